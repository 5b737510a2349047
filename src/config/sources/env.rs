//! Environment variable source.

use super::{RawSource, RawValues, SourceTier};
use crate::config::descriptors::FieldDescriptor;
use std::collections::HashMap;
use std::env::VarError;

/// Values read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    values: RawValues,
    ignored: Vec<&'static str>,
}

impl EnvSource {
    /// Read every descriptor's environment key from the live process.
    pub fn from_env(table: &[FieldDescriptor]) -> Self {
        Self::from_lookup(table, |key| std::env::var(key))
    }

    /// Build from an explicit set of variables instead of the process environment.
    pub fn from_vars<I, K, V>(table: &[FieldDescriptor], vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(table, |key| vars.get(key).cloned().ok_or(VarError::NotPresent))
    }

    fn from_lookup(
        table: &[FieldDescriptor],
        mut lookup: impl FnMut(&str) -> Result<String, VarError>,
    ) -> Self {
        let mut source = Self::default();
        for d in table {
            let Some(key) = d.env_key.filter(|k| !k.is_empty()) else {
                continue;
            };
            match lookup(key) {
                Ok(value) => {
                    source.values.insert(d.name, value);
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(_)) => source.ignored.push(key),
            }
        }
        source
    }

    /// Keys skipped because their value was not valid unicode.
    ///
    /// Reading happens before logging is configured, so callers report these
    /// once the subscriber is installed.
    pub fn ignored_keys(&self) -> &[&'static str] {
        &self.ignored
    }

    pub fn values(&self) -> &RawValues {
        &self.values
    }
}

impl RawSource for EnvSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Environment
    }

    fn raw(&self, descriptor: &FieldDescriptor) -> Option<&str> {
        self.values.get(descriptor.name).map(String::as_str)
    }
}
