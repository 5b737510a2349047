//! Command-line argument source.
//!
//! Flags are matched against the descriptor table, so `-dh` and `--db-host`
//! are both single flags. Every token that is not the value of a preceding
//! flag must carry a `-` or `--` prefix.

use super::{RawSource, RawValues, SourceTier};
use crate::config::descriptors::{FieldDescriptor, FieldKind};
use crate::error::{ConfigError, ConfigResult};

/// Values read from the process argument vector.
#[derive(Debug, Clone, Default)]
pub struct ArgSource {
    values: RawValues,
}

impl ArgSource {
    /// Scan the live process arguments.
    pub fn from_env_args(table: &[FieldDescriptor]) -> ConfigResult<Self> {
        Self::parse(
            table,
            std::env::args_os().map(|a| a.to_string_lossy().into_owned()),
        )
    }

    /// Scan an argument vector. Element 0 is the program path and is skipped.
    pub fn parse<I, S>(table: &[FieldDescriptor], argv: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().skip(1).map(Into::into).collect();
        let mut values = RawValues::new();

        let mut i = 0;
        while i < argv.len() {
            let token = &argv[i];
            let descriptor = match_flag(table, token)?;

            if descriptor.consumes_value {
                let value = argv
                    .get(i + 1)
                    .ok_or_else(|| ConfigError::MissingArgumentValue {
                        flag: token.clone(),
                    })?;
                values.insert(descriptor.name, value.clone());
                i += 2;
            } else {
                if descriptor.kind != FieldKind::Bool {
                    return Err(ConfigError::InvalidDescriptor {
                        field: descriptor.name,
                        reason: "only bool fields may be valueless switches",
                    });
                }
                values.insert(descriptor.name, "true".to_string());
                i += 1;
            }
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &RawValues {
        &self.values
    }
}

/// Select the single descriptor bound to a flag token.
fn match_flag<'a>(table: &'a [FieldDescriptor], token: &str) -> ConfigResult<&'a FieldDescriptor> {
    let matches: Vec<&FieldDescriptor> = if let Some(text) = token.strip_prefix("--") {
        table.iter().filter(|d| d.long_flag == Some(text)).collect()
    } else if let Some(text) = token.strip_prefix('-') {
        table.iter().filter(|d| d.short_flag == Some(text)).collect()
    } else {
        Vec::new()
    };

    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(ConfigError::UnrecognizedArgumentToken {
            token: token.to_string(),
        }),
        many => Err(ConfigError::DuplicateDescriptorBinding {
            flag: token.to_string(),
            fields: many.iter().map(|d| d.name).collect(),
        }),
    }
}

impl RawSource for ArgSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Arguments
    }

    fn raw(&self, descriptor: &FieldDescriptor) -> Option<&str> {
        self.values.get(descriptor.name).map(String::as_str)
    }
}
