//! Settings resolution.
//!
//! Merges the three sources field by field, substitutes defaults, validates
//! the merged values and builds the immutable [`ResolvedSettings`]. Every
//! field-level violation is collected before failing.

use super::coerce::coerce;
use super::descriptors::{FieldDescriptor, FieldValue, field};
use super::merge;
use super::sources::{SourceSet, SourceTier};
use super::types::{DatabaseSettings, LogSeverity, LoggingSettings, ResolvedSettings};
use crate::error::{ConfigError, ConfigResult, FieldError, FieldErrors};
use std::collections::HashMap;
use tracing::debug;

/// Inclusive numeric bounds checked after merging.
const RANGES: &[(&str, i64, i64)] = &[
    (field::LOG_SEVERITY, 0, LogSeverity::MAX),
    (field::DB_PORT, 1, u16::MAX as i64),
];

/// Where one field's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub field: &'static str,
    pub tier: SourceTier,
    /// Display form of the value, redacted for secret fields.
    pub value: Option<String>,
}

/// Per-field provenance of a resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTrace {
    entries: Vec<TraceEntry>,
}

impl ResolutionTrace {
    fn record(&mut self, descriptor: &FieldDescriptor, tier: SourceTier, value: Option<&FieldValue>) {
        let value = value.map(|v| {
            if descriptor.secret {
                "<redacted>".to_string()
            } else {
                match v {
                    FieldValue::Str(s) => s.clone(),
                    FieldValue::Bool(b) => b.to_string(),
                    FieldValue::Int(i) => i.to_string(),
                }
            }
        });
        self.entries.push(TraceEntry {
            field: descriptor.name,
            tier,
            value,
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Tier that supplied `field`, if it was resolved.
    pub fn tier_of(&self, field: &str) -> Option<SourceTier> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.tier)
    }

    /// Emit one debug event per field.
    pub fn log(&self) {
        for entry in &self.entries {
            debug!(
                field = entry.field,
                source = %entry.tier,
                value = entry.value.as_deref().unwrap_or("<unset>"),
                "Resolved setting"
            );
        }
    }
}

/// Successful resolution result.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub settings: ResolvedSettings,
    pub trace: ResolutionTrace,
}

/// Resolve settings from the given sources.
///
/// Precedence per field is arguments, then file, then environment, then the
/// declared default.
pub fn resolve(table: &[FieldDescriptor], sources: &SourceSet) -> ConfigResult<Resolution> {
    let layers = sources.layers();
    let mut values = HashMap::new();
    let mut trace = ResolutionTrace::default();
    let mut errors = FieldErrors::new();

    for d in table {
        let (tier, coerced) = match merge::pick(d, &layers) {
            Some((tier, raw)) => (tier, coerce(d, Some(raw))),
            None => match d.default {
                Some(default) => (SourceTier::Default, Ok(Some(default.to_value()))),
                None => (SourceTier::Default, coerce(d, None)),
            },
        };

        match coerced {
            Ok(Some(value)) => {
                trace.record(d, tier, Some(&value));
                values.insert(d.name, value);
            }
            Ok(None) => {
                if d.required {
                    errors.push(FieldError::missing(d.name));
                }
                trace.record(d, tier, None);
            }
            Err(e) => errors.push(e),
        }
    }

    validate(&values, &mut errors);
    if !errors.is_empty() {
        return Err(ConfigError::Fields(errors));
    }

    let settings = build(FieldMap(values))?;
    Ok(Resolution { settings, trace })
}

/// Structural checks over the merged values.
fn validate(values: &HashMap<&'static str, FieldValue>, errors: &mut FieldErrors) {
    if let Some(FieldValue::Str(token)) = values.get(field::TOKEN)
        && token.trim().is_empty()
    {
        errors.push(FieldError::missing(field::TOKEN));
    }

    for &(name, min, max) in RANGES {
        if let Some(FieldValue::Int(value)) = values.get(name)
            && !(min..=max).contains(value)
        {
            errors.push(FieldError::out_of_range(name, *value, min, max));
        }
    }
}

/// Typed access to merged values while building the settings struct.
struct FieldMap(HashMap<&'static str, FieldValue>);

impl FieldMap {
    fn string(&mut self, name: &'static str) -> ConfigResult<String> {
        self.opt_string(name)?.ok_or_else(|| mismatch(name))
    }

    fn opt_string(&mut self, name: &'static str) -> ConfigResult<Option<String>> {
        match self.0.remove(name) {
            None => Ok(None),
            Some(FieldValue::Str(s)) => Ok(Some(s)),
            Some(_) => Err(mismatch(name)),
        }
    }

    fn bool(&mut self, name: &'static str) -> ConfigResult<bool> {
        match self.0.remove(name) {
            Some(FieldValue::Bool(b)) => Ok(b),
            _ => Err(mismatch(name)),
        }
    }

    fn int(&mut self, name: &'static str) -> ConfigResult<i64> {
        match self.0.remove(name) {
            Some(FieldValue::Int(i)) => Ok(i),
            _ => Err(mismatch(name)),
        }
    }
}

fn mismatch(name: &'static str) -> ConfigError {
    ConfigError::InvalidDescriptor {
        field: name,
        reason: "field is not declared with the kind the settings struct expects",
    }
}

fn build(mut map: FieldMap) -> ConfigResult<ResolvedSettings> {
    let severity = map.int(field::LOG_SEVERITY)?;
    let port = map.int(field::DB_PORT)?;

    let out_of_range = |name, value, max| {
        let mut errors = FieldErrors::new();
        errors.push(FieldError::out_of_range(name, value, 0, max));
        ConfigError::Fields(errors)
    };

    Ok(ResolvedSettings {
        token: map.string(field::TOKEN)?,
        use_reply: map.bool(field::USE_REPLY)?,
        logging: LoggingSettings {
            use_utc: map.bool(field::LOG_USE_UTC)?,
            severity: LogSeverity::from_i64(severity)
                .ok_or_else(|| out_of_range(field::LOG_SEVERITY, severity, LogSeverity::MAX))?,
        },
        database: DatabaseSettings {
            hostname: map.string(field::DB_HOSTNAME)?,
            port: u16::try_from(port)
                .map_err(|_| out_of_range(field::DB_PORT, port, u16::MAX as i64))?,
            username: map.string(field::DB_USERNAME)?,
            password: map.string(field::DB_PASSWORD)?,
            name: map.string(field::DB_NAME)?,
            certificate_path: map.opt_string(field::DB_CERTIFICATE_PATH)?,
            ssl_mode: map.opt_string(field::DB_SSL_MODE)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::descriptors::descriptors;
    use crate::config::sources::{ArgSource, EnvSource, FileSource};
    use crate::error::ErrorCode;
    use std::path::Path;

    fn sources(args: &[&str], file: Option<&str>, env: &[(&str, &str)]) -> SourceSet {
        let table = descriptors();
        SourceSet::new(
            ArgSource::parse(table, std::iter::once("sb-bot").chain(args.iter().copied())).unwrap(),
            file.map(|json| FileSource::parse(table, Path::new("appsettings.json"), json).unwrap())
                .unwrap_or_default(),
            EnvSource::from_vars(table, env.iter().copied()),
        )
    }

    const REQUIRED_ENV: &[(&str, &str)] = &[
        ("SB_BOT_TOKEN", "env-token"),
        ("SB_DB_USERNAME", "bot"),
        ("SB_DB_PASSWORD", "pw"),
        ("SB_DB_NAME", "botdb"),
    ];

    fn env_with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED_ENV.iter().chain(extra).copied().collect()
    }

    fn field_errors(err: ConfigError) -> FieldErrors {
        match err {
            ConfigError::Fields(errors) => errors,
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_fill_optional_fields() {
        let resolution = resolve(descriptors(), &sources(&[], None, REQUIRED_ENV)).unwrap();
        let s = resolution.settings;

        assert_eq!(s.token, "env-token");
        assert!(!s.use_reply);
        assert!(!s.logging.use_utc);
        assert_eq!(s.logging.severity, LogSeverity::Info);
        assert_eq!(s.database.hostname, "localhost");
        assert_eq!(s.database.port, 5432);
        assert_eq!(s.database.username, "bot");
        assert_eq!(s.database.certificate_path, None);
        assert_eq!(s.database.ssl_mode, None);

        assert_eq!(resolution.trace.tier_of(field::DB_PORT), Some(SourceTier::Default));
        assert_eq!(resolution.trace.tier_of(field::TOKEN), Some(SourceTier::Environment));
    }

    #[test]
    fn test_only_token_is_required_without_default() {
        let err = resolve(descriptors(), &sources(&[], None, &[])).unwrap_err();
        let errors = field_errors(err);

        assert!(errors.contains(ErrorCode::MissingRequiredField, field::TOKEN));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_database_credentials_default() {
        let env = [("SB_BOT_TOKEN", "env-token")];
        let resolution = resolve(descriptors(), &sources(&[], None, &env)).unwrap();
        let db = resolution.settings.database;

        assert_eq!(db.username, "postgres");
        assert_eq!(db.password, "");
        assert_eq!(db.name, "postgres");
        assert_eq!(resolution.trace.tier_of(field::DB_NAME), Some(SourceTier::Default));
    }

    #[test]
    fn test_whitespace_token_rejected() {
        let env = [("SB_BOT_TOKEN", " \t ")];
        let errors = field_errors(resolve(descriptors(), &sources(&[], None, &env)).unwrap_err());
        assert!(errors.contains(ErrorCode::MissingRequiredField, field::TOKEN));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_malformed_and_range_errors_aggregate() {
        let env = env_with(&[("SB_DB_PORT", "not-a-port"), ("SB_LOG_SEVERITY", "9")]);
        let errors = field_errors(resolve(descriptors(), &sources(&[], None, &env)).unwrap_err());

        assert!(errors.contains(ErrorCode::MalformedValue, field::DB_PORT));
        assert!(errors.contains(ErrorCode::OutOfRangeField, field::LOG_SEVERITY));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_argument_overrides_malformed_lower_tier() {
        let env = env_with(&[("SB_DB_PORT", "not-a-port")]);
        let resolution = resolve(descriptors(), &sources(&["-dp", "7000"], None, &env)).unwrap();
        assert_eq!(resolution.settings.database.port, 7000);
    }

    #[test]
    fn test_port_zero_out_of_range() {
        let env = env_with(&[("SB_DB_PORT", "0")]);
        let errors = field_errors(resolve(descriptors(), &sources(&[], None, &env)).unwrap_err());
        assert!(errors.contains(ErrorCode::OutOfRangeField, field::DB_PORT));
    }

    #[test]
    fn test_port_bounds_accepted() {
        for port in ["1", "65535"] {
            let env = env_with(&[("SB_DB_PORT", port)]);
            let resolution = resolve(descriptors(), &sources(&[], None, &env)).unwrap();
            assert_eq!(resolution.settings.database.port.to_string(), port);
        }
    }

    #[test]
    fn test_ssl_mode_passes_through_unchecked() {
        for mode in ["true", "verify-full", "sometimes"] {
            let env = env_with(&[("SB_DB_USESSL", mode)]);
            let resolution = resolve(descriptors(), &sources(&[], None, &env)).unwrap();
            assert_eq!(resolution.settings.database.ssl_mode.as_deref(), Some(mode));
        }
    }

    #[test]
    fn test_bool_env_uses_truthy_rule() {
        let env = env_with(&[("SB_USE_REPLY", "1"), ("SB_LOG_USE_UTC", "yes")]);
        let s = resolve(descriptors(), &sources(&[], None, &env)).unwrap().settings;
        assert!(s.use_reply);
        assert!(!s.logging.use_utc);
    }

    #[test]
    fn test_trace_redacts_secrets() {
        let resolution = resolve(descriptors(), &sources(&[], None, REQUIRED_ENV)).unwrap();
        for entry in resolution.trace.entries() {
            if entry.field == field::TOKEN || entry.field == field::DB_PASSWORD {
                assert_eq!(entry.value.as_deref(), Some("<redacted>"));
            }
        }
        let unset = resolution
            .trace
            .entries()
            .iter()
            .find(|e| e.field == field::DB_CERTIFICATE_PATH)
            .unwrap();
        assert_eq!(unset.value, None);
    }
}
