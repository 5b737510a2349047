//! JSON settings file source.

use super::{RawSource, RawValues, SourceTier};
use crate::config::descriptors::FieldDescriptor;
use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument {
    bot_token: Option<String>,
    use_reply: Option<bool>,
    logging: Option<LoggingSection>,
    database: Option<DatabaseSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggingSection {
    use_utc: Option<bool>,
    log_severity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseSection {
    hostname: Option<String>,
    port: Option<i64>,
    username: Option<String>,
    password: Option<String>,
    name: Option<String>,
    cert_path: Option<String>,
    ssl_mode: Option<String>,
}

impl SettingsDocument {
    /// Flatten into raw strings keyed by dotted path.
    fn flatten(self) -> HashMap<&'static str, String> {
        let mut flat = HashMap::new();
        let mut put = |path: &'static str, value: Option<String>| {
            if let Some(value) = value {
                flat.insert(path, value);
            }
        };

        put("botToken", self.bot_token);
        put("useReply", self.use_reply.map(|b| b.to_string()));

        let logging = self.logging.unwrap_or_default();
        put("logging.useUtc", logging.use_utc.map(|b| b.to_string()));
        put("logging.logSeverity", logging.log_severity.map(|i| i.to_string()));

        let db = self.database.unwrap_or_default();
        put("database.hostname", db.hostname);
        put("database.port", db.port.map(|i| i.to_string()));
        put("database.username", db.username);
        put("database.password", db.password);
        put("database.name", db.name);
        put("database.certPath", db.cert_path);
        put("database.sslMode", db.ssl_mode);

        flat
    }
}

/// Values read from the JSON settings file.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    path: Option<PathBuf>,
    values: RawValues,
}

impl FileSource {
    /// Read the settings file at `path`.
    ///
    /// A missing file yields an empty source. An unreadable or malformed file
    /// is fatal.
    pub fn load(table: &[FieldDescriptor], path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, file source is empty");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsFileUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(table, path, &content)
    }

    /// Parse settings file content. `path` is only used for reporting.
    pub fn parse(table: &[FieldDescriptor], path: &Path, content: &str) -> ConfigResult<Self> {
        let document: SettingsDocument =
            serde_json::from_str(content).map_err(|source| ConfigError::MalformedSettingsFile {
                path: path.to_path_buf(),
                source,
            })?;
        let mut flat = document.flatten();

        let values = table
            .iter()
            .filter_map(|d| {
                let key = d.file_path?;
                flat.remove(key).map(|value| (d.name, value))
            })
            .collect();

        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Path of the file that was read, if one existed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn values(&self) -> &RawValues {
        &self.values
    }
}

impl RawSource for FileSource {
    fn tier(&self) -> SourceTier {
        SourceTier::File
    }

    fn raw(&self, descriptor: &FieldDescriptor) -> Option<&str> {
        self.values.get(descriptor.name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::descriptors::{descriptors, field};
    use tempfile::TempDir;

    fn parse(json: &str) -> ConfigResult<FileSource> {
        FileSource::parse(descriptors(), Path::new("appsettings.json"), json)
    }

    #[test]
    fn test_flattens_nested_shape() {
        let source = parse(
            r#"{
                "botToken": "X",
                "useReply": true,
                "logging": { "useUtc": false, "logSeverity": 3 },
                "database": {
                    "hostname": "db.local",
                    "port": 5432,
                    "username": "bot",
                    "password": "secret",
                    "name": "botdb",
                    "certPath": "/etc/ca.pem",
                    "sslMode": "Require"
                }
            }"#,
        )
        .unwrap();

        let values = source.values();
        assert_eq!(values[field::TOKEN], "X");
        assert_eq!(values[field::USE_REPLY], "true");
        assert_eq!(values[field::LOG_USE_UTC], "false");
        assert_eq!(values[field::LOG_SEVERITY], "3");
        assert_eq!(values[field::DB_HOSTNAME], "db.local");
        assert_eq!(values[field::DB_PORT], "5432");
        assert_eq!(values[field::DB_USERNAME], "bot");
        assert_eq!(values[field::DB_PASSWORD], "secret");
        assert_eq!(values[field::DB_NAME], "botdb");
        assert_eq!(values[field::DB_CERTIFICATE_PATH], "/etc/ca.pem");
        assert_eq!(values[field::DB_SSL_MODE], "Require");
    }

    #[test]
    fn test_null_and_missing_are_absent() {
        let source = parse(r#"{"botToken": "X", "database": {"certPath": null}}"#).unwrap();
        assert_eq!(source.values().len(), 1);
        assert!(!source.values().contains_key(field::DB_CERTIFICATE_PATH));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let source = parse(r#"{"botToken": "X", "extra": {"nested": 1}}"#).unwrap();
        assert_eq!(source.values().len(), 1);
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let err = parse(r#"{"botToken": "X","#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedSettingsFile { .. }));
    }

    #[test]
    fn test_wrong_json_type_is_fatal() {
        let err = parse(r#"{"database": {"port": "5432"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedSettingsFile { .. }));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::load(descriptors(), &temp.path().join("appsettings.json")).unwrap();
        assert!(source.values().is_empty());
        assert!(source.path().is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appsettings.json");
        std::fs::write(&path, r#"{"database": {"port": 6543}}"#).unwrap();

        let source = FileSource::load(descriptors(), &path).unwrap();
        assert_eq!(source.values()[field::DB_PORT], "6543");
        assert_eq!(source.path(), Some(path.as_path()));
    }
}
