//! Resolved settings types.
//!
//! These are the immutable values handed to the rest of the process once
//! resolution succeeds.

use std::fmt;

/// Log severity, ordered from least to most verbose.
///
/// A configured severity admits its own level and every level below it, so
/// `Critical` logs the least and `Debug` logs everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogSeverity {
    Critical = 0,
    Error = 1,
    Warning = 2,
    #[default]
    Info = 3,
    Verbose = 4,
    Debug = 5,
}

impl LogSeverity {
    /// Highest valid numeric severity.
    pub const MAX: i64 = LogSeverity::Debug as i64;

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(LogSeverity::Critical),
            1 => Some(LogSeverity::Error),
            2 => Some(LogSeverity::Warning),
            3 => Some(LogSeverity::Info),
            4 => Some(LogSeverity::Verbose),
            5 => Some(LogSeverity::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogSeverity::Critical => "critical",
            LogSeverity::Error => "error",
            LogSeverity::Warning => "warning",
            LogSeverity::Info => "info",
            LogSeverity::Verbose => "verbose",
            LogSeverity::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Logging behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingSettings {
    /// Timestamp log lines in UTC instead of local time.
    pub use_utc: bool,
    pub severity: LogSeverity,
}

/// Database connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub name: String,
    /// CA certificate used to verify the server.
    pub certificate_path: Option<String>,
    pub ssl_mode: Option<String>,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("certificate_path", &self.certificate_path)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// The fully resolved and validated settings snapshot.
///
/// Built once at startup and shared read-only, usually as
/// `Arc<ResolvedSettings>`.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// Chat gateway token. Never empty.
    pub token: String,
    /// Send bot responses as replies to the triggering message.
    pub use_reply: bool,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
}

impl fmt::Debug for ResolvedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSettings")
            .field("token", &"<redacted>")
            .field("use_reply", &self.use_reply)
            .field("logging", &self.logging)
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_range() {
        assert_eq!(LogSeverity::MAX, 5);
        for i in 0..=LogSeverity::MAX {
            assert_eq!(LogSeverity::from_i64(i).unwrap() as i64, i);
        }
        assert!(LogSeverity::from_i64(-1).is_none());
        assert!(LogSeverity::from_i64(6).is_none());
    }

    #[test]
    fn test_severity_scale_runs_quiet_to_verbose() {
        assert_eq!(LogSeverity::from_i64(0), Some(LogSeverity::Critical));
        assert_eq!(LogSeverity::from_i64(5), Some(LogSeverity::Debug));
        assert_eq!(LogSeverity::default(), LogSeverity::Info);
        assert_eq!(LogSeverity::default() as i64, 3);
        assert!(LogSeverity::Critical < LogSeverity::Debug);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = ResolvedSettings {
            token: "very-secret-token".into(),
            use_reply: false,
            logging: LoggingSettings::default(),
            database: DatabaseSettings {
                hostname: "localhost".into(),
                port: 5432,
                username: "bot".into(),
                password: "hunter2".into(),
                name: "botdb".into(),
                certificate_path: None,
                ssl_mode: None,
            },
        };
        let text = format!("{:?}", settings);
        assert!(!text.contains("very-secret-token"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("botdb"));
    }
}
