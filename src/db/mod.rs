//! Database connection descriptor.
//!
//! The SQL data-access layer consumes a [`ConnectionDescriptor`] built from the
//! resolved `database` settings. This module only assembles and renders
//! connection parameters; it never opens a connection.

use crate::config::{DatabaseSettings, parse_bool};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// TLS negotiation mode for the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    /// libpq keyword for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SslMode {
    /// Interpret a configured SSL setting.
    ///
    /// A libpq mode name selects that mode. Anything else is read as a flag
    /// with the truthy rule: `1` or `true` means `require`, every other value
    /// means `disable`.
    pub fn from_setting(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            if parse_bool(raw) {
                SslMode::Require
            } else {
                SslMode::Disable
            }
        })
    }
}

impl FromStr for SslMode {
    type Err = String;

    /// Case-insensitive; `verify-ca`, `verify_ca` and `VerifyCA` are equivalent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verifyca" => Ok(SslMode::VerifyCa),
            "verifyfull" => Ok(SslMode::VerifyFull),
            _ => Err(format!(
                "expected one of disable, allow, prefer, require, verify-ca, verify-full; got {:?}",
                s
            )),
        }
    }
}

/// Parameters needed to open a database connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    password: String,
    pub dbname: String,
    pub ssl_mode: Option<SslMode>,
    /// CA certificate used to verify the server.
    pub root_cert: Option<PathBuf>,
}

impl ConnectionDescriptor {
    /// Build the descriptor from resolved settings.
    ///
    /// With no CA certificate and no SSL setting the connection falls back to
    /// `disable`. With a certificate and no SSL setting the mode is left to the
    /// driver.
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        let root_cert = settings
            .certificate_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let ssl_mode = match settings.ssl_mode.as_deref() {
            Some(raw) => Some(SslMode::from_setting(raw)),
            None if root_cert.is_none() => Some(SslMode::Disable),
            None => None,
        };

        Self {
            host: settings.hostname.clone(),
            port: settings.port,
            user: settings.username.clone(),
            password: settings.password.clone(),
            dbname: settings.name.clone(),
            ssl_mode,
            root_cert,
        }
    }

    /// True when the connection neither encrypts nor verifies the server.
    pub fn is_plaintext(&self) -> bool {
        self.root_cert.is_none() && self.ssl_mode == Some(SslMode::Disable)
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Render as a libpq keyword/value connection string.
    pub fn connection_string(&self) -> String {
        self.render(&self.password)
    }

    /// Connection string with the password masked, for logging.
    pub fn redacted(&self) -> String {
        self.render("*****")
    }

    fn render(&self, password: &str) -> String {
        let mut parts = vec![
            format!("host={}", quote(&self.host)),
            format!("port={}", self.port),
            format!("user={}", quote(&self.user)),
            format!("password={}", quote(password)),
            format!("dbname={}", quote(&self.dbname)),
        ];
        if let Some(mode) = self.ssl_mode {
            parts.push(format!("sslmode={}", mode));
        }
        if let Some(ref cert) = self.root_cert {
            parts.push(format!("sslrootcert={}", quote(&cert.to_string_lossy())));
        }
        parts.join(" ")
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("ssl_mode", &self.ssl_mode)
            .field("root_cert", &self.root_cert)
            .finish()
    }
}

/// Quote a keyword value when it is empty or contains spaces, quotes or backslashes.
fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
