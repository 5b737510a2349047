//! Static field descriptor table.
//!
//! Every configurable parameter is declared here once, together with the key it
//! is looked up under in each source. The table is the single place the
//! resolver, the source readers and the startup binding check consult.

use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// Logical field names, as reported in diagnostics.
pub mod field {
    pub const TOKEN: &str = "token";
    pub const USE_REPLY: &str = "useReply";
    pub const LOG_USE_UTC: &str = "logging.useUtc";
    pub const LOG_SEVERITY: &str = "logging.severity";
    pub const DB_HOSTNAME: &str = "database.hostname";
    pub const DB_PORT: &str = "database.port";
    pub const DB_USERNAME: &str = "database.username";
    pub const DB_PASSWORD: &str = "database.password";
    pub const DB_NAME: &str = "database.name";
    pub const DB_CERTIFICATE_PATH: &str = "database.certificatePath";
    pub const DB_SSL_MODE: &str = "database.sslMode";
}

/// Declared type of a field, selecting its coercion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    Int,
    NullableInt,
}

/// A typed value after coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

/// Compile-time default for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Str(&'static str),
    Bool(bool),
    Int(i64),
}

impl FieldDefault {
    pub fn to_value(self) -> FieldValue {
        match self {
            FieldDefault::Str(s) => FieldValue::Str(s.to_string()),
            FieldDefault::Bool(b) => FieldValue::Bool(b),
            FieldDefault::Int(i) => FieldValue::Int(i),
        }
    }
}

/// Metadata describing one configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Logical identifier, e.g. `database.port`.
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldDefault>,
    /// Environment variable name.
    pub env_key: Option<&'static str>,
    /// Dotted path into the settings file.
    pub file_path: Option<&'static str>,
    /// Short flag text without the leading `-`.
    pub short_flag: Option<&'static str>,
    /// Long flag text without the leading `--`.
    pub long_flag: Option<&'static str>,
    /// Whether the flag takes the following token as its value.
    /// Only `Bool` fields may be valueless switches.
    pub consumes_value: bool,
    /// Value is redacted in logs.
    pub secret: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            env_key: None,
            file_path: None,
            short_flag: None,
            long_flag: None,
            consumes_value: true,
            secret: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn env(mut self, key: &'static str) -> Self {
        self.env_key = Some(key);
        self
    }

    pub const fn file(mut self, path: &'static str) -> Self {
        self.file_path = Some(path);
        self
    }

    pub const fn flags(mut self, short: &'static str, long: &'static str) -> Self {
        self.short_flag = Some(short);
        self.long_flag = Some(long);
        self
    }

    /// Mark the flag as a bare switch that does not consume a value.
    pub const fn switch(mut self) -> Self {
        self.consumes_value = false;
        self
    }

    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

static DESCRIPTORS: [FieldDescriptor; 11] = [
    FieldDescriptor::new(field::TOKEN, FieldKind::String)
        .required()
        .env("SB_BOT_TOKEN")
        .file("botToken")
        .flags("t", "bot-token")
        .secret(),
    FieldDescriptor::new(field::USE_REPLY, FieldKind::Bool)
        .default_value(FieldDefault::Bool(false))
        .env("SB_USE_REPLY")
        .file("useReply")
        .flags("r", "use-reply")
        .switch(),
    FieldDescriptor::new(field::LOG_USE_UTC, FieldKind::Bool)
        .default_value(FieldDefault::Bool(false))
        .env("SB_LOG_USE_UTC")
        .file("logging.useUtc")
        .flags("u", "use-utc")
        .switch(),
    FieldDescriptor::new(field::LOG_SEVERITY, FieldKind::NullableInt)
        .default_value(FieldDefault::Int(3))
        .env("SB_LOG_SEVERITY")
        .file("logging.logSeverity")
        .flags("l", "log-severity"),
    FieldDescriptor::new(field::DB_HOSTNAME, FieldKind::String)
        .required()
        .default_value(FieldDefault::Str("localhost"))
        .env("SB_DB_HOST")
        .file("database.hostname")
        .flags("dh", "db-host"),
    FieldDescriptor::new(field::DB_PORT, FieldKind::Int)
        .required()
        .default_value(FieldDefault::Int(5432))
        .env("SB_DB_PORT")
        .file("database.port")
        .flags("dp", "db-port"),
    FieldDescriptor::new(field::DB_USERNAME, FieldKind::String)
        .required()
        .default_value(FieldDefault::Str("postgres"))
        .env("SB_DB_USERNAME")
        .file("database.username")
        .flags("du", "db-username"),
    FieldDescriptor::new(field::DB_PASSWORD, FieldKind::String)
        .required()
        .default_value(FieldDefault::Str(""))
        .env("SB_DB_PASSWORD")
        .file("database.password")
        .secret(),
    FieldDescriptor::new(field::DB_NAME, FieldKind::String)
        .required()
        .default_value(FieldDefault::Str("postgres"))
        .env("SB_DB_NAME")
        .file("database.name")
        .flags("dn", "db-name"),
    FieldDescriptor::new(field::DB_CERTIFICATE_PATH, FieldKind::String)
        .env("SB_DB_CAPATH")
        .file("database.certPath")
        .flags("dc", "db-capath"),
    FieldDescriptor::new(field::DB_SSL_MODE, FieldKind::String)
        .env("SB_DB_USESSL")
        .file("database.sslMode")
        .flags("ds", "db-usessl"),
];

/// The process-wide descriptor table.
pub fn descriptors() -> &'static [FieldDescriptor] {
    &DESCRIPTORS
}

/// Look up a descriptor by logical name.
pub fn find<'a>(table: &'a [FieldDescriptor], name: &str) -> Option<&'a FieldDescriptor> {
    table.iter().find(|d| d.name == name)
}

/// Verify that a descriptor table is internally consistent.
///
/// Every short and every long flag must be bound to exactly one descriptor,
/// and only `Bool` descriptors may be valueless switches. A failure here is a
/// defect in the table, not a user input error.
pub fn check_bindings(table: &[FieldDescriptor]) -> ConfigResult<()> {
    let mut short: BTreeMap<&str, Vec<&'static str>> = BTreeMap::new();
    let mut long: BTreeMap<&str, Vec<&'static str>> = BTreeMap::new();

    for d in table {
        if !d.consumes_value && d.kind != FieldKind::Bool {
            return Err(ConfigError::InvalidDescriptor {
                field: d.name,
                reason: "only bool fields may be valueless switches",
            });
        }
        if let Some(flag) = d.short_flag {
            short.entry(flag).or_default().push(d.name);
        }
        if let Some(flag) = d.long_flag {
            long.entry(flag).or_default().push(d.name);
        }
    }

    let bindings = short
        .into_iter()
        .map(|(flag, fields)| (format!("-{}", flag), fields))
        .chain(
            long.into_iter()
                .map(|(flag, fields)| (format!("--{}", flag), fields)),
        );
    for (flag, fields) in bindings {
        if fields.len() > 1 {
            return Err(ConfigError::DuplicateDescriptorBinding { flag, fields });
        }
    }

    Ok(())
}
