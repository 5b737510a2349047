//! Structured error types for settings resolution.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Field errors
    MissingRequiredField,
    OutOfRangeField,
    MalformedValue,

    // Argument vector errors
    UnrecognizedArgumentToken,
    MissingArgumentValue,

    // Descriptor table defects
    DuplicateDescriptorBinding,
    InvalidDescriptor,

    // I/O errors
    SettingsFileUnreadable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::OutOfRangeField => "OUT_OF_RANGE_FIELD",
            ErrorCode::MalformedValue => "MALFORMED_VALUE",
            ErrorCode::UnrecognizedArgumentToken => "UNRECOGNIZED_ARGUMENT_TOKEN",
            ErrorCode::MissingArgumentValue => "MISSING_ARGUMENT_VALUE",
            ErrorCode::DuplicateDescriptorBinding => "DUPLICATE_DESCRIPTOR_BINDING",
            ErrorCode::InvalidDescriptor => "INVALID_DESCRIPTOR",
            ErrorCode::SettingsFileUnreadable => "SETTINGS_FILE_UNREADABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violation attached to a single settings field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} is required")]
    MissingRequiredField { field: &'static str },

    #[error("{field} is out of range: {value} is not within [{min}, {max}]")]
    OutOfRangeField {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} has malformed value {raw:?}: {reason}")]
    MalformedValue {
        field: &'static str,
        raw: String,
        reason: String,
    },
}

impl FieldError {
    pub fn missing(field: &'static str) -> Self {
        FieldError::MissingRequiredField { field }
    }

    pub fn out_of_range(field: &'static str, value: i64, min: i64, max: i64) -> Self {
        FieldError::OutOfRangeField {
            field,
            value,
            min,
            max,
        }
    }

    pub fn malformed(field: &'static str, raw: &str, reason: impl fmt::Display) -> Self {
        FieldError::MalformedValue {
            field,
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Logical name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::MissingRequiredField { field }
            | FieldError::OutOfRangeField { field, .. }
            | FieldError::MalformedValue { field, .. } => field,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FieldError::MissingRequiredField { .. } => ErrorCode::MissingRequiredField,
            FieldError::OutOfRangeField { .. } => ErrorCode::OutOfRangeField,
            FieldError::MalformedValue { .. } => ErrorCode::MalformedValue,
        }
    }
}

/// Every field violation found in one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Check whether a violation with this code was reported for `field`.
    pub fn contains(&self, code: ErrorCode, field: &str) -> bool {
        self.0.iter().any(|e| e.code() == code && e.field() == field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid setting(s)", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, error)?;
        }
        Ok(())
    }
}

/// Fatal failure while resolving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more fields failed coercion, presence or range checks.
    #[error("{0}")]
    Fields(FieldErrors),

    #[error("malformed settings file {}: {source}", .path.display())]
    MalformedSettingsFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read settings file {}: {source}", .path.display())]
    SettingsFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized argument '{token}'")]
    UnrecognizedArgumentToken { token: String },

    #[error("flag '{flag}' expects a value")]
    MissingArgumentValue { flag: String },

    #[error("flag '{flag}' is bound to more than one field: {}", .fields.join(", "))]
    DuplicateDescriptorBinding {
        flag: String,
        fields: Vec<&'static str>,
    },

    #[error("descriptor '{field}' is invalid: {reason}")]
    InvalidDescriptor {
        field: &'static str,
        reason: &'static str,
    },
}

impl From<FieldErrors> for ConfigError {
    fn from(errors: FieldErrors) -> Self {
        ConfigError::Fields(errors)
    }
}

impl ConfigError {
    /// Flatten into one diagnostic per failed field or flag.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            ConfigError::Fields(errors) => errors
                .iter()
                .map(|e| Diagnostic::new(e.code(), e.to_string()).with_field(e.field()))
                .collect(),
            ConfigError::MalformedSettingsFile { .. } => {
                vec![Diagnostic::new(ErrorCode::MalformedValue, self.to_string())]
            }
            ConfigError::SettingsFileUnreadable { .. } => {
                vec![Diagnostic::new(ErrorCode::SettingsFileUnreadable, self.to_string())]
            }
            ConfigError::UnrecognizedArgumentToken { .. } => {
                vec![Diagnostic::new(ErrorCode::UnrecognizedArgumentToken, self.to_string())]
            }
            ConfigError::MissingArgumentValue { .. } => {
                vec![Diagnostic::new(ErrorCode::MissingArgumentValue, self.to_string())]
            }
            ConfigError::DuplicateDescriptorBinding { .. } => {
                vec![Diagnostic::new(ErrorCode::DuplicateDescriptorBinding, self.to_string())]
            }
            ConfigError::InvalidDescriptor { field, .. } => {
                vec![Diagnostic::new(ErrorCode::InvalidDescriptor, self.to_string()).with_field(*field)]
            }
        }
    }

    /// Field violations, if this is an aggregated validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ConfigError::Fields(errors) => Some(errors),
            _ => None,
        }
    }
}

/// User-facing rendering of a resolution failure.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result type for settings resolution.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
