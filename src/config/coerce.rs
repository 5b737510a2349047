//! Raw string to typed value coercion.

use super::descriptors::{FieldDescriptor, FieldKind, FieldValue};
use crate::error::FieldError;

/// Truthy-token rule shared by every source: `"1"` or any casing of `"true"`.
pub fn parse_bool(raw: &str) -> bool {
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

/// Parse a base-10 integer, independent of locale.
pub fn parse_int(field: &'static str, raw: &str) -> Result<i64, FieldError> {
    raw.trim_ascii()
        .parse::<i64>()
        .map_err(|e| FieldError::malformed(field, raw, e))
}

/// Coerce an optional raw value according to the descriptor's kind.
///
/// Absent input yields `None` for every kind except `Bool`, which resolves
/// to `false`. Defaults are applied by the caller.
pub fn coerce(
    descriptor: &FieldDescriptor,
    raw: Option<&str>,
) -> Result<Option<FieldValue>, FieldError> {
    match descriptor.kind {
        FieldKind::Bool => Ok(Some(FieldValue::Bool(raw.is_some_and(parse_bool)))),
        FieldKind::Int | FieldKind::NullableInt => raw
            .map(|r| parse_int(descriptor.name, r).map(FieldValue::Int))
            .transpose(),
        FieldKind::String => Ok(raw.map(|r| FieldValue::Str(r.to_string()))),
    }
}
