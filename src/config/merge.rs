//! Per-field precedence merging of raw values.
//!
//! Sources are consulted highest tier first; the first one that supplies a
//! value wins. Lower tiers are never coerced once a higher tier has answered.

use super::descriptors::FieldDescriptor;
use super::sources::{RawSource, SourceTier};

/// Pick the raw value for one field, `args ?? file ?? env`.
///
/// `layers` must be ordered highest precedence first. Returns `None` when no
/// source supplies the field, leaving default substitution to the caller.
pub fn pick<'a>(
    descriptor: &FieldDescriptor,
    layers: &[&'a dyn RawSource],
) -> Option<(SourceTier, &'a str)> {
    layers
        .iter()
        .copied()
        .find_map(|source| source.raw(descriptor).map(|raw| (source.tier(), raw)))
}
