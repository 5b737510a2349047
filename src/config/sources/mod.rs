//! Raw value sources.
//!
//! Each source scans its input once at construction and keeps the resulting
//! map of raw strings, keyed by descriptor name, for the lifetime of the
//! process.

mod args;
mod env;
mod file;

pub use args::ArgSource;
pub use env::EnvSource;
pub use file::FileSource;

use super::descriptors::FieldDescriptor;
use std::collections::BTreeMap;

/// Raw strings keyed by descriptor name.
pub type RawValues = BTreeMap<&'static str, String>;

/// Where a resolved value came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceTier {
    /// Declared default (lowest priority)
    Default = 0,
    /// Process environment
    Environment = 1,
    /// JSON settings file
    File = 2,
    /// Command-line arguments (highest priority)
    Arguments = 3,
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTier::Default => write!(f, "default"),
            SourceTier::Environment => write!(f, "environment"),
            SourceTier::File => write!(f, "file"),
            SourceTier::Arguments => write!(f, "arguments"),
        }
    }
}

/// A source of raw, uncoerced setting values.
pub trait RawSource {
    fn tier(&self) -> SourceTier;

    /// Raw value this source supplies for the field, if any.
    fn raw(&self, descriptor: &FieldDescriptor) -> Option<&str>;
}

/// The three sources read at startup.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub args: ArgSource,
    pub file: FileSource,
    pub env: EnvSource,
}

impl SourceSet {
    pub fn new(args: ArgSource, file: FileSource, env: EnvSource) -> Self {
        Self { args, file, env }
    }

    /// Sources in precedence order, highest first.
    pub fn layers(&self) -> [&dyn RawSource; 3] {
        [&self.args, &self.file, &self.env]
    }
}
