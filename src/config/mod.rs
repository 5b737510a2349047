//! Settings resolution engine.
//!
//! Every configurable parameter is declared in a static descriptor table and
//! read from three sources, merged field by field:
//! 1. **Arguments** - `-t/--bot-token` style flags (highest priority)
//! 2. **File** - JSON settings file (`SB_SETTINGS_FILE`, default `./appsettings.json`)
//! 3. **Environment** - `SB_*` variables
//! 4. **Defaults** - declared in the descriptor table (lowest priority)
//!
//! The merged values are validated as a whole and every violation is
//! reported together. The result is an immutable [`ResolvedSettings`].

mod coerce;
pub mod descriptors;
mod loader;
mod merge;
mod resolver;
pub mod sources;
mod types;

pub use coerce::parse_bool;
pub use descriptors::{
    FieldDefault, FieldDescriptor, FieldKind, FieldValue, check_bindings, descriptors, field,
};
pub use loader::{DEFAULT_SETTINGS_FILE, SETTINGS_FILE_ENV, SettingsLoader, SettingsPaths};
pub use resolver::{Resolution, ResolutionTrace, TraceEntry, resolve};
pub use sources::{ArgSource, EnvSource, FileSource, RawSource, SourceSet, SourceTier};
pub use types::*;
