//! Startup settings loader.
//!
//! Locates the settings file, reads every source exactly once and runs the
//! resolver. The result is shared as `Arc<ResolvedSettings>`.

use super::descriptors::{FieldDescriptor, check_bindings, descriptors};
use super::resolver::{ResolutionTrace, resolve};
use super::sources::{ArgSource, EnvSource, FileSource, SourceSet};
use super::types::ResolvedSettings;
use crate::error::ConfigResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Environment variable naming an explicit settings file.
pub const SETTINGS_FILE_ENV: &str = "SB_SETTINGS_FILE";

/// Settings file looked up in the working directory by default.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// Filesystem locations consulted during loading.
#[derive(Debug, Clone)]
pub struct SettingsPaths {
    pub settings_file: PathBuf,
}

impl Default for SettingsPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl SettingsPaths {
    /// `SB_SETTINGS_FILE` if set, otherwise `./appsettings.json`.
    pub fn discover() -> Self {
        let settings_file = std::env::var_os(SETTINGS_FILE_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
        Self { settings_file }
    }

    pub fn with_file(settings_file: impl Into<PathBuf>) -> Self {
        Self {
            settings_file: settings_file.into(),
        }
    }
}

/// Resolved settings together with how they were obtained.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    paths: SettingsPaths,
    settings: Arc<ResolvedSettings>,
    trace: ResolutionTrace,
    file_used: bool,
    ignored_env: Vec<&'static str>,
}

impl SettingsLoader {
    /// Resolve settings from the live process: arguments, settings file and
    /// environment.
    pub fn load() -> ConfigResult<Self> {
        let paths = SettingsPaths::discover();
        let table = descriptors();
        check_bindings(table)?;

        let args = ArgSource::from_env_args(table)?;
        let file = FileSource::load(table, &paths.settings_file)?;
        let env = EnvSource::from_env(table);

        Self::load_from(table, paths, SourceSet::new(args, file, env))
    }

    /// Resolve settings from explicitly constructed sources.
    pub fn load_with(paths: SettingsPaths, sources: SourceSet) -> ConfigResult<Self> {
        let table = descriptors();
        check_bindings(table)?;
        Self::load_from(table, paths, sources)
    }

    fn load_from(
        table: &[FieldDescriptor],
        paths: SettingsPaths,
        sources: SourceSet,
    ) -> ConfigResult<Self> {
        let file_used = sources.file.path().is_some();
        let ignored_env = sources.env.ignored_keys().to_vec();
        debug!(
            settings_file = %paths.settings_file.display(),
            file_used,
            arguments = sources.args.values().len(),
            environment = sources.env.values().len(),
            "Resolving settings"
        );

        let resolution = resolve(table, &sources)?;
        Ok(Self {
            paths,
            settings: Arc::new(resolution.settings),
            trace: resolution.trace,
            file_used,
            ignored_env,
        })
    }

    /// The shared settings snapshot.
    pub fn settings(&self) -> &Arc<ResolvedSettings> {
        &self.settings
    }

    /// Consume the loader and return the settings.
    pub fn into_settings(self) -> Arc<ResolvedSettings> {
        self.settings
    }

    pub fn trace(&self) -> &ResolutionTrace {
        &self.trace
    }

    /// Path the settings file was looked up at.
    pub fn settings_file(&self) -> &Path {
        &self.paths.settings_file
    }

    /// Whether the settings file existed and contributed to resolution.
    pub fn file_used(&self) -> bool {
        self.file_used
    }

    /// Environment keys that were set but skipped as non-unicode.
    pub fn ignored_env_keys(&self) -> &[&'static str] {
        &self.ignored_env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::descriptors::field;
    use crate::config::sources::SourceTier;
    use tempfile::TempDir;

    #[test]
    fn test_paths_with_file() {
        let paths = SettingsPaths::with_file("/etc/sb-bot/settings.json");
        assert_eq!(paths.settings_file, PathBuf::from("/etc/sb-bot/settings.json"));
    }

    #[test]
    fn test_load_with_file_on_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appsettings.json");
        std::fs::write(
            &path,
            r#"{"botToken": "X", "database": {"username": "bot", "password": "pw", "name": "botdb"}}"#,
        )
        .unwrap();

        let table = descriptors();
        let sources = SourceSet::new(
            ArgSource::default(),
            FileSource::load(table, &path).unwrap(),
            EnvSource::default(),
        );
        let loader = SettingsLoader::load_with(SettingsPaths::with_file(&path), sources).unwrap();

        assert!(loader.file_used());
        assert_eq!(loader.settings_file(), path.as_path());
        assert_eq!(loader.settings().token, "X");
        assert_eq!(loader.trace().tier_of(field::TOKEN), Some(SourceTier::File));
    }

    #[test]
    fn test_load_without_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.json");
        let table = descriptors();
        let sources = SourceSet::new(
            ArgSource::parse(
                table,
                ["sb-bot", "-t", "T", "-du", "bot", "-dn", "botdb"],
            )
            .unwrap(),
            FileSource::load(table, &path).unwrap(),
            EnvSource::from_vars(table, [("SB_DB_PASSWORD", "pw")]),
        );
        let loader = SettingsLoader::load_with(SettingsPaths::with_file(&path), sources).unwrap();

        assert!(!loader.file_used());
        assert!(loader.ignored_env_keys().is_empty());
        let settings = loader.into_settings();
        assert_eq!(settings.token, "T");
        assert_eq!(settings.database.password, "pw");
    }
}
