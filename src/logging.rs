//! Logging bootstrap.
//!
//! Maps the configured [`LogSeverity`] onto `tracing` levels and installs a
//! stderr subscriber with UTC or local timestamps. `RUST_LOG`, when set,
//! overrides the configured severity.

use crate::config::{LogSeverity, LoggingSettings};
use anyhow::Result;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc};

/// Convert a configured severity to the tracing level it enables.
pub fn severity_to_tracing(severity: LogSeverity) -> Level {
    match severity {
        LogSeverity::Critical | LogSeverity::Error => Level::ERROR,
        LogSeverity::Warning => Level::WARN,
        LogSeverity::Info => Level::INFO,
        LogSeverity::Verbose => Level::DEBUG,
        LogSeverity::Debug => Level::TRACE,
    }
}

/// Minimum-level filter for a configured severity.
pub fn severity_filter(severity: LogSeverity) -> LevelFilter {
    LevelFilter::from_level(severity_to_tracing(severity))
}

/// Build the event filter: `RUST_LOG` if present, otherwise the configured severity.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(severity_filter(settings.severity).into())
        .from_env_lossy()
}

/// Install the global subscriber.
///
/// Must be called at most once, after settings are resolved.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(std::io::stderr);

    if settings.use_utc {
        let subscriber = builder.with_timer(ChronoUtc::rfc_3339()).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = builder.with_timer(ChronoLocal::rfc_3339()).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
