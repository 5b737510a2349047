//! sb-bot
//!
//! Resolves settings from command-line arguments, the JSON settings file and
//! `SB_*` environment variables, then starts the bot. A resolution failure is
//! reported field by field and the process exits before any connection is
//! attempted.

use anyhow::Result;
use sb_bot::bot::console::ConsoleGateway;
use sb_bot::bot::{Bot, BotOptions, IncomingMessage};
use sb_bot::config::SettingsLoader;
use sb_bot::db::ConnectionDescriptor;
use sb_bot::logging;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Built-in responses.
fn respond(message: &IncomingMessage) -> Option<String> {
    match message.content.trim() {
        "!ping" => Some("pong".to_string()),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logging is configured by the settings, so failures here go to stderr directly.
    let loader = match SettingsLoader::load() {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error: could not resolve settings");
            for diagnostic in e.diagnostics() {
                eprintln!("  {}", diagnostic);
            }
            return ExitCode::FAILURE;
        }
    };

    match run(loader).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(loader: SettingsLoader) -> Result<()> {
    let settings = Arc::clone(loader.settings());
    logging::init(&settings.logging)?;

    if loader.file_used() {
        info!(path = %loader.settings_file().display(), "Loaded settings file");
    }
    for key in loader.ignored_env_keys() {
        warn!(key, "Ignored environment variable with non-unicode value");
    }
    loader.trace().log();

    let database = ConnectionDescriptor::from_settings(&settings.database);
    if database.is_plaintext() {
        warn!("Database connection does not use SSL");
    }
    info!(connection = %database.redacted(), "Database connection configured");

    let bot = Bot::new(BotOptions::from_settings(&settings), respond);
    let gateway = ConsoleGateway::new();
    bot.run_until(&gateway, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await
}
