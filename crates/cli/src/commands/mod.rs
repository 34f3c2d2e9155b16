pub mod chat;
pub mod config;
pub mod doctor;
pub mod meta;
pub mod parse;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;

use homefinder_agent::ConversationController;
use homefinder_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use homefinder_core::search::SearchEngine;
use homefinder_core::store::ListingStore;
use serde::Serialize;

pub use search::SearchArgs;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATASET: u8 = 3;

/// Paths given on the command line. They win over file and env values.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub config_path: Option<PathBuf>,
    pub listings_path: Option<PathBuf>,
}

impl ContextOptions {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config_path.clone(),
            require_file: self.config_path.is_some(),
            overrides: ConfigOverrides {
                listings_path: self.listings_path.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn output(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn to_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult::output(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

/// Loads config and the listing dataset, then wires the controller.
pub fn load_controller(
    command: &str,
    options: &ContextOptions,
) -> Result<(AppConfig, ConversationController), CommandResult> {
    let config = AppConfig::load(options.load_options()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    let store = ListingStore::from_json_path(&config.data.listings_path).map_err(|error| {
        CommandResult::failure(command, "dataset_load", error.to_string(), EXIT_DATASET)
    })?;

    let engine = SearchEngine::new(Arc::new(store))
        .with_weights(config.search.weights)
        .with_default_top_n(config.search.default_top_n);
    Ok((config, ConversationController::new(engine)))
}

/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_logging(options: &ContextOptions, verbose: bool) {
    use homefinder_core::config::LogFormat::*;
    use tracing::Level;

    let Ok(config) = AppConfig::load(options.load_options()) else {
        tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(Level::WARN).init();
        return;
    };
    let log_level = if verbose {
        config.logging.level.parse::<Level>().unwrap_or(Level::INFO)
    } else {
        Level::WARN
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);
    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
