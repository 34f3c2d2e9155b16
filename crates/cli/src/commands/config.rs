use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use homefinder_core::config::{AppConfig, DEFAULT_CONFIG_FILE};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::ContextOptions;

struct Sources<'a> {
    doc: Option<Value>,
    path: Option<PathBuf>,
    options: &'a ContextOptions,
}

impl Sources<'_> {
    fn line(&self, key: &str, env_keys: &[&str], value: &str) -> String {
        format!("- {key} = {value} (source: {})", self.source(key, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if key_path == "data.listings_path" && self.options.listings_path.is_some() {
            return "cli (--data)".to_string();
        }

        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

pub fn run(options: &ContextOptions) -> String {
    let config = match AppConfig::load(options.load_options()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let path = detect_config_path(options.config_path.as_deref());
    let sources = Sources { doc: load_config_file_doc(path.as_deref()), path, options };
    let weights = &config.search.weights;
    let contact = &config.contact;

    let lines = vec![
        "effective config (source precedence: cli > env > file > default):".to_string(),
        sources.line(
            "data.listings_path",
            &["HOMEFINDER_DATA_LISTINGS_PATH"],
            &config.data.listings_path.display().to_string(),
        ),
        sources.line(
            "search.default_top_n",
            &["HOMEFINDER_SEARCH_DEFAULT_TOP_N"],
            &config.search.default_top_n.to_string(),
        ),
        sources.line(
            "search.weights",
            &[],
            &format!(
                "affordability={} low_income={} section8={} hud={} transit={} utilities={}",
                weights.affordability,
                weights.low_income_eligible,
                weights.section8_accepted,
                weights.hud_approved,
                weights.nearby_transit,
                weights.utilities_included
            ),
        ),
        sources.line(
            "server.bind_address",
            &["HOMEFINDER_SERVER_BIND_ADDRESS"],
            &config.server.bind_address,
        ),
        sources.line("server.port", &["HOMEFINDER_SERVER_PORT"], &config.server.port.to_string()),
        sources.line(
            "server.graceful_shutdown_secs",
            &["HOMEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            &config.server.graceful_shutdown_secs.to_string(),
        ),
        sources.line(
            "contact.timeout_secs",
            &["HOMEFINDER_CONTACT_TIMEOUT_SECS"],
            &contact.timeout_secs.to_string(),
        ),
        sources.line(
            "contact.twilio_account_sid",
            &["HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID"],
            contact.twilio_account_sid.as_deref().unwrap_or("<unset>"),
        ),
        sources.line(
            "contact.twilio_auth_token",
            &["HOMEFINDER_CONTACT_TWILIO_AUTH_TOKEN"],
            &redact_secret(contact.twilio_auth_token.as_ref()),
        ),
        sources.line(
            "contact.twilio_from_number",
            &["HOMEFINDER_CONTACT_TWILIO_FROM_NUMBER"],
            contact.twilio_from_number.as_deref().unwrap_or("<unset>"),
        ),
        sources.line(
            "contact.email_api_key",
            &["HOMEFINDER_CONTACT_EMAIL_API_KEY"],
            &redact_secret(contact.email_api_key.as_ref()),
        ),
        sources.line(
            "contact.email_sender",
            &["HOMEFINDER_CONTACT_EMAIL_SENDER"],
            contact.email_sender.as_deref().unwrap_or("<unset>"),
        ),
        sources.line(
            "contact.email_sender_name",
            &["HOMEFINDER_CONTACT_EMAIL_SENDER_NAME"],
            &contact.email_sender_name,
        ),
        sources.line(
            "logging.level",
            &["HOMEFINDER_LOGGING_LEVEL", "HOMEFINDER_LOG_LEVEL"],
            &config.logging.level,
        ),
        sources.line(
            "logging.format",
            &["HOMEFINDER_LOGGING_FORMAT", "HOMEFINDER_LOG_FORMAT"],
            &format!("{:?}", config.logging.format),
        ),
    ];

    lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps the last four characters so operators can tell keys apart.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let exposed = secret.expose_secret().trim();
    let chars: Vec<char> = exposed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
