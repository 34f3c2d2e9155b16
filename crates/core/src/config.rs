use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::{ScoringWeights, DEFAULT_TOP_N};

pub const DEFAULT_CONFIG_FILE: &str = "homefinder.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data: DataConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub contact: ContactConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DataConfig {
    pub listings_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub default_top_n: usize,
    pub weights: ScoringWeights,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Outbound contact channels. A channel with no credentials is disabled.
#[derive(Clone, Debug)]
pub struct ContactConfig {
    pub timeout_secs: u64,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<SecretString>,
    pub twilio_from_number: Option<String>,
    pub email_api_key: Option<SecretString>,
    pub email_sender: Option<String>,
    pub email_sender_name: String,
}

impl ContactConfig {
    pub fn twilio_enabled(&self) -> bool {
        self.twilio_account_sid.is_some()
            && self.twilio_auth_token.is_some()
            && self.twilio_from_number.is_some()
    }

    pub fn email_enabled(&self) -> bool {
        self.email_api_key.is_some() && self.email_sender.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub listings_path: Option<PathBuf>,
    pub default_top_n: Option<usize>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig { listings_path: PathBuf::from("data/listings.json") },
            search: SearchConfig {
                default_top_n: DEFAULT_TOP_N,
                weights: ScoringWeights::DEFAULT,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            contact: ContactConfig {
                timeout_secs: 15,
                twilio_account_sid: None,
                twilio_auth_token: None,
                twilio_from_number: None,
                email_api_key: None,
                email_sender: None,
                email_sender_name: "Homefinder".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(data) = patch.data {
            if let Some(listings_path) = data.listings_path {
                self.data.listings_path = listings_path;
            }
        }

        if let Some(search) = patch.search {
            if let Some(default_top_n) = search.default_top_n {
                self.search.default_top_n = default_top_n;
            }
            if let Some(weights) = search.weights {
                self.search.weights = weights;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(contact) = patch.contact {
            if let Some(timeout_secs) = contact.timeout_secs {
                self.contact.timeout_secs = timeout_secs;
            }
            if let Some(account_sid) = contact.twilio_account_sid {
                self.contact.twilio_account_sid = Some(account_sid);
            }
            if let Some(auth_token) = contact.twilio_auth_token {
                self.contact.twilio_auth_token = Some(secret_value(auth_token));
            }
            if let Some(from_number) = contact.twilio_from_number {
                self.contact.twilio_from_number = Some(from_number);
            }
            if let Some(api_key) = contact.email_api_key {
                self.contact.email_api_key = Some(secret_value(api_key));
            }
            if let Some(sender) = contact.email_sender {
                self.contact.email_sender = Some(sender);
            }
            if let Some(sender_name) = contact.email_sender_name {
                self.contact.email_sender_name = sender_name;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HOMEFINDER_DATA_LISTINGS_PATH") {
            self.data.listings_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("HOMEFINDER_SEARCH_DEFAULT_TOP_N") {
            self.search.default_top_n = parse_usize("HOMEFINDER_SEARCH_DEFAULT_TOP_N", &value)?;
        }

        if let Some(value) = read_env("HOMEFINDER_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HOMEFINDER_SERVER_PORT") {
            self.server.port = parse_u16("HOMEFINDER_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HOMEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("HOMEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("HOMEFINDER_CONTACT_TIMEOUT_SECS") {
            self.contact.timeout_secs = parse_u64("HOMEFINDER_CONTACT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID") {
            self.contact.twilio_account_sid = Some(value);
        }
        if let Some(value) = read_env("HOMEFINDER_CONTACT_TWILIO_AUTH_TOKEN") {
            self.contact.twilio_auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("HOMEFINDER_CONTACT_TWILIO_FROM_NUMBER") {
            self.contact.twilio_from_number = Some(value);
        }
        if let Some(value) = read_env("HOMEFINDER_CONTACT_EMAIL_API_KEY") {
            self.contact.email_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("HOMEFINDER_CONTACT_EMAIL_SENDER") {
            self.contact.email_sender = Some(value);
        }
        if let Some(value) = read_env("HOMEFINDER_CONTACT_EMAIL_SENDER_NAME") {
            self.contact.email_sender_name = value;
        }

        let log_level =
            read_env("HOMEFINDER_LOGGING_LEVEL").or_else(|| read_env("HOMEFINDER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HOMEFINDER_LOGGING_FORMAT").or_else(|| read_env("HOMEFINDER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(listings_path) = overrides.listings_path {
            self.data.listings_path = listings_path;
        }
        if let Some(default_top_n) = overrides.default_top_n {
            self.search.default_top_n = default_top_n;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_data(&self.data)?;
        validate_search(&self.search)?;
        validate_server(&self.server)?;
        validate_contact(&self.contact)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if data.listings_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("data.listings_path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.default_top_n == 0 || search.default_top_n > 100 {
        return Err(ConfigError::Validation(
            "search.default_top_n must be in range 1..=100".to_string(),
        ));
    }

    search
        .weights
        .validate()
        .map_err(|error| ConfigError::Validation(format!("search.weights: {error}")))
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_contact(contact: &ContactConfig) -> Result<(), ConfigError> {
    if contact.timeout_secs == 0 || contact.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "contact.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    let twilio_parts = [
        contact.twilio_account_sid.as_ref().map(|value| value.trim().is_empty()),
        contact.twilio_auth_token.as_ref().map(|value| value.expose_secret().trim().is_empty()),
        contact.twilio_from_number.as_ref().map(|value| value.trim().is_empty()),
    ];
    if twilio_parts.iter().any(|part| *part == Some(true)) {
        return Err(ConfigError::Validation(
            "contact.twilio_* values must not be blank".to_string(),
        ));
    }
    let configured = twilio_parts.iter().filter(|part| part.is_some()).count();
    if configured != 0 && configured != twilio_parts.len() {
        return Err(ConfigError::Validation(
            "contact.twilio_account_sid, contact.twilio_auth_token and \
             contact.twilio_from_number must be set together"
                .to_string(),
        ));
    }

    if contact.email_api_key.is_some() && contact.email_sender.is_none() {
        return Err(ConfigError::Validation(
            "contact.email_sender is required when contact.email_api_key is set".to_string(),
        ));
    }
    if let Some(sender) = &contact.email_sender {
        if !sender.contains('@') {
            return Err(ConfigError::Validation(
                "contact.email_sender must be an email address".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    data: Option<DataPatch>,
    search: Option<SearchPatch>,
    server: Option<ServerPatch>,
    contact: Option<ContactPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    listings_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    default_top_n: Option<usize>,
    weights: Option<ScoringWeights>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ContactPatch {
    timeout_secs: Option<u64>,
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
    twilio_from_number: Option<String>,
    email_api_key: Option<String>,
    email_sender: Option<String>,
    email_sender_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<PathBuf, String> {
        let path = dir.path().join("homefinder.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_are_valid_without_a_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.search.default_top_n == 5, "default top_n should be 5")?;
        ensure(config.server.port == 8080, "default port should be 8080")?;
        ensure(!config.contact.twilio_enabled(), "twilio should start disabled")?;
        ensure(!config.contact.email_enabled(), "email should start disabled")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_HOMEFINDER_EMAIL_KEY", "xkeysib-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[contact]
email_api_key = "${TEST_HOMEFINDER_EMAIL_KEY}"
email_sender = "listings@example.org"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let key = config.contact.email_api_key.as_ref().map(|key| key.expose_secret());
            ensure(key == Some("xkeysib-from-env"), "email key should come from the environment")?;
            ensure(config.contact.email_enabled(), "email channel should be enabled")
        })();

        clear_vars(&["TEST_HOMEFINDER_EMAIL_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(&dir, "[data]\nlistings_path = \"${HOMEFINDER_TEST_UNSET}\"\n")?;

        let error =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(error, Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "HOMEFINDER_TEST_UNSET"),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HOMEFINDER_SERVER_PORT", "9090");
        env::set_var("HOMEFINDER_SEARCH_DEFAULT_TOP_N", "8");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[data]
listings_path = "from-file.json"

[search]
default_top_n = 3

[server]
port = 7070

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    default_top_n: Some(10),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.data.listings_path == PathBuf::from("from-file.json"),
                "file should override the default listings path",
            )?;
            ensure(config.server.port == 9090, "env port should win over the file")?;
            ensure(config.search.default_top_n == 10, "override top_n should win over env")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["HOMEFINDER_SERVER_PORT", "HOMEFINDER_SEARCH_DEFAULT_TOP_N"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HOMEFINDER_LOG_LEVEL", "warn");
        env::set_var("HOMEFINDER_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["HOMEFINDER_LOG_LEVEL", "HOMEFINDER_LOG_FORMAT"]);
        result
    }

    #[test]
    fn invalid_env_number_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HOMEFINDER_CONTACT_TIMEOUT_SECS", "soon");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["HOMEFINDER_CONTACT_TIMEOUT_SECS"]);

        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "HOMEFINDER_CONTACT_TIMEOUT_SECS"),
            "invalid number should name the env key",
        )
    }

    #[test]
    fn weights_table_must_sum_to_one() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[search.weights]
affordability = 0.9
low_income_eligible = 0.15
section8_accepted = 0.10
hud_approved = 0.10
nearby_transit = 0.10
utilities_included = 0.05
accessibility_features = 0.05
"#,
        )?;

        let error =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(
                error,
                Err(ConfigError::Validation(ref message))
                    if message == "search.weights: weights must sum to 1.0 (got 1.4500)"
            ),
            "weights validation should name the table and the sum",
        )
    }

    #[test]
    fn partial_twilio_configuration_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID", "AC123");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("set together")
            );
            ensure(has_message, "validation failure should explain the twilio trio")
        })();

        clear_vars(&["HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID"]);
        result
    }

    #[test]
    fn top_n_out_of_range_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { default_top_n: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        });
        ensure(
            matches!(error, Err(ConfigError::Validation(ref message)) if message.contains("default_top_n")),
            "zero top_n should be rejected",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(error, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID", "AC-visible");
        env::set_var("HOMEFINDER_CONTACT_TWILIO_AUTH_TOKEN", "twilio-secret-value");
        env::set_var("HOMEFINDER_CONTACT_TWILIO_FROM_NUMBER", "+15550100");
        env::set_var("HOMEFINDER_CONTACT_EMAIL_API_KEY", "brevo-secret-value");
        env::set_var("HOMEFINDER_CONTACT_EMAIL_SENDER", "homes@example.org");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("twilio-secret-value"), "debug should hide the twilio token")?;
            ensure(!debug.contains("brevo-secret-value"), "debug should hide the email key")?;
            ensure(config.contact.twilio_enabled(), "complete twilio trio should enable calls")
        })();

        clear_vars(&[
            "HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID",
            "HOMEFINDER_CONTACT_TWILIO_AUTH_TOKEN",
            "HOMEFINDER_CONTACT_TWILIO_FROM_NUMBER",
            "HOMEFINDER_CONTACT_EMAIL_API_KEY",
            "HOMEFINDER_CONTACT_EMAIL_SENDER",
        ]);
        result
    }
}
