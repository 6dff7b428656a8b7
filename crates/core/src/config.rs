use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::memory::DEFAULT_SESSION_TTL_SECS;

pub const DEFAULT_TRIGGER_PHRASE: &str = "カンタン見積り";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub pricing: PricingConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// `table_path` replaces the built-in 2025 price table when set.
#[derive(Clone, Debug, Default)]
pub struct PricingConfig {
    pub table_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ConversationConfig {
    pub trigger_phrase: String,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
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
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub table_path: Option<PathBuf>,
    pub trigger_phrase: Option<String>,
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
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            pricing: PricingConfig::default(),
            conversation: ConversationConfig {
                trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
                session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
                sweep_interval_secs: 60,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
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

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
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
                options.config_path.unwrap_or_else(|| PathBuf::from("printquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
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

        if let Some(pricing) = patch.pricing {
            if let Some(table_path) = pricing.table_path {
                self.pricing.table_path = Some(table_path);
            }
        }

        if let Some(conversation) = patch.conversation {
            if let Some(trigger_phrase) = conversation.trigger_phrase {
                self.conversation.trigger_phrase = trigger_phrase;
            }
            if let Some(session_ttl_secs) = conversation.session_ttl_secs {
                self.conversation.session_ttl_secs = session_ttl_secs;
            }
            if let Some(sweep_interval_secs) = conversation.sweep_interval_secs {
                self.conversation.sweep_interval_secs = sweep_interval_secs;
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
        if let Some(value) = read_env("PRINTQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PRINTQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("PRINTQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PRINTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PRINTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("PRINTQUOTE_PRICING_TABLE_PATH") {
            self.pricing.table_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("PRINTQUOTE_CONVERSATION_TRIGGER_PHRASE") {
            self.conversation.trigger_phrase = value;
        }
        if let Some(value) = read_env("PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS") {
            self.conversation.session_ttl_secs =
                parse_u64("PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("PRINTQUOTE_CONVERSATION_SWEEP_INTERVAL_SECS") {
            self.conversation.sweep_interval_secs =
                parse_u64("PRINTQUOTE_CONVERSATION_SWEEP_INTERVAL_SECS", &value)?;
        }

        let log_level =
            read_env("PRINTQUOTE_LOGGING_LEVEL").or_else(|| read_env("PRINTQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PRINTQUOTE_LOGGING_FORMAT").or_else(|| read_env("PRINTQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(table_path) = overrides.table_path {
            self.pricing.table_path = Some(table_path);
        }
        if let Some(trigger_phrase) = overrides.trigger_phrase {
            self.conversation.trigger_phrase = trigger_phrase;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_pricing(&self.pricing)?;
        validate_conversation(&self.conversation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("printquote.toml"), PathBuf::from("config/printquote.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

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

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if let Some(path) = &pricing.table_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "pricing.table_path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_conversation(conversation: &ConversationConfig) -> Result<(), ConfigError> {
    if conversation.trigger_phrase.trim().is_empty() {
        return Err(ConfigError::Validation(
            "conversation.trigger_phrase must not be empty".to_string(),
        ));
    }

    if conversation.session_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "conversation.session_ttl_secs must be greater than zero".to_string(),
        ));
    }

    if conversation.sweep_interval_secs == 0
        || conversation.sweep_interval_secs > conversation.session_ttl_secs
    {
        return Err(ConfigError::Validation(
            "conversation.sweep_interval_secs must be in range 1..=session_ttl_secs".to_string(),
        ));
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

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    pricing: Option<PricingPatch>,
    conversation: Option<ConversationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    table_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    trigger_phrase: Option<String>,
    session_ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
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

    #[test]
    fn defaults_use_builtin_table_and_thirty_minute_sessions() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.table_path.is_none(), "default table should be the builtin one")?;
        ensure(config.conversation.trigger_phrase == "カンタン見積り", "default trigger phrase")?;
        ensure(config.conversation.session_ttl_secs == 1800, "default session ttl is 30 minutes")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PRINTQUOTE_TABLE", "/srv/tables/2026.toml");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("printquote.toml");
            fs::write(
                &path,
                r#"
[pricing]
table_path = "${TEST_PRINTQUOTE_TABLE}"

[conversation]
session_ttl_secs = 600
sweep_interval_secs = 30
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.pricing.table_path == Some(PathBuf::from("/srv/tables/2026.toml")),
                "table path should be interpolated from environment",
            )?;
            ensure(config.conversation.session_ttl_secs == 600, "ttl should come from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_PRINTQUOTE_TABLE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTQUOTE_LOG_LEVEL", "warn");
        env::set_var("PRINTQUOTE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PRINTQUOTE_LOG_LEVEL", "PRINTQUOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTQUOTE_SERVER_PORT", "9100");
        env::set_var("PRINTQUOTE_CONVERSATION_TRIGGER_PHRASE", "見積もり");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("printquote.toml");
            fs::write(
                &path,
                r#"
[server]
port = 9000
bind_address = "0.0.0.0"

[conversation]
trigger_phrase = "ファイルの見積り"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    port: Some(9200),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 9200, "override port should win")?;
            ensure(config.server.bind_address == "0.0.0.0", "file bind address should apply")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.conversation.trigger_phrase == "見積もり",
                "env trigger phrase should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["PRINTQUOTE_SERVER_PORT", "PRINTQUOTE_CONVERSATION_TRIGGER_PHRASE"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS", "half-an-hour");

        let result = (|| -> Result<(), String> {
            match AppConfig::load(LoadOptions::default()) {
                Ok(_) => Err("expected env override failure".to_string()),
                Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                    key == "PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS",
                    "error should name the offending variable",
                ),
                Err(other) => Err(format!("unexpected error: {other}")),
            }
        })();

        clear_vars(&["PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS", "60");
        env::set_var("PRINTQUOTE_CONVERSATION_SWEEP_INTERVAL_SECS", "120");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("sweep_interval_secs")
            );
            ensure(has_message, "validation failure should mention sweep_interval_secs")
        })();

        clear_vars(&[
            "PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS",
            "PRINTQUOTE_CONVERSATION_SWEEP_INTERVAL_SECS",
        ]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported with its path",
        )
    }
}
