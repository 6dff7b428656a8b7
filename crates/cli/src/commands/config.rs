use std::env;
use std::fs;
use std::path::Path;

use printquote_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let table_path = config
        .pricing
        .table_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());

    let fields: [(&str, &[&str], String); 9] = [
        (
            "server.bind_address",
            &["PRINTQUOTE_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        ("server.port", &["PRINTQUOTE_SERVER_PORT"], config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["PRINTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        ("pricing.table_path", &["PRINTQUOTE_PRICING_TABLE_PATH"], table_path),
        (
            "conversation.trigger_phrase",
            &["PRINTQUOTE_CONVERSATION_TRIGGER_PHRASE"],
            config.conversation.trigger_phrase.clone(),
        ),
        (
            "conversation.session_ttl_secs",
            &["PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS"],
            config.conversation.session_ttl_secs.to_string(),
        ),
        (
            "conversation.sweep_interval_secs",
            &["PRINTQUOTE_CONVERSATION_SWEEP_INTERVAL_SECS"],
            config.conversation.sweep_interval_secs.to_string(),
        ),
        (
            "logging.level",
            &["PRINTQUOTE_LOGGING_LEVEL", "PRINTQUOTE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["PRINTQUOTE_LOGGING_FORMAT", "PRINTQUOTE_LOG_FORMAT"],
            config.logging.format.as_str().to_string(),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in &fields {
        let source = field_source(
            key_path,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
