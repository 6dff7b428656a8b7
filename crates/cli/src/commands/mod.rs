pub mod config;
pub mod doctor;
pub mod quote;
pub mod tiers;

use printquote_core::config::{AppConfig, LoadOptions};
use printquote_core::pricing::PricingCatalog;
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_PRICE_TABLE: u8 = 3;
pub const EXIT_INVALID_INPUT: u8 = 4;
pub const EXIT_NO_TIER: u8 = 5;

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
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

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
}

/// Loads the price table named by the effective config.
fn load_catalog(command: &str) -> Result<PricingCatalog, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    let catalog = PricingCatalog::load(config.pricing.table_path.as_deref()).map_err(|error| {
        CommandResult::failure(command, "price_table", error.to_string(), EXIT_PRICE_TABLE)
    })?;
    Ok(catalog)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
