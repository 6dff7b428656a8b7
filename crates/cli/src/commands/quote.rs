use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use printquote_core::audit::InMemoryAuditSink;
use printquote_core::domain::catalog::format_yen;
use printquote_core::domain::quote::QuoteRecord;
use printquote_core::errors::{ApplicationError, DomainError};
use printquote_core::intake::WebOrderForm;
use printquote_core::pricing::{PricingError, QuoteEngine};
use printquote_core::service::QuoteService;
use printquote_core::sink::InMemoryQuoteSink;

use crate::commands::{load_catalog, CommandResult, EXIT_INVALID_INPUT, EXIT_NO_TIER};

const COMMAND: &str = "quote";
const CORRELATION_ID: &str = "cli-quote";

pub fn run(form_path: &Path, json_output: bool) -> CommandResult {
    let raw = match read_form(form_path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "form_read",
                format!("{error:#}"),
                EXIT_INVALID_INPUT,
            );
        }
    };
    let form = match WebOrderForm::from_json(&raw) {
        Ok(form) => form,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "form_invalid",
                error.to_string(),
                EXIT_INVALID_INPUT,
            );
        }
    };

    let catalog = match load_catalog(COMMAND) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };
    let service = QuoteService::new(
        QuoteEngine::new(Arc::new(catalog)),
        Arc::new(InMemoryQuoteSink::default()),
        Arc::new(InMemoryAuditSink::default()),
    );

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    match runtime.block_on(service.issue_web_order(form, CORRELATION_ID)) {
        Ok(record) if json_output => match serde_json::to_string_pretty(&record) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
        },
        Ok(record) => CommandResult::success(COMMAND, render_human(&record)),
        Err(error) => failure_for(error),
    }
}

fn read_form(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("could not read web-order form `{}`", path.display()))
}

fn failure_for(error: ApplicationError) -> CommandResult {
    match error {
        ApplicationError::Domain(DomainError::Pricing(
            error @ PricingError::TierNotFound { .. },
        )) => CommandResult::failure(COMMAND, "tier_not_found", error.to_string(), EXIT_NO_TIER),
        ApplicationError::Domain(DomainError::Intake(error)) => {
            CommandResult::failure(COMMAND, "form_invalid", error.to_string(), EXIT_INVALID_INPUT)
        }
        other => CommandResult::failure(COMMAND, "quote_failed", other.to_string(), 1),
    }
}

fn render_human(record: &QuoteRecord) -> String {
    let mut lines = vec![
        format!(
            "quote {} for {} x {} ({})",
            record.quote_id,
            record.item,
            record.quantity,
            record.discount_class.display_label()
        ),
        format!("- unit price: ¥{}", format_yen(record.unit_price)),
        format!("- total price: ¥{}", format_yen(record.total_price)),
    ];
    for step in &record.trace {
        lines.push(format!("  - {}: {} (¥{})", step.stage, step.detail, format_yen(step.amount)));
    }
    lines.join("\n")
}
