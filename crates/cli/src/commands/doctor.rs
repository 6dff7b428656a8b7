use printquote_core::config::{AppConfig, LoadOptions};
use printquote_core::domain::catalog::SelectionKind;
use printquote_core::pricing::{CatalogError, PricingCatalog};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match PricingCatalog::load(config.pricing.table_path.as_deref()) {
                Ok(catalog) => {
                    checks.push(DoctorCheck {
                        name: "price_table",
                        status: CheckStatus::Pass,
                        details: format!(
                            "loaded `{}` with {} tiers across {} items",
                            catalog.origin(),
                            catalog.tiers().len(),
                            catalog.items().len()
                        ),
                    });
                    checks.push(check_chat_options(&catalog));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "price_table",
                        status: CheckStatus::Fail,
                        details: describe_catalog_error(&error),
                    });
                    checks.push(skipped("chat_options", "price table did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("price_table", "configuration did not load"));
            checks.push(skipped("chat_options", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_chat_options(catalog: &PricingCatalog) -> DoctorCheck {
    let buckets = catalog.quantity_buckets().len();
    let single = catalog.selections(SelectionKind::Single).len();
    let dual = catalog.selections(SelectionKind::Dual).len();

    if buckets == 0 {
        return DoctorCheck {
            name: "chat_options",
            status: CheckStatus::Fail,
            details: "price table defines no quantity answers for the chat flow".to_string(),
        };
    }

    DoctorCheck {
        name: "chat_options",
        status: CheckStatus::Pass,
        details: format!(
            "{buckets} quantity answers; color answers: {single} single-position, {dual} front-and-back"
        ),
    }
}

fn describe_catalog_error(error: &CatalogError) -> String {
    match error {
        CatalogError::Validation(issues) => format!("price table is inconsistent: {issues}"),
        other => other.to_string(),
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
