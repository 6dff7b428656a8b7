use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use printquote_cli::commands::{doctor, quote, tiers};
use serde_json::Value;
use tempfile::TempDir;

const SINGLE_POSITION_FORM: &str = r#"{
    "productName": "ドライTシャツ",
    "sizeM": 10,
    "sizeL": "12",
    "discountOption": "早割",
    "positions": [{"position": "前", "colors": ["白"]}]
}"#;

#[test]
fn tiers_lists_the_builtin_table() {
    with_env(&[], || {
        let result = tiers::run(None);
        assert_eq!(result.exit_code, 0, "expected builtin table listing");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "tiers");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("price table `builtin:price_table_2025`: 120 tiers"));
    });
}

#[test]
fn tiers_can_be_filtered_by_item() {
    with_env(&[], || {
        let result = tiers::run(Some("ドライTシャツ"));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains(": 10 tiers"));
        assert!(message.contains("- ドライTシャツ [早割] 20..=29: ¥1,240"));
        assert!(!message.contains("ゲームシャツ"));
    });
}

#[test]
fn tiers_rejects_unknown_item() {
    with_env(&[], || {
        let result = tiers::run(Some("ジャージ"));
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "unknown_item");
    });
}

#[test]
fn tiers_reports_missing_price_table() {
    with_env(&[("PRINTQUOTE_PRICING_TABLE_PATH", "/nonexistent/price_table.toml")], || {
        let result = tiers::run(None);
        assert_eq!(result.exit_code, 3, "expected price table failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "price_table");
    });
}

#[test]
fn tiers_reports_config_failure() {
    with_env(&[("PRINTQUOTE_SERVER_PORT", "not-a-port")], || {
        let result = tiers::run(None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "tiers");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn quote_prices_a_web_order_form() {
    let dir = TempDir::new().expect("temp dir");
    let form = write_form(&dir, SINGLE_POSITION_FORM);

    with_env(&[], || {
        let result = quote::run(&form, false);
        assert_eq!(result.exit_code, 0, "expected quote to be issued");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("for ドライTシャツ x 22 (早割)"));
        assert!(message.contains("- unit price: ¥1,240"));
        assert!(message.contains("- total price: ¥27,280"));
    });
}

#[test]
fn quote_json_emits_the_full_record() {
    let dir = TempDir::new().expect("temp dir");
    let form = write_form(&dir, SINGLE_POSITION_FORM);

    with_env(&[], || {
        let result = quote::run(&form, true);
        assert_eq!(result.exit_code, 0);

        let record = parse_payload(&result.output);
        assert_eq!(record["item"], "ドライTシャツ");
        assert_eq!(record["quantity"], 22);
        assert_eq!(record["discount_class"], "early");
        assert_eq!(record["unit_price"], 1240);
        assert_eq!(record["intake"]["source"], "web_order");
        assert!(record["quote_id"].as_str().unwrap_or_default().starts_with('Q'));
    });
}

#[test]
fn quote_outside_every_tier_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let form = write_form(
        &dir,
        r#"{"productName": "ドライTシャツ", "sizeM": 5,
            "positions": [{"position": "前", "colors": ["白"]}]}"#,
    );

    with_env(&[], || {
        let result = quote::run(&form, false);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "tier_not_found");
    });
}

#[test]
fn quote_without_positions_is_invalid() {
    let dir = TempDir::new().expect("temp dir");
    let form = write_form(&dir, r#"{"productName": "ドライTシャツ", "sizeM": 25}"#);

    with_env(&[], || {
        let result = quote::run(&form, false);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "form_invalid");
    });
}

#[test]
fn quote_reports_unreadable_form() {
    with_env(&[], || {
        let result = quote::run(&PathBuf::from("/nonexistent/order.json"), false);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "form_read");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("could not read web-order form"));
    });
}

#[test]
fn doctor_passes_with_builtin_table() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][1]["name"], "price_table");
        assert_eq!(report["checks"][2]["status"], "pass");
    });
}

#[test]
fn doctor_flags_inconsistent_price_table() {
    let dir = TempDir::new().expect("temp dir");
    let table = dir.path().join("broken.toml");
    fs::write(&table, "[name_number_fees]\nset_fee = 800\n").expect("write table");
    let table = table.display().to_string();

    with_env(&[("PRINTQUOTE_PRICING_TABLE_PATH", table.as_str())], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][1]["status"], "fail");
        assert_eq!(report["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_human_output_marks_skipped_checks() {
    with_env(&[("PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS", "0")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] price_table:"));
    });
}

fn write_form(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("order.json");
    fs::write(&path, body).expect("write form");
    path
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PRINTQUOTE_SERVER_BIND_ADDRESS",
        "PRINTQUOTE_SERVER_PORT",
        "PRINTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PRINTQUOTE_PRICING_TABLE_PATH",
        "PRINTQUOTE_CONVERSATION_TRIGGER_PHRASE",
        "PRINTQUOTE_CONVERSATION_SESSION_TTL_SECS",
        "PRINTQUOTE_CONVERSATION_SWEEP_INTERVAL_SECS",
        "PRINTQUOTE_LOGGING_LEVEL",
        "PRINTQUOTE_LOGGING_FORMAT",
        "PRINTQUOTE_LOG_LEVEL",
        "PRINTQUOTE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
