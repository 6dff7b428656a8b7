use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use printquote_core::pricing::PricingCatalog;
use printquote_core::session::SessionStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub catalog: Arc<PricingCatalog>,
    pub sessions: Arc<dyn SessionStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub price_table: HealthCheck,
    pub sessions: HealthCheck,
    pub tier_count: usize,
    pub active_sessions: Option<usize>,
    pub checked_at: String,
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let tier_count = state.catalog.tiers().len();
    let price_table = if tier_count > 0 {
        HealthCheck {
            status: "ready",
            detail: format!("{tier_count} tiers loaded from {}", state.catalog.origin()),
        }
    } else {
        HealthCheck { status: "degraded", detail: "price table has no tiers".to_string() }
    };

    let (sessions, active_sessions) = match state.sessions.len().await {
        Ok(count) => (
            HealthCheck { status: "ready", detail: format!("{count} active sessions") },
            Some(count),
        ),
        Err(error) => (
            HealthCheck { status: "degraded", detail: format!("session store failed: {error}") },
            None,
        ),
    };
    let ready = price_table.status == "ready" && sessions.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "printquote-server runtime initialized".to_string(),
        },
        price_table,
        sessions,
        tier_count,
        active_sessions,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
