use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use printquote_chat::events::EventHandlerError;
use printquote_chat::{
    ChatEnvelope, ChatEvent, DispatchError, EventContext, EventDispatcher, HandlerResult,
    MessageEvent,
};
use printquote_core::errors::{ApplicationError, DomainError, InterfaceError};
use printquote_core::intake::{IntakeError, WebOrderForm};
use printquote_core::service::QuoteService;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::bootstrap::Application;
use crate::health::{self, HealthState};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<EventDispatcher>,
    pub quotes: QuoteService,
    pub health: HealthState,
}

impl AppState {
    pub fn from_application(app: &Application) -> Self {
        Self {
            dispatcher: Arc::clone(&app.dispatcher),
            quotes: app.quotes.clone(),
            health: HealthState {
                catalog: Arc::clone(&app.catalog),
                sessions: Arc::clone(&app.sessions),
            },
        }
    }
}

pub fn router(state: AppState) -> Router {
    let health_router =
        Router::new().route("/health", get(health::health)).with_state(state.health.clone());

    Router::new()
        .route("/chat/events", post(post_chat_event))
        .route("/web-orders", post(post_web_order))
        .with_state(state)
        .merge(health_router)
}

/// Inbound chat event. A missing `type` means a text message.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatEventRequest {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub requester_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ChatEventRequest {
    pub fn into_envelope(self, envelope_id: String) -> ChatEnvelope {
        let event_type = self.event_type.unwrap_or_else(|| "message".to_owned());
        let event = match (event_type.as_str(), self.text) {
            ("message", Some(text)) => ChatEvent::Message(MessageEvent {
                requester_id: self.requester_id.unwrap_or_default(),
                text,
            }),
            ("message", None) => {
                ChatEvent::Unsupported { event_type: "message/non-text".to_owned() }
            }
            _ => ChatEvent::Unsupported { event_type },
        };
        ChatEnvelope { envelope_id, event }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.user_message().to_owned(),
            detail: self.0.to_string(),
            correlation_id: self.0.correlation_id().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

async fn post_chat_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    let correlation_id = correlation_id(&headers);
    let request: ChatEventRequest = serde_json::from_str(&body).map_err(|parse| {
        malformed(format!("chat event is not valid JSON: {parse}"), &correlation_id)
    })?;

    let envelope = request.into_envelope(correlation_id.clone());
    let ctx = EventContext { correlation_id: correlation_id.clone() };
    let result = state.dispatcher.dispatch(&envelope, &ctx).await.map_err(|dispatch| {
        error!(
            event_name = "http.chat_event_failed",
            correlation_id = %correlation_id,
            error = %dispatch,
            "chat event dispatch failed"
        );
        ApiError(dispatch_error(dispatch, &correlation_id))
    })?;

    match result {
        HandlerResult::Responded(reply) => {
            info!(
                event_name = "http.chat_event_replied",
                correlation_id = %correlation_id,
                step = reply.step.map(|step| step.as_str()).unwrap_or("none"),
                "chat event answered"
            );
            Ok((StatusCode::OK, Json(reply)).into_response())
        }
        HandlerResult::Processed | HandlerResult::Ignored => {
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

async fn post_web_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    let correlation_id = correlation_id(&headers);
    let form = WebOrderForm::from_json(&body).map_err(|intake| {
        ApiError(
            ApplicationError::Domain(DomainError::Intake(intake)).into_interface(&correlation_id),
        )
    })?;

    let record = state
        .quotes
        .issue_web_order(form, &correlation_id)
        .await
        .map_err(|issue| ApiError(issue.into_interface(&correlation_id)))?;

    info!(
        event_name = "http.web_order_quoted",
        correlation_id = %correlation_id,
        quote_id = %record.quote_id,
        "web order quoted"
    );
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("req-{}", uuid::Uuid::new_v4()))
}

fn malformed(message: String, correlation_id: &str) -> ApiError {
    ApiError(
        ApplicationError::Domain(DomainError::Intake(IntakeError::Malformed(message)))
            .into_interface(correlation_id),
    )
}

fn dispatch_error(error: DispatchError, correlation_id: &str) -> InterfaceError {
    let DispatchError::Handler(handler) = error;
    match handler {
        EventHandlerError::Conversation(conversation) => {
            ApplicationError::from(conversation).into_interface(correlation_id)
        }
        EventHandlerError::MissingRequester => InterfaceError::BadRequest {
            message: "message event is missing a requester id".to_owned(),
            correlation_id: correlation_id.to_owned(),
        },
    }
}
