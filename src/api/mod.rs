//! HTTP boundary: thin axum handlers mapping 1:1 onto core operations.
//!
//! Handlers never reach into the page themselves; they sequence calls
//! on a `Bot` and translate the failure taxonomy into status codes:
//! sequencing errors are 409, missing targets 404, driver/UI trouble
//! 502.

pub mod bots;
pub mod contacts;
pub mod reports;
pub mod send;
pub mod settings;

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

use crate::automation::BotError;
use crate::core::types::ErrorResponse;
use crate::core::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/bots", get(bots::list_bots).post(bots::create_bot))
        .route("/api/bots/{id}", get(bots::bot_status).delete(bots::close_bot))
        .route("/api/bots/{id}/login", post(bots::login))
        .route("/api/bots/{id}/code", post(bots::submit_code))
        .route("/api/bots/{id}/logout", post(bots::logout))
        .route("/api/bots/{id}/send", post(send::start_send))
        .route("/api/bots/{id}/send/status", get(send::send_status))
        .route("/api/bots/{id}/send/stop", post(send::stop_send))
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::add_contacts),
        )
        .route("/api/contacts/{handle}", delete(contacts::delete_contact))
        .route("/api/contacts/import", post(contacts::import_contacts))
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route("/api/reports", get(reports::list_reports))
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "peyk",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn unknown_bot(id: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("unknown bot id '{}'", id))
}

pub(crate) fn map_bot_error(e: BotError) -> ApiError {
    match &e {
        BotError::ElementNotFound { what, snapshot } => {
            let mut msg = format!("element not found: {}", what);
            if let Some(path) = snapshot {
                msg.push_str(&format!(" (snapshot: {})", path.display()));
            }
            error(StatusCode::BAD_GATEWAY, msg)
        }
        BotError::TargetNotFound { .. } => error(StatusCode::NOT_FOUND, e.to_string()),
        BotError::SessionUnavailable => error(StatusCode::CONFLICT, e.to_string()),
        BotError::Driver(_) => error(StatusCode::BAD_GATEWAY, e.to_string()),
        BotError::Io(_) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
