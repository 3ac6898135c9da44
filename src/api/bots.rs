//! Bot lifecycle handlers: create, status, login steps, logout, close.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;
use tracing::info;

use super::{error, map_bot_error, unknown_bot, ApiError};
use crate::bot::{Bot, BotConfig};
use crate::core::types::*;
use crate::core::AppState;

pub async fn create_bot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBotRequest>,
) -> Result<Json<CreateBotResponse>, ApiError> {
    let settings = state.store.settings();
    let bot_id = req
        .bot_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let config = BotConfig {
        min_delay_ms: req.min_delay_ms.unwrap_or(settings.min_delay_ms),
        max_delay_ms: req.max_delay_ms.unwrap_or(settings.max_delay_ms),
        headless: req.headless.unwrap_or_else(|| state.config.resolve_headless()),
        search_settle_ms: state.config.resolve_search_settle_ms(),
    };

    let bot = Bot::new(&bot_id, config, state.sessions.clone(), &state.snapshot_dir);
    state
        .registry
        .insert(bot)
        .map_err(|e| error(StatusCode::CONFLICT, e.to_string()))?;

    info!("bot '{}' created", bot_id);
    Ok(Json(CreateBotResponse {
        bot_id,
        status: "created".to_string(),
    }))
}

pub async fn list_bots(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "bots": state.registry.ids() }))
}

pub async fn bot_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BotStatusResponse>, ApiError> {
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;
    Ok(Json(BotStatusResponse {
        bot_id: bot.id.clone(),
        login_state: bot.login_state().as_str().to_string(),
        is_logged_in: bot.is_logged_in(),
        min_delay_ms: bot.config.min_delay_ms,
        max_delay_ms: bot.config.max_delay_ms,
        send: bot.stats.snapshot(),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.phone_number.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "phone_number is required"));
    }
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;
    let outcome = bot
        .begin_login(req.phone_number.trim())
        .await
        .map_err(map_bot_error)?;
    Ok(Json(LoginResponse {
        status: outcome.as_str().to_string(),
    }))
}

pub async fn submit_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.code.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "code is required"));
    }
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;
    let outcome = bot
        .submit_code(req.code.trim())
        .await
        .map_err(map_bot_error)?;
    Ok(Json(LoginResponse {
        status: outcome.as_str().to_string(),
    }))
}

/// Forget persisted credentials and drop the live session. The instance
/// itself stays registered for a fresh login.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;
    bot.forget_credentials();
    bot.shutdown().await;
    info!("bot '{}' logged out", id);
    Ok(Json(serde_json::json!({ "status": "logged_out" })))
}

pub async fn close_bot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bot = state.registry.remove(&id).ok_or_else(|| unknown_bot(&id))?;
    bot.shutdown().await;
    info!("bot '{}' closed", id);
    Ok(Json(serde_json::json!({ "status": "closed" })))
}
