//! Bulk-send dispatch and live status.
//!
//! `start_send` assembles the target list (explicit handles ∪ CSV import
//! ∪ group mention harvest ∪ saved contacts), arms the stats record, and
//! spawns the batch task. Pollers read the shared snapshot; stopping is
//! a flag flip the loop observes before its next target.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::{error, map_bot_error, unknown_bot, ApiError};
use crate::bot::{run_batch, SendStatus};
use crate::core::types::*;
use crate::core::AppState;
use crate::spreadsheet::handles_from_csv;
use crate::storage::SendReport;

fn dedupe(handles: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    handles
        .into_iter()
        .map(|h| h.trim().to_string())
        .filter(|h| h.len() > 1 && h.starts_with('@'))
        .filter(|h| seen.insert(h.clone()))
        .collect()
}

pub async fn start_send(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendStartResponse>, ApiError> {
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;

    if !bot.is_logged_in() {
        return Err(error(StatusCode::CONFLICT, "bot is not logged in"));
    }
    if bot.stats.is_running() {
        return Err(error(StatusCode::CONFLICT, "a send batch is already running"));
    }

    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.store.settings().message_template);
    if message.trim().is_empty() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "message is required (no saved template either)",
        ));
    }

    let mut collected: Vec<String> = req.targets;

    if let Some(csv) = req.contacts_csv.as_deref() {
        collected.extend(handles_from_csv(csv));
    }

    if req.include_saved_contacts {
        collected.extend(state.store.contacts().into_iter().map(|c| c.handle));
    }

    if let (Some(group), Some(prefix)) = (req.group_name.as_deref(), req.message_prefix.as_deref())
    {
        let harvested = bot
            .extract_group_mentions(group, prefix)
            .await
            .map_err(map_bot_error)?;
        // Keep the harvest in the saved book so later runs can reuse it.
        let _ = state.store.add_contacts(&harvested, &format!("group:{}", group));
        collected.extend(harvested);
    }

    let targets = dedupe(collected);
    if targets.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "no targets resolved"));
    }

    let total = targets.len();
    bot.stats.begin(total);
    info!("bot '{}': starting batch of {} targets", id, total);

    let store = state.store.clone();
    let task_bot = bot.clone();
    let started_at = chrono::Utc::now().to_rfc3339();
    tokio::spawn(async move {
        run_batch(task_bot.as_ref(), &targets, &message, &task_bot.stats).await;
        let s = task_bot.stats.snapshot();
        store.append_report(SendReport {
            bot_id: task_bot.id.clone(),
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            total: s.total,
            succeeded: s.succeeded,
            failed: s.failed,
            stopped: s.sent < s.total,
        });
    });

    Ok(Json(SendStartResponse {
        status: "started".to_string(),
        total,
    }))
}

pub async fn send_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SendStatus>, ApiError> {
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;
    Ok(Json(bot.stats.snapshot()))
}

pub async fn stop_send(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bot = state.registry.get(&id).ok_or_else(|| unknown_bot(&id))?;
    bot.stats.request_stop();
    info!("bot '{}': stop requested", id);
    Ok(Json(serde_json::json!({ "status": "stopping" })))
}
