//! Past send-run reports.

use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

use crate::core::AppState;
use crate::storage::SendReport;

pub async fn list_reports(State(state): State<Arc<AppState>>) -> Json<Vec<SendReport>> {
    Json(state.store.reports())
}
