//! Contact book handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

use super::{error, ApiError};
use crate::core::types::*;
use crate::core::AppState;
use crate::spreadsheet::handles_from_csv;
use crate::storage::ContactEntry;

pub async fn list_contacts(State(state): State<Arc<AppState>>) -> Json<Vec<ContactEntry>> {
    Json(state.store.contacts())
}

pub async fn add_contacts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddContactsRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let handles: Vec<String> = req
        .handles
        .iter()
        .map(|h| h.trim().to_string())
        .filter(|h| h.len() > 1 && h.starts_with('@'))
        .collect();
    if handles.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "no valid @handles supplied"));
    }
    let source = req.source.as_deref().unwrap_or("manual");
    let imported = state
        .store
        .add_contacts(&handles, source)
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(ImportResponse {
        imported,
        total: state.store.contacts().len(),
    }))
}

pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state
        .store
        .remove_contact(&handle)
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if !removed {
        return Err(error(
            StatusCode::NOT_FOUND,
            format!("contact '{}' not found", handle),
        ));
    }
    Ok(Json(serde_json::json!({ "status": "removed" })))
}

/// Import handles from a raw CSV request body: any `@`-prefixed field
/// in any column counts.
pub async fn import_contacts(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let handles = handles_from_csv(&body);
    if handles.is_empty() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "no @handles found in the uploaded data",
        ));
    }
    let imported = state
        .store
        .add_contacts(&handles, "csv_import")
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(ImportResponse {
        imported,
        total: state.store.contacts().len(),
    }))
}
