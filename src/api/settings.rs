//! Persisted operator settings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

use super::{error, ApiError};
use crate::core::AppState;
use crate::storage::Settings;

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.store.settings())
}

pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    if settings.min_delay_ms > settings.max_delay_ms {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "min_delay_ms must not exceed max_delay_ms",
        ));
    }
    state
        .store
        .save_settings(&settings)
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(settings))
}
