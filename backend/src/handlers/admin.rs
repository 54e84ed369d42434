//! Administrative handlers

use axum::{extract::State, Json};

use crate::{error::AppResult, AppState};

/// Rebuild the cached snapshot from the record store
pub async fn reload_snapshot(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    state.repo.reload().await?;
    let snapshot = state.repo.read().await;
    Ok(Json(serde_json::json!({
        "reloaded": true,
        "backend": state.repo.backend(),
        "weather_days": snapshot.weather().len(),
    })))
}
