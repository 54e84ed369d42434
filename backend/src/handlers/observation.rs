//! HTTP handlers for NDVI readings and pest observations

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    error::AppResult,
    services::observation::{NdviInput, NdviOverview, ObservationService, PestInput, PestOverview},
    AppState,
};

/// NDVI records, per-date chart and per-plot averages
pub async fn get_ndvi(State(state): State<AppState>) -> Json<NdviOverview> {
    let service = ObservationService::new(state.repo);
    Json(service.ndvi_overview().await)
}

pub async fn add_ndvi(
    State(state): State<AppState>,
    Json(input): Json<NdviInput>,
) -> AppResult<impl IntoResponse> {
    let service = ObservationService::new(state.repo);
    let record = service.add_ndvi(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Pest records with per-pest counts
pub async fn get_pests(State(state): State<AppState>) -> Json<PestOverview> {
    let service = ObservationService::new(state.repo);
    Json(service.pest_overview().await)
}

pub async fn add_pest(
    State(state): State<AppState>,
    Json(input): Json<PestInput>,
) -> AppResult<impl IntoResponse> {
    let service = ObservationService::new(state.repo);
    let record = service.add_pest(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace every pest record
pub async fn replace_pests(
    State(state): State<AppState>,
    Json(inputs): Json<Vec<PestInput>>,
) -> AppResult<impl IntoResponse> {
    let service = ObservationService::new(state.repo);
    let saved = service.replace_pests(inputs).await?;
    Ok(Json(serde_json::json!({ "saved": saved })))
}
