//! Soil-moisture HTTP handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::aggregation::SoilStatus;

use crate::{
    error::AppResult,
    handlers::TodayQuery,
    models::PlotId,
    services::soil::{SoilService, SoilView},
    AppState,
};

/// Soil position of every plot
pub async fn soil_snapshot(
    State(state): State<AppState>,
    Query(query): Query<TodayQuery>,
) -> Json<Vec<SoilStatus>> {
    let service = SoilService::new(state.repo);
    Json(service.snapshot(query.resolve()).await)
}

/// Soil position and recent daily table for one plot
pub async fn get_plot_soil(
    State(state): State<AppState>,
    Path(plot_id): Path<u16>,
    Query(query): Query<TodayQuery>,
) -> AppResult<Json<SoilView>> {
    let service = SoilService::new(state.repo);
    let view = service.plot_view(PlotId(plot_id), query.resolve()).await?;
    Ok(Json(view))
}
