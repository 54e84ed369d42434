//! Plot schedule HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::handlers::TodayQuery;
use crate::models::PlotId;
use crate::services::plot::{PlotService, UpdatePlotInput};
use crate::AppState;

/// List all plots with their headline figures
pub async fn list_plots(
    State(state): State<AppState>,
    Query(query): Query<TodayQuery>,
) -> impl IntoResponse {
    let service = PlotService::new(state.repo.clone());
    let plots = service.list_plots(query.resolve()).await;
    (StatusCode::OK, Json(serde_json::json!({ "plots": plots })))
}

/// Get a plot page
pub async fn get_plot(
    State(state): State<AppState>,
    Path(plot_id): Path<u16>,
    Query(query): Query<TodayQuery>,
) -> impl IntoResponse {
    let service = PlotService::new(state.repo.clone());

    match service.get_plot(PlotId(plot_id), query.resolve()).await {
        Ok(plot) => (StatusCode::OK, Json(plot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace a plot's metadata, schedule and soil inputs
pub async fn update_plot(
    State(state): State<AppState>,
    Path(plot_id): Path<u16>,
    Query(query): Query<TodayQuery>,
    Json(input): Json<UpdatePlotInput>,
) -> impl IntoResponse {
    let service = PlotService::new(state.repo.clone());

    match service
        .update_plot(PlotId(plot_id), input, query.resolve())
        .await
    {
        Ok(plot) => (StatusCode::OK, Json(plot)).into_response(),
        Err(e) => e.into_response(),
    }
}
