//! HTTP handlers for plot agronomy records

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    handlers::TodayQuery,
    models::PlotId,
    services::agronomy::{AgronomyService, AgronomyView, UpdateAgronomyInput},
    AppState,
};

pub async fn get_agronomy(
    State(state): State<AppState>,
    Path(plot_id): Path<u16>,
    Query(query): Query<TodayQuery>,
) -> AppResult<Json<AgronomyView>> {
    let service = AgronomyService::new(state.repo);
    let view = service
        .get_agronomy(PlotId(plot_id), query.resolve())
        .await?;
    Ok(Json(view))
}

/// Replace a plot's agronomy rows
pub async fn update_agronomy(
    State(state): State<AppState>,
    Path(plot_id): Path<u16>,
    Query(query): Query<TodayQuery>,
    Json(input): Json<UpdateAgronomyInput>,
) -> AppResult<Json<AgronomyView>> {
    let service = AgronomyService::new(state.repo);
    let view = service
        .update_agronomy(PlotId(plot_id), input, query.resolve())
        .await?;
    Ok(Json(view))
}
