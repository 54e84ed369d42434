//! Dashboard HTTP handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::handlers::resolve_today;
use crate::models::PlotId;
use crate::services::dashboard::{Dashboard, DashboardQuery, DashboardService};
use crate::AppState;
use shared::aggregation::ComparisonView;

/// Estate dashboard
///
/// Accepts `view=week|season`, repeated `focus=<plot id>` (comma-separated
/// lists work too) and an optional `today=YYYY-MM-DD`.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Dashboard> {
    let (query, today) = parse_params(&params);
    let service = DashboardService::new(state.repo, state.forecast, state.config.site.clone());
    Json(service.build(query, resolve_today(today)).await)
}

fn parse_params(params: &[(String, String)]) -> (DashboardQuery, Option<&str>) {
    let mut query = DashboardQuery::default();
    let mut today = None;
    for (key, value) in params {
        match key.as_str() {
            "view" => {
                query.view = match value.trim() {
                    "season" => ComparisonView::Season,
                    _ => ComparisonView::Week,
                }
            }
            "focus" => query.focus.extend(
                value
                    .split(',')
                    .filter_map(|id| id.trim().parse::<u16>().ok())
                    .map(PlotId),
            ),
            "today" => today = Some(value.as_str()),
            _ => {}
        }
    }
    (query, today)
}
