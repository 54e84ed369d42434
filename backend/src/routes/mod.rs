//! Route definitions for the Estate Irrigation Monitor

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/soil", get(handlers::soil_snapshot))
        .nest("/plots", plot_routes())
        .nest("/weather", weather_routes())
        .nest("/ndvi", ndvi_routes())
        .nest("/pests", pest_routes())
        .route("/admin/reload", post(handlers::reload_snapshot))
}

/// Plot schedule, agronomy and soil routes
fn plot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_plots))
        .route(
            "/:plot_id",
            get(handlers::get_plot).put(handlers::update_plot),
        )
        .route(
            "/:plot_id/agronomy",
            get(handlers::get_agronomy).put(handlers::update_agronomy),
        )
        .route("/:plot_id/soil", get(handlers::get_plot_soil))
}

/// Weather routes
fn weather_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_weather).post(handlers::add_weather_record),
        )
        .route("/all", put(handlers::replace_weather))
        .route("/export", get(handlers::export_weather))
}

/// NDVI routes
fn ndvi_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::get_ndvi).post(handlers::add_ndvi))
}

/// Pest observation routes
fn pest_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_pests).post(handlers::add_pest))
        .route("/all", put(handlers::replace_pests))
}
