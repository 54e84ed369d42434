//! HTTP handlers for estate weather records

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::services::weather::{WeatherInput, WeatherOverview, WeatherService};
use crate::AppState;

/// Weather records with monthly statistics
pub async fn get_weather(State(state): State<AppState>) -> Json<WeatherOverview> {
    let service = WeatherService::new(state.repo);
    Json(service.overview().await)
}

/// Add or overwrite one day
pub async fn add_weather_record(
    State(state): State<AppState>,
    Json(input): Json<WeatherInput>,
) -> AppResult<impl IntoResponse> {
    let service = WeatherService::new(state.repo);
    let record = service.add_record(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace the whole weather series
pub async fn replace_weather(
    State(state): State<AppState>,
    Json(inputs): Json<Vec<WeatherInput>>,
) -> AppResult<impl IntoResponse> {
    let service = WeatherService::new(state.repo);
    let saved = service.replace_all(inputs).await?;
    Ok(Json(serde_json::json!({ "saved": saved })))
}

/// Download the weather series as CSV
pub async fn export_weather(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = WeatherService::new(state.repo);
    let csv = service.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"weather.csv\"",
            ),
        ],
        csv,
    ))
}
