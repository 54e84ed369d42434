//! Estate Irrigation Monitor - Backend Server
//!
//! Tracks weekly irrigation compliance, agronomy records and the daily
//! soil-moisture balance of every plot on the estate.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod models;
mod repository;
mod routes;
mod services;
mod store;

pub use config::Config;

use external::ForecastClient;
use repository::Repository;
use store::{MemoryRecordStore, PgRecordStore, RecordStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub forecast: ForecastClient,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "irrigation_monitor_server=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Estate Irrigation Monitor");
    tracing::info!("Environment: {}", config.environment);

    let store = open_store(&config).await;
    let repo = Repository::load(
        store,
        config.site.registry(),
        config.site.starting_balance_mm,
    )
    .await?;
    let forecast = ForecastClient::new(&config.forecast)?;

    // Create application state
    let state = AppState {
        repo,
        forecast,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((ip, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres when configured and reachable, otherwise the in-memory store
async fn open_store(config: &Config) -> Arc<dyn RecordStore> {
    let Some(url) = config.database.url.as_deref() else {
        tracing::warn!("No database URL configured; records are kept in memory only");
        return Arc::new(MemoryRecordStore::new());
    };

    tracing::info!("Connecting to database...");
    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
    {
        Ok(pool) => pool,
        Err(error) => {
            tracing::error!(error = %error, "Database unavailable; falling back to the in-memory store");
            return Arc::new(MemoryRecordStore::new());
        }
    };
    tracing::info!("Database connection established");

    let store = PgRecordStore::new(pool);
    tracing::info!("Running database migrations...");
    if let Err(error) = store.migrate().await {
        tracing::error!(error = %error, "Migrations failed; falling back to the in-memory store");
        return Arc::new(MemoryRecordStore::new());
    }
    tracing::info!("Migrations completed");

    Arc::new(store)
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Estate Irrigation Monitor API v1.0"
}
