//! Configuration management for the Estate Irrigation Monitor
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with IMS_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::PlotRegistry;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Site (estate) configuration
    pub site: SiteConfig,

    /// Forecast provider configuration
    pub forecast: ForecastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; records stay in memory when unset
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Estate name shown on the dashboard
    pub name: String,

    /// Starting balance (and TAM) for plots without a stored value
    pub starting_balance_mm: Decimal,

    /// Maximum plots on the focus chart
    pub focus_limit: usize,

    /// Replaces the built-in estate plot list when set
    pub plot_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Forecast API base endpoint
    pub api_endpoint: String,

    /// Provider location id
    pub location_id: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent to the provider
    pub user_agent: String,

    /// Skip the network call entirely when false
    pub enabled: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IMS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("site.name", "Estate")?
            .set_default("site.starting_balance_mm", "120.0")?
            .set_default("site.focus_limit", 6)?
            .set_default("forecast.api_endpoint", "https://www.yr.no/api/v0/locations")?
            .set_default("forecast.location_id", "2-893332")?
            .set_default("forecast.timeout_secs", 10)?
            .set_default("forecast.user_agent", "irrigation-monitor/0.1")?
            .set_default("forecast.enabled", true)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IMS_ prefix)
            .add_source(
                Environment::with_prefix("IMS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl SiteConfig {
    /// Configured plot list, or the built-in estate layout
    pub fn registry(&self) -> PlotRegistry {
        match &self.plot_names {
            Some(names) if !names.is_empty() => PlotRegistry::new(names.clone()),
            _ => PlotRegistry::estate(),
        }
    }
}

impl ForecastConfig {
    /// Full forecast URL for the configured location
    pub fn url(&self) -> String {
        format!(
            "{}/{}/forecast",
            self.api_endpoint.trim_end_matches('/'),
            self.location_id
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
