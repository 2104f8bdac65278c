use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::badges::{BadgeCatalog, BadgeCatalogError};
use crate::scoring::{CatalogError, ItemCatalog};

/// Distinguishes runtime behavior for different stages of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

pub const DEFAULT_TREND_WINDOW: usize = 3;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub catalogs: CatalogConfig,
    pub analytics: AnalyticsConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let items_path = optional_path("MERIT_ITEM_CATALOG");
        let badges_path = optional_path("MERIT_BADGE_CATALOG");

        let trend_window = match env::var("MERIT_TREND_WINDOW") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(window) if window > 0 => window,
                _ => return Err(ConfigError::InvalidTrendWindow { value: raw }),
            },
            Err(_) => DEFAULT_TREND_WINDOW,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            catalogs: CatalogConfig {
                items_path,
                badges_path,
            },
            analytics: AnalyticsConfig { trend_window },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn optional_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Where the rubric and badge catalogs come from. Unset paths fall back to the
/// built-in catalogs.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub items_path: Option<PathBuf>,
    pub badges_path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn load_items(&self) -> Result<ItemCatalog, CatalogError> {
        match &self.items_path {
            Some(path) => ItemCatalog::from_csv_path(path),
            None => ItemCatalog::standard(),
        }
    }

    pub fn load_badges(&self) -> Result<BadgeCatalog, BadgeCatalogError> {
        match &self.badges_path {
            Some(path) => BadgeCatalog::from_json_path(path),
            None => BadgeCatalog::standard(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Number of most recent evaluations compared against the rest of the history.
    pub trend_window: usize,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidTrendWindow { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTrendWindow { value } => write!(
                f,
                "MERIT_TREND_WINDOW must be a positive integer, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
