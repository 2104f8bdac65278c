use crate::awards::AwardServiceError;
use crate::badges::BadgeCatalogError;
use crate::config::ConfigError;
use crate::scoring::{CatalogError, ScoringError};
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    ItemCatalog(CatalogError),
    BadgeCatalog(BadgeCatalogError),
    Scoring(ScoringError),
    Service(AwardServiceError),
    Json(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::ItemCatalog(err) => write!(f, "item catalog error: {}", err),
            AppError::BadgeCatalog(err) => write!(f, "badge catalog error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
            AppError::Service(err) => write!(f, "award service error: {}", err),
            AppError::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::ItemCatalog(err) => Some(err),
            AppError::BadgeCatalog(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Service(err) => Some(err),
            AppError::Json(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::ItemCatalog(value)
    }
}

impl From<BadgeCatalogError> for AppError {
    fn from(value: BadgeCatalogError) -> Self {
        Self::BadgeCatalog(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

impl From<AwardServiceError> for AppError {
    fn from(value: AwardServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
