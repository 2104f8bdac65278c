pub mod analytics;
pub mod awards;
pub mod badges;
pub mod config;
pub mod error;
pub mod history;
pub mod scoring;
pub mod telemetry;
