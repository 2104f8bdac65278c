//! Read-only performance analytics over scored evaluation history.

mod items;
mod standings;
mod trend;

pub use items::{category_averages, improvement_areas, item_averages, strengths, ItemAverage};
pub use standings::{needs_attention, standings, top_performers, NurseStanding};
pub use trend::{
    performance_trend, smart_alerts, PerformanceTrend, SmartAlert, TrendDirection,
    DECLINING_THRESHOLD_PCT, IMPROVING_THRESHOLD_PCT,
};

use crate::history::{mean_score, EvaluationRecord};

/// Mean final score, or `None` when there is no history.
pub fn nurse_average_score(history: &[EvaluationRecord]) -> Option<f64> {
    mean_score(history)
}
