use serde::Serialize;

use crate::history::{chronological, mean_score, EvaluationRecord};

/// Percentage change above which recent performance counts as improving.
pub const IMPROVING_THRESHOLD_PCT: f64 = 5.0;
/// Percentage change below which recent performance counts as declining.
pub const DECLINING_THRESHOLD_PCT: f64 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

/// Recent window compared against everything before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTrend {
    pub direction: TrendDirection,
    pub percentage_change: f64,
    pub recent_average: f64,
    pub historical_average: f64,
}

/// Needs at least two full windows of history; returns `None` otherwise.
pub fn performance_trend(history: &[EvaluationRecord], window: usize) -> Option<PerformanceTrend> {
    if window == 0 || history.len() / 2 < window {
        return None;
    }

    let ordered = chronological(history);
    let (historical, recent) = ordered.split_at(ordered.len() - window);
    let recent_average = mean_score(recent.iter().copied())?;
    let historical_average = mean_score(historical.iter().copied())?;

    if historical_average == 0.0 {
        let improving = recent_average > 0.0;
        return Some(PerformanceTrend {
            direction: if improving {
                TrendDirection::Improving
            } else {
                TrendDirection::Stable
            },
            percentage_change: if improving { 100.0 } else { 0.0 },
            recent_average,
            historical_average,
        });
    }

    let percentage_change = (recent_average - historical_average) / historical_average * 100.0;
    let direction = if percentage_change > IMPROVING_THRESHOLD_PCT {
        TrendDirection::Improving
    } else if percentage_change < DECLINING_THRESHOLD_PCT {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    Some(PerformanceTrend {
        direction,
        percentage_change,
        recent_average,
        historical_average,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmartAlert {
    PerformanceDecline { percentage_drop: f64, window: usize },
}

impl SmartAlert {
    pub fn message(&self) -> String {
        match self {
            SmartAlert::PerformanceDecline {
                percentage_drop,
                window,
            } => format!(
                "performance dropped {:.0}% across the last {window} evaluations",
                percentage_drop
            ),
        }
    }
}

pub fn smart_alerts(history: &[EvaluationRecord], window: usize) -> Vec<SmartAlert> {
    let mut alerts = Vec::new();

    if let Some(trend) = performance_trend(history, window) {
        if trend.direction == TrendDirection::Declining {
            alerts.push(SmartAlert::PerformanceDecline {
                percentage_drop: trend.percentage_change.abs(),
                window,
            });
        }
    }

    alerts
}
