use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::badges::{BadgeDefinition, BadgeId, Comparison, Criterion, Tier, TierName};
use crate::history::{EvaluationRecord, NurseId};
use crate::scoring::{EvaluationType, FinalScore};

pub(super) fn nurse() -> NurseId {
    NurseId::new("nurse-amal")
}

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 7, 30, 0).unwrap()
}

pub(super) fn record_at(
    nurse_id: &NurseId,
    weeks: i64,
    evaluation_type: EvaluationType,
    score: f64,
) -> EvaluationRecord {
    EvaluationRecord {
        nurse_id: nurse_id.clone(),
        evaluation_type,
        recorded_at: start() + Duration::weeks(weeks),
        final_score: FinalScore::new(score),
    }
}

/// Weekly history for the default nurse, one record per week in the given order.
pub(super) fn weekly_history(scores: &[f64]) -> Vec<EvaluationRecord> {
    scores
        .iter()
        .enumerate()
        .map(|(week, score)| record_at(&nurse(), week as i64, EvaluationType::Weekly, *score))
        .collect()
}

pub(super) fn average_tier(name: TierName, value: f64, period: u32) -> Tier {
    Tier {
        name,
        criterion: Criterion::AverageScore {
            value,
            operator: Comparison::Gte,
            period: Some(period),
            evaluation_type: None,
        },
    }
}

pub(super) fn badge(id: &str, tiers: Vec<Tier>) -> BadgeDefinition {
    BadgeDefinition {
        id: BadgeId::new(id),
        name: id.replace('_', " "),
        description: String::new(),
        icon: None,
        tiers,
    }
}

/// bronze >= 70, silver >= 85, gold >= 95 on the latest evaluation, listed lowest first.
pub(super) fn performer_badge() -> BadgeDefinition {
    badge(
        "top_performer",
        vec![
            average_tier(TierName::Bronze, 70.0, 1),
            average_tier(TierName::Silver, 85.0, 1),
            average_tier(TierName::Gold, 95.0, 1),
        ],
    )
}

pub(super) fn consistency_badge(period: u32) -> BadgeDefinition {
    badge(
        "consistency_star",
        vec![Tier {
            name: TierName::Silver,
            criterion: Criterion::Consistency {
                value: 80.0,
                operator: Comparison::Gte,
                period,
                evaluation_type: None,
            },
        }],
    )
}
