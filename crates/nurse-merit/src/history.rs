use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{EvaluationType, FinalScore};

/// Identifier wrapper for an evaluated nurse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NurseId(pub String);

impl NurseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NurseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scored evaluation as it appears in a nurse's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub nurse_id: NurseId,
    pub evaluation_type: EvaluationType,
    pub recorded_at: DateTime<Utc>,
    pub final_score: FinalScore,
}

/// Borrow the records in chronological order. The sort is stable so records sharing a
/// timestamp keep the caller's relative order.
pub(crate) fn chronological(records: &[EvaluationRecord]) -> Vec<&EvaluationRecord> {
    let mut ordered: Vec<&EvaluationRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.recorded_at);
    ordered
}

pub(crate) fn mean_score<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a EvaluationRecord>,
{
    let (total, count) = records
        .into_iter()
        .fold((0.0_f64, 0_usize), |(total, count), record| {
            (total + record.final_score.value(), count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(day: u32, score: f64) -> EvaluationRecord {
        EvaluationRecord {
            nurse_id: NurseId::new("n-1"),
            evaluation_type: EvaluationType::Weekly,
            recorded_at: Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap(),
            final_score: FinalScore::new(score),
        }
    }

    #[test]
    fn chronological_orders_by_timestamp() {
        let records = vec![record(9, 70.0), record(2, 80.0), record(5, 90.0)];
        let ordered: Vec<f64> = chronological(&records)
            .iter()
            .map(|record| record.final_score.value())
            .collect();
        assert_eq!(ordered, vec![80.0, 90.0, 70.0]);
    }

    #[test]
    fn mean_score_is_none_for_empty_history() {
        assert_eq!(mean_score(&[]), None);
        assert_eq!(mean_score(&[record(1, 60.0), record(2, 90.0)]), Some(75.0));
    }
}
