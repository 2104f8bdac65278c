use std::collections::BTreeMap;

use serde::Serialize;

use crate::history::{EvaluationRecord, NurseId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NurseStanding {
    pub nurse_id: NurseId,
    pub average_score: f64,
    pub evaluations: usize,
}

/// Every nurse with at least one record, best average first.
pub fn standings(records: &[EvaluationRecord]) -> Vec<NurseStanding> {
    let mut totals: BTreeMap<&NurseId, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(&record.nurse_id).or_default();
        entry.0 += record.final_score.value();
        entry.1 += 1;
    }

    let mut standings: Vec<NurseStanding> = totals
        .into_iter()
        .map(|(nurse_id, (total, evaluations))| NurseStanding {
            nurse_id: nurse_id.clone(),
            average_score: total / evaluations as f64,
            evaluations,
        })
        .collect();

    standings.sort_by(|a, b| {
        b.average_score
            .total_cmp(&a.average_score)
            .then_with(|| a.nurse_id.cmp(&b.nurse_id))
    });
    standings
}

pub fn top_performers(records: &[EvaluationRecord], count: usize) -> Vec<NurseStanding> {
    let mut ranked = standings(records);
    ranked.truncate(count);
    ranked
}

/// Lowest averages first.
pub fn needs_attention(records: &[EvaluationRecord], count: usize) -> Vec<NurseStanding> {
    let mut ranked = standings(records);
    ranked.sort_by(|a, b| {
        a.average_score
            .total_cmp(&b.average_score)
            .then_with(|| a.nurse_id.cmp(&b.nurse_id))
    });
    ranked.truncate(count);
    ranked
}
