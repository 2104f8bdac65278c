use super::domain::Criterion;
use crate::history::{mean_score, EvaluationRecord};

/// Select the records a criterion looks at. `history` must already be chronological.
/// Returns `None` when a period is required and there are not enough records.
fn window<'a>(
    criterion: &Criterion,
    history: &[&'a EvaluationRecord],
) -> Option<Vec<&'a EvaluationRecord>> {
    let filtered: Vec<&EvaluationRecord> = history
        .iter()
        .copied()
        .filter(|record| {
            criterion
                .evaluation_type()
                .map_or(true, |kind| record.evaluation_type == kind)
        })
        .collect();

    match criterion.period() {
        Some(period) => {
            let period = period as usize;
            if filtered.len() < period {
                return None;
            }
            Some(filtered[filtered.len() - period..].to_vec())
        }
        None => Some(filtered),
    }
}

fn satisfied(criterion: &Criterion, window: &[&EvaluationRecord]) -> bool {
    if window.is_empty() {
        return false;
    }

    let operator = criterion.operator();
    let threshold = criterion.value();
    let every_record_passes = || {
        window
            .iter()
            .all(|record| operator.holds(record.final_score.value(), threshold))
    };

    match criterion {
        Criterion::AverageScore { .. } => mean_score(window.iter().copied())
            .map_or(false, |mean| operator.holds(mean, threshold)),
        Criterion::SpecificScore { .. } => every_record_passes(),
        Criterion::Consistency { period, .. } => {
            window.len() >= *period as usize && every_record_passes()
        }
    }
}

/// The most recent record of the qualifying window when the criterion holds.
pub(crate) fn qualifying_record<'a>(
    criterion: &Criterion,
    history: &[&'a EvaluationRecord],
) -> Option<&'a EvaluationRecord> {
    let window = window(criterion, history)?;
    if satisfied(criterion, &window) {
        window.last().copied()
    } else {
        None
    }
}
