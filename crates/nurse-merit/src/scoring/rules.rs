use std::collections::BTreeMap;

use super::catalog::ItemCatalog;
use super::domain::{
    Category, EvaluationType, FinalScore, ScoreSet, MAX_ITEM_SCORE, MIN_ITEM_SCORE,
    PERCENT_PER_POINT,
};
use super::{CategoryScore, ScoreBreakdown, ScoringError};

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: u32,
    count: usize,
}

impl Tally {
    fn add(&mut self, score: u8) {
        self.total += u32::from(score);
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(f64::from(self.total) / self.count as f64)
        }
    }
}

pub(crate) fn score(
    evaluation_type: EvaluationType,
    scores: &ScoreSet,
    catalog: &ItemCatalog,
) -> Result<ScoreBreakdown, ScoringError> {
    if scores.is_empty() {
        return Err(ScoringError::EmptyScoreSet);
    }

    let mut tallies: BTreeMap<Category, Tally> = BTreeMap::new();
    for (key, score) in scores.iter() {
        let item =
            catalog
                .item_for(key, evaluation_type)
                .ok_or_else(|| ScoringError::UnknownItemKey {
                    key: key.clone(),
                    evaluation_type,
                })?;

        if !(MIN_ITEM_SCORE..=MAX_ITEM_SCORE).contains(&score) {
            return Err(ScoringError::ScoreOutOfRange {
                key: key.clone(),
                score,
            });
        }

        tallies.entry(item.category).or_default().add(score);
    }

    let breakdown = if evaluation_type.is_weighted() {
        weighted(evaluation_type, &tallies, catalog)
    } else {
        flat(evaluation_type, &tallies)
    };

    Ok(breakdown)
}

fn flat(evaluation_type: EvaluationType, tallies: &BTreeMap<Category, Tally>) -> ScoreBreakdown {
    let overall = tallies
        .values()
        .fold(Tally::default(), |acc, tally| Tally {
            total: acc.total + tally.total,
            count: acc.count + tally.count,
        });

    let categories = tallies
        .iter()
        .map(|(category, tally)| {
            let mean = tally.mean();
            CategoryScore {
                category: *category,
                items_scored: tally.count,
                mean,
                percent: mean.map(|mean| mean * PERCENT_PER_POINT),
                weight: None,
                contribution: None,
            }
        })
        .collect();

    ScoreBreakdown {
        evaluation_type,
        final_score: FinalScore::new(overall.mean().unwrap_or(0.0) * PERCENT_PER_POINT),
        categories,
    }
}

fn weighted(
    evaluation_type: EvaluationType,
    tallies: &BTreeMap<Category, Tally>,
    catalog: &ItemCatalog,
) -> ScoreBreakdown {
    let mut total = 0.0;
    let mut categories = Vec::new();

    for (category, weight) in catalog.category_weights(evaluation_type).into_iter().flatten() {
        let tally = tallies.get(category).copied().unwrap_or_default();
        let mean = tally.mean();
        let percent = mean.map(|mean| mean * PERCENT_PER_POINT);
        // An unscored category adds nothing rather than dividing by zero.
        let contribution = percent.map_or(0.0, |percent| percent * weight);
        total += contribution;

        categories.push(CategoryScore {
            category: *category,
            items_scored: tally.count,
            mean,
            percent,
            weight: Some(*weight),
            contribution: Some(contribution),
        });
    }

    ScoreBreakdown {
        evaluation_type,
        final_score: FinalScore::new(total),
        categories,
    }
}
