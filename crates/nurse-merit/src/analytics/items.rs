use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::scoring::{Category, EvaluationType, ItemCatalog, ItemKey, ScoreSet};

/// Mean rubric score of one item across evaluations, on the 1-5 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAverage {
    pub key: ItemKey,
    pub average: f64,
    pub samples: usize,
}

pub fn item_averages(score_sets: &[ScoreSet]) -> Vec<ItemAverage> {
    let mut totals: BTreeMap<&ItemKey, (u32, usize)> = BTreeMap::new();
    for scores in score_sets {
        for (key, score) in scores.iter() {
            let entry = totals.entry(key).or_default();
            entry.0 += u32::from(score);
            entry.1 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(key, (total, samples))| ItemAverage {
            key: key.clone(),
            average: f64::from(total) / samples as f64,
            samples,
        })
        .collect()
}

/// Best scored items first; ties keep key order.
pub fn strengths(score_sets: &[ScoreSet], count: usize) -> Vec<ItemAverage> {
    ranked(score_sets, count, |a, b| b.average.total_cmp(&a.average))
}

/// Weakest items first; ties keep key order.
pub fn improvement_areas(score_sets: &[ScoreSet], count: usize) -> Vec<ItemAverage> {
    ranked(score_sets, count, |a, b| a.average.total_cmp(&b.average))
}

fn ranked<F>(score_sets: &[ScoreSet], count: usize, order: F) -> Vec<ItemAverage>
where
    F: Fn(&ItemAverage, &ItemAverage) -> Ordering,
{
    let mut averages = item_averages(score_sets);
    averages.sort_by(|a, b| order(a, b));
    averages.truncate(count);
    averages
}

/// Per-category mean of each evaluation's category mean (1-5 scale). Evaluations that
/// scored nothing in a category do not count towards it, and keys the catalog does not
/// know for the evaluation type are skipped.
pub fn category_averages(
    score_sets: &[ScoreSet],
    catalog: &ItemCatalog,
    evaluation_type: EvaluationType,
) -> BTreeMap<Category, f64> {
    let mut per_category: BTreeMap<Category, Vec<f64>> = BTreeMap::new();

    for scores in score_sets {
        let mut evaluation: BTreeMap<Category, (u32, usize)> = BTreeMap::new();
        for (key, score) in scores.iter() {
            if let Some(item) = catalog.item_for(key, evaluation_type) {
                let entry = evaluation.entry(item.category).or_default();
                entry.0 += u32::from(score);
                entry.1 += 1;
            }
        }
        for (category, (total, count)) in evaluation {
            per_category
                .entry(category)
                .or_default()
                .push(f64::from(total) / count as f64);
        }
    }

    per_category
        .into_iter()
        .map(|(category, means)| {
            let average = means.iter().sum::<f64>() / means.len() as f64;
            (category, average)
        })
        .collect()
}
