//! Rubric scoring: turns per-item 1-5 scores into a 0-100 final score.
//!
//! Weekly evaluations take the flat mean of every item. Monthly evaluations average each
//! category separately and combine the category percentages with the weights carried by
//! the [`ItemCatalog`].

mod catalog;
mod domain;
mod import;
mod rules;


pub use catalog::{CatalogError, ItemCatalog, WEIGHT_TOLERANCE};
pub use domain::{
    Category, EvaluationItem, EvaluationType, FinalScore, InvalidFinalScore, ItemKey, ScoreSet,
    MAX_ITEM_SCORE, MIN_ITEM_SCORE,
};

use serde::Serialize;

/// Scores evaluations against a validated rubric catalog.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: ItemCatalog,
}

impl ScoringEngine {
    pub fn new(catalog: ItemCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn final_score(
        &self,
        evaluation_type: EvaluationType,
        scores: &ScoreSet,
    ) -> Result<FinalScore, ScoringError> {
        compute_final_score(evaluation_type, scores, &self.catalog)
    }

    /// Final score together with the per-category trail used to reach it.
    pub fn breakdown(
        &self,
        evaluation_type: EvaluationType,
        scores: &ScoreSet,
    ) -> Result<ScoreBreakdown, ScoringError> {
        rules::score(evaluation_type, scores, &self.catalog)
    }
}

pub fn compute_final_score(
    evaluation_type: EvaluationType,
    scores: &ScoreSet,
    catalog: &ItemCatalog,
) -> Result<FinalScore, ScoringError> {
    rules::score(evaluation_type, scores, catalog).map(|breakdown| breakdown.final_score)
}

/// Contribution of one category to an evaluation, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub items_scored: usize,
    /// Mean on the 1-5 rubric scale; `None` when no item of the category was scored.
    pub mean: Option<f64>,
    pub percent: Option<f64>,
    pub weight: Option<f64>,
    pub contribution: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub evaluation_type: EvaluationType,
    pub final_score: FinalScore,
    pub categories: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("no item scores were provided")]
    EmptyScoreSet,
    #[error("item '{key}' is not part of the {evaluation_type} rubric")]
    UnknownItemKey {
        key: ItemKey,
        evaluation_type: EvaluationType,
    },
    #[error("item '{key}' scored {score}, expected 1-5")]
    ScoreOutOfRange { key: ItemKey, score: u8 },
}
