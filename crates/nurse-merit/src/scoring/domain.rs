use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest score a rubric item can receive.
pub const MIN_ITEM_SCORE: u8 = 1;
/// Highest score a rubric item can receive.
pub const MAX_ITEM_SCORE: u8 = 5;
/// Rescales a 1-5 rubric mean onto the 0-100 percentage scale.
pub(crate) const PERCENT_PER_POINT: f64 = 20.0;

/// Cadence of a supervisor evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Weekly,
    Monthly,
}

impl EvaluationType {
    pub const ALL: [EvaluationType; 2] = [EvaluationType::Weekly, EvaluationType::Monthly];

    pub fn label(&self) -> &'static str {
        match self {
            EvaluationType::Weekly => "weekly",
            EvaluationType::Monthly => "monthly",
        }
    }

    /// Monthly evaluations combine per-category means using catalog weights; weekly ones
    /// take a flat mean.
    pub fn is_weighted(&self) -> bool {
        matches!(self, EvaluationType::Monthly)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Some(Self::Weekly),
            "monthly" | "month" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rubric axis an item contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Behavioral,
    Care,
    Initiative,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Behavioral,
        Category::Care,
        Category::Initiative,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Behavioral => "behavioral",
            Category::Care => "care",
            Category::Initiative => "initiative",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.label() == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable identifier of a rubric question.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(pub String);

impl ItemKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single rubric question as maintained by the catalog administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationItem {
    pub key: ItemKey,
    pub question: String,
    pub category: Category,
    pub evaluation_types: BTreeSet<EvaluationType>,
    /// Weight of the item's category for weighted evaluation types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl EvaluationItem {
    pub fn applies_to(&self, evaluation_type: EvaluationType) -> bool {
        self.evaluation_types.contains(&evaluation_type)
    }
}

/// Item scores captured for one evaluation, keyed by item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet(BTreeMap<ItemKey, u8>);

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<ItemKey>, score: u8) -> Option<u8> {
        self.0.insert(key.into(), score)
    }

    pub fn get(&self, key: &ItemKey) -> Option<u8> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, u8)> {
        self.0.iter().map(|(key, score)| (key, *score))
    }
}

impl<K: Into<ItemKey>> FromIterator<(K, u8)> for ScoreSet {
    fn from_iter<T: IntoIterator<Item = (K, u8)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, score)| (key.into(), score))
                .collect(),
        )
    }
}

/// Percentage outcome of an evaluation, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FinalScore(f64);

impl FinalScore {
    pub const MAX: f64 = 100.0;

    /// Clamp into the percentage range; NaN collapses to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, Self::MAX))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Stored scores are taken as-is; anything outside the percentage range is rejected.
impl TryFrom<f64> for FinalScore {
    type Error = InvalidFinalScore;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && (0.0..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidFinalScore(value))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("final score {0} is outside 0-100")]
pub struct InvalidFinalScore(pub f64);

impl From<FinalScore> for f64 {
    fn from(score: FinalScore) -> Self {
        score.0
    }
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}
