use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::NurseId;
use crate::scoring::EvaluationType;

const EQ_TOLERANCE: f64 = 1e-9;

/// Identifier wrapper for badge definitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(pub String);

impl BadgeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Qualification level of a badge, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierName {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl TierName {
    pub fn label(&self) -> &'static str {
        match self {
            TierName::Bronze => "bronze",
            TierName::Silver => "silver",
            TierName::Gold => "gold",
            TierName::Platinum => "platinum",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    Gte,
    Lte,
    Eq,
}

impl Comparison {
    pub fn holds(&self, actual: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gte => actual >= threshold,
            Comparison::Lte => actual <= threshold,
            Comparison::Eq => (actual - threshold).abs() <= EQ_TOLERANCE,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
            Comparison::Eq => "==",
        }
    }
}

/// Rule deciding whether a tier is earned. Thresholds are on the 0-100 final score scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    /// Mean final score over the window.
    AverageScore {
        value: f64,
        #[serde(default)]
        operator: Comparison,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evaluation_type: Option<EvaluationType>,
    },
    /// Every evaluation in the window must pass on its own.
    SpecificScore {
        value: f64,
        #[serde(default)]
        operator: Comparison,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evaluation_type: Option<EvaluationType>,
    },
    /// A run of `period` consecutive passing evaluations.
    Consistency {
        value: f64,
        #[serde(default)]
        operator: Comparison,
        period: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evaluation_type: Option<EvaluationType>,
    },
}

impl Criterion {
    pub fn value(&self) -> f64 {
        match self {
            Criterion::AverageScore { value, .. }
            | Criterion::SpecificScore { value, .. }
            | Criterion::Consistency { value, .. } => *value,
        }
    }

    pub fn operator(&self) -> Comparison {
        match self {
            Criterion::AverageScore { operator, .. }
            | Criterion::SpecificScore { operator, .. }
            | Criterion::Consistency { operator, .. } => *operator,
        }
    }

    pub fn period(&self) -> Option<u32> {
        match self {
            Criterion::AverageScore { period, .. } | Criterion::SpecificScore { period, .. } => {
                *period
            }
            Criterion::Consistency { period, .. } => Some(*period),
        }
    }

    pub fn evaluation_type(&self) -> Option<EvaluationType> {
        match self {
            Criterion::AverageScore {
                evaluation_type, ..
            }
            | Criterion::SpecificScore {
                evaluation_type, ..
            }
            | Criterion::Consistency {
                evaluation_type, ..
            } => *evaluation_type,
        }
    }

    pub fn describe(&self) -> String {
        let subject = match self {
            Criterion::AverageScore { .. } => "average score",
            Criterion::SpecificScore { .. } => "every score",
            Criterion::Consistency { .. } => "consecutive scores",
        };
        let scope = match (self.period(), self.evaluation_type()) {
            (Some(period), Some(kind)) => format!(" over the last {period} {kind} evaluations"),
            (Some(period), None) => format!(" over the last {period} evaluations"),
            (None, Some(kind)) => format!(" across all {kind} evaluations"),
            (None, None) => " across all evaluations".to_string(),
        };
        format!(
            "{subject} {} {}{scope}",
            self.operator().symbol(),
            self.value()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: TierName,
    pub criterion: Criterion,
}

/// Badge managed by administrators, with independently evaluable tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub tiers: Vec<Tier>,
}

impl BadgeDefinition {
    /// Tiers in evaluation order: highest threshold first, ties broken by tier rank.
    pub fn ordered_tiers(&self) -> Vec<&Tier> {
        let mut tiers: Vec<&Tier> = self.tiers.iter().collect();
        tiers.sort_by(|a, b| {
            b.criterion
                .value()
                .partial_cmp(&a.criterion.value())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.name.cmp(&a.name))
        });
        tiers
    }
}

/// Write-once award of one badge tier to a nurse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub nurse_id: NurseId,
    pub badge_id: BadgeId,
    pub tier: TierName,
    pub awarded_at: DateTime<Utc>,
}

impl AwardedBadge {
    pub fn key(&self) -> AwardKey {
        AwardKey {
            nurse_id: self.nurse_id.clone(),
            badge_id: self.badge_id.clone(),
            tier: self.tier,
        }
    }
}

/// Uniqueness key of an award: one row per (nurse, badge, tier).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AwardKey {
    pub nurse_id: NurseId,
    pub badge_id: BadgeId,
    pub tier: TierName,
}
