use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::domain::{BadgeDefinition, BadgeId, Comparison, Criterion, Tier, TierName};
use crate::scoring::{EvaluationType, FinalScore};

/// Badge definitions that passed structural validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BadgeCatalog {
    badges: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    pub fn new(badges: Vec<BadgeDefinition>) -> Result<Self, BadgeCatalogError> {
        let mut seen = BTreeSet::new();
        for badge in &badges {
            if !seen.insert(badge.id.clone()) {
                return Err(BadgeCatalogError::DuplicateBadge(badge.id.clone()));
            }
            validate_badge(badge)?;
        }

        Ok(Self { badges })
    }

    /// Seed catalog offered to new installations.
    pub fn standard() -> Result<Self, BadgeCatalogError> {
        Self::new(standard_badges())
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, BadgeCatalogError> {
        let badges: Vec<BadgeDefinition> = serde_json::from_reader(reader)?;
        Self::new(badges)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, BadgeCatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    pub fn get(&self, id: &BadgeId) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|badge| &badge.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BadgeDefinition> {
        self.badges.iter()
    }

    pub fn as_slice(&self) -> &[BadgeDefinition] {
        &self.badges
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}

fn validate_badge(badge: &BadgeDefinition) -> Result<(), BadgeCatalogError> {
    if badge.tiers.is_empty() {
        return Err(BadgeCatalogError::EmptyTiers(badge.id.clone()));
    }

    let mut names = BTreeSet::new();
    for tier in &badge.tiers {
        if !names.insert(tier.name) {
            return Err(BadgeCatalogError::DuplicateTier {
                badge: badge.id.clone(),
                tier: tier.name,
            });
        }

        if tier.criterion.period() == Some(0) {
            return Err(BadgeCatalogError::ZeroPeriod {
                badge: badge.id.clone(),
                tier: tier.name,
            });
        }

        let value = tier.criterion.value();
        if !value.is_finite() || !(0.0..=FinalScore::MAX).contains(&value) {
            return Err(BadgeCatalogError::InvalidThreshold {
                badge: badge.id.clone(),
                tier: tier.name,
                value,
            });
        }
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum BadgeCatalogError {
    #[error("badge '{0}' defines no tiers")]
    EmptyTiers(BadgeId),
    #[error("badge '{0}' is defined more than once")]
    DuplicateBadge(BadgeId),
    #[error("badge '{badge}' defines the {tier} tier more than once")]
    DuplicateTier { badge: BadgeId, tier: TierName },
    #[error("badge '{badge}' {tier} tier requires a period of at least one evaluation")]
    ZeroPeriod { badge: BadgeId, tier: TierName },
    #[error("badge '{badge}' {tier} tier threshold {value} is outside 0-100")]
    InvalidThreshold {
        badge: BadgeId,
        tier: TierName,
        value: f64,
    },
    #[error("invalid badge catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read badge catalog: {0}")]
    Io(#[from] std::io::Error),
}

fn tier(name: TierName, criterion: Criterion) -> Tier {
    Tier { name, criterion }
}

fn standard_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition {
            id: BadgeId::new("high_performer"),
            name: "High Performer".to_string(),
            description: "Average of the last three evaluations at or above the tier bar."
                .to_string(),
            icon: Some("Award".to_string()),
            tiers: [(TierName::Bronze, 80.0), (TierName::Silver, 90.0), (TierName::Gold, 95.0)]
                .into_iter()
                .map(|(name, value)| {
                    tier(
                        name,
                        Criterion::AverageScore {
                            value,
                            operator: Comparison::Gte,
                            period: Some(3),
                            evaluation_type: None,
                        },
                    )
                })
                .collect(),
        },
        BadgeDefinition {
            id: BadgeId::new("perfect_score"),
            name: "Perfect Score".to_string(),
            description: "A monthly evaluation scored at 100%.".to_string(),
            icon: Some("Zap".to_string()),
            tiers: vec![tier(
                TierName::Gold,
                Criterion::SpecificScore {
                    value: 100.0,
                    operator: Comparison::Eq,
                    period: Some(1),
                    evaluation_type: Some(EvaluationType::Monthly),
                },
            )],
        },
        BadgeDefinition {
            id: BadgeId::new("steady_hand"),
            name: "Steady Hand".to_string(),
            description: "Consecutive weekly evaluations that never dip below the bar."
                .to_string(),
            icon: Some("Shield".to_string()),
            tiers: vec![
                tier(
                    TierName::Bronze,
                    Criterion::Consistency {
                        value: 80.0,
                        operator: Comparison::Gte,
                        period: 4,
                        evaluation_type: Some(EvaluationType::Weekly),
                    },
                ),
                tier(
                    TierName::Silver,
                    Criterion::Consistency {
                        value: 85.0,
                        operator: Comparison::Gte,
                        period: 6,
                        evaluation_type: Some(EvaluationType::Weekly),
                    },
                ),
                tier(
                    TierName::Gold,
                    Criterion::Consistency {
                        value: 90.0,
                        operator: Comparison::Gte,
                        period: 8,
                        evaluation_type: Some(EvaluationType::Weekly),
                    },
                ),
            ],
        },
        BadgeDefinition {
            id: BadgeId::new("weekly_champion"),
            name: "Weekly Champion".to_string(),
            description: "Strong average across the last four weekly evaluations.".to_string(),
            icon: Some("Star".to_string()),
            tiers: vec![
                tier(
                    TierName::Silver,
                    Criterion::AverageScore {
                        value: 85.0,
                        operator: Comparison::Gte,
                        period: Some(4),
                        evaluation_type: Some(EvaluationType::Weekly),
                    },
                ),
                tier(
                    TierName::Gold,
                    Criterion::AverageScore {
                        value: 92.0,
                        operator: Comparison::Gte,
                        period: Some(4),
                        evaluation_type: Some(EvaluationType::Weekly),
                    },
                ),
            ],
        },
        BadgeDefinition {
            id: BadgeId::new("monthly_excellence"),
            name: "Monthly Excellence".to_string(),
            description: "Every monthly evaluation of the last quarter above the bar."
                .to_string(),
            icon: Some("TrendingUp".to_string()),
            tiers: vec![
                tier(
                    TierName::Silver,
                    Criterion::SpecificScore {
                        value: 90.0,
                        operator: Comparison::Gte,
                        period: Some(3),
                        evaluation_type: Some(EvaluationType::Monthly),
                    },
                ),
                tier(
                    TierName::Platinum,
                    Criterion::SpecificScore {
                        value: 96.0,
                        operator: Comparison::Gte,
                        period: Some(3),
                        evaluation_type: Some(EvaluationType::Monthly),
                    },
                ),
            ],
        },
    ]
}
