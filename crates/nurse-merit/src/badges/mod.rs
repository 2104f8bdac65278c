//! Badge eligibility: decides which badge tiers a nurse newly qualifies for.
//!
//! Each badge is assessed on its own. Tiers are tried from the highest bar down and the
//! first satisfied tier ends the search, so a single run awards at most one tier per badge
//! and never re-awards a tier that is already held.

mod catalog;
mod criteria;
mod domain;

#[cfg(test)]
mod tests;

pub use catalog::{BadgeCatalog, BadgeCatalogError};
pub use domain::{
    AwardKey, AwardedBadge, BadgeDefinition, BadgeId, Comparison, Criterion, Tier, TierName,
};

use std::collections::BTreeSet;

use serde::Serialize;

use crate::history::{chronological, EvaluationRecord, NurseId};

/// What a badge check concluded for one badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssessmentOutcome {
    Awarded {
        award: AwardedBadge,
    },
    /// The highest satisfied tier is already held.
    AlreadyHeld {
        tier: TierName,
    },
    /// A lower tier is satisfied while a higher tier of the same badge is held.
    Superseded {
        eligible: TierName,
        held: TierName,
    },
    NotEligible,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeAssessment {
    pub badge_id: BadgeId,
    #[serde(flatten)]
    pub outcome: AssessmentOutcome,
}

/// Badge eligibility over a validated catalog.
#[derive(Debug, Clone)]
pub struct BadgeEngine {
    catalog: BadgeCatalog,
}

impl BadgeEngine {
    pub fn new(catalog: BadgeCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    pub fn evaluate(
        &self,
        nurse_id: &NurseId,
        history: &[EvaluationRecord],
        already_awarded: &[AwardedBadge],
    ) -> Vec<AwardedBadge> {
        evaluate_badges_for_nurse(nurse_id, history, already_awarded, self.catalog.as_slice())
    }

    pub fn assess(
        &self,
        nurse_id: &NurseId,
        history: &[EvaluationRecord],
        already_awarded: &[AwardedBadge],
    ) -> Vec<BadgeAssessment> {
        assess_badges(nurse_id, history, already_awarded, self.catalog.as_slice())
    }
}

/// Newly qualifying awards for the nurse. Callers persist them.
pub fn evaluate_badges_for_nurse(
    nurse_id: &NurseId,
    history: &[EvaluationRecord],
    already_awarded: &[AwardedBadge],
    catalog: &[BadgeDefinition],
) -> Vec<AwardedBadge> {
    assess_badges(nurse_id, history, already_awarded, catalog)
        .into_iter()
        .filter_map(|assessment| match assessment.outcome {
            AssessmentOutcome::Awarded { award } => Some(award),
            _ => None,
        })
        .collect()
}

/// One assessment per catalog badge, in catalog order.
pub fn assess_badges(
    nurse_id: &NurseId,
    history: &[EvaluationRecord],
    already_awarded: &[AwardedBadge],
    catalog: &[BadgeDefinition],
) -> Vec<BadgeAssessment> {
    let ordered = chronological(history);
    let history: Vec<&EvaluationRecord> = ordered
        .into_iter()
        .filter(|record| &record.nurse_id == nurse_id)
        .collect();

    let held: BTreeSet<(&BadgeId, TierName)> = already_awarded
        .iter()
        .filter(|award| &award.nurse_id == nurse_id)
        .map(|award| (&award.badge_id, award.tier))
        .collect();

    catalog
        .iter()
        .map(|badge| BadgeAssessment {
            badge_id: badge.id.clone(),
            outcome: assess_badge(nurse_id, badge, &history, &held),
        })
        .collect()
}

fn assess_badge(
    nurse_id: &NurseId,
    badge: &BadgeDefinition,
    history: &[&EvaluationRecord],
    held: &BTreeSet<(&BadgeId, TierName)>,
) -> AssessmentOutcome {
    let tiers = badge.ordered_tiers();
    let is_held = |name: TierName| held.contains(&(&badge.id, name));

    for (position, tier) in tiers.iter().enumerate() {
        let Some(latest) = criteria::qualifying_record(&tier.criterion, history) else {
            continue;
        };

        if is_held(tier.name) {
            return AssessmentOutcome::AlreadyHeld { tier: tier.name };
        }

        if let Some(higher) = tiers[..position].iter().find(|higher| is_held(higher.name)) {
            return AssessmentOutcome::Superseded {
                eligible: tier.name,
                held: higher.name,
            };
        }

        return AssessmentOutcome::Awarded {
            award: AwardedBadge {
                nurse_id: nurse_id.clone(),
                badge_id: badge.id.clone(),
                tier: tier.name,
                awarded_at: latest.recorded_at,
            },
        };
    }

    AssessmentOutcome::NotEligible
}
