use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::awards::{
    AwardNotice, AwardNotifier, AwardRepository, AwardService, EvaluationSubmission,
    InMemoryAwardRepository, InMemoryEvaluationRepository, InMemoryNotifier, NotifyError,
    RepositoryError,
};
use crate::badges::{
    AwardedBadge, BadgeCatalog, BadgeDefinition, BadgeEngine, BadgeId, Comparison, Criterion,
    Tier, TierName,
};
use crate::history::NurseId;
use crate::scoring::{EvaluationType, ItemCatalog, ScoreSet, ScoringEngine};

pub(super) type MemoryService =
    AwardService<InMemoryEvaluationRepository, InMemoryAwardRepository, InMemoryNotifier>;

pub(super) fn nurse(id: &str) -> NurseId {
    NurseId::new(id)
}

pub(super) fn week(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap() + Duration::weeks(n)
}

fn latest_tier(name: TierName, value: f64) -> Tier {
    Tier {
        name,
        criterion: Criterion::AverageScore {
            value,
            operator: Comparison::Gte,
            period: Some(1),
            evaluation_type: None,
        },
    }
}

/// bronze >= 70, silver >= 85, gold >= 95 on the latest evaluation.
pub(super) fn badge_catalog() -> BadgeCatalog {
    BadgeCatalog::new(vec![BadgeDefinition {
        id: BadgeId::new("top_performer"),
        name: "Top Performer".to_string(),
        description: String::new(),
        icon: None,
        tiers: vec![
            latest_tier(TierName::Bronze, 70.0),
            latest_tier(TierName::Silver, 85.0),
            latest_tier(TierName::Gold, 95.0),
        ],
    }])
    .expect("fixture badges validate")
}

/// Adds a single-tier "Steady Hand" badge (>= 60) next to the top performer ladder.
pub(super) fn two_badge_catalog() -> BadgeCatalog {
    let mut badges = badge_catalog().as_slice().to_vec();
    badges.push(BadgeDefinition {
        id: BadgeId::new("steady_hand"),
        name: "Steady Hand".to_string(),
        description: String::new(),
        icon: None,
        tiers: vec![latest_tier(TierName::Bronze, 60.0)],
    });
    BadgeCatalog::new(badges).expect("fixture badges validate")
}

pub(super) fn engines() -> (ScoringEngine, BadgeEngine) {
    let items = ItemCatalog::standard().expect("standard rubric");
    (ScoringEngine::new(items), BadgeEngine::new(badge_catalog()))
}

/// Every weekly item scored the same, so the final score is `score * 20`.
pub(super) fn weekly_scores(score: u8) -> ScoreSet {
    let catalog = ItemCatalog::standard().expect("standard rubric");
    catalog
        .items_for(EvaluationType::Weekly)
        .map(|item| (item.key.clone(), score))
        .collect()
}

pub(super) fn weekly(nurse_id: &str, weeks: i64, score: u8) -> EvaluationSubmission {
    EvaluationSubmission {
        nurse_id: nurse(nurse_id),
        evaluation_type: EvaluationType::Weekly,
        recorded_at: week(weeks),
        scores: weekly_scores(score),
    }
}

pub(super) fn memory_service() -> (
    MemoryService,
    Arc<InMemoryEvaluationRepository>,
    Arc<InMemoryAwardRepository>,
    Arc<InMemoryNotifier>,
) {
    let evaluations = Arc::new(InMemoryEvaluationRepository::default());
    let awards = Arc::new(InMemoryAwardRepository::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let (scoring, badges) = engines();
    let service = AwardService::new(
        evaluations.clone(),
        awards.clone(),
        notifier.clone(),
        scoring,
        badges,
    );
    (service, evaluations, awards, notifier)
}

/// Award store that claims every award already exists.
pub(super) struct ConflictAwards;

impl AwardRepository for ConflictAwards {
    fn insert(&self, _award: AwardedBadge) -> Result<AwardedBadge, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn awarded(&self, _nurse_id: &NurseId) -> Result<Vec<AwardedBadge>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct OfflineAwards;

impl AwardRepository for OfflineAwards {
    fn insert(&self, _award: AwardedBadge) -> Result<AwardedBadge, RepositoryError> {
        Err(RepositoryError::Unavailable("award store offline".to_string()))
    }

    fn awarded(&self, _nurse_id: &NurseId) -> Result<Vec<AwardedBadge>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct FailingNotifier;

impl AwardNotifier for FailingNotifier {
    fn notify(&self, _notice: AwardNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp down".to_string()))
    }
}
