use std::sync::Arc;

use super::common::*;
use crate::awards::{
    AwardRepository, AwardService, AwardServiceError, EvaluationId, EvaluationRepository,
    InMemoryAwardRepository, InMemoryEvaluationRepository, InMemoryNotifier, NotifyError,
    RepositoryError, StoredEvaluation,
};
use crate::badges::{AwardedBadge, BadgeEngine, BadgeId, TierName};
use crate::scoring::{EvaluationType, FinalScore, ScoreSet, ScoringError};

#[test]
fn submit_scores_persists_and_awards() {
    let (service, evaluations, awards, notifier) = memory_service();

    let receipt = service.submit(weekly("n-1", 0, 4)).expect("submission succeeds");

    assert!(receipt.evaluation.id.0.starts_with("eval-"));
    assert!((receipt.evaluation.final_score.value() - 80.0).abs() < 1e-9);
    assert_eq!(
        evaluations
            .fetch(&receipt.evaluation.id)
            .expect("fetch succeeds"),
        Some(receipt.evaluation.clone())
    );

    assert_eq!(receipt.new_awards.len(), 1);
    let award = &receipt.new_awards[0];
    assert_eq!(award.tier, TierName::Bronze);
    assert_eq!(award.awarded_at, week(0));
    assert_eq!(awards.awarded(&nurse("n-1")).expect("awards"), receipt.new_awards);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].template, "badge_awarded");
    assert_eq!(notices[0].badge_name, "Top Performer");
    assert_eq!(notices[0].details["tier"], "bronze");
}

#[test]
fn later_submissions_upgrade_without_repeating_awards() {
    let (service, _evaluations, awards, notifier) = memory_service();

    service.submit(weekly("n-1", 0, 4)).expect("bronze week");
    let upgrade = service.submit(weekly("n-1", 1, 5)).expect("gold week");
    let repeat = service.submit(weekly("n-1", 2, 4)).expect("bronze again");

    assert_eq!(
        upgrade
            .new_awards
            .iter()
            .map(|award| award.tier)
            .collect::<Vec<_>>(),
        vec![TierName::Gold]
    );
    assert!(repeat.new_awards.is_empty());

    let tiers: Vec<TierName> = awards
        .awarded(&nurse("n-1"))
        .expect("awards")
        .into_iter()
        .map(|award| award.tier)
        .collect();
    assert_eq!(tiers, vec![TierName::Bronze, TierName::Gold]);
    assert_eq!(notifier.notices().len(), 2);
}

#[test]
fn held_higher_tier_blocks_a_lower_award() {
    let (service, _evaluations, awards, _notifier) = memory_service();

    awards
        .insert(AwardedBadge {
            nurse_id: nurse("n-1"),
            badge_id: BadgeId::new("top_performer"),
            tier: TierName::Gold,
            awarded_at: week(-4),
        })
        .expect("seed gold");

    let receipt = service.submit(weekly("n-1", 0, 4)).expect("submission succeeds");
    assert!(receipt.new_awards.is_empty());
    assert_eq!(awards.awarded(&nurse("n-1")).expect("awards").len(), 1);
}

#[test]
fn scoring_errors_stop_before_persisting() {
    let (service, evaluations, _awards, notifier) = memory_service();

    let mut submission = weekly("n-1", 0, 4);
    submission.scores = [("not_a_rubric_item", 4)].into_iter().collect::<ScoreSet>();

    match service.submit(submission) {
        Err(AwardServiceError::Scoring(ScoringError::UnknownItemKey {
            evaluation_type, ..
        })) => assert_eq!(evaluation_type, EvaluationType::Weekly),
        other => panic!("expected scoring error, got {other:?}"),
    }
    assert!(evaluations.nurses().expect("nurses").is_empty());
    assert!(notifier.notices().is_empty());
}

#[test]
fn conflicting_awards_are_skipped() {
    let evaluations = Arc::new(InMemoryEvaluationRepository::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let (scoring, badges) = engines();
    let service = AwardService::new(
        evaluations,
        Arc::new(ConflictAwards),
        notifier.clone(),
        scoring,
        badges,
    );

    let receipt = service.submit(weekly("n-1", 0, 5)).expect("conflict is not fatal");
    assert!(receipt.new_awards.is_empty());
    assert!(notifier.notices().is_empty());
}

#[test]
fn repository_outages_propagate() {
    let (scoring, badges) = engines();
    let service = AwardService::new(
        Arc::new(InMemoryEvaluationRepository::default()),
        Arc::new(OfflineAwards),
        Arc::new(InMemoryNotifier::default()),
        scoring,
        badges,
    );

    assert!(matches!(
        service.submit(weekly("n-1", 0, 5)),
        Err(AwardServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn notifier_failures_surface_after_the_award_is_stored() {
    let awards = Arc::new(InMemoryAwardRepository::default());
    let (scoring, _) = engines();
    let service = AwardService::new(
        Arc::new(InMemoryEvaluationRepository::default()),
        awards.clone(),
        Arc::new(FailingNotifier),
        scoring,
        BadgeEngine::new(two_badge_catalog()),
    );

    let receipt = service
        .submit(weekly("n-1", 0, 5))
        .expect("undelivered notices do not fail the submission");

    let mut stored: Vec<String> = awards
        .awarded(&nurse("n-1"))
        .expect("awards")
        .into_iter()
        .map(|award| award.badge_id.to_string())
        .collect();
    stored.sort();
    assert_eq!(stored, vec!["steady_hand", "top_performer"]);
    assert_eq!(receipt.new_awards.len(), 2);

    assert_eq!(receipt.notify_failures.len(), 2);
    assert!(receipt
        .notify_failures
        .iter()
        .all(|failure| failure.error == NotifyError::Transport("smtp down".to_string())));
}

#[test]
fn process_all_refreshes_every_nurse() {
    let (service, evaluations, awards, _notifier) = memory_service();

    // Stored directly so no badge run happens at submission time.
    for (id, nurse_id, score) in [("seed-1", "n-1", 100.0), ("seed-2", "n-2", 60.0)] {
        evaluations
            .insert(StoredEvaluation {
                id: EvaluationId(id.to_string()),
                nurse_id: nurse(nurse_id),
                evaluation_type: EvaluationType::Weekly,
                recorded_at: week(0),
                scores: weekly_scores(5),
                final_score: FinalScore::new(score),
            })
            .expect("seed evaluation");
    }

    let results = service.process_all().expect("batch succeeds");
    assert_eq!(results.len(), 2);
    assert_eq!(results[&nurse("n-1")].awards[0].tier, TierName::Gold);
    assert!(results[&nurse("n-2")].awards.is_empty());
    assert!(results.values().all(|refresh| refresh.notify_failures.is_empty()));

    let rerun = service.process_all().expect("second batch succeeds");
    assert!(rerun.values().all(|refresh| refresh.awards.is_empty()));
    assert_eq!(awards.all().expect("awards").len(), 1);
}

#[test]
fn stored_evaluations_are_looked_up_by_id() {
    let (service, _evaluations, _awards, _notifier) = memory_service();

    let receipt = service.submit(weekly("n-1", 0, 3)).expect("submission succeeds");
    assert_eq!(
        service.evaluation(&receipt.evaluation.id).expect("stored"),
        receipt.evaluation
    );

    assert!(matches!(
        service.evaluation(&EvaluationId("eval-missing".to_string())),
        Err(AwardServiceError::Repository(RepositoryError::NotFound))
    ));
}
