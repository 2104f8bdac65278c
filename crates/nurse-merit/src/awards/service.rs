use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::repository::{
    AwardNotice, AwardNotifier, AwardRepository, EvaluationId, EvaluationRepository,
    EvaluationSubmission, NotifyError, RepositoryError, StoredEvaluation,
};
use crate::badges::{AssessmentOutcome, AwardedBadge, BadgeEngine};
use crate::history::NurseId;
use crate::scoring::{ScoringEngine, ScoringError};

/// Service composing the scoring and badge engines with their storage ports.
pub struct AwardService<E, A, N> {
    evaluations: Arc<E>,
    awards: Arc<A>,
    notifier: Arc<N>,
    scoring: Arc<ScoringEngine>,
    badges: Arc<BadgeEngine>,
}

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub evaluation: StoredEvaluation,
    pub new_awards: Vec<AwardedBadge>,
    pub notify_failures: Vec<NotifyFailure>,
}

/// Awards stored by one refresh. Notices that could not be delivered are reported
/// alongside; the awards themselves stay persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BadgeRefresh {
    pub awards: Vec<AwardedBadge>,
    pub notify_failures: Vec<NotifyFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotifyFailure {
    pub award: AwardedBadge,
    pub error: NotifyError,
}

impl<E, A, N> AwardService<E, A, N>
where
    E: EvaluationRepository + 'static,
    A: AwardRepository + 'static,
    N: AwardNotifier + 'static,
{
    pub fn new(
        evaluations: Arc<E>,
        awards: Arc<A>,
        notifier: Arc<N>,
        scoring: ScoringEngine,
        badges: BadgeEngine,
    ) -> Self {
        Self {
            evaluations,
            awards,
            notifier,
            scoring: Arc::new(scoring),
            badges: Arc::new(badges),
        }
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn badges(&self) -> &BadgeEngine {
        &self.badges
    }

    pub fn evaluation(&self, id: &EvaluationId) -> Result<StoredEvaluation, AwardServiceError> {
        let evaluation = self.evaluations.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(evaluation)
    }

    /// Score and persist an evaluation, then award whatever badges it unlocks.
    pub fn submit(
        &self,
        submission: EvaluationSubmission,
    ) -> Result<SubmissionReceipt, AwardServiceError> {
        let final_score = self
            .scoring
            .final_score(submission.evaluation_type, &submission.scores)?;

        let evaluation = StoredEvaluation {
            id: next_evaluation_id(),
            nurse_id: submission.nurse_id,
            evaluation_type: submission.evaluation_type,
            recorded_at: submission.recorded_at,
            scores: submission.scores,
            final_score,
        };
        let evaluation = self.evaluations.insert(evaluation)?;
        info!(
            evaluation = %evaluation.id,
            nurse = %evaluation.nurse_id,
            evaluation_type = %evaluation.evaluation_type,
            score = evaluation.final_score.value(),
            "evaluation recorded"
        );

        let refresh = self.refresh_badges(&evaluation.nurse_id)?;
        Ok(SubmissionReceipt {
            evaluation,
            new_awards: refresh.awards,
            notify_failures: refresh.notify_failures,
        })
    }

    /// Run badge eligibility over the nurse's stored history and persist new awards.
    ///
    /// Every award is stored before any notice goes out, so a failing notifier never
    /// drops an award.
    pub fn refresh_badges(&self, nurse_id: &NurseId) -> Result<BadgeRefresh, AwardServiceError> {
        let history = self.evaluations.history(nurse_id)?;
        let held = self.awards.awarded(nurse_id)?;

        let mut persisted = Vec::new();
        for assessment in self.badges.assess(nurse_id, &history, &held) {
            match assessment.outcome {
                AssessmentOutcome::Awarded { award } => match self.awards.insert(award) {
                    Ok(award) => {
                        info!(
                            nurse = %award.nurse_id,
                            badge = %award.badge_id,
                            tier = %award.tier,
                            "badge awarded"
                        );
                        persisted.push(award);
                    }
                    Err(RepositoryError::Conflict) => {
                        debug!(
                            nurse = %nurse_id,
                            badge = %assessment.badge_id,
                            "award already stored, skipping"
                        );
                    }
                    Err(error) => return Err(error.into()),
                },
                AssessmentOutcome::Superseded { eligible, held } => {
                    warn!(
                        nurse = %nurse_id,
                        badge = %assessment.badge_id,
                        eligible = %eligible,
                        held = %held,
                        "lower tier satisfied while a higher tier is held"
                    );
                }
                AssessmentOutcome::AlreadyHeld { tier } => {
                    debug!(
                        nurse = %nurse_id,
                        badge = %assessment.badge_id,
                        tier = %tier,
                        "tier already held"
                    );
                }
                AssessmentOutcome::NotEligible => {
                    debug!(nurse = %nurse_id, badge = %assessment.badge_id, "not eligible");
                }
            }
        }

        let mut notify_failures = Vec::new();
        for award in &persisted {
            if let Err(error) = self.notifier.notify(self.notice_for(award)) {
                warn!(
                    nurse = %award.nurse_id,
                    badge = %award.badge_id,
                    tier = %award.tier,
                    error = %error,
                    "award notice not delivered"
                );
                notify_failures.push(NotifyFailure {
                    award: award.clone(),
                    error,
                });
            }
        }

        Ok(BadgeRefresh {
            awards: persisted,
            notify_failures,
        })
    }

    /// Refresh badges for every nurse with stored evaluations.
    pub fn process_all(&self) -> Result<BTreeMap<NurseId, BadgeRefresh>, AwardServiceError> {
        let mut results = BTreeMap::new();
        for nurse_id in self.evaluations.nurses()? {
            let refresh = self.refresh_badges(&nurse_id)?;
            results.insert(nurse_id, refresh);
        }
        Ok(results)
    }

    fn notice_for(&self, award: &AwardedBadge) -> AwardNotice {
        let badge_name = self
            .badges
            .catalog()
            .get(&award.badge_id)
            .map(|badge| badge.name.clone())
            .unwrap_or_else(|| award.badge_id.to_string());

        let mut details = BTreeMap::new();
        details.insert("tier".to_string(), award.tier.label().to_string());
        details.insert("awarded_at".to_string(), award.awarded_at.to_rfc3339());

        AwardNotice {
            template: "badge_awarded".to_string(),
            nurse_id: award.nurse_id.clone(),
            badge_id: award.badge_id.clone(),
            badge_name,
            tier: award.tier,
            details,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AwardServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
