use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badges::{AwardedBadge, BadgeId, TierName};
use crate::history::{EvaluationRecord, NurseId};
use crate::scoring::{EvaluationType, FinalScore, ScoreSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(pub String);

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw rubric scores for one evaluation, as handed in by a supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub nurse_id: NurseId,
    pub evaluation_type: EvaluationType,
    pub recorded_at: DateTime<Utc>,
    pub scores: ScoreSet,
}

/// Persisted evaluation with its computed final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvaluation {
    pub id: EvaluationId,
    pub nurse_id: NurseId,
    pub evaluation_type: EvaluationType,
    pub recorded_at: DateTime<Utc>,
    pub scores: ScoreSet,
    pub final_score: FinalScore,
}

impl StoredEvaluation {
    pub fn record(&self) -> EvaluationRecord {
        EvaluationRecord {
            nurse_id: self.nurse_id.clone(),
            evaluation_type: self.evaluation_type,
            recorded_at: self.recorded_at,
            final_score: self.final_score,
        }
    }
}

/// Storage for scored evaluations so the service can run without a database.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, evaluation: StoredEvaluation) -> Result<StoredEvaluation, RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<StoredEvaluation>, RepositoryError>;
    /// Stored evaluations of one nurse, rubric scores included.
    fn evaluations_for(
        &self,
        nurse_id: &NurseId,
    ) -> Result<Vec<StoredEvaluation>, RepositoryError>;

    fn history(&self, nurse_id: &NurseId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        Ok(self
            .evaluations_for(nurse_id)?
            .iter()
            .map(StoredEvaluation::record)
            .collect())
    }
    /// Every nurse with at least one stored evaluation.
    fn nurses(&self) -> Result<Vec<NurseId>, RepositoryError>;
}

/// Award storage. `insert` must reject a second row for the same (nurse, badge, tier)
/// with [`RepositoryError::Conflict`].
pub trait AwardRepository: Send + Sync {
    fn insert(&self, award: AwardedBadge) -> Result<AwardedBadge, RepositoryError>;
    fn awarded(&self, nurse_id: &NurseId) -> Result<Vec<AwardedBadge>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for award announcements (e-mail, dashboard feed).
pub trait AwardNotifier: Send + Sync {
    fn notify(&self, notice: AwardNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardNotice {
    pub template: String,
    pub nurse_id: NurseId,
    pub badge_id: BadgeId,
    pub badge_name: String,
    pub tier: TierName,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
