use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::repository::{
    AwardNotice, AwardNotifier, AwardRepository, EvaluationId, EvaluationRepository,
    NotifyError, RepositoryError, StoredEvaluation,
};
use crate::badges::{AwardKey, AwardedBadge};
use crate::history::NurseId;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} lock poisoned")))
}

#[derive(Debug, Default)]
pub struct InMemoryEvaluationRepository {
    evaluations: Mutex<BTreeMap<EvaluationId, StoredEvaluation>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert(&self, evaluation: StoredEvaluation) -> Result<StoredEvaluation, RepositoryError> {
        let mut guard = lock(&self.evaluations, "evaluation")?;
        if guard.contains_key(&evaluation.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(evaluation.id.clone(), evaluation.clone());
        Ok(evaluation)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<StoredEvaluation>, RepositoryError> {
        let guard = lock(&self.evaluations, "evaluation")?;
        Ok(guard.get(id).cloned())
    }

    fn evaluations_for(
        &self,
        nurse_id: &NurseId,
    ) -> Result<Vec<StoredEvaluation>, RepositoryError> {
        let guard = lock(&self.evaluations, "evaluation")?;
        Ok(guard
            .values()
            .filter(|evaluation| &evaluation.nurse_id == nurse_id)
            .cloned()
            .collect())
    }

    fn nurses(&self) -> Result<Vec<NurseId>, RepositoryError> {
        let guard = lock(&self.evaluations, "evaluation")?;
        let nurses: BTreeSet<&NurseId> = guard.values().map(|e| &e.nurse_id).collect();
        Ok(nurses.into_iter().cloned().collect())
    }
}

/// Award store with a unique (nurse, badge, tier) index.
#[derive(Debug, Default)]
pub struct InMemoryAwardRepository {
    awards: Mutex<BTreeMap<AwardKey, AwardedBadge>>,
}

impl InMemoryAwardRepository {
    pub fn all(&self) -> Result<Vec<AwardedBadge>, RepositoryError> {
        let guard = lock(&self.awards, "award")?;
        Ok(guard.values().cloned().collect())
    }
}

impl AwardRepository for InMemoryAwardRepository {
    fn insert(&self, award: AwardedBadge) -> Result<AwardedBadge, RepositoryError> {
        let mut guard = lock(&self.awards, "award")?;
        let key = award.key();
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, award.clone());
        Ok(award)
    }

    fn awarded(&self, nurse_id: &NurseId) -> Result<Vec<AwardedBadge>, RepositoryError> {
        let guard = lock(&self.awards, "award")?;
        Ok(guard
            .values()
            .filter(|award| &award.nurse_id == nurse_id)
            .cloned()
            .collect())
    }
}

/// Notifier that keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    notices: Mutex<Vec<AwardNotice>>,
}

impl InMemoryNotifier {
    pub fn notices(&self) -> Vec<AwardNotice> {
        match self.notices.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AwardNotifier for InMemoryNotifier {
    fn notify(&self, notice: AwardNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .map_err(|_| NotifyError::Transport("notice log poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::{BadgeId, TierName};
    use crate::scoring::{EvaluationType, FinalScore, ScoreSet};
    use chrono::{TimeZone, Utc};

    fn award(nurse: &str, tier: TierName) -> AwardedBadge {
        AwardedBadge {
            nurse_id: NurseId::new(nurse),
            badge_id: BadgeId::new("high_performer"),
            tier,
            awarded_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        }
    }

    fn evaluation(id: &str, nurse: &str) -> StoredEvaluation {
        StoredEvaluation {
            id: EvaluationId(id.to_string()),
            nurse_id: NurseId::new(nurse),
            evaluation_type: EvaluationType::Weekly,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            scores: ScoreSet::new(),
            final_score: FinalScore::new(80.0),
        }
    }

    #[test]
    fn award_index_is_unique_per_tier() {
        let repository = InMemoryAwardRepository::default();
        repository
            .insert(award("n-1", TierName::Gold))
            .expect("first insert");
        repository
            .insert(award("n-1", TierName::Silver))
            .expect("other tier");

        assert!(matches!(
            repository.insert(award("n-1", TierName::Gold)),
            Err(RepositoryError::Conflict)
        ));
        assert_eq!(
            repository
                .awarded(&NurseId::new("n-1"))
                .expect("awards")
                .len(),
            2
        );
        assert!(repository
            .awarded(&NurseId::new("n-2"))
            .expect("awards")
            .is_empty());
    }

    #[test]
    fn evaluation_history_is_scoped_to_the_nurse() {
        let repository = InMemoryEvaluationRepository::default();
        repository.insert(evaluation("eval-1", "n-1")).expect("insert");
        repository.insert(evaluation("eval-2", "n-2")).expect("insert");
        repository.insert(evaluation("eval-3", "n-1")).expect("insert");

        assert_eq!(
            repository.history(&NurseId::new("n-1")).expect("history").len(),
            2
        );
        let stored: Vec<EvaluationId> = repository
            .evaluations_for(&NurseId::new("n-1"))
            .expect("evaluations")
            .into_iter()
            .map(|evaluation| evaluation.id)
            .collect();
        assert_eq!(
            stored,
            vec![
                EvaluationId("eval-1".to_string()),
                EvaluationId("eval-3".to_string())
            ]
        );
        assert_eq!(
            repository.nurses().expect("nurses"),
            vec![NurseId::new("n-1"), NurseId::new("n-2")]
        );
        assert!(matches!(
            repository.insert(evaluation("eval-1", "n-3")),
            Err(RepositoryError::Conflict)
        ));
    }
}
