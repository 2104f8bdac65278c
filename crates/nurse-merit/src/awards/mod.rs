//! Persistence-facing award workflow: score submissions, store them, and record the
//! badges they unlock through injected repository and notifier ports.

mod memory;
mod repository;
mod service;

#[cfg(test)]
mod tests;

pub use memory::{InMemoryAwardRepository, InMemoryEvaluationRepository, InMemoryNotifier};
pub use repository::{
    AwardNotice, AwardNotifier, AwardRepository, EvaluationId, EvaluationRepository,
    EvaluationSubmission, NotifyError, RepositoryError, StoredEvaluation,
};
pub use service::{
    AwardService, AwardServiceError, BadgeRefresh, NotifyFailure, SubmissionReceipt,
};
