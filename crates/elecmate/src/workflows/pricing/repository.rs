use super::domain::{
    AuditLogEntry, NewAuditEntry, PricingSubmission, SubmissionId, SubmissionListing,
    VerificationUpdate,
};
use super::query::{StatusFilter, SubmissionQuery};

/// CRUD boundary over the hosted `community_pricing_submissions` and `profiles` tables.
pub trait SubmissionRepository: Send + Sync {
    /// Filtered, searched, newest-first listing capped at `query.limit`.
    fn list(&self, query: &SubmissionQuery) -> Result<Vec<SubmissionListing>, RepositoryError>;
    /// Every approved submission, uncapped, for aggregation.
    fn approved(&self) -> Result<Vec<PricingSubmission>, RepositoryError>;
    fn count(&self, filter: StatusFilter) -> Result<usize, RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionListing>, RepositoryError>;
    fn update_verification(
        &self,
        id: &SubmissionId,
        update: VerificationUpdate,
    ) -> Result<PricingSubmission, RepositoryError>;
    /// Puts the verification fields of `previous` back onto the stored row.
    fn restore_verification(&self, previous: &PricingSubmission) -> Result<(), RepositoryError>;
    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError>;
    fn insert(&self, submission: PricingSubmission) -> Result<PricingSubmission, RepositoryError>;
}

/// Append-only sink for `admin_audit_logs`.
pub trait AuditLog: Send + Sync {
    fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError>;
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

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}
