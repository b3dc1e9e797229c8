//! Moderation of community-reported job prices.
//!
//! Approved submissions are folded into per-job-type averages, every listed submission is
//! classified against those averages, and administrators approve, flag, or reject (delete)
//! submissions with each action written to an append-only audit log.

pub mod aggregate;
pub mod classifier;
pub mod domain;
pub mod import;
pub mod memory;
pub mod money;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod view_state;

#[cfg(test)]
mod tests;

pub use aggregate::{JobTypeAggregate, JobTypeAverageView, PriceAggregates};
pub use classifier::{AnomalyClassifier, AnomalyPolicy, PriceVerdict, Severity};
pub use domain::{
    AuditAction, AuditLogEntry, NewAuditEntry, PricingSubmission, RejectionError,
    RejectionReason, RejectionRequest, SubmissionId, SubmissionListing, SubmitterProfile, UserId,
    VerificationStatus, VerificationUpdate, PRICING_TARGET_TYPE,
};
pub use import::{ImportedSubmissions, SubmissionCsvImporter, SubmissionImportError};
pub use memory::{InMemoryAuditLog, InMemoryPricingStore};
pub use money::{format_gbp, format_percent};
pub use query::{StatusFilter, SubmissionQuery, DEFAULT_LIST_LIMIT};
pub use repository::{AuditError, AuditLog, RepositoryError, SubmissionRepository};
pub use router::{pricing_router, ADMIN_HEADER};
pub use service::{ModerationError, ModerationStats, PricingModerationService, ReviewedSubmission};
pub use view_state::{ModerationActionKind, ModerationViewState, ViewEvent};
