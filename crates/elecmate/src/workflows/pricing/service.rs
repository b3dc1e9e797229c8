use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::aggregate::PriceAggregates;
use super::classifier::{AnomalyClassifier, AnomalyPolicy, PriceVerdict};
use super::domain::{
    AuditAction, AuditLogEntry, NewAuditEntry, PricingSubmission,
    RejectionError, RejectionRequest, SubmissionId, SubmissionListing, UserId,
    VerificationStatus, VerificationUpdate, PRICING_TARGET_TYPE,
};
use super::money::format_gbp;
use super::query::{StatusFilter, SubmissionQuery, DEFAULT_LIST_LIMIT};
use super::repository::{AuditError, AuditLog, RepositoryError, SubmissionRepository};

/// Listing annotated with its price verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewedSubmission {
    #[serde(flatten)]
    pub listing: SubmissionListing,
    pub price_label: String,
    pub verdict: PriceVerdict,
}

/// Row counts for the moderation dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModerationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub flagged: usize,
}

/// Service composing the submission store, the audit log, and the anomaly policy.
pub struct PricingModerationService<S, L> {
    store: Arc<S>,
    audit: Arc<L>,
    policy: AnomalyPolicy,
    list_limit: usize,
}

impl<S, L> PricingModerationService<S, L>
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    pub fn new(store: Arc<S>, audit: Arc<L>, policy: AnomalyPolicy) -> Self {
        Self {
            store,
            audit,
            policy,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Caps listing reads below the default of 200 rows.
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit.min(DEFAULT_LIST_LIMIT);
        self
    }

    pub fn policy(&self) -> AnomalyPolicy {
        self.policy
    }

    pub fn list_limit(&self) -> usize {
        self.list_limit
    }

    pub fn list(
        &self,
        query: &SubmissionQuery,
    ) -> Result<Vec<SubmissionListing>, ModerationError> {
        Ok(self.store.list(query)?)
    }

    /// Aggregates over every approved submission, rebuilt on each call.
    pub fn averages(&self) -> Result<PriceAggregates, ModerationError> {
        let approved = self.store.approved()?;
        Ok(PriceAggregates::from_approved(&approved))
    }

    /// Listings with verdicts computed against a single aggregate snapshot.
    pub fn review(
        &self,
        query: &SubmissionQuery,
    ) -> Result<Vec<ReviewedSubmission>, ModerationError> {
        let listings = self.store.list(query)?;
        let aggregates = self.averages()?;
        let classifier = AnomalyClassifier::new(&aggregates, self.policy);

        Ok(listings
            .into_iter()
            .map(|listing| reviewed(&classifier, listing))
            .collect())
    }

    pub fn detail(&self, id: &SubmissionId) -> Result<ReviewedSubmission, ModerationError> {
        let listing = self
            .store
            .fetch(id)?
            .ok_or(ModerationError::NotFound(*id))?;
        let aggregates = self.averages()?;
        let classifier = AnomalyClassifier::new(&aggregates, self.policy);
        Ok(reviewed(&classifier, listing))
    }

    pub fn stats(&self) -> Result<ModerationStats, ModerationError> {
        Ok(ModerationStats {
            total: self.store.count(StatusFilter::All)?,
            pending: self.store.count(StatusFilter::Pending)?,
            approved: self.store.count(StatusFilter::Approved)?,
            flagged: self.store.count(StatusFilter::Flagged)?,
        })
    }

    pub fn approve(
        &self,
        id: &SubmissionId,
        actor: UserId,
    ) -> Result<PricingSubmission, ModerationError> {
        self.set_verification(
            id,
            actor,
            VerificationStatus::Approved,
            AuditAction::PricingApproved,
        )
    }

    pub fn flag(
        &self,
        id: &SubmissionId,
        actor: UserId,
    ) -> Result<PricingSubmission, ModerationError> {
        self.set_verification(
            id,
            actor,
            VerificationStatus::Flagged,
            AuditAction::PricingFlagged,
        )
    }

    /// Logs the deletion first, then removes the row. A failed log write leaves the row intact.
    pub fn reject(
        &self,
        id: &SubmissionId,
        actor: UserId,
        request: &RejectionRequest,
    ) -> Result<AuditLogEntry, ModerationError> {
        request.validate()?;

        if self.store.fetch(id)?.is_none() {
            return Err(ModerationError::NotFound(*id));
        }

        let mut details = json!({ "reasons": request.reasons });
        if let Some(other_text) = request.other_text.as_deref() {
            details["otherText"] = json!(other_text);
        }

        let entry = self
            .audit
            .append(NewAuditEntry {
                actor_id: actor,
                action: AuditAction::PricingDeleted,
                target_type: PRICING_TARGET_TYPE,
                target_id: *id,
                details: Some(details),
            })
            .inspect_err(|err| {
                warn!(submission = %id, %actor, error = %err, "audit write failed; submission kept");
            })?;

        self.store.delete(id).map_err(|err| {
            warn!(
                submission = %id,
                audit_entry = %entry.id,
                error = %err,
                "deletion failed after audit entry was written"
            );
            match err {
                RepositoryError::NotFound => ModerationError::NotFound(*id),
                other => ModerationError::Repository(other),
            }
        })?;

        info!(
            submission = %id,
            %actor,
            reasons = request.reasons.len(),
            "pricing submission rejected and deleted"
        );
        Ok(entry)
    }

    /// Applies the status change, then logs it. A failed log write restores the previous
    /// verification fields before the error is returned.
    fn set_verification(
        &self,
        id: &SubmissionId,
        actor: UserId,
        status: VerificationStatus,
        action: AuditAction,
    ) -> Result<PricingSubmission, ModerationError> {
        let previous = self
            .store
            .fetch(id)?
            .ok_or(ModerationError::NotFound(*id))?
            .submission;

        let update = VerificationUpdate {
            status,
            verified_by: actor,
            verified_at: Utc::now(),
        };

        let updated = self
            .store
            .update_verification(id, update)
            .map_err(|err| match err {
                RepositoryError::NotFound => ModerationError::NotFound(*id),
                other => ModerationError::Repository(other),
            })?;

        let appended = self.audit.append(NewAuditEntry {
            actor_id: actor,
            action,
            target_type: PRICING_TARGET_TYPE,
            target_id: *id,
            details: None,
        });

        if let Err(err) = appended {
            warn!(
                submission = %id,
                action = action.tag(),
                error = %err,
                "audit write failed; restoring previous status"
            );
            if let Err(restore_err) = self.store.restore_verification(&previous) {
                warn!(
                    submission = %id,
                    error = %restore_err,
                    "status left changed without an audit entry"
                );
            }
            return Err(ModerationError::Audit(err));
        }

        info!(
            submission = %id,
            %actor,
            status = status.label(),
            "pricing submission reviewed"
        );
        Ok(updated)
    }
}

fn reviewed(classifier: &AnomalyClassifier<'_>, listing: SubmissionListing) -> ReviewedSubmission {
    let verdict = classifier.classify(&listing.submission);
    ReviewedSubmission {
        price_label: format_gbp(listing.submission.actual_price),
        verdict,
        listing,
    }
}

/// Error raised by the moderation service.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("pricing submission {0} not found")]
    NotFound(SubmissionId),
    #[error(transparent)]
    Validation(#[from] RejectionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}
