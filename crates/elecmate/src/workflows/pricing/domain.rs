use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for community pricing submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a row in `profiles`, used for submitters and administrators alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review state observed at rest. Rejection deletes the row, so there is no rejected variant;
/// an unset status (`None` on the submission) reads the same as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Flagged,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Flagged => "flagged",
        }
    }
}

/// A user-reported real-world job price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSubmission {
    pub id: SubmissionId,
    pub user_id: Option<UserId>,
    pub postcode_district: Option<String>,
    pub job_type: String,
    /// Reported price in GBP.
    pub actual_price: f64,
    pub job_description: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub materials_cost: Option<f64>,
    pub labour_hours: Option<f64>,
    pub complexity_notes: Option<String>,
    pub verification_status: Option<VerificationStatus>,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PricingSubmission {
    /// Minimal submission awaiting review; optional details default to empty.
    pub fn new(job_type: impl Into<String>, actual_price: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::new(),
            user_id: None,
            postcode_district: None,
            job_type: job_type.into(),
            actual_price,
            job_description: None,
            completion_date: None,
            materials_cost: None,
            labour_hours: None,
            complexity_notes: None,
            verification_status: None,
            verified_by: None,
            verified_at: None,
            created_at,
        }
    }

    pub fn awaiting_review(&self) -> bool {
        matches!(
            self.verification_status,
            None | Some(VerificationStatus::Pending)
        )
    }

    pub fn is_approved(&self) -> bool {
        self.verification_status == Some(VerificationStatus::Approved)
    }

    pub fn status_label(&self) -> &'static str {
        self.verification_status
            .unwrap_or(VerificationStatus::Pending)
            .label()
    }
}

/// Status change applied by approve and flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationUpdate {
    pub status: VerificationStatus,
    pub verified_by: UserId,
    pub verified_at: DateTime<Utc>,
}

/// Row from `profiles` needed to show who submitted a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterProfile {
    pub id: UserId,
    pub full_name: Option<String>,
}

/// Submission joined with its submitter's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionListing {
    pub submission: PricingSubmission,
    pub submitter_name: Option<String>,
}

/// Fixed reasons offered by the rejection dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    Unrealistic,
    Spam,
    Incomplete,
    Duplicate,
    Other,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 5] = [
        RejectionReason::Unrealistic,
        RejectionReason::Spam,
        RejectionReason::Incomplete,
        RejectionReason::Duplicate,
        RejectionReason::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RejectionReason::Unrealistic => "Unrealistic price",
            RejectionReason::Spam => "Spam or test entry",
            RejectionReason::Incomplete => "Incomplete information",
            RejectionReason::Duplicate => "Duplicate submission",
            RejectionReason::Other => "Other",
        }
    }
}

/// Reasons chosen by the administrator plus an optional free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRequest {
    pub reasons: Vec<RejectionReason>,
    #[serde(default)]
    pub other_text: Option<String>,
}

impl RejectionRequest {
    pub fn validate(&self) -> Result<(), RejectionError> {
        if self.reasons.is_empty() {
            return Err(RejectionError::NoReasonSelected);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionError {
    #[error("select at least one rejection reason")]
    NoReasonSelected,
}

/// Tags written to `admin_audit_logs.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PricingApproved,
    PricingDeleted,
    PricingFlagged,
}

impl AuditAction {
    pub const fn tag(self) -> &'static str {
        match self {
            AuditAction::PricingApproved => "pricing_approved",
            AuditAction::PricingDeleted => "pricing_deleted",
            AuditAction::PricingFlagged => "pricing_flagged",
        }
    }
}

pub const PRICING_TARGET_TYPE: &str = "community_pricing_submission";

/// Audit entry as handed to the log; id and timestamp are assigned on append.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditEntry {
    pub actor_id: UserId,
    pub action: AuditAction,
    pub target_type: &'static str,
    pub target_id: SubmissionId,
    pub details: Option<serde_json::Value>,
}

/// Immutable record of an administrative action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: UserId,
    pub action: AuditAction,
    pub target_type: &'static str,
    pub target_id: SubmissionId,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
