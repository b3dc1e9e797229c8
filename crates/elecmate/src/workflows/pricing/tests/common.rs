use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::workflows::pricing::domain::{
    AuditLogEntry, NewAuditEntry, PricingSubmission, SubmissionId, SubmissionListing, UserId,
    VerificationStatus, VerificationUpdate,
};
use crate::workflows::pricing::memory::{InMemoryAuditLog, InMemoryPricingStore};
use crate::workflows::pricing::query::{StatusFilter, SubmissionQuery};
use crate::workflows::pricing::repository::{
    AuditError, AuditLog, RepositoryError, SubmissionRepository,
};
use crate::workflows::pricing::{pricing_router, AnomalyPolicy, PricingModerationService};

pub(super) fn admin() -> UserId {
    UserId(Uuid::from_u128(0xa11ce))
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn submission(
    job_type: &str,
    price: f64,
    status: Option<VerificationStatus>,
    minutes: i64,
) -> PricingSubmission {
    let mut submission =
        PricingSubmission::new(job_type, price, base_time() + Duration::minutes(minutes));
    submission.verification_status = status;
    submission.postcode_district = Some("M14".to_string());
    submission
}

/// Five approved consumer unit changes averaging £460 plus two approved garden lighting jobs.
pub(super) fn seed(store: &InMemoryPricingStore) {
    let approved = Some(VerificationStatus::Approved);
    for (offset, price) in [450.0, 470.0, 460.0, 480.0, 440.0].into_iter().enumerate() {
        store
            .insert(submission(
                "Consumer Unit Change",
                price,
                approved,
                offset as i64,
            ))
            .expect("seed insert");
    }
    for (offset, price) in [300.0, 320.0].into_iter().enumerate() {
        store
            .insert(submission("Garden Lighting", price, approved, 10 + offset as i64))
            .expect("seed insert");
    }
}

pub(super) fn insert_pending(store: &InMemoryPricingStore, job_type: &str, price: f64) -> SubmissionId {
    let pending = submission(job_type, price, None, 60);
    let id = pending.id;
    store.insert(pending).expect("pending insert");
    id
}

pub(super) type MemoryService = PricingModerationService<InMemoryPricingStore, InMemoryAuditLog>;

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryPricingStore>, Arc<InMemoryAuditLog>) {
    let store = Arc::new(InMemoryPricingStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    seed(&store);
    let service = PricingModerationService::new(store.clone(), audit.clone(), AnomalyPolicy::default());
    (service, store, audit)
}

/// Audit log that refuses every write and counts the attempts.
#[derive(Default)]
pub(super) struct FailingAuditLog {
    pub(super) attempts: AtomicUsize,
}

impl AuditLog for FailingAuditLog {
    fn append(&self, _entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::Unavailable("admin_audit_logs insert failed".to_string()))
    }
}

/// Store whose reads succeed but whose deletes always fail. With `vanished` set the
/// delete reports the row as already gone.
pub(super) struct UndeletableStore {
    pub(super) inner: InMemoryPricingStore,
    pub(super) vanished: bool,
}

impl SubmissionRepository for UndeletableStore {
    fn list(&self, query: &SubmissionQuery) -> Result<Vec<SubmissionListing>, RepositoryError> {
        self.inner.list(query)
    }

    fn approved(&self) -> Result<Vec<PricingSubmission>, RepositoryError> {
        self.inner.approved()
    }

    fn count(&self, filter: StatusFilter) -> Result<usize, RepositoryError> {
        self.inner.count(filter)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionListing>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update_verification(
        &self,
        id: &SubmissionId,
        update: VerificationUpdate,
    ) -> Result<PricingSubmission, RepositoryError> {
        self.inner.update_verification(id, update)
    }

    fn restore_verification(&self, previous: &PricingSubmission) -> Result<(), RepositoryError> {
        self.inner.restore_verification(previous)
    }

    fn delete(&self, _id: &SubmissionId) -> Result<(), RepositoryError> {
        if self.vanished {
            return Err(RepositoryError::NotFound);
        }
        Err(RepositoryError::Unavailable("delete timed out".to_string()))
    }

    fn insert(&self, submission: PricingSubmission) -> Result<PricingSubmission, RepositoryError> {
        self.inner.insert(submission)
    }
}

pub(super) struct UnavailableStore;

impl SubmissionRepository for UnavailableStore {
    fn list(&self, _query: &SubmissionQuery) -> Result<Vec<SubmissionListing>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn approved(&self) -> Result<Vec<PricingSubmission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self, _filter: StatusFilter) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<SubmissionListing>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_verification(
        &self,
        _id: &SubmissionId,
        _update: VerificationUpdate,
    ) -> Result<PricingSubmission, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn restore_verification(&self, _previous: &PricingSubmission) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &SubmissionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _submission: PricingSubmission) -> Result<PricingSubmission, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service<S, L>(service: PricingModerationService<S, L>) -> axum::Router
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    pricing_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
