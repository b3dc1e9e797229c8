use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::domain::{
    AuditLogEntry, NewAuditEntry, PricingSubmission, SubmissionId, SubmissionListing,
    SubmitterProfile, UserId, VerificationUpdate,
};
use super::query::{StatusFilter, SubmissionQuery};
use super::repository::{AuditError, AuditLog, RepositoryError, SubmissionRepository};

#[derive(Default)]
struct StoreTables {
    submissions: HashMap<SubmissionId, PricingSubmission>,
    profiles: HashMap<UserId, SubmitterProfile>,
}

impl StoreTables {
    fn listing(&self, submission: &PricingSubmission) -> SubmissionListing {
        let submitter_name = submission
            .user_id
            .and_then(|user_id| self.profiles.get(&user_id))
            .and_then(|profile| profile.full_name.clone());

        SubmissionListing {
            submission: submission.clone(),
            submitter_name,
        }
    }
}

/// Process-local stand-in for the hosted submissions and profiles tables.
#[derive(Default, Clone)]
pub struct InMemoryPricingStore {
    tables: Arc<Mutex<StoreTables>>,
}

impl InMemoryPricingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn upsert_profile(&self, profile: SubmitterProfile) -> Result<(), RepositoryError> {
        self.lock()?.profiles.insert(profile.id, profile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|tables| tables.submissions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubmissionRepository for InMemoryPricingStore {
    fn list(&self, query: &SubmissionQuery) -> Result<Vec<SubmissionListing>, RepositoryError> {
        let tables = self.lock()?;
        let mut rows: Vec<SubmissionListing> = tables
            .submissions
            .values()
            .map(|submission| tables.listing(submission))
            .filter(|listing| query.matches(listing))
            .collect();

        rows.sort_by(|a, b| {
            b.submission
                .created_at
                .cmp(&a.submission.created_at)
                .then_with(|| a.submission.id.cmp(&b.submission.id))
        });
        rows.truncate(query.limit);
        Ok(rows)
    }

    fn approved(&self) -> Result<Vec<PricingSubmission>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .submissions
            .values()
            .filter(|submission| submission.is_approved())
            .cloned()
            .collect())
    }

    fn count(&self, filter: StatusFilter) -> Result<usize, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .submissions
            .values()
            .filter(|submission| filter.matches(submission.verification_status))
            .count())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionListing>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .submissions
            .get(id)
            .map(|submission| tables.listing(submission)))
    }

    fn update_verification(
        &self,
        id: &SubmissionId,
        update: VerificationUpdate,
    ) -> Result<PricingSubmission, RepositoryError> {
        let mut tables = self.lock()?;
        let submission = tables
            .submissions
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        submission.verification_status = Some(update.status);
        submission.verified_by = Some(update.verified_by);
        submission.verified_at = Some(update.verified_at);
        Ok(submission.clone())
    }

    fn restore_verification(&self, previous: &PricingSubmission) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let submission = tables
            .submissions
            .get_mut(&previous.id)
            .ok_or(RepositoryError::NotFound)?;
        submission.verification_status = previous.verification_status;
        submission.verified_by = previous.verified_by;
        submission.verified_at = previous.verified_at;
        Ok(())
    }

    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables
            .submissions
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn insert(&self, submission: PricingSubmission) -> Result<PricingSubmission, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.submissions.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }
}

/// Append-only audit log held in memory; `entries` exposes a snapshot for inspection.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditLogEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| AuditError::Unavailable("audit mutex poisoned".to_string()))?;

        let stored = AuditLogEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            details: entry.details,
            created_at: Utc::now(),
        };
        guard.push(stored.clone());
        Ok(stored)
    }
}
