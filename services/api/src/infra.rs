use chrono::{DateTime, Duration, TimeZone, Utc};
use elecmate::config::ModerationConfig;
use elecmate::error::AppError;
use elecmate::workflows::pricing::{
    AnomalyPolicy, ImportedSubmissions, InMemoryAuditLog, InMemoryPricingStore,
    PricingModerationService, PricingSubmission, StatusFilter, SubmissionCsvImporter,
    SubmitterProfile, UserId, VerificationStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryModerationService =
    PricingModerationService<InMemoryPricingStore, InMemoryAuditLog>;

/// Service over fresh in-memory tables, plus handles on those tables.
pub(crate) struct ModerationStack {
    pub(crate) service: Arc<MemoryModerationService>,
    pub(crate) store: Arc<InMemoryPricingStore>,
    pub(crate) audit: Arc<InMemoryAuditLog>,
}

pub(crate) fn moderation_stack(policy: AnomalyPolicy, list_limit: usize) -> ModerationStack {
    let store = Arc::new(InMemoryPricingStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let service = Arc::new(
        PricingModerationService::new(store.clone(), audit.clone(), policy)
            .with_list_limit(list_limit),
    );
    ModerationStack {
        service,
        store,
        audit,
    }
}

/// Builds the stack for `serve`, seeding from the configured CSV when present.
pub(crate) fn seeded_stack(config: &ModerationConfig) -> Result<ModerationStack, AppError> {
    let stack = moderation_stack(config.policy, config.list_limit);
    if let Some(path) = &config.seed_csv {
        let loaded = load_csv_into(&stack, path)?;
        info!(path = %path.display(), submissions = loaded, "seeded pricing submissions");
    }
    Ok(stack)
}

pub(crate) fn load_csv_into(stack: &ModerationStack, path: &Path) -> Result<usize, AppError> {
    let imported = SubmissionCsvImporter::from_path(path)?;
    load_imported(stack, &imported)
}

pub(crate) fn load_imported(
    stack: &ModerationStack,
    imported: &ImportedSubmissions,
) -> Result<usize, AppError> {
    for profile in &imported.profiles {
        stack
            .store
            .upsert_profile(profile.clone())
            .map_err(elecmate::workflows::pricing::SubmissionImportError::from)?;
    }
    Ok(imported.load_into(stack.store.as_ref())?)
}

pub(crate) fn demo_admin() -> UserId {
    UserId(Uuid::from_u128(0xad01))
}

fn demo_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Approved history for two job types plus a pending queue that exercises every verdict.
pub(crate) fn demo_dataset() -> ImportedSubmissions {
    let electrician = SubmitterProfile {
        id: UserId(Uuid::from_u128(0x5eed_0001)),
        full_name: Some("Dylan Hughes".to_string()),
    };
    let approved = Some(VerificationStatus::Approved);
    let mut submissions = Vec::new();
    let mut minute = 0;
    let mut push = |job_type: &str,
                    price: f64,
                    postcode: &str,
                    status: Option<VerificationStatus>,
                    description: Option<&str>| {
        let mut submission =
            PricingSubmission::new(job_type, price, demo_epoch() + Duration::minutes(minute));
        minute += 7;
        submission.postcode_district = Some(postcode.to_string());
        submission.user_id = Some(electrician.id);
        submission.verification_status = status;
        submission.job_description = description.map(str::to_string);
        submissions.push(submission);
    };

    for price in [450.0, 470.0, 460.0, 480.0, 440.0] {
        push("Consumer Unit Change", price, "CF10", approved, None);
    }
    push("Garden Lighting", 300.0, "NP20", approved, None);
    push("Garden Lighting", 340.0, "NP20", approved, None);

    push(
        "Consumer Unit Change",
        465.0,
        "CF14",
        None,
        Some("Split-load board, 10 ways"),
    );
    push(
        "Consumer Unit Change",
        700.0,
        "CF11",
        None,
        Some("Board swap with SPD"),
    );
    push(
        "Consumer Unit Change",
        1_000.0,
        "CF24",
        Some(VerificationStatus::Pending),
        Some("Board swap, weekend call-out"),
    );
    push("Garden Lighting", 2_400.0, "NP19", None, Some("12 bollards"));
    push("Consumer Unit Change", 1.0, "CF5", None, Some("test"));

    ImportedSubmissions {
        submissions,
        profiles: vec![electrician],
    }
}

pub(crate) fn parse_status_filter(raw: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(raw).ok_or_else(|| {
        format!("unknown status '{raw}' (expected pending, approved, rejected, flagged, or all)")
    })
}
