use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{RejectionRequest, SubmissionId, UserId};
use super::query::{StatusFilter, SubmissionQuery};
use super::repository::{AuditLog, SubmissionRepository};
use super::service::{ModerationError, PricingModerationService};

/// Header carrying the acting administrator's profile id.
pub const ADMIN_HEADER: &str = "x-admin-id";

/// Router builder exposing the admin moderation endpoints.
pub fn pricing_router<S, L>(service: Arc<PricingModerationService<S, L>>) -> Router
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/admin/pricing/submissions",
            get(list_handler::<S, L>),
        )
        .route(
            "/api/v1/admin/pricing/submissions/:submission_id",
            get(detail_handler::<S, L>),
        )
        .route(
            "/api/v1/admin/pricing/submissions/:submission_id/approve",
            post(approve_handler::<S, L>),
        )
        .route(
            "/api/v1/admin/pricing/submissions/:submission_id/flag",
            post(flag_handler::<S, L>),
        )
        .route(
            "/api/v1/admin/pricing/submissions/:submission_id/reject",
            post(reject_handler::<S, L>),
        )
        .route("/api/v1/admin/pricing/stats", get(stats_handler::<S, L>))
        .route(
            "/api/v1/admin/pricing/averages",
            get(averages_handler::<S, L>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub(crate) async fn list_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    let status = match params.status.as_deref() {
        Some(raw) => match StatusFilter::parse(raw) {
            Some(status) => status,
            None => {
                let payload = json!({ "error": format!("unknown status filter '{raw}'") });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        },
        None => StatusFilter::default(),
    };

    let limit = params
        .limit
        .unwrap_or(service.list_limit())
        .min(service.list_limit());
    let mut query = SubmissionQuery::new(status).with_limit(limit);
    if let Some(search) = params.search {
        query = query.with_search(search);
    }

    match service.review(&query) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
    Path(submission_id): Path<Uuid>,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    match service.detail(&SubmissionId(submission_id)) {
        Ok(row) => (StatusCode::OK, Json(row)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
    Path(submission_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    let actor = match admin_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.approve(&SubmissionId(submission_id), actor) {
        Ok(submission) => (StatusCode::OK, Json(submission)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn flag_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
    Path(submission_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    let actor = match admin_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.flag(&SubmissionId(submission_id), actor) {
        Ok(submission) => (StatusCode::OK, Json(submission)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
    Path(submission_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<RejectionRequest>,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    let actor = match admin_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.reject(&SubmissionId(submission_id), actor, &request) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stats_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn averages_handler<S, L>(
    State(service): State<Arc<PricingModerationService<S, L>>>,
) -> Response
where
    S: SubmissionRepository + 'static,
    L: AuditLog + 'static,
{
    match service.averages() {
        Ok(aggregates) => (StatusCode::OK, Json(aggregates.views())).into_response(),
        Err(err) => error_response(err),
    }
}

fn admin_from_headers(headers: &HeaderMap) -> Result<UserId, Response> {
    headers
        .get(ADMIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(UserId)
        .ok_or_else(|| {
            let payload = json!({ "error": format!("missing or invalid {ADMIN_HEADER} header") });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

fn error_response(err: ModerationError) -> Response {
    let status = match &err {
        ModerationError::NotFound(_) => StatusCode::NOT_FOUND,
        ModerationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ModerationError::Repository(_) | ModerationError::Audit(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
