use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    BusinessDecision, BusinessId, BusinessProfile, IdentityId, JobId, JobPosting, SwipeDirection,
    WorkerId, WorkerProfile,
};
use super::error::MarketplaceError;
use super::identity::{AuthError, IdentityProvider};
use super::service::{MarketplaceService, RegisterBusinessRequest, RegisterWorkerRequest};
use super::session::failure_message;
use super::store::MarketplaceStore;

const DEFAULT_FEED_LIMIT: usize = 20;
const MAX_FEED_LIMIT: usize = 100;

type Shared<S, P> = State<Arc<MarketplaceService<S, P>>>;

/// Router builder exposing the marketplace over HTTP.
pub fn marketplace_router<S, P>(service: Arc<MarketplaceService<S, P>>) -> Router
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/workers", post(register_worker_handler::<S, P>))
        .route("/api/v1/workers/:worker_id", get(worker_handler::<S, P>))
        .route(
            "/api/v1/workers/:worker_id/profile",
            put(update_worker_profile_handler::<S, P>),
        )
        .route("/api/v1/workers/:worker_id/feed", get(feed_handler::<S, P>))
        .route(
            "/api/v1/workers/:worker_id/matches",
            get(worker_matches_handler::<S, P>),
        )
        .route("/api/v1/businesses", post(register_business_handler::<S, P>))
        .route(
            "/api/v1/businesses/:business_id",
            get(business_handler::<S, P>),
        )
        .route(
            "/api/v1/businesses/:business_id/profile",
            put(update_business_profile_handler::<S, P>),
        )
        .route(
            "/api/v1/businesses/:business_id/jobs",
            post(post_job_handler::<S, P>),
        )
        .route("/api/v1/jobs/:job_id", get(job_handler::<S, P>))
        .route("/api/v1/jobs/:job_id/close", post(close_job_handler::<S, P>))
        .route(
            "/api/v1/jobs/:job_id/matches",
            get(job_matches_handler::<S, P>),
        )
        .route("/api/v1/jobs/:job_id/swipes", post(swipe_handler::<S, P>))
        .route(
            "/api/v1/jobs/:job_id/decisions",
            post(decision_handler::<S, P>),
        )
        .route(
            "/api/v1/profiles/:identity/complete",
            post(complete_profile_handler::<S, P>),
        )
        .route(
            "/api/v1/profiles/:identity/route",
            get(profile_route_handler::<S, P>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SwipeRequest {
    worker_id: WorkerId,
    direction: SwipeDirection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    business_id: BusinessId,
    worker_id: WorkerId,
    decision: BusinessDecision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CloseJobRequest {
    business_id: BusinessId,
}

pub(crate) async fn register_worker_handler<S, P>(
    State(service): Shared<S, P>,
    Json(request): Json<RegisterWorkerRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.register_worker(request).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn worker_handler<S, P>(
    State(service): Shared<S, P>,
    Path(worker_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.worker(&WorkerId(worker_id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_worker_profile_handler<S, P>(
    State(service): Shared<S, P>,
    Path(worker_id): Path<String>,
    Json(profile): Json<WorkerProfile>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service
        .update_worker_profile(&WorkerId(worker_id), profile)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn feed_handler<S, P>(
    State(service): Shared<S, P>,
    Path(worker_id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .min(MAX_FEED_LIMIT);
    let worker_id = WorkerId(worker_id);
    match service.job_feed(&worker_id, limit).await {
        Ok(jobs) => {
            let payload = json!({
                "worker_id": worker_id,
                "jobs": jobs,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn worker_matches_handler<S, P>(
    State(service): Shared<S, P>,
    Path(worker_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    let worker_id = WorkerId(worker_id);
    match service.worker_matches(&worker_id).await {
        Ok(matches) => {
            let payload = json!({
                "worker_id": worker_id,
                "matches": matches,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_business_handler<S, P>(
    State(service): Shared<S, P>,
    Json(request): Json<RegisterBusinessRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.register_business(request).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn business_handler<S, P>(
    State(service): Shared<S, P>,
    Path(business_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.business(&BusinessId(business_id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_business_profile_handler<S, P>(
    State(service): Shared<S, P>,
    Path(business_id): Path<String>,
    Json(profile): Json<BusinessProfile>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service
        .update_business_profile(&BusinessId(business_id), profile)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn post_job_handler<S, P>(
    State(service): Shared<S, P>,
    Path(business_id): Path<String>,
    Json(posting): Json<JobPosting>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.post_job(&BusinessId(business_id), posting).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_handler<S, P>(
    State(service): Shared<S, P>,
    Path(job_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.job(&JobId(job_id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn close_job_handler<S, P>(
    State(service): Shared<S, P>,
    Path(job_id): Path<String>,
    Json(request): Json<CloseJobRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service.close_job(&request.business_id, &JobId(job_id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_matches_handler<S, P>(
    State(service): Shared<S, P>,
    Path(job_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    let job_id = JobId(job_id);
    match service.job_matches(&job_id).await {
        Ok(matches) => {
            let payload = json!({
                "job_id": job_id,
                "matches": matches,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn swipe_handler<S, P>(
    State(service): Shared<S, P>,
    Path(job_id): Path<String>,
    Json(request): Json<SwipeRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service
        .record_worker_swipe(&request.worker_id, &JobId(job_id), request.direction)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<S, P>(
    State(service): Shared<S, P>,
    Path(job_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    match service
        .record_business_decision(
            &request.business_id,
            &JobId(job_id),
            &request.worker_id,
            request.decision,
        )
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_profile_handler<S, P>(
    State(service): Shared<S, P>,
    Path(identity): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    let identity = IdentityId(identity);
    let transition = match service.complete_profile(&identity).await {
        Ok(transition) => transition,
        Err(error) => return error_response(error),
    };
    match service.profile_route(&identity).await {
        Ok(route) => {
            let payload = json!({
                "identity": identity,
                "transition": transition,
                "route": route,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn profile_route_handler<S, P>(
    State(service): Shared<S, P>,
    Path(identity): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    P: IdentityProvider + 'static,
{
    let identity = IdentityId(identity);
    match service.profile_route(&identity).await {
        Ok(route) => {
            let payload = json!({
                "identity": identity,
                "route": route,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
        AuthError::WeakPassword | AuthError::InvalidEmail => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        AuthError::UserDisabled => StatusCode::FORBIDDEN,
        AuthError::Provider { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub fn status_for(error: &MarketplaceError) -> StatusCode {
    match error {
        MarketplaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketplaceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MarketplaceError::UsernameTaken(_)
        | MarketplaceError::SwipeConflict { .. }
        | MarketplaceError::DecisionConflict { .. }
        | MarketplaceError::JobClosed(_) => StatusCode::CONFLICT,
        MarketplaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        MarketplaceError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        MarketplaceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        MarketplaceError::Auth(auth) => auth_status(auth),
    }
}

pub(crate) fn error_response(error: MarketplaceError) -> Response {
    let status = status_for(&error);
    let payload = match &error {
        MarketplaceError::Validation(errors) => json!({
            "error": error.to_string(),
            "fields": errors.errors,
        }),
        _ => json!({
            "error": error.to_string(),
            "message": failure_message(&error),
        }),
    };
    (status, Json(payload)).into_response()
}
