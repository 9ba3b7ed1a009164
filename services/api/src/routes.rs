use crate::infra::{AppState, InMemoryRateLimitStore, Marketplace};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use rentmatch::auth::SessionResolver;
use rentmatch::error::ApiError;
use rentmatch::rate_limit::{RateDecision, RateLimiter};
use rentmatch::workflows::listings::listing_router;
use rentmatch::workflows::matching::matching_router;
use rentmatch::workflows::viewings::viewing_router;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// API routers behind the rate limiter, plus the unthrottled operational endpoints.
pub(crate) fn marketplace_routes(
    marketplace: &Marketplace,
    sessions: Arc<dyn SessionResolver>,
) -> Router {
    let api = matching_router(marketplace.matching.clone(), sessions.clone())
        .merge(listing_router(marketplace.listings.clone(), sessions.clone()))
        .merge(viewing_router(marketplace.viewings.clone(), sessions))
        .layer(middleware::from_fn_with_state(
            marketplace.rate_limiter.clone(),
            rate_limit,
        ));

    api.route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Fixed-window limit per client IP and path. Requests without peer info share one bucket.
pub(crate) async fn rate_limit(
    State(limiter): State<Arc<RateLimiter<InMemoryRateLimitStore>>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = peer
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match limiter.check(&client, request.uri().path())? {
        RateDecision::Allowed { .. } => Ok(next.run(request).await),
        RateDecision::Limited { retry_after_secs } => {
            Err(ApiError::TooManyRequests { retry_after_secs })
        }
    }
}
