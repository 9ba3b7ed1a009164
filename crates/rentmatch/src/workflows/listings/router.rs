use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::domain::{DraftStep, PropertyId};
use super::repository::ListingRepository;
use super::service::ListingService;
use crate::auth::{session_from_headers, SessionResolver};
use crate::error::ApiError;
use crate::notifications::NotificationPublisher;
use crate::workflows::matching::repository::ProfileRepository;
use crate::workflows::respond;
use crate::workflows::viewings::domain::LandlordAvailabilityPreference;

pub struct ListingRoutes<L, P, N> {
    service: Arc<ListingService<L, P, N>>,
    sessions: Arc<dyn SessionResolver>,
}

impl<L, P, N> Clone for ListingRoutes<L, P, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionBody {
    #[serde(default)]
    reason: String,
}

/// Router builder exposing the listing form and review endpoints.
pub fn listing_router<L, P, N>(
    service: Arc<ListingService<L, P, N>>,
    sessions: Arc<dyn SessionResolver>,
) -> Router
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/listings", post(create_handler::<L, P, N>))
        .route(
            "/api/v1/listings/:property_id",
            get(fetch_handler::<L, P, N>).patch(update_handler::<L, P, N>),
        )
        .route(
            "/api/v1/listings/:property_id/submit",
            post(submit_handler::<L, P, N>),
        )
        .route(
            "/api/v1/listings/:property_id/approve",
            post(approve_handler::<L, P, N>),
        )
        .route(
            "/api/v1/listings/:property_id/reject",
            post(reject_handler::<L, P, N>),
        )
        .route(
            "/api/v1/listings/:property_id/archive",
            post(archive_handler::<L, P, N>),
        )
        .route(
            "/api/v1/landlords/me/availability",
            get(availability_handler::<L, P, N>).put(set_availability_handler::<L, P, N>),
        )
        .with_state(ListingRoutes { service, sessions })
}

pub(crate) async fn create_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let record = routes.service.create_draft(&session, Utc::now())?;
    Ok(respond(StatusCode::CREATED, record))
}

pub(crate) async fn fetch_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    Path(property_id): Path<String>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let record = routes.service.get(&PropertyId(property_id))?;
    Ok(respond(StatusCode::OK, record))
}

pub(crate) async fn update_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    payload: Result<Json<DraftStep>, JsonRejection>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let Json(step) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let record =
        routes
            .service
            .update_draft(&session, &PropertyId(property_id), step, Utc::now())?;
    Ok(respond(StatusCode::OK, record))
}

pub(crate) async fn submit_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let record = routes
        .service
        .submit(&session, &PropertyId(property_id), Utc::now())?;
    Ok(respond(StatusCode::OK, record))
}

pub(crate) async fn approve_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let outcome = routes
        .service
        .approve(&session, &PropertyId(property_id), Utc::now())?;
    Ok(respond(StatusCode::OK, outcome))
}

pub(crate) async fn reject_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    payload: Result<Json<RejectionBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let record = routes.service.reject(
        &session,
        &PropertyId(property_id),
        &body.reason,
        Utc::now(),
    )?;
    Ok(respond(StatusCode::OK, record))
}

pub(crate) async fn archive_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let record = routes
        .service
        .archive(&session, &PropertyId(property_id), Utc::now())?;
    Ok(respond(StatusCode::OK, record))
}

pub(crate) async fn availability_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let preference = routes.service.viewing_availability(&session)?;
    Ok(respond(StatusCode::OK, preference))
}

pub(crate) async fn set_availability_handler<L, P, N>(
    State(routes): State<ListingRoutes<L, P, N>>,
    headers: HeaderMap,
    payload: Result<Json<LandlordAvailabilityPreference>, JsonRejection>,
) -> Result<Response, ApiError>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let Json(preference) =
        payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let stored = routes
        .service
        .set_viewing_availability(&session, preference)?;
    Ok(respond(StatusCode::OK, stored))
}
