use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Duration, Local, NaiveDate};
use serde::Deserialize;

use super::domain::{BookingId, BookingStatus, ViewingSlotRequest};
use super::repository::BookingRepository;
use super::service::ViewingService;
use crate::auth::{session_from_headers, SessionResolver};
use crate::error::ApiError;
use crate::notifications::NotificationPublisher;
use crate::workflows::listings::domain::PropertyId;
use crate::workflows::listings::repository::ListingRepository;
use crate::workflows::respond;

/// Days shown when the availability query omits `end`.
const DEFAULT_RANGE_DAYS: i64 = 13;

pub struct ViewingRoutes<B, L, N> {
    service: Arc<ViewingService<B, L, N>>,
    sessions: Arc<dyn SessionResolver>,
}

impl<B, L, N> Clone for ViewingRoutes<B, L, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    status: BookingStatus,
}

/// Router builder exposing availability and booking endpoints.
pub fn viewing_router<B, L, N>(
    service: Arc<ViewingService<B, L, N>>,
    sessions: Arc<dyn SessionResolver>,
) -> Router
where
    B: BookingRepository + 'static,
    L: ListingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/properties/:property_id/availability",
            get(availability_handler::<B, L, N>),
        )
        .route("/api/v1/viewings", post(request_handler::<B, L, N>))
        .route("/api/v1/viewings/:booking_id", get(booking_handler::<B, L, N>))
        .route(
            "/api/v1/viewings/:booking_id/status",
            patch(status_handler::<B, L, N>),
        )
        .with_state(ViewingRoutes { service, sessions })
}

fn parse_date(params: &HashMap<String, String>, key: &str) -> Result<Option<NaiveDate>, ApiError> {
    params
        .get(key)
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!("{key} must be a YYYY-MM-DD date (found '{raw}')"))
            })
        })
        .transpose()
}

pub(crate) async fn availability_handler<B, L, N>(
    State(routes): State<ViewingRoutes<B, L, N>>,
    Path(property_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError>
where
    B: BookingRepository + 'static,
    L: ListingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let now = Local::now().naive_local();
    let start = parse_date(&params, "start")?.unwrap_or_else(|| now.date());
    let end = match parse_date(&params, "end")? {
        Some(end) => end,
        None => start
            .checked_add_signed(Duration::days(DEFAULT_RANGE_DAYS))
            .unwrap_or(start),
    };
    let calendar = routes
        .service
        .availability(&PropertyId(property_id), start, end, now)?;
    Ok(respond(StatusCode::OK, calendar))
}

pub(crate) async fn request_handler<B, L, N>(
    State(routes): State<ViewingRoutes<B, L, N>>,
    headers: HeaderMap,
    payload: Result<Json<ViewingSlotRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    B: BookingRepository + 'static,
    L: ListingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let booking = routes
        .service
        .request_viewing(&session, request, Local::now().naive_local())?;
    Ok(respond(StatusCode::CREATED, booking))
}

pub(crate) async fn booking_handler<B, L, N>(
    State(routes): State<ViewingRoutes<B, L, N>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Response, ApiError>
where
    B: BookingRepository + 'static,
    L: ListingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let booking = routes.service.get(&session, &BookingId(booking_id))?;
    Ok(respond(StatusCode::OK, booking))
}

pub(crate) async fn status_handler<B, L, N>(
    State(routes): State<ViewingRoutes<B, L, N>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Response, ApiError>
where
    B: BookingRepository + 'static,
    L: ListingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_from_headers(&headers, routes.sessions.as_ref())?;
    let Json(change) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let booking = routes.service.transition(
        &session,
        &BookingId(booking_id),
        change.status,
        Local::now().naive_local(),
    )?;
    Ok(respond(StatusCode::OK, booking))
}
