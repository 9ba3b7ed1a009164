use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use super::domain::InvestorId;
use super::repository::ProfileRepository;
use super::service::MatchingService;
use super::validation::ProfileSubmission;
use crate::auth::{session_from_headers, Role, SessionResolver};
use crate::error::ApiError;
use crate::workflows::listings::domain::PropertyId;
use crate::workflows::listings::repository::ListingRepository;
use crate::workflows::respond;

pub struct MatchingRoutes<P, L> {
    service: Arc<MatchingService<P, L>>,
    sessions: Arc<dyn SessionResolver>,
}

impl<P, L> Clone for MatchingRoutes<P, L> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<P, L> MatchingRoutes<P, L> {
    fn investor(&self, headers: &HeaderMap) -> Result<InvestorId, ApiError> {
        let session = session_from_headers(headers, self.sessions.as_ref())?;
        session.require(&[Role::Investor])?;
        Ok(InvestorId(session.user_id))
    }
}

/// Router builder exposing preference capture and match scoring for the signed-in investor.
pub fn matching_router<P, L>(
    service: Arc<MatchingService<P, L>>,
    sessions: Arc<dyn SessionResolver>,
) -> Router
where
    P: ProfileRepository + 'static,
    L: ListingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/investors/me/preferences",
            get(preferences_handler::<P, L>).put(save_handler::<P, L>),
        )
        .route(
            "/api/v1/investors/me/recommendations",
            get(recommendations_handler::<P, L>),
        )
        .route(
            "/api/v1/properties/:property_id/match",
            get(match_handler::<P, L>),
        )
        .with_state(MatchingRoutes { service, sessions })
}

fn numeric_param<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ApiError> {
    params
        .get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                ApiError::BadRequest(format!("{key} must be a non-negative integer"))
            })
        })
        .transpose()
}

pub(crate) async fn save_handler<P, L>(
    State(routes): State<MatchingRoutes<P, L>>,
    headers: HeaderMap,
    payload: Result<Json<ProfileSubmission>, JsonRejection>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    L: ListingRepository + 'static,
{
    let investor_id = routes.investor(&headers)?;
    let Json(submission) =
        payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let profile = routes
        .service
        .save_preferences(&investor_id, submission, Utc::now())?;
    Ok(respond(StatusCode::OK, profile))
}

pub(crate) async fn preferences_handler<P, L>(
    State(routes): State<MatchingRoutes<P, L>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    L: ListingRepository + 'static,
{
    let investor_id = routes.investor(&headers)?;
    let profile = routes.service.preferences(&investor_id)?;
    Ok(respond(StatusCode::OK, profile))
}

pub(crate) async fn recommendations_handler<P, L>(
    State(routes): State<MatchingRoutes<P, L>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    L: ListingRepository + 'static,
{
    let investor_id = routes.investor(&headers)?;
    let limit = numeric_param::<usize>(&params, "limit")?;
    let min_score = numeric_param::<u8>(&params, "min_score")?;
    if min_score.is_some_and(|score| score > 100) {
        return Err(ApiError::BadRequest(
            "min_score must be between 0 and 100".to_string(),
        ));
    }

    let recommendations = routes
        .service
        .recommendations(&investor_id, limit, min_score)?;
    Ok(respond(StatusCode::OK, recommendations))
}

pub(crate) async fn match_handler<P, L>(
    State(routes): State<MatchingRoutes<P, L>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    L: ListingRepository + 'static,
{
    let investor_id = routes.investor(&headers)?;
    let outcome = routes
        .service
        .score_property(&investor_id, &PropertyId(property_id))?;
    Ok(respond(StatusCode::OK, outcome))
}
