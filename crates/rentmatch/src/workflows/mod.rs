pub mod listings;
pub mod matching;
pub mod viewings;

#[cfg(test)]
pub(crate) mod testing;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Error enumeration shared by every storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Success envelope mirroring the `{ "success": false, ... }` error body.
pub(crate) fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}
