use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::rate_limit::RateLimitError;
use crate::telemetry::TelemetryError;
use crate::workflows::listings::ListingServiceError;
use crate::workflows::matching::{MatchingServiceError, ValidationError};
use crate::workflows::viewings::ViewingServiceError;
use crate::workflows::RepositoryError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Startup and runtime failures of the service process.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Workflow(ApiError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Workflow(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Workflow(err) => err.into_response(),
            other => ApiError::Internal(other.to_string()).into_response(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Workflow(value)
    }
}

/// Request-level failure rendered as `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("too many requests, retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "success": false, "error": self.to_string() }));
        let mut response = (status, body).into_response();
        if let ApiError::TooManyRequests { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::MissingToken | AuthError::InvalidToken => {
                ApiError::Unauthorized(value.to_string())
            }
            AuthError::Forbidden { .. } => ApiError::Forbidden(value.to_string()),
            AuthError::Unavailable(_) => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::Malformed(_) => ApiError::BadRequest(value.to_string()),
            other => ApiError::Unprocessable(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict | RepositoryError::Stale => {
                ApiError::Conflict(value.to_string())
            }
            RepositoryError::NotFound => ApiError::NotFound(value.to_string()),
            RepositoryError::Unavailable(_) => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(value: RateLimitError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<MatchingServiceError> for ApiError {
    fn from(value: MatchingServiceError) -> Self {
        match value {
            MatchingServiceError::ProfileNotFound(_) | MatchingServiceError::PropertyNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            MatchingServiceError::Validation(err) => err.into(),
            MatchingServiceError::Repository(err) => err.into(),
        }
    }
}

impl From<ListingServiceError> for ApiError {
    fn from(value: ListingServiceError) -> Self {
        match value {
            ListingServiceError::NotFound(_) => ApiError::NotFound(value.to_string()),
            ListingServiceError::Incomplete { .. }
            | ListingServiceError::MissingReason
            | ListingServiceError::UnknownWeekday(_) => ApiError::Unprocessable(value.to_string()),
            ListingServiceError::NotEditable { .. }
            | ListingServiceError::NotSubmitted(_)
            | ListingServiceError::Changed(_)
            | ListingServiceError::Transition(_) => ApiError::Conflict(value.to_string()),
            ListingServiceError::Auth(err) => err.into(),
            ListingServiceError::Repository(err) => err.into(),
        }
    }
}

impl From<ViewingServiceError> for ApiError {
    fn from(value: ViewingServiceError) -> Self {
        match value {
            ViewingServiceError::PropertyNotFound(_) | ViewingServiceError::BookingNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            ViewingServiceError::OffGrid(_) => ApiError::Unprocessable(value.to_string()),
            ViewingServiceError::PropertyNotBookable { .. }
            | ViewingServiceError::SlotUnavailable { .. }
            | ViewingServiceError::SlotTaken { .. }
            | ViewingServiceError::Changed(_)
            | ViewingServiceError::Transition(_) => ApiError::Conflict(value.to_string()),
            ViewingServiceError::Auth(err) => err.into(),
            ViewingServiceError::Repository(err) => err.into(),
        }
    }
}
