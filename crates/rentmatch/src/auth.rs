//! Bearer-token session resolution.
//!
//! Token issuance lives with the hosted auth provider; handlers only need the
//! resolved user id and role, so the provider sits behind [`SessionResolver`].

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// Marketplace role attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Landlord,
    Investor,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "landlord" => Some(Self::Landlord),
            "investor" | "tenant" => Some(Self::Investor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Landlord => "landlord",
            Role::Investor => "investor",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with [`AuthError::Forbidden`] unless the session holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), AuthError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                role: self.role.label(),
            })
        }
    }
}

/// Resolves an opaque bearer token into a session.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Option<Session>, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired session")]
    InvalidToken,
    #[error("role {role} is not permitted to perform this action")]
    Forbidden { role: &'static str },
    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}

/// Extract the bearer token from `Authorization` and resolve it.
pub fn session_from_headers(
    headers: &HeaderMap,
    resolver: &dyn SessionResolver,
) -> Result<Session, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    resolver.resolve(token)?.ok_or(AuthError::InvalidToken)
}
