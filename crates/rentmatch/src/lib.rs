//! Property-rental marketplace core.
//!
//! Investors are matched to landlord listings by [`workflows::matching`], viewings are
//! scheduled against landlord availability by [`workflows::viewings`], and listings move
//! through the draft/review lifecycle in [`workflows::listings`]. Storage, session issuance,
//! e-mail delivery, and rate-limit counters are collaborators reached through traits.

pub mod auth;
pub mod config;
pub mod error;
pub mod notifications;
pub mod rate_limit;
pub mod telemetry;
pub mod workflows;
