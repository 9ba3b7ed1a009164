//! Investor preference capture and listing match scoring.
//!
//! [`PreferenceMatcher`] is a pure weighted-additive scorer. Everything around it (validation
//! of raw preference payloads, batch runs for notifications, the investor-facing service and
//! router) feeds it validated data only.

pub mod batch;
pub mod domain;
pub mod notifier;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use batch::{match_batch, MatchResult, MatchTrigger};
pub use domain::{
    normalize_property_type, AvailabilityPreference, BedroomRange, BudgetRange, BudgetType,
    InvestorId, LocationPreference, OperatorType, PreferenceProfile,
};
pub use notifier::MatchNotifier;
pub use repository::ProfileRepository;
pub use router::matching_router;
pub use scoring::{BreakdownEntry, MatchFactor, MatchOutcome, PreferenceMatcher};
pub use service::{MatchingService, MatchingServiceError, Recommendation};
pub use validation::{
    AvailabilityInput, LocationInput, ProfileSubmission, RangeInput, StoredProfile,
    ValidationError,
};
