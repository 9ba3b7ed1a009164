//! Landlord listings: the multi-step draft form, admin review, and publication.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    DraftStep, LandlordId, LicenceType, ListingStatus, ListingTransitionError, PropertyCondition,
    PropertyId, PropertyRecord,
};
pub use repository::ListingRepository;
pub use router::listing_router;
pub use service::{ApprovalOutcome, ListingService, ListingServiceError};
