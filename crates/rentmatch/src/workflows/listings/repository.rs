use super::domain::{LandlordId, ListingStatus, PropertyId, PropertyRecord};
use crate::workflows::viewings::domain::LandlordAvailabilityPreference;
use crate::workflows::RepositoryError;

/// Storage abstraction for listings and the landlord settings that travel with them.
pub trait ListingRepository: Send + Sync {
    fn insert(&self, record: PropertyRecord) -> Result<PropertyRecord, RepositoryError>;
    /// Replace the record only while its stored status is still `expected`; otherwise
    /// [`RepositoryError::Stale`].
    fn update(&self, record: PropertyRecord, expected: ListingStatus)
        -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, RepositoryError>;
    fn with_status(&self, status: ListingStatus) -> Result<Vec<PropertyRecord>, RepositoryError>;
    /// Viewing-day preferences; `None` when the landlord never set any.
    fn landlord_availability(
        &self,
        landlord_id: &LandlordId,
    ) -> Result<Option<LandlordAvailabilityPreference>, RepositoryError>;
    fn set_landlord_availability(
        &self,
        landlord_id: LandlordId,
        preference: LandlordAvailabilityPreference,
    ) -> Result<(), RepositoryError>;
}
