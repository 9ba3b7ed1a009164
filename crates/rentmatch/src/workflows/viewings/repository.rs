use chrono::NaiveDate;

use super::domain::{BookingId, BookingStatus, ViewingBooking};
use crate::workflows::listings::domain::PropertyId;
use crate::workflows::RepositoryError;

/// Storage abstraction for viewing bookings.
///
/// `insert` is the authoritative conflict guard: it must fail with
/// [`RepositoryError::Conflict`] when a pending or approved booking already holds the same
/// (property, date, time), checked atomically with the write. `update` is conditional the same
/// way: it fails with [`RepositoryError::Stale`] unless the stored status is still `expected`.
pub trait BookingRepository: Send + Sync {
    fn insert(&self, booking: ViewingBooking) -> Result<ViewingBooking, RepositoryError>;
    fn update(&self, booking: ViewingBooking, expected: BookingStatus)
        -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<ViewingBooking>, RepositoryError>;
    /// Bookings of any status for the property with dates in `[start, end]`.
    fn for_property(
        &self,
        property_id: &PropertyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ViewingBooking>, RepositoryError>;
}
