//! Viewing slots and bookings.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod slots;

#[cfg(test)]
mod tests;

pub use domain::{
    BookingId, BookingStatus, LandlordAvailabilityPreference, SlotTime, TimeWindow,
    TransitionError, ViewingBooking, ViewingSlotRequest, SLOT_MINUTES,
};
pub use repository::BookingRepository;
pub use router::viewing_router;
pub use service::{ViewingService, ViewingServiceError};
pub use slots::{
    AvailabilityCalendar, AvailabilitySlotGenerator, BookedSlot, BusinessHours, DayAvailability,
};
