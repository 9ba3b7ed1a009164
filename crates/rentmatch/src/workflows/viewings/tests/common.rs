use std::sync::Arc;

use crate::config::ViewingConfig;
use crate::workflows::listings::domain::PropertyId;
use crate::workflows::matching::domain::InvestorId;
use crate::workflows::testing::{
    date, local, london_flat, MemoryBookings, MemoryListings, MemoryNotifications,
};
use crate::workflows::viewings::domain::{
    BookingId, BookingStatus, LandlordAvailabilityPreference, SlotTime, TimeWindow,
    ViewingBooking,
};
use crate::workflows::viewings::service::ViewingService;

pub(super) const PROPERTY: &str = "listing-100";

pub(super) type Service = ViewingService<MemoryBookings, MemoryListings, MemoryNotifications>;

pub(super) fn slot(hour: u32, minute: u32) -> SlotTime {
    SlotTime::hm(hour, minute).expect("valid slot")
}

pub(super) fn monday_mornings() -> LandlordAvailabilityPreference {
    LandlordAvailabilityPreference {
        preferred_days: vec!["Mon".to_string()],
        preferred_time_windows: vec![TimeWindow::Morning],
    }
}

pub(super) fn booking(
    id: &str,
    day: u32,
    time: SlotTime,
    status: BookingStatus,
) -> ViewingBooking {
    ViewingBooking {
        id: BookingId(id.to_string()),
        property_id: PropertyId(PROPERTY.to_string()),
        investor_id: InvestorId("investor-9".to_string()),
        date: date(2024, 6, day),
        time,
        status,
        requested_at: local(2024, 5, 20, 9, 0),
        updated_at: local(2024, 5, 20, 9, 0),
    }
}

pub(super) fn build_service(
    bookings: MemoryBookings,
) -> (Service, Arc<MemoryListings>, Arc<MemoryBookings>, Arc<MemoryNotifications>) {
    let listings = Arc::new(MemoryListings::with([london_flat(PROPERTY)]));
    let bookings = Arc::new(bookings);
    let notifications = Arc::new(MemoryNotifications::default());
    let service = ViewingService::new(
        bookings.clone(),
        listings.clone(),
        notifications.clone(),
        ViewingConfig::default(),
    );
    (service, listings, bookings, notifications)
}
