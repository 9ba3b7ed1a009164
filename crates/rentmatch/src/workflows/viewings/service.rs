use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use super::domain::{
    BookingId, BookingStatus, SlotTime, TransitionError, ViewingBooking, ViewingSlotRequest,
};
use super::repository::BookingRepository;
use super::slots::{AvailabilityCalendar, AvailabilitySlotGenerator};
use crate::auth::{AuthError, Role, Session};
use crate::config::ViewingConfig;
use crate::notifications::{Notification, NotificationPublisher, NotificationTemplate};
use crate::workflows::listings::domain::{ListingStatus, PropertyId, PropertyRecord};
use crate::workflows::listings::repository::ListingRepository;
use crate::workflows::matching::domain::InvestorId;
use crate::workflows::RepositoryError;

/// Service composing listing storage, booking storage, and the slot generator.
pub struct ViewingService<B, L, N> {
    bookings: Arc<B>,
    listings: Arc<L>,
    notifications: Arc<N>,
    generator: AvailabilitySlotGenerator,
    sequence: AtomicU64,
}

impl<B, L, N> ViewingService<B, L, N>
where
    B: BookingRepository + 'static,
    L: ListingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        bookings: Arc<B>,
        listings: Arc<L>,
        notifications: Arc<N>,
        config: ViewingConfig,
    ) -> Self {
        Self {
            bookings,
            listings,
            notifications,
            generator: AvailabilitySlotGenerator::new(&config),
            sequence: AtomicU64::new(1),
        }
    }

    fn next_booking_id(&self) -> BookingId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        BookingId(format!("viewing-{id:06}"))
    }

    fn bookable_listing(&self, property_id: &PropertyId) -> Result<PropertyRecord, ViewingServiceError> {
        let property = self
            .listings
            .fetch(property_id)?
            .ok_or_else(|| ViewingServiceError::PropertyNotFound(property_id.clone()))?;
        if property.status != ListingStatus::Active {
            return Err(ViewingServiceError::PropertyNotBookable {
                property_id: property_id.clone(),
                status: property.status,
            });
        }
        Ok(property)
    }

    fn calendar_for(
        &self,
        property: &PropertyRecord,
        start: NaiveDate,
        end: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<AvailabilityCalendar, ViewingServiceError> {
        let preferences = self
            .listings
            .landlord_availability(&property.landlord_id)?
            .unwrap_or_default();
        let bookings = if start <= end {
            self.bookings.for_property(&property.id, start, end)?
        } else {
            Vec::new()
        };

        Ok(self
            .generator
            .generate(property, &preferences, &bookings, start, end, now))
    }

    /// Slot calendar for an active listing.
    pub fn availability(
        &self,
        property_id: &PropertyId,
        start: NaiveDate,
        end: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<AvailabilityCalendar, ViewingServiceError> {
        let property = self.bookable_listing(property_id)?;
        self.calendar_for(&property, start, end, now)
    }

    /// Request a viewing. The slot is checked against the advisory calendar first, then the
    /// repository insert re-checks it so a concurrent request for the same slot loses cleanly.
    pub fn request_viewing(
        &self,
        session: &Session,
        request: ViewingSlotRequest,
        now: NaiveDateTime,
    ) -> Result<ViewingBooking, ViewingServiceError> {
        session.require(&[Role::Investor])?;

        if !request.time.is_on_grid() {
            return Err(ViewingServiceError::OffGrid(request.time));
        }

        let property = self.bookable_listing(&request.property_id)?;
        let calendar = self.calendar_for(&property, request.date, request.date, now)?;
        if !calendar.is_available(request.date, request.time) {
            return Err(ViewingServiceError::SlotUnavailable {
                date: request.date,
                time: request.time,
            });
        }

        let booking = ViewingBooking {
            id: self.next_booking_id(),
            property_id: request.property_id,
            investor_id: InvestorId(session.user_id.clone()),
            date: request.date,
            time: request.time,
            status: BookingStatus::Pending,
            requested_at: now,
            updated_at: now,
        };

        let stored = match self.bookings.insert(booking) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(ViewingServiceError::SlotTaken {
                    date: request.date,
                    time: request.time,
                })
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            booking = %stored.id,
            property = %stored.property_id,
            date = %stored.date,
            time = %stored.time,
            "viewing requested"
        );

        self.notify(
            Notification::new(
                NotificationTemplate::ViewingRequested,
                property.landlord_id.0.clone(),
            )
            .with_detail("booking_id", &stored.id)
            .with_detail("property_id", &stored.property_id)
            .with_detail("date", stored.date)
            .with_detail("time", stored.time),
        );

        Ok(stored)
    }

    /// Move a booking to `next`. Landlords approve, reject, and complete viewings of their
    /// own listings; investors cancel their own requests; admins may do any valid move.
    pub fn transition(
        &self,
        session: &Session,
        booking_id: &BookingId,
        next: BookingStatus,
        now: NaiveDateTime,
    ) -> Result<ViewingBooking, ViewingServiceError> {
        let mut booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or_else(|| ViewingServiceError::BookingNotFound(booking_id.clone()))?;
        let property = self
            .listings
            .fetch(&booking.property_id)?
            .ok_or_else(|| ViewingServiceError::PropertyNotFound(booking.property_id.clone()))?;

        let permitted = match session.role {
            Role::Admin => true,
            Role::Landlord => {
                property.is_owned_by(&session.user_id)
                    && matches!(
                        next,
                        BookingStatus::Approved | BookingStatus::Rejected | BookingStatus::Completed
                    )
            }
            Role::Investor => {
                booking.investor_id.0 == session.user_id && next == BookingStatus::Cancelled
            }
        };
        if !permitted {
            return Err(ViewingServiceError::Auth(AuthError::Forbidden {
                role: session.role.label(),
            }));
        }

        let previous = booking.status;
        booking.status = previous.transition(next)?;
        booking.updated_at = now;
        match self.bookings.update(booking.clone(), previous) {
            Ok(()) => {}
            Err(RepositoryError::Stale) => {
                warn!(booking = %booking.id, to = next.label(), "viewing changed before update");
                return Err(ViewingServiceError::Changed(booking.id));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            booking = %booking.id,
            from = previous.label(),
            to = next.label(),
            actor = %session.user_id,
            "viewing status changed"
        );

        self.notify(
            Notification::new(
                NotificationTemplate::ViewingStatusChanged,
                booking.investor_id.0.clone(),
            )
            .with_detail("booking_id", &booking.id)
            .with_detail("property_id", &booking.property_id)
            .with_detail("status", next.label()),
        );

        Ok(booking)
    }

    /// Fetch a booking visible to the session: its investor, the listing's landlord, or an admin.
    pub fn get(
        &self,
        session: &Session,
        booking_id: &BookingId,
    ) -> Result<ViewingBooking, ViewingServiceError> {
        let booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or_else(|| ViewingServiceError::BookingNotFound(booking_id.clone()))?;

        let visible = match session.role {
            Role::Admin => true,
            Role::Investor => booking.investor_id.0 == session.user_id,
            Role::Landlord => self
                .listings
                .fetch(&booking.property_id)?
                .map(|property| property.is_owned_by(&session.user_id))
                .unwrap_or(false),
        };
        if !visible {
            return Err(ViewingServiceError::Auth(AuthError::Forbidden {
                role: session.role.label(),
            }));
        }

        Ok(booking)
    }

    fn notify(&self, notification: Notification) {
        let template = notification.template.label();
        if let Err(err) = self.notifications.publish(notification) {
            warn!(template, error = %err, "viewing notification failed");
        }
    }
}

/// Error raised by the viewing service.
#[derive(Debug, thiserror::Error)]
pub enum ViewingServiceError {
    #[error("property {0} not found")]
    PropertyNotFound(PropertyId),
    #[error("property {property_id} is {} and not accepting viewings", .status.label())]
    PropertyNotBookable {
        property_id: PropertyId,
        status: ListingStatus,
    },
    #[error("viewing {0} not found")]
    BookingNotFound(BookingId),
    #[error("viewing time {0} must start on the hour or half hour")]
    OffGrid(SlotTime),
    #[error("slot {date} {time} is not offered for viewings")]
    SlotUnavailable { date: NaiveDate, time: SlotTime },
    #[error("slot {date} {time} has already been booked")]
    SlotTaken { date: NaiveDate, time: SlotTime },
    #[error("viewing {0} was changed by another request; reload and retry")]
    Changed(BookingId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
