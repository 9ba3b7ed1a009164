//! In-memory collaborators and fixtures shared by the workflow unit tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::auth::{AuthError, Role, Session, SessionResolver};
use crate::notifications::{Notification, NotificationError, NotificationPublisher};
use crate::workflows::listings::domain::{
    LandlordId, LicenceType, ListingStatus, PropertyCondition, PropertyId, PropertyRecord,
};
use crate::workflows::listings::repository::ListingRepository;
use crate::workflows::matching::domain::InvestorId;
use crate::workflows::matching::repository::ProfileRepository;
use crate::workflows::matching::validation::{
    AvailabilityInput, LocationInput, ProfileSubmission, RangeInput, StoredProfile,
};
use crate::workflows::viewings::domain::{
    BookingId, BookingStatus, LandlordAvailabilityPreference, ViewingBooking,
};
use crate::workflows::viewings::repository::BookingRepository;
use crate::workflows::RepositoryError;

pub(crate) const LANDLORD: &str = "landlord-1";
pub(crate) const OTHER_LANDLORD: &str = "landlord-2";
pub(crate) const INVESTOR: &str = "investor-1";
pub(crate) const OTHER_INVESTOR: &str = "investor-2";
pub(crate) const ADMIN: &str = "admin-1";

pub(crate) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(year, month, day)
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(crate) fn landlord() -> Session {
    Session::new(LANDLORD, Role::Landlord)
}

pub(crate) fn other_landlord() -> Session {
    Session::new(OTHER_LANDLORD, Role::Landlord)
}

pub(crate) fn investor() -> Session {
    Session::new(INVESTOR, Role::Investor)
}

pub(crate) fn other_investor() -> Session {
    Session::new(OTHER_INVESTOR, Role::Investor)
}

pub(crate) fn admin() -> Session {
    Session::new(ADMIN, Role::Admin)
}

/// Active two-bed London flat at £1,500 pcm.
pub(crate) fn london_flat(id: &str) -> PropertyRecord {
    let mut record = PropertyRecord::draft(
        PropertyId(id.to_string()),
        LandlordId(LANDLORD.to_string()),
        at(2024, 5, 1),
    );
    record.property_type = "flat".to_string();
    record.bedrooms = Some(2);
    record.bathrooms = Some(1);
    record.monthly_rent_minor_units = Some(150_000);
    record.address = "12 Example Street".to_string();
    record.city = "London".to_string();
    record.postcode = "E1 6AN".to_string();
    record.amenities = BTreeSet::from(["parking".to_string()]);
    record.status = ListingStatus::Active;
    record.available_date = Some(date(2024, 6, 1));
    record.licence = Some(LicenceType::NotRequired);
    record.condition = Some(PropertyCondition::Good);
    record
}

/// Flats in London, 2-3 bedrooms, £1,200-£1,800 per property.
pub(crate) fn london_submission() -> ProfileSubmission {
    ProfileSubmission {
        operator_type: Some("sa_operator".to_string()),
        property_types: vec!["flats".to_string()],
        bedroom_range: Some(RangeInput {
            min: Some(2.0),
            max: Some(3.0),
            budget_type: None,
        }),
        budget_range: Some(RangeInput {
            min: Some(1200.0),
            max: Some(1800.0),
            budget_type: Some("per_property".to_string()),
        }),
        locations: vec![LocationInput {
            city: Some("London".to_string()),
            areas: Vec::new(),
            radius_miles: Some(5.0),
        }],
        availability: Some(AvailabilityInput {
            immediate: true,
            available_from: None,
        }),
        additional_preferences: Vec::new(),
        active: Some(true),
    }
}

pub(crate) fn stored(investor: &str, submission: &ProfileSubmission) -> StoredProfile {
    StoredProfile::from_submission(InvestorId(investor.to_string()), submission, at(2024, 4, 1))
        .expect("submission serializes")
}

#[derive(Default, Clone)]
pub(crate) struct MemoryListings {
    records: Arc<Mutex<HashMap<PropertyId, PropertyRecord>>>,
    availability: Arc<Mutex<HashMap<LandlordId, LandlordAvailabilityPreference>>>,
}

impl MemoryListings {
    pub(crate) fn with(records: impl IntoIterator<Item = PropertyRecord>) -> Self {
        let listings = Self::default();
        for record in records {
            listings.insert(record).expect("seed listing");
        }
        listings
    }

    pub(crate) fn set_availability(&self, landlord: &str, preference: LandlordAvailabilityPreference) {
        self.set_landlord_availability(LandlordId(landlord.to_string()), preference)
            .expect("availability stored");
    }
}

impl ListingRepository for MemoryListings {
    fn insert(&self, record: PropertyRecord) -> Result<PropertyRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        record: PropertyRecord,
        expected: ListingStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        let stored = guard.get_mut(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::Stale);
        }
        *stored = record;
        Ok(())
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, RepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn with_status(&self, status: ListingStatus) -> Result<Vec<PropertyRecord>, RepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn landlord_availability(
        &self,
        landlord_id: &LandlordId,
    ) -> Result<Option<LandlordAvailabilityPreference>, RepositoryError> {
        let guard = self.availability.lock().expect("availability mutex poisoned");
        Ok(guard.get(landlord_id).cloned())
    }

    fn set_landlord_availability(
        &self,
        landlord_id: LandlordId,
        preference: LandlordAvailabilityPreference,
    ) -> Result<(), RepositoryError> {
        self.availability
            .lock()
            .expect("availability mutex poisoned")
            .insert(landlord_id, preference);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryProfiles {
    records: Arc<Mutex<HashMap<InvestorId, StoredProfile>>>,
}

impl MemoryProfiles {
    pub(crate) fn with(profiles: impl IntoIterator<Item = StoredProfile>) -> Self {
        let repository = Self::default();
        for profile in profiles {
            repository.upsert(profile).expect("seed profile");
        }
        repository
    }
}

impl ProfileRepository for MemoryProfiles {
    fn upsert(&self, profile: StoredProfile) -> Result<StoredProfile, RepositoryError> {
        let mut guard = self.records.lock().expect("profile mutex poisoned");
        guard.insert(profile.investor_id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, investor_id: &InvestorId) -> Result<Option<StoredProfile>, RepositoryError> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        Ok(guard.get(investor_id).cloned())
    }

    fn all(&self) -> Result<Vec<StoredProfile>, RepositoryError> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        let mut profiles: Vec<_> = guard.values().cloned().collect();
        profiles.sort_by(|a, b| a.investor_id.cmp(&b.investor_id));
        Ok(profiles)
    }
}

pub(crate) struct UnavailableProfiles;

impl ProfileRepository for UnavailableProfiles {
    fn upsert(&self, _profile: StoredProfile) -> Result<StoredProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _investor_id: &InvestorId) -> Result<Option<StoredProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<StoredProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryBookings {
    records: Arc<Mutex<Vec<ViewingBooking>>>,
}

impl MemoryBookings {
    pub(crate) fn with(bookings: impl IntoIterator<Item = ViewingBooking>) -> Self {
        let repository = Self::default();
        repository
            .records
            .lock()
            .expect("booking mutex poisoned")
            .extend(bookings);
        repository
    }

    pub(crate) fn all(&self) -> Vec<ViewingBooking> {
        self.records.lock().expect("booking mutex poisoned").clone()
    }
}

impl BookingRepository for MemoryBookings {
    fn insert(&self, booking: ViewingBooking) -> Result<ViewingBooking, RepositoryError> {
        let mut guard = self.records.lock().expect("booking mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.occupies(&booking.property_id, booking.date, booking.time))
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(booking.clone());
        Ok(booking)
    }

    fn update(
        &self,
        booking: ViewingBooking,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("booking mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == booking.id)
            .ok_or(RepositoryError::NotFound)?;
        if slot.status != expected {
            return Err(RepositoryError::Stale);
        }
        *slot = booking;
        Ok(())
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<ViewingBooking>, RepositoryError> {
        let guard = self.records.lock().expect("booking mutex poisoned");
        Ok(guard.iter().find(|booking| &booking.id == id).cloned())
    }

    fn for_property(
        &self,
        property_id: &PropertyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ViewingBooking>, RepositoryError> {
        let guard = self.records.lock().expect("booking mutex poisoned");
        Ok(guard
            .iter()
            .filter(|booking| {
                &booking.property_id == property_id && booking.date >= start && booking.date <= end
            })
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryNotifications {
    sent: Arc<Mutex<Vec<Notification>>>,
    refuse: Arc<Mutex<Vec<String>>>,
}

impl MemoryNotifications {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notification mutex poisoned").clone()
    }

    /// Make deliveries to `recipient` fail.
    pub(crate) fn refuse(&self, recipient: &str) {
        self.refuse
            .lock()
            .expect("notification mutex poisoned")
            .push(recipient.to_string());
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        let refused = self
            .refuse
            .lock()
            .expect("notification mutex poisoned")
            .contains(&notification.recipient);
        if refused {
            return Err(NotificationError::UndeliverableRecipient(
                notification.recipient,
            ));
        }
        self.sent
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Resolves `<user_id>-token` for every fixture session.
pub(crate) struct FixtureSessions;

impl SessionResolver for FixtureSessions {
    fn resolve(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let session = [landlord(), other_landlord(), investor(), other_investor(), admin()]
            .into_iter()
            .find(|session| token == format!("{}-token", session.user_id));
        Ok(session)
    }
}

pub(crate) fn bearer(session: &Session) -> String {
    format!("Bearer {}-token", session.user_id)
}

pub(crate) async fn read_json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&body).expect("json payload"))
}
