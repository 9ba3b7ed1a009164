use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rentmatch::auth::{AuthError, Session, SessionResolver};
use rentmatch::config::{AppConfig, SessionSeed};
use rentmatch::notifications::{Notification, NotificationError, NotificationPublisher};
use rentmatch::rate_limit::{RateLimitError, RateLimitStore, RateLimiter, WindowHit};
use rentmatch::workflows::listings::{
    LandlordId, ListingRepository, ListingService, ListingStatus, PropertyId, PropertyRecord,
};
use rentmatch::workflows::matching::{
    InvestorId, MatchingService, ProfileRepository, StoredProfile,
};
use rentmatch::workflows::viewings::{
    BookingId, BookingRepository, BookingStatus, LandlordAvailabilityPreference, ViewingBooking,
    ViewingService,
};
use rentmatch::workflows::RepositoryError;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::info;

/// Live windows kept before expired ones are swept.
const RATE_LIMIT_SWEEP_AT: usize = 10_000;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} store poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileRepository {
    records: Arc<Mutex<HashMap<InvestorId, StoredProfile>>>,
}

impl ProfileRepository for InMemoryProfileRepository {
    fn upsert(&self, profile: StoredProfile) -> Result<StoredProfile, RepositoryError> {
        let mut guard = lock(&self.records, "profile")?;
        guard.insert(profile.investor_id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, investor_id: &InvestorId) -> Result<Option<StoredProfile>, RepositoryError> {
        let guard = lock(&self.records, "profile")?;
        Ok(guard.get(investor_id).cloned())
    }

    fn all(&self) -> Result<Vec<StoredProfile>, RepositoryError> {
        let guard = lock(&self.records, "profile")?;
        let mut profiles: Vec<_> = guard.values().cloned().collect();
        profiles.sort_by(|a, b| a.investor_id.cmp(&b.investor_id));
        Ok(profiles)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryListingRepository {
    records: Arc<Mutex<HashMap<PropertyId, PropertyRecord>>>,
    availability: Arc<Mutex<HashMap<LandlordId, LandlordAvailabilityPreference>>>,
}

impl ListingRepository for InMemoryListingRepository {
    fn insert(&self, record: PropertyRecord) -> Result<PropertyRecord, RepositoryError> {
        let mut guard = lock(&self.records, "listing")?;
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
        let mut guard = lock(&self.records, "listing")?;
        let stored = guard.get_mut(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::Stale);
        }
        *stored = record;
        Ok(())
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, RepositoryError> {
        let guard = lock(&self.records, "listing")?;
        Ok(guard.get(id).cloned())
    }

    fn with_status(&self, status: ListingStatus) -> Result<Vec<PropertyRecord>, RepositoryError> {
        let guard = lock(&self.records, "listing")?;
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
        let guard = lock(&self.availability, "availability")?;
        Ok(guard.get(landlord_id).cloned())
    }

    fn set_landlord_availability(
        &self,
        landlord_id: LandlordId,
        preference: LandlordAvailabilityPreference,
    ) -> Result<(), RepositoryError> {
        lock(&self.availability, "availability")?.insert(landlord_id, preference);
        Ok(())
    }
}

/// Conflict and status checks share one lock with the write, so two requests for a slot cannot
/// both land and a stale transition cannot overwrite a newer one.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBookingRepository {
    records: Arc<Mutex<Vec<ViewingBooking>>>,
}

impl BookingRepository for InMemoryBookingRepository {
    fn insert(&self, booking: ViewingBooking) -> Result<ViewingBooking, RepositoryError> {
        let mut guard = lock(&self.records, "booking")?;
        let taken = guard
            .iter()
            .any(|existing| existing.occupies(&booking.property_id, booking.date, booking.time));
        if taken || guard.iter().any(|existing| existing.id == booking.id) {
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
        let mut guard = lock(&self.records, "booking")?;
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
        let guard = lock(&self.records, "booking")?;
        Ok(guard.iter().find(|booking| &booking.id == id).cloned())
    }

    fn for_property(
        &self,
        property_id: &PropertyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ViewingBooking>, RepositoryError> {
        let guard = lock(&self.records, "booking")?;
        Ok(guard
            .iter()
            .filter(|booking| {
                &booking.property_id == property_id && booking.date >= start && booking.date <= end
            })
            .cloned()
            .collect())
    }
}

/// Logs and records outbound notifications in place of an e-mail provider.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = notification.template.label(),
            recipient = %notification.recipient,
            "notification queued"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Transport("notification log poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: Instant,
    count: u32,
}

/// Process-local fixed windows. Replace with a shared store when running more than one replica.
#[derive(Default)]
pub(crate) struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimitStore {
    fn hit_at(&self, key: &str, window: Duration, now: Instant) -> Result<WindowHit, RateLimitError> {
        let mut guard = self
            .windows
            .lock()
            .map_err(|_| RateLimitError::Unavailable("rate limit map poisoned".to_string()))?;

        if guard.len() >= RATE_LIMIT_SWEEP_AT {
            guard.retain(|_, entry| now.duration_since(entry.opened_at) < window);
        }

        let entry = guard.entry(key.to_string()).or_insert(Window {
            opened_at: now,
            count: 0,
        });
        if now.duration_since(entry.opened_at) >= window {
            *entry = Window {
                opened_at: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);

        Ok(WindowHit {
            count: entry.count,
            resets_in: window.saturating_sub(now.duration_since(entry.opened_at)),
        })
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, RateLimitError> {
        self.hit_at(key, window, Instant::now())
    }
}

/// Resolves the bearer tokens seeded through `APP_SESSION_TOKENS`.
#[derive(Debug, Default)]
pub(crate) struct StaticSessionResolver {
    sessions: HashMap<String, Session>,
}

impl StaticSessionResolver {
    pub(crate) fn from_seeds(seeds: &[SessionSeed]) -> Self {
        let sessions = seeds
            .iter()
            .map(|seed| {
                (
                    seed.token.clone(),
                    Session::new(seed.user_id.clone(), seed.role),
                )
            })
            .collect();
        Self { sessions }
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionResolver for StaticSessionResolver {
    fn resolve(&self, token: &str) -> Result<Option<Session>, AuthError> {
        Ok(self.sessions.get(token).cloned())
    }
}

pub(crate) type Matching = MatchingService<InMemoryProfileRepository, InMemoryListingRepository>;
pub(crate) type Listings = ListingService<
    InMemoryListingRepository,
    InMemoryProfileRepository,
    InMemoryNotificationPublisher,
>;
pub(crate) type Viewings = ViewingService<
    InMemoryBookingRepository,
    InMemoryListingRepository,
    InMemoryNotificationPublisher,
>;

/// Services wired against the in-memory adapters, sharing one set of stores.
pub(crate) struct Marketplace {
    pub(crate) notifications: Arc<InMemoryNotificationPublisher>,
    pub(crate) matching: Arc<Matching>,
    pub(crate) listings: Arc<Listings>,
    pub(crate) viewings: Arc<Viewings>,
    pub(crate) rate_limiter: Arc<RateLimiter<InMemoryRateLimitStore>>,
}

impl Marketplace {
    pub(crate) fn in_memory(config: &AppConfig) -> Self {
        let profiles = Arc::new(InMemoryProfileRepository::default());
        let listing_store = Arc::new(InMemoryListingRepository::default());
        let bookings = Arc::new(InMemoryBookingRepository::default());
        let notifications = Arc::new(InMemoryNotificationPublisher::default());

        let matching = Arc::new(MatchingService::new(
            profiles.clone(),
            listing_store.clone(),
            config.matching,
        ));
        let listings = Arc::new(ListingService::new(
            listing_store.clone(),
            profiles,
            notifications.clone(),
            config.matching,
        ));
        let viewings = Arc::new(ViewingService::new(
            bookings,
            listing_store,
            notifications.clone(),
            config.viewings,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::default()),
            &config.rate_limit,
        ));

        Self {
            notifications,
            matching,
            listings,
            viewings,
            rate_limiter,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentmatch::auth::Role;
    use rentmatch::workflows::viewings::SlotTime;

    fn booking(id: &str, status: BookingStatus) -> ViewingBooking {
        let requested_at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|day| day.and_hms_opt(8, 0, 0))
            .expect("valid timestamp");
        ViewingBooking {
            id: BookingId(id.to_string()),
            property_id: PropertyId("listing-000001".to_string()),
            investor_id: InvestorId("investor-1".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date"),
            time: SlotTime::hm(10, 0).expect("valid slot"),
            status,
            requested_at,
            updated_at: requested_at,
        }
    }

    #[test]
    fn booking_insert_rejects_occupied_slots() {
        let repository = InMemoryBookingRepository::default();
        repository
            .insert(booking("viewing-1", BookingStatus::Pending))
            .expect("first booking stored");

        let err = repository
            .insert(booking("viewing-2", BookingStatus::Pending))
            .expect_err("slot already held");
        assert!(matches!(err, RepositoryError::Conflict));
    }

    #[test]
    fn cancelled_bookings_free_the_slot() {
        let repository = InMemoryBookingRepository::default();
        let mut first = booking("viewing-1", BookingStatus::Pending);
        repository.insert(first.clone()).expect("stored");
        first.status = BookingStatus::Cancelled;
        repository
            .update(first, BookingStatus::Pending)
            .expect("updated");

        repository
            .insert(booking("viewing-2", BookingStatus::Pending))
            .expect("slot reopened");
    }

    #[test]
    fn booking_update_refuses_a_moved_status() {
        let repository = InMemoryBookingRepository::default();
        let pending = booking("viewing-1", BookingStatus::Pending);
        repository.insert(pending.clone()).expect("stored");

        let mut cancelled = pending.clone();
        cancelled.status = BookingStatus::Cancelled;
        repository
            .update(cancelled, BookingStatus::Pending)
            .expect("investor cancels");

        let mut approved = pending;
        approved.status = BookingStatus::Approved;
        let err = repository
            .update(approved, BookingStatus::Pending)
            .expect_err("status already moved on");
        assert!(matches!(err, RepositoryError::Stale));
        assert_eq!(
            repository
                .fetch(&BookingId("viewing-1".to_string()))
                .expect("fetch")
                .map(|booking| booking.status),
            Some(BookingStatus::Cancelled)
        );
    }

    #[test]
    fn rate_limit_windows_reset_after_expiry() {
        let store = InMemoryRateLimitStore::default();
        let window = Duration::from_secs(60);
        let start = Instant::now();

        assert_eq!(store.hit_at("ip:/a", window, start).expect("hit").count, 1);
        let second = store
            .hit_at("ip:/a", window, start + Duration::from_secs(20))
            .expect("hit");
        assert_eq!(second.count, 2);
        assert_eq!(second.resets_in, Duration::from_secs(40));

        let fresh = store
            .hit_at("ip:/a", window, start + Duration::from_secs(61))
            .expect("hit");
        assert_eq!(fresh.count, 1);
        assert_eq!(store.hit_at("ip:/b", window, start).expect("hit").count, 1);
    }

    #[test]
    fn static_sessions_resolve_seeded_tokens() {
        let resolver = StaticSessionResolver::from_seeds(&[SessionSeed {
            token: "abc".to_string(),
            user_id: "landlord-9".to_string(),
            role: Role::Landlord,
        }]);

        let session = resolver
            .resolve("abc")
            .expect("resolver available")
            .expect("token known");
        assert_eq!(session.user_id, "landlord-9");
        assert_eq!(session.role, Role::Landlord);
        assert!(resolver.resolve("nope").expect("resolver available").is_none());
    }
}
