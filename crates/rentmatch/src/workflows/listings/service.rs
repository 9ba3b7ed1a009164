use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    DraftStep, LandlordId, ListingStatus, ListingTransitionError, PropertyId, PropertyRecord,
};
use super::repository::ListingRepository;
use crate::auth::{AuthError, Role, Session};
use crate::config::MatchingConfig;
use crate::notifications::{NotificationPublisher, NotificationReport};
use crate::workflows::matching::notifier::MatchNotifier;
use crate::workflows::matching::repository::ProfileRepository;
use crate::workflows::viewings::domain::{
    parse_weekday, weekday_name, LandlordAvailabilityPreference,
};
use crate::workflows::RepositoryError;

/// Result of an approval: the now-active listing and the match fan-out it triggered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalOutcome {
    pub listing: PropertyRecord,
    pub notifications: NotificationReport,
}

/// Service driving listings through draft, review, and publication.
pub struct ListingService<L, P, N> {
    listings: Arc<L>,
    profiles: Arc<P>,
    notifier: MatchNotifier<N>,
    sequence: AtomicU64,
}

impl<L, P, N> ListingService<L, P, N>
where
    L: ListingRepository + 'static,
    P: ProfileRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        listings: Arc<L>,
        profiles: Arc<P>,
        publisher: Arc<N>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            listings,
            profiles,
            notifier: MatchNotifier::new(publisher, config),
            sequence: AtomicU64::new(1),
        }
    }

    fn next_property_id(&self) -> PropertyId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        PropertyId(format!("listing-{id:06}"))
    }

    /// Write `record` back only if nobody moved it out of `expected` since it was loaded.
    fn store(
        &self,
        record: &PropertyRecord,
        expected: ListingStatus,
    ) -> Result<(), ListingServiceError> {
        match self.listings.update(record.clone(), expected) {
            Ok(()) => Ok(()),
            Err(RepositoryError::Stale) => {
                warn!(
                    property = %record.id,
                    expected = expected.label(),
                    "listing changed before update"
                );
                Err(ListingServiceError::Changed(record.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn load(&self, property_id: &PropertyId) -> Result<PropertyRecord, ListingServiceError> {
        self.listings
            .fetch(property_id)?
            .ok_or_else(|| ListingServiceError::NotFound(property_id.clone()))
    }

    fn load_owned(
        &self,
        session: &Session,
        property_id: &PropertyId,
    ) -> Result<PropertyRecord, ListingServiceError> {
        session.require(&[Role::Landlord])?;
        let record = self.load(property_id)?;
        if !record.is_owned_by(&session.user_id) {
            return Err(ListingServiceError::Auth(AuthError::Forbidden {
                role: session.role.label(),
            }));
        }
        Ok(record)
    }

    pub fn create_draft(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<PropertyRecord, ListingServiceError> {
        session.require(&[Role::Landlord])?;
        let record = PropertyRecord::draft(
            self.next_property_id(),
            LandlordId(session.user_id.clone()),
            now,
        );
        let stored = self.listings.insert(record)?;
        info!(property = %stored.id, landlord = %session.user_id, "listing draft created");
        Ok(stored)
    }

    /// Apply a form step. Editing a rejected listing returns it to draft.
    pub fn update_draft(
        &self,
        session: &Session,
        property_id: &PropertyId,
        step: DraftStep,
        now: DateTime<Utc>,
    ) -> Result<PropertyRecord, ListingServiceError> {
        let mut record = self.load_owned(session, property_id)?;
        let loaded = record.status;
        match record.status {
            ListingStatus::Draft => {}
            ListingStatus::Rejected => {
                record.status = record.status.transition(ListingStatus::Draft)?;
                record.rejection_reason = None;
                info!(property = %record.id, "rejected listing reopened for edits");
            }
            status => {
                return Err(ListingServiceError::NotEditable {
                    property_id: record.id,
                    status,
                })
            }
        }

        record.apply_step(step, now);
        self.store(&record, loaded)?;
        Ok(record)
    }

    /// Queue the draft for admin review once every required field is filled.
    pub fn submit(
        &self,
        session: &Session,
        property_id: &PropertyId,
        now: DateTime<Utc>,
    ) -> Result<PropertyRecord, ListingServiceError> {
        let mut record = self.load_owned(session, property_id)?;
        if record.status != ListingStatus::Draft {
            return Err(ListingServiceError::NotEditable {
                property_id: record.id,
                status: record.status,
            });
        }

        let missing = record.missing_fields();
        if !missing.is_empty() {
            debug!(property = %record.id, ?missing, "incomplete listing submitted");
            return Err(ListingServiceError::Incomplete {
                property_id: record.id,
                missing,
            });
        }

        record.submitted_at = Some(now);
        record.updated_at = now;
        self.store(&record, ListingStatus::Draft)?;
        info!(property = %record.id, "listing submitted for review");
        Ok(record)
    }

    /// Publish a submitted draft and notify investors whose profiles clear the approval
    /// threshold. Notification failures never undo the approval.
    pub fn approve(
        &self,
        session: &Session,
        property_id: &PropertyId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, ListingServiceError> {
        session.require(&[Role::Admin])?;
        let mut record = self.load(property_id)?;
        if record.status == ListingStatus::Draft && record.submitted_at.is_none() {
            return Err(ListingServiceError::NotSubmitted(record.id));
        }

        let previous = record.status;
        record.status = previous.transition(ListingStatus::Active)?;
        record.rejection_reason = None;
        record.updated_at = now;
        self.store(&record, previous)?;
        info!(property = %record.id, admin = %session.user_id, "listing approved");

        let notifications = match self.profiles.all() {
            Ok(profiles) => self.notifier.notify_listing_approved(&record, &profiles),
            Err(err) => {
                warn!(property = %record.id, error = %err, "skipping match notifications");
                NotificationReport::default()
            }
        };

        Ok(ApprovalOutcome {
            listing: record,
            notifications,
        })
    }

    pub fn reject(
        &self,
        session: &Session,
        property_id: &PropertyId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PropertyRecord, ListingServiceError> {
        session.require(&[Role::Admin])?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ListingServiceError::MissingReason);
        }

        let mut record = self.load(property_id)?;
        let previous = record.status;
        record.status = previous.transition(ListingStatus::Rejected)?;
        record.rejection_reason = Some(reason.to_string());
        record.submitted_at = None;
        record.updated_at = now;
        self.store(&record, previous)?;
        info!(property = %record.id, admin = %session.user_id, "listing rejected");
        Ok(record)
    }

    pub fn archive(
        &self,
        session: &Session,
        property_id: &PropertyId,
        now: DateTime<Utc>,
    ) -> Result<PropertyRecord, ListingServiceError> {
        let mut record = if session.is_admin() {
            self.load(property_id)?
        } else {
            self.load_owned(session, property_id)?
        };

        let previous = record.status;
        record.status = previous.transition(ListingStatus::Archived)?;
        record.updated_at = now;
        self.store(&record, previous)?;
        info!(property = %record.id, actor = %session.user_id, "listing archived");
        Ok(record)
    }

    pub fn get(&self, property_id: &PropertyId) -> Result<PropertyRecord, ListingServiceError> {
        self.load(property_id)
    }

    /// The caller's viewing-day preferences, or the empty default when none were saved.
    pub fn viewing_availability(
        &self,
        session: &Session,
    ) -> Result<LandlordAvailabilityPreference, ListingServiceError> {
        session.require(&[Role::Landlord])?;
        let landlord = LandlordId(session.user_id.clone());
        Ok(self
            .listings
            .landlord_availability(&landlord)?
            .unwrap_or_default())
    }

    /// Replace the caller's viewing-day preferences. Day names are stored in their full form;
    /// duplicates collapse and an unrecognised day is rejected.
    pub fn set_viewing_availability(
        &self,
        session: &Session,
        preference: LandlordAvailabilityPreference,
    ) -> Result<LandlordAvailabilityPreference, ListingServiceError> {
        session.require(&[Role::Landlord])?;

        let mut days = Vec::new();
        for raw in &preference.preferred_days {
            let day = parse_weekday(raw)
                .ok_or_else(|| ListingServiceError::UnknownWeekday(raw.trim().to_string()))?;
            let name = weekday_name(day).to_string();
            if !days.contains(&name) {
                days.push(name);
            }
        }
        let mut windows = Vec::new();
        for window in preference.preferred_time_windows {
            if !windows.contains(&window) {
                windows.push(window);
            }
        }

        let stored = LandlordAvailabilityPreference {
            preferred_days: days,
            preferred_time_windows: windows,
        };
        self.listings
            .set_landlord_availability(LandlordId(session.user_id.clone()), stored.clone())?;
        info!(
            landlord = %session.user_id,
            days = stored.preferred_days.len(),
            windows = stored.preferred_time_windows.len(),
            "viewing availability updated"
        );
        Ok(stored)
    }

    /// Score every active listing against every stored profile and send per-investor digests.
    pub fn nightly_digest(&self) -> Result<NotificationReport, ListingServiceError> {
        let profiles = self.profiles.all()?;
        let listings = self.listings.with_status(ListingStatus::Active)?;
        Ok(self.notifier.nightly_digest(&profiles, &listings))
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error("listing {0} not found")]
    NotFound(PropertyId),
    #[error("listing {property_id} is incomplete: missing {}", .missing.join(", "))]
    Incomplete {
        property_id: PropertyId,
        missing: Vec<&'static str>,
    },
    #[error("listing {property_id} is {} and cannot be edited", .status.label())]
    NotEditable {
        property_id: PropertyId,
        status: ListingStatus,
    },
    #[error("listing {0} has not been submitted for review")]
    NotSubmitted(PropertyId),
    #[error("a rejection reason is required")]
    MissingReason,
    #[error("unknown weekday `{0}`")]
    UnknownWeekday(String),
    #[error("listing {0} was changed by another request; reload and retry")]
    Changed(PropertyId),
    #[error(transparent)]
    Transition(#[from] ListingTransitionError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
