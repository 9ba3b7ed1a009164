use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::MatchingConfig;
use crate::workflows::listings::domain::{
    DraftStep, LicenceType, PropertyCondition, PropertyId, PropertyRecord,
};
use crate::workflows::listings::service::ListingService;
use crate::workflows::testing::{
    at, date, landlord, MemoryListings, MemoryNotifications, MemoryProfiles,
};

pub(super) type Service = ListingService<MemoryListings, MemoryProfiles, MemoryNotifications>;

pub(super) fn now() -> DateTime<Utc> {
    at(2024, 6, 1)
}

pub(super) fn build_service(
    profiles: MemoryProfiles,
) -> (Service, Arc<MemoryListings>, Arc<MemoryNotifications>) {
    let listings = Arc::new(MemoryListings::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = ListingService::new(
        listings.clone(),
        Arc::new(profiles),
        notifications.clone(),
        MatchingConfig::default(),
    );
    (service, listings, notifications)
}

pub(super) fn complete_steps() -> Vec<DraftStep> {
    vec![
        DraftStep::Basics {
            property_type: "Flat".to_string(),
            bedrooms: 2,
            bathrooms: 1,
        },
        DraftStep::Location {
            address: "12 Example Street".to_string(),
            city: "London".to_string(),
            postcode: "e1 6an".to_string(),
        },
        DraftStep::Pricing {
            monthly_rent_minor_units: 150_000,
            available_date: date(2024, 7, 1),
        },
        DraftStep::Features {
            amenities: ["Parking".to_string(), " ".to_string()].into_iter().collect(),
            licence: LicenceType::NotRequired,
            condition: PropertyCondition::Good,
        },
    ]
}

/// Draft with every form step applied, owned by the fixture landlord.
pub(super) fn filled_draft(service: &Service) -> PropertyId {
    let draft = service
        .create_draft(&landlord(), now())
        .expect("draft created");
    for step in complete_steps() {
        service
            .update_draft(&landlord(), &draft.id, step, now())
            .expect("step applies");
    }
    draft.id
}

pub(super) fn submitted(service: &Service) -> PropertyRecord {
    let id = filled_draft(service);
    service
        .submit(&landlord(), &id, now())
        .expect("complete draft submits")
}
