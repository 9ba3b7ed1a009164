use std::collections::BTreeSet;

use crate::workflows::listings::domain::PropertyRecord;
use crate::workflows::matching::domain::{
    AvailabilityPreference, BedroomRange, BudgetRange, BudgetType, InvestorId, LocationPreference,
    OperatorType, PreferenceProfile,
};
use crate::workflows::testing::{london_flat, INVESTOR};

/// Flats in London, 1-2 bedrooms, £1,000-£1,500 per property.
pub(super) fn profile() -> PreferenceProfile {
    PreferenceProfile {
        investor_id: InvestorId(INVESTOR.to_string()),
        operator_type: OperatorType::SaOperator,
        property_types: BTreeSet::from(["flats".to_string()]),
        bedroom_range: BedroomRange { min: 1, max: 2 },
        budget_range: BudgetRange {
            min: 1000.0,
            max: 1500.0,
            budget_type: BudgetType::PerProperty,
        },
        locations: vec![LocationPreference {
            city: "London".to_string(),
            areas: BTreeSet::new(),
            radius_miles: 0.0,
        }],
        availability: AvailabilityPreference {
            immediate: true,
            available_from: None,
        },
        additional_preferences: BTreeSet::new(),
        active: true,
    }
}

pub(super) fn property(
    property_type: &str,
    bedrooms: u8,
    rent_minor_units: u64,
    city: &str,
) -> PropertyRecord {
    let mut record = london_flat("listing-100");
    record.property_type = property_type.to_string();
    record.bedrooms = Some(bedrooms);
    record.monthly_rent_minor_units = Some(rent_minor_units);
    record.city = city.to_string();
    record
}
