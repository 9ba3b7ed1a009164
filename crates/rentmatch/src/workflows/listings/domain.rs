use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LandlordId(pub String);

/// Lifecycle of a listing from first draft to retirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Active,
    Rejected,
    Archived,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Active => "active",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Archived => "archived",
        }
    }

    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        use ListingStatus::*;
        matches!(
            (self, next),
            (Draft, Active)
                | (Draft, Rejected)
                | (Draft, Archived)
                | (Active, Rejected)
                | (Active, Archived)
                | (Rejected, Draft)
        )
    }

    pub fn transition(self, next: ListingStatus) -> Result<ListingStatus, ListingTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ListingTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("listing cannot move from {} to {}", .from.label(), .to.label())]
pub struct ListingTransitionError {
    pub from: ListingStatus,
    pub to: ListingStatus,
}

/// Local-authority licensing held for the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenceType {
    NotRequired,
    Hmo,
    Selective,
    Additional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCondition {
    Excellent,
    Good,
    Fair,
    NeedsRefurbishment,
}

/// A landlord's listing. Drafts carry partially filled fields; the matcher treats a record
/// without rent or bedrooms as a hard non-match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub landlord_id: LandlordId,
    pub property_type: String,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub monthly_rent_minor_units: Option<u64>,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub amenities: BTreeSet<String>,
    pub status: ListingStatus,
    pub available_date: Option<NaiveDate>,
    pub licence: Option<LicenceType>,
    pub condition: Option<PropertyCondition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl PropertyRecord {
    pub fn draft(id: PropertyId, landlord_id: LandlordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            landlord_id,
            property_type: String::new(),
            bedrooms: None,
            bathrooms: None,
            monthly_rent_minor_units: None,
            address: String::new(),
            city: String::new(),
            postcode: String::new(),
            amenities: BTreeSet::new(),
            status: ListingStatus::Draft,
            available_date: None,
            licence: None,
            condition: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            rejection_reason: None,
        }
    }

    /// Rent in major currency units (pounds).
    pub fn monthly_rent(&self) -> Option<f64> {
        self.monthly_rent_minor_units
            .map(|minor| minor as f64 / 100.0)
    }

    pub fn is_owned_by(&self, landlord: &str) -> bool {
        self.landlord_id.0 == landlord
    }

    /// Apply one step of the listing form. Editing resets any pending review.
    pub fn apply_step(&mut self, step: DraftStep, now: DateTime<Utc>) {
        match step {
            DraftStep::Basics {
                property_type,
                bedrooms,
                bathrooms,
            } => {
                self.property_type = property_type.trim().to_string();
                self.bedrooms = Some(bedrooms);
                self.bathrooms = Some(bathrooms);
            }
            DraftStep::Location {
                address,
                city,
                postcode,
            } => {
                self.address = address.trim().to_string();
                self.city = city.trim().to_string();
                self.postcode = postcode.trim().to_ascii_uppercase();
            }
            DraftStep::Pricing {
                monthly_rent_minor_units,
                available_date,
            } => {
                self.monthly_rent_minor_units = Some(monthly_rent_minor_units);
                self.available_date = Some(available_date);
            }
            DraftStep::Features {
                amenities,
                licence,
                condition,
            } => {
                self.amenities = amenities
                    .into_iter()
                    .map(|amenity| amenity.trim().to_ascii_lowercase())
                    .filter(|amenity| !amenity.is_empty())
                    .collect();
                self.licence = Some(licence);
                self.condition = Some(condition);
            }
        }
        self.submitted_at = None;
        self.updated_at = now;
    }

    /// Fields that still block submission for review.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.property_type.is_empty() {
            missing.push("property_type");
        }
        if self.bedrooms.is_none() {
            missing.push("bedrooms");
        }
        if self.bathrooms.is_none() {
            missing.push("bathrooms");
        }
        if self.monthly_rent_minor_units.unwrap_or(0) == 0 {
            missing.push("monthly_rent_minor_units");
        }
        if self.address.is_empty() {
            missing.push("address");
        }
        if self.city.is_empty() {
            missing.push("city");
        }
        if self.postcode.is_empty() {
            missing.push("postcode");
        }
        if self.available_date.is_none() {
            missing.push("available_date");
        }
        missing
    }
}

/// One page of the multi-step listing form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DraftStep {
    Basics {
        property_type: String,
        bedrooms: u8,
        bathrooms: u8,
    },
    Location {
        address: String,
        city: String,
        postcode: String,
    },
    Pricing {
        monthly_rent_minor_units: u64,
        available_date: NaiveDate,
    },
    Features {
        #[serde(default)]
        amenities: BTreeSet<String>,
        licence: LicenceType,
        condition: PropertyCondition,
    },
}
