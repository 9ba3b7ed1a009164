//! Boundary between loosely shaped preference payloads and [`PreferenceProfile`].
//!
//! The preferences form and the stored `preference_data` column both arrive as JSON whose
//! fields may be missing or mistyped. Everything is checked here once; the matcher only ever
//! sees validated profiles.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{
    normalize_property_type, AvailabilityPreference, BedroomRange, BudgetRange, BudgetType,
    InvestorId, LocationPreference, OperatorType, PreferenceProfile,
};

const MAX_BEDROOMS: f64 = 50.0;

/// Validation errors raised while building a [`PreferenceProfile`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unknown operator type `{0}`")]
    UnknownOperatorType(String),
    #[error("unknown budget type `{0}`")]
    UnknownBudgetType(String),
    #[error("invalid {field}: {reason}")]
    InvalidRange { field: &'static str, reason: String },
    #[error("invalid date `{value}` for {field} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
    #[error("location #{index} has no city")]
    BlankCity { index: usize },
    #[error("malformed preference payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeInput {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub budget_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub city: Option<String>,
    #[serde(default)]
    pub areas: Vec<String>,
    pub radius_miles: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityInput {
    #[serde(default)]
    pub immediate: bool,
    pub available_from: Option<String>,
}

/// Raw shape of the preferences form, also persisted verbatim as `preference_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSubmission {
    pub operator_type: Option<String>,
    pub property_types: Vec<String>,
    pub bedroom_range: Option<RangeInput>,
    pub budget_range: Option<RangeInput>,
    pub locations: Vec<LocationInput>,
    pub availability: Option<AvailabilityInput>,
    pub additional_preferences: Vec<String>,
    pub active: Option<bool>,
}

impl ProfileSubmission {
    pub fn validate(&self, investor_id: InvestorId) -> Result<PreferenceProfile, ValidationError> {
        let operator_raw = self
            .operator_type
            .as_deref()
            .ok_or(ValidationError::MissingField("operator_type"))?;
        let operator_type = OperatorType::parse(operator_raw)
            .ok_or_else(|| ValidationError::UnknownOperatorType(operator_raw.to_string()))?;

        let property_types = self
            .property_types
            .iter()
            .filter(|value| !value.trim().is_empty())
            .map(|value| normalize_property_type(value))
            .collect();

        let bedroom_range = validate_bedrooms(
            self.bedroom_range
                .as_ref()
                .ok_or(ValidationError::MissingField("bedroom_range"))?,
        )?;
        let budget_range = validate_budget(
            self.budget_range
                .as_ref()
                .ok_or(ValidationError::MissingField("budget_range"))?,
        )?;

        if self.locations.is_empty() {
            return Err(ValidationError::MissingField("locations"));
        }
        let locations = self
            .locations
            .iter()
            .enumerate()
            .map(|(index, location)| validate_location(index, location))
            .collect::<Result<Vec<_>, _>>()?;

        let availability = validate_availability(self.availability.as_ref())?;

        let additional_preferences = self
            .additional_preferences
            .iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        Ok(PreferenceProfile {
            investor_id,
            operator_type,
            property_types,
            bedroom_range,
            budget_range,
            locations,
            availability,
            additional_preferences,
            active: self.active.unwrap_or(true),
        })
    }
}

fn validate_bedrooms(input: &RangeInput) -> Result<BedroomRange, ValidationError> {
    let min = input
        .min
        .ok_or(ValidationError::MissingField("bedroom_range.min"))?;
    let max = input
        .max
        .ok_or(ValidationError::MissingField("bedroom_range.max"))?;

    let invalid = |reason: &str| ValidationError::InvalidRange {
        field: "bedroom_range",
        reason: reason.to_string(),
    };

    if min.fract() != 0.0 || max.fract() != 0.0 {
        return Err(invalid("bedroom counts must be whole numbers"));
    }
    if min < 1.0 {
        return Err(invalid("min must be at least 1"));
    }
    if max > MAX_BEDROOMS {
        return Err(invalid("max exceeds 50"));
    }
    if min > max {
        return Err(invalid("min must not exceed max"));
    }

    Ok(BedroomRange {
        min: min as u8,
        max: max as u8,
    })
}

fn validate_budget(input: &RangeInput) -> Result<BudgetRange, ValidationError> {
    let min = input
        .min
        .ok_or(ValidationError::MissingField("budget_range.min"))?;
    let max = input
        .max
        .ok_or(ValidationError::MissingField("budget_range.max"))?;

    let invalid = |reason: &str| ValidationError::InvalidRange {
        field: "budget_range",
        reason: reason.to_string(),
    };

    if !min.is_finite() || !max.is_finite() {
        return Err(invalid("bounds must be finite numbers"));
    }
    if min < 0.0 || max < 0.0 {
        return Err(invalid("bounds must not be negative"));
    }
    if min > max {
        return Err(invalid("min must not exceed max"));
    }

    let budget_type = match input.budget_type.as_deref() {
        None => BudgetType::PerProperty,
        Some(raw) => BudgetType::parse(raw)
            .ok_or_else(|| ValidationError::UnknownBudgetType(raw.to_string()))?,
    };

    Ok(BudgetRange {
        min,
        max,
        budget_type,
    })
}

fn validate_location(
    index: usize,
    input: &LocationInput,
) -> Result<LocationPreference, ValidationError> {
    let city = input
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .ok_or(ValidationError::BlankCity { index })?;

    let radius_miles = input.radius_miles.unwrap_or(0.0);
    if !radius_miles.is_finite() || radius_miles < 0.0 {
        return Err(ValidationError::InvalidRange {
            field: "locations.radius_miles",
            reason: "radius must be a non-negative number".to_string(),
        });
    }

    let areas: BTreeSet<String> = input
        .areas
        .iter()
        .map(|area| area.trim().to_string())
        .filter(|area| !area.is_empty())
        .collect();

    Ok(LocationPreference {
        city: city.to_string(),
        areas,
        radius_miles,
    })
}

fn validate_availability(
    input: Option<&AvailabilityInput>,
) -> Result<AvailabilityPreference, ValidationError> {
    let input = input.ok_or(ValidationError::MissingField("availability"))?;

    if input.immediate {
        return Ok(AvailabilityPreference {
            immediate: true,
            available_from: None,
        });
    }

    let raw = input
        .available_from
        .as_deref()
        .ok_or(ValidationError::MissingField("availability.available_from"))?;
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidDate {
            field: "availability.available_from",
            value: raw.to_string(),
        }
    })?;

    Ok(AvailabilityPreference {
        immediate: false,
        available_from: Some(date),
    })
}

/// Preference row as held by the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub investor_id: InvestorId,
    pub active: bool,
    pub preference_data: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl StoredProfile {
    pub fn from_submission(
        investor_id: InvestorId,
        submission: &ProfileSubmission,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let preference_data = serde_json::to_value(submission)
            .map_err(|err| ValidationError::Malformed(err.to_string()))?;
        Ok(Self {
            investor_id,
            active: submission.active.unwrap_or(true),
            preference_data: Some(preference_data),
            updated_at,
        })
    }

    /// Parse and validate the stored payload. The row-level `active` flag wins over the payload.
    pub fn profile(&self) -> Result<PreferenceProfile, ValidationError> {
        let data = self
            .preference_data
            .as_ref()
            .ok_or(ValidationError::MissingField("preference_data"))?;
        let submission: ProfileSubmission = serde_json::from_value(data.clone())
            .map_err(|err| ValidationError::Malformed(err.to_string()))?;
        let mut profile = submission.validate(self.investor_id.clone())?;
        profile.active = self.active;
        Ok(profile)
    }
}
