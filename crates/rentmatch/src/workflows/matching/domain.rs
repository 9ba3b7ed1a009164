use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for investors (tenant-side accounts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvestorId(pub String);

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorType {
    SaOperator,
    SupportedLiving,
    SocialHousing,
    Other,
}

impl OperatorType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "sa_operator" => Some(Self::SaOperator),
            "supported_living" => Some(Self::SupportedLiving),
            "social_housing" => Some(Self::SocialHousing),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Inclusive bedroom bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedroomRange {
    pub min: u8,
    pub max: u8,
}

impl BedroomRange {
    /// Bounds in ascending order even if the stored pair was inverted.
    pub fn ordered(self) -> (u8, u8) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    PerProperty,
    TotalPortfolio,
}

impl BudgetType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "per_property" => Some(Self::PerProperty),
            "total_portfolio" | "portfolio" => Some(Self::TotalPortfolio),
            _ => None,
        }
    }
}

/// Monthly budget in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    #[serde(rename = "type")]
    pub budget_type: BudgetType,
}

impl BudgetRange {
    pub fn ordered(self) -> (f64, f64) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPreference {
    pub city: String,
    #[serde(default)]
    pub areas: BTreeSet<String>,
    #[serde(default)]
    pub radius_miles: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPreference {
    pub immediate: bool,
    pub available_from: Option<NaiveDate>,
}

/// Validated investor preferences. Built only through the validation boundary in
/// [`super::validation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub investor_id: InvestorId,
    pub operator_type: OperatorType,
    pub property_types: BTreeSet<String>,
    pub bedroom_range: BedroomRange,
    pub budget_range: BudgetRange,
    pub locations: Vec<LocationPreference>,
    pub availability: AvailabilityPreference,
    pub additional_preferences: BTreeSet<String>,
    pub active: bool,
}

/// Map free-form property type labels onto the preference tag vocabulary
/// (`houses`, `flats`, `hmo`, `studios`, `commercial`). Unknown labels pass through lowercased.
pub fn normalize_property_type(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let canonical = match lowered.as_str() {
        "house" | "houses" | "detached" | "semi-detached" | "semi_detached" | "terraced"
        | "bungalow" => "houses",
        "flat" | "flats" | "apartment" | "apartments" | "maisonette" => "flats",
        "hmo" | "hmos" | "house share" | "house_share" => "hmo",
        "studio" | "studios" => "studios",
        "commercial" | "office" | "retail" => "commercial",
        _ => return lowered,
    };
    canonical.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_property_type_aliases() {
        assert_eq!(normalize_property_type(" Flat "), "flats");
        assert_eq!(normalize_property_type("APARTMENT"), "flats");
        assert_eq!(normalize_property_type("House"), "houses");
        assert_eq!(normalize_property_type("HMO"), "hmo");
        assert_eq!(normalize_property_type("Studio"), "studios");
        assert_eq!(normalize_property_type("Warehouse"), "warehouse");
    }

    #[test]
    fn inverted_ranges_are_ordered() {
        let range = BedroomRange { min: 4, max: 2 };
        assert_eq!(range.ordered(), (2, 4));

        let budget = BudgetRange {
            min: 1500.0,
            max: 900.0,
            budget_type: BudgetType::PerProperty,
        };
        assert_eq!(budget.ordered(), (900.0, 1500.0));
    }
}
