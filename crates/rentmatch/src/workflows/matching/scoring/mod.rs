mod rules;
mod weights;

use serde::{Deserialize, Serialize};

use super::domain::{BudgetType, PreferenceProfile};
use crate::workflows::listings::domain::PropertyRecord;
use weights::Weights;

/// Criterion contributing to a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    PropertyType,
    Bedrooms,
    Budget,
    Location,
    MissingData,
    ProfileIncomplete,
}

impl MatchFactor {
    pub const fn label(self) -> &'static str {
        match self {
            MatchFactor::PropertyType => "property_type",
            MatchFactor::Bedrooms => "bedrooms",
            MatchFactor::Budget => "budget",
            MatchFactor::Location => "location",
            MatchFactor::MissingData => "missing_data",
            MatchFactor::ProfileIncomplete => "profile_incomplete",
        }
    }
}

/// Discrete contribution to a match score, so callers can render why a listing matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub factor: MatchFactor,
    pub points: u8,
    pub matched: bool,
    pub note: String,
}

impl BreakdownEntry {
    fn hit(factor: MatchFactor, points: u8, note: String) -> Self {
        Self {
            factor,
            points,
            matched: true,
            note,
        }
    }

    fn partial(factor: MatchFactor, points: u8, note: String) -> Self {
        Self {
            factor,
            points,
            matched: false,
            note,
        }
    }

    fn miss(factor: MatchFactor, note: String) -> Self {
        Self::partial(factor, 0, note)
    }
}

/// Score in `0..=100` with the per-criterion trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub score: u8,
    pub breakdown: Vec<BreakdownEntry>,
}

impl MatchOutcome {
    fn from_breakdown(breakdown: Vec<BreakdownEntry>) -> Self {
        let total: u32 = breakdown.iter().map(|entry| entry.points as u32).sum();
        Self {
            score: total.min(100) as u8,
            breakdown,
        }
    }

    /// Outcome for a profile whose stored payload could not be validated.
    pub fn profile_incomplete(reason: impl Into<String>) -> Self {
        Self {
            score: 0,
            breakdown: vec![BreakdownEntry::miss(
                MatchFactor::ProfileIncomplete,
                reason.into(),
            )],
        }
    }

    fn missing_data(missing: &[&str]) -> Self {
        Self {
            score: 0,
            breakdown: vec![BreakdownEntry::miss(
                MatchFactor::MissingData,
                format!("property is missing {}", missing.join(" and ")),
            )],
        }
    }
}

/// Stateless weighted-additive scorer: property type 25, bedrooms 20, budget 30, location 25.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferenceMatcher;

impl PreferenceMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, profile: &PreferenceProfile, property: &PropertyRecord) -> MatchOutcome {
        let mut missing = Vec::new();
        if property.monthly_rent_minor_units.is_none() {
            missing.push("monthly rent");
        }
        if property.bedrooms.is_none() {
            missing.push("bedrooms");
        }
        let (Some(rent), Some(bedrooms)) = (property.monthly_rent_minor_units, property.bedrooms) else {
            return MatchOutcome::missing_data(&missing);
        };

        let portfolio_budget = profile.budget_range.budget_type == BudgetType::TotalPortfolio;
        let weights = if portfolio_budget {
            Weights::without_budget()
        } else {
            Weights::STANDARD
        };

        let budget = if portfolio_budget {
            rules::skipped_budget()
        } else {
            rules::score_budget(profile.budget_range, rent, weights.budget)
        };

        MatchOutcome::from_breakdown(vec![
            rules::score_property_type(profile, &property.property_type, weights.property_type),
            rules::score_bedrooms(profile.bedroom_range, bedrooms, weights.bedrooms),
            budget,
            rules::score_location(&profile.locations, &property.city, weights.location),
        ])
    }
}
