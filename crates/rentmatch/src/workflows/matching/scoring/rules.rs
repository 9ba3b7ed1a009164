use super::super::domain::{
    normalize_property_type, BedroomRange, BudgetRange, LocationPreference, PreferenceProfile,
};
use super::{BreakdownEntry, MatchFactor};

/// Partial budget credit reaches zero once rent is a fifth (20%) beyond the nearer bound.
const TOLERANCE_DIVISOR: u128 = 5;

pub(crate) fn score_property_type(
    profile: &PreferenceProfile,
    property_type: &str,
    weight: u8,
) -> BreakdownEntry {
    if profile.property_types.is_empty() {
        return BreakdownEntry::hit(
            MatchFactor::PropertyType,
            weight,
            "no property type preference; any type accepted".to_string(),
        );
    }

    let normalized = normalize_property_type(property_type);
    if profile
        .property_types
        .iter()
        .any(|preferred| normalize_property_type(preferred) == normalized)
    {
        BreakdownEntry::hit(
            MatchFactor::PropertyType,
            weight,
            format!("{normalized} is a preferred property type"),
        )
    } else {
        BreakdownEntry::miss(
            MatchFactor::PropertyType,
            format!("{normalized} is not among preferred property types"),
        )
    }
}

pub(crate) fn score_bedrooms(range: BedroomRange, bedrooms: u8, weight: u8) -> BreakdownEntry {
    let (min, max) = range.ordered();

    if (min..=max).contains(&bedrooms) {
        return BreakdownEntry::hit(
            MatchFactor::Bedrooms,
            weight,
            format!("{bedrooms} bedroom(s) within {min}-{max}"),
        );
    }

    let distance = if bedrooms < min {
        min - bedrooms
    } else {
        bedrooms - max
    };

    if distance == 1 {
        BreakdownEntry::partial(
            MatchFactor::Bedrooms,
            weight / 2,
            format!("{bedrooms} bedroom(s) is one outside {min}-{max}"),
        )
    } else {
        BreakdownEntry::miss(
            MatchFactor::Bedrooms,
            format!("{bedrooms} bedroom(s) outside {min}-{max}"),
        )
    }
}

pub(crate) fn score_budget(
    budget: BudgetRange,
    rent_minor_units: u64,
    weight: u8,
) -> BreakdownEntry {
    let (min, max) = budget.ordered();
    let (min_minor, max_minor) = (to_minor_units(min), to_minor_units(max));
    let rent = rent_minor_units as f64 / 100.0;

    if (min_minor..=max_minor).contains(&rent_minor_units) {
        return BreakdownEntry::hit(
            MatchFactor::Budget,
            weight,
            format!("rent £{rent:.2} within £{min:.2}-£{max:.2}"),
        );
    }

    let (bound, bound_minor, deviation_minor) = if rent_minor_units < min_minor {
        (min, min_minor, min_minor - rent_minor_units)
    } else {
        (max, max_minor, rent_minor_units - max_minor)
    };

    // points = weight * (1 - deviation / (bound / 5)), in minor units.
    let scaled_deviation = deviation_minor as u128 * TOLERANCE_DIVISOR;
    let bound_minor = bound_minor as u128;
    if scaled_deviation >= bound_minor {
        return BreakdownEntry::miss(
            MatchFactor::Budget,
            format!(
                "rent £{rent:.2} is {}% or more beyond £{bound:.2}",
                100 / TOLERANCE_DIVISOR
            ),
        );
    }

    let points = weight as u128 * (bound_minor - scaled_deviation) / bound_minor;
    let percent = deviation_minor as f64 * 100.0 / bound_minor as f64;

    BreakdownEntry::partial(
        MatchFactor::Budget,
        points.min(weight as u128) as u8,
        format!("rent £{rent:.2} is {percent:.1}% beyond £{bound:.2}"),
    )
}

fn to_minor_units(pounds: f64) -> u64 {
    (pounds.max(0.0) * 100.0).round() as u64
}

pub(crate) fn skipped_budget() -> BreakdownEntry {
    BreakdownEntry::miss(
        MatchFactor::Budget,
        "skipped: budget is set for the total portfolio".to_string(),
    )
}

pub(crate) fn score_location(
    locations: &[LocationPreference],
    city: &str,
    weight: u8,
) -> BreakdownEntry {
    let city = city.trim();
    if city.is_empty() {
        return BreakdownEntry::miss(MatchFactor::Location, "property has no city".to_string());
    }

    match locations
        .iter()
        .find(|location| location.city.trim().eq_ignore_ascii_case(city))
    {
        Some(location) => BreakdownEntry::hit(
            MatchFactor::Location,
            weight,
            format!("{} is a preferred city", location.city),
        ),
        None => BreakdownEntry::miss(
            MatchFactor::Location,
            format!("{city} is not a preferred city"),
        ),
    }
}
