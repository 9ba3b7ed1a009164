use crate::infra::{Listings, Marketplace};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::Args;
use rentmatch::auth::{Role, Session};
use rentmatch::config::AppConfig;
use rentmatch::error::{ApiError, AppError};
use rentmatch::notifications::NotificationTemplate;
use rentmatch::workflows::listings::{DraftStep, LicenceType, PropertyCondition, PropertyId};
use rentmatch::workflows::matching::{
    AvailabilityInput, InvestorId, LocationInput, ProfileSubmission, RangeInput,
};
use rentmatch::workflows::viewings::{LandlordAvailabilityPreference, TimeWindow};
use std::collections::BTreeSet;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Hide recommendations scoring below this value (0-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) min_score: Option<u8>,
}

struct DemoListing {
    property_type: &'static str,
    bedrooms: u8,
    rent_pounds: u64,
    address: &'static str,
    city: &'static str,
    postcode: &'static str,
    amenities: &'static [&'static str],
}

const DEMO_LISTINGS: [DemoListing; 4] = [
    DemoListing {
        property_type: "flat",
        bedrooms: 2,
        rent_pounds: 1_500,
        address: "14 Shadwell Place",
        city: "London",
        postcode: "E1 2QE",
        amenities: &["parking", "garden"],
    },
    DemoListing {
        property_type: "flat",
        bedrooms: 3,
        rent_pounds: 1_950,
        address: "3 Canal Wharf",
        city: "London",
        postcode: "N1 9RL",
        amenities: &["lift"],
    },
    DemoListing {
        property_type: "house",
        bedrooms: 4,
        rent_pounds: 1_300,
        address: "22 Ancoats Row",
        city: "Manchester",
        postcode: "M4 6BF",
        amenities: &["garden"],
    },
    DemoListing {
        property_type: "hmo",
        bedrooms: 5,
        rent_pounds: 2_400,
        address: "7 Hyde Park Road",
        city: "Leeds",
        postcode: "LS6 1AG",
        amenities: &[],
    },
];

const LANDLORD: &str = "demo-landlord";
const ADMIN: &str = "demo-admin";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { today, min_score } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let morning = today
        .and_hms_opt(8, 0, 0)
        .unwrap_or_else(|| today.and_time(NaiveTime::default()));
    let now = DateTime::<Utc>::from_naive_utc_and_offset(morning, Utc);

    let marketplace = Marketplace::in_memory(&AppConfig::load()?);
    let landlord = Session::new(LANDLORD, Role::Landlord);
    let admin = Session::new(ADMIN, Role::Admin);

    println!("Rental marketplace demo ({today})");
    seed_investors(&marketplace, now)?;

    println!("\nPublishing listings");
    let mut published = Vec::new();
    for (index, listing) in DEMO_LISTINGS.iter().enumerate() {
        let property_id = publish(&marketplace.listings, &landlord, listing, today, now)?;
        let outcome = marketplace
            .listings
            .approve(&admin, &property_id, now + Duration::minutes(index as i64))
            .map_err(ApiError::from)?;
        println!(
            "- {} {}-bed {} in {} at £{}/month -> {} match alerts sent",
            outcome.listing.id,
            listing.bedrooms,
            listing.property_type,
            listing.city,
            listing.rent_pounds,
            outcome.notifications.sent
        );
        published.push(property_id);
    }

    for investor in ["demo-investor-london", "demo-investor-portfolio"] {
        print_recommendations(&marketplace, investor, min_score)?;
    }

    let digest = marketplace
        .listings
        .nightly_digest()
        .map_err(ApiError::from)?;
    println!(
        "\nNightly digest preview: {} matches, {} sent, {} failed",
        digest.matched, digest.sent, digest.failed
    );
    for notification in marketplace
        .notifications
        .events()
        .into_iter()
        .filter(|event| event.template == NotificationTemplate::MatchDigest)
    {
        let matches = notification
            .details
            .get("matches")
            .map(String::as_str)
            .unwrap_or("none");
        println!("  - {} <- {}", notification.recipient, matches);
    }

    if let Some(property_id) = published.first() {
        print_calendar(&marketplace, &landlord, property_id, today, morning)?;
    }

    Ok(())
}

fn seed_investors(marketplace: &Marketplace, now: DateTime<Utc>) -> Result<(), AppError> {
    let london = ProfileSubmission {
        operator_type: Some("sa_operator".to_string()),
        property_types: vec!["flats".to_string()],
        bedroom_range: Some(range(2.0, 3.0, None)),
        budget_range: Some(range(1_200.0, 1_800.0, Some("per_property"))),
        locations: vec![location("London")],
        availability: Some(AvailabilityInput {
            immediate: true,
            available_from: None,
        }),
        additional_preferences: vec!["parking".to_string()],
        active: Some(true),
    };
    let portfolio = ProfileSubmission {
        operator_type: Some("supported_living".to_string()),
        property_types: vec!["houses".to_string(), "hmos".to_string()],
        bedroom_range: Some(range(3.0, 5.0, None)),
        budget_range: Some(range(2_500.0, 8_000.0, Some("total_portfolio"))),
        locations: vec![location("Manchester"), location("Leeds")],
        availability: Some(AvailabilityInput {
            immediate: false,
            available_from: Some("2024-09-01".to_string()),
        }),
        additional_preferences: Vec::new(),
        active: Some(true),
    };

    for (investor, submission) in [
        ("demo-investor-london", london),
        ("demo-investor-portfolio", portfolio),
    ] {
        let profile = marketplace
            .matching
            .save_preferences(&InvestorId(investor.to_string()), submission, now)
            .map_err(ApiError::from)?;
        println!(
            "- saved preferences for {} ({} property types, {} locations)",
            investor,
            profile.property_types.len(),
            profile.locations.len()
        );
    }
    Ok(())
}

fn range(min: f64, max: f64, budget_type: Option<&str>) -> RangeInput {
    RangeInput {
        min: Some(min),
        max: Some(max),
        budget_type: budget_type.map(str::to_string),
    }
}

fn location(city: &str) -> LocationInput {
    LocationInput {
        city: Some(city.to_string()),
        areas: Vec::new(),
        radius_miles: None,
    }
}

fn publish(
    listings: &Listings,
    landlord: &Session,
    listing: &DemoListing,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<PropertyId, AppError> {
    let draft = listings.create_draft(landlord, now).map_err(ApiError::from)?;
    let steps = [
        DraftStep::Basics {
            property_type: listing.property_type.to_string(),
            bedrooms: listing.bedrooms,
            bathrooms: 1,
        },
        DraftStep::Location {
            address: listing.address.to_string(),
            city: listing.city.to_string(),
            postcode: listing.postcode.to_string(),
        },
        DraftStep::Pricing {
            monthly_rent_minor_units: listing.rent_pounds * 100,
            available_date: today,
        },
        DraftStep::Features {
            amenities: listing
                .amenities
                .iter()
                .map(|amenity| amenity.to_string())
                .collect::<BTreeSet<_>>(),
            licence: LicenceType::NotRequired,
            condition: PropertyCondition::Good,
        },
    ];
    for step in steps {
        listings
            .update_draft(landlord, &draft.id, step, now)
            .map_err(ApiError::from)?;
    }
    listings
        .submit(landlord, &draft.id, now)
        .map_err(ApiError::from)?;
    Ok(draft.id)
}

fn print_recommendations(
    marketplace: &Marketplace,
    investor: &str,
    min_score: Option<u8>,
) -> Result<(), AppError> {
    let recommendations = marketplace
        .matching
        .recommendations(&InvestorId(investor.to_string()), None, min_score)
        .map_err(ApiError::from)?;

    println!("\nRecommendations for {investor}");
    if recommendations.is_empty() {
        println!("  (no listings above the minimum score)");
    }
    for recommendation in recommendations {
        println!(
            "- {} {} in {}: score {}",
            recommendation.property.id,
            recommendation.property.property_type,
            recommendation.property.city,
            recommendation.outcome.score
        );
        for entry in &recommendation.outcome.breakdown {
            println!(
                "    {:<14} {:>3} pts  {}",
                entry.factor.label(),
                entry.points,
                entry.note
            );
        }
    }
    Ok(())
}

fn print_calendar(
    marketplace: &Marketplace,
    landlord: &Session,
    property_id: &PropertyId,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let offered = marketplace
        .listings
        .set_viewing_availability(
            landlord,
            LandlordAvailabilityPreference {
                preferred_days: vec![
                    "Monday".to_string(),
                    "Wednesday".to_string(),
                    "Saturday".to_string(),
                ],
                preferred_time_windows: vec![TimeWindow::Morning, TimeWindow::Evening],
            },
        )
        .map_err(ApiError::from)?;
    println!(
        "\nLandlord viewing days: {}",
        offered.preferred_days.join(", ")
    );

    let end = today + Duration::days(6);
    let calendar = marketplace
        .viewings
        .availability(property_id, today, end, now)
        .map_err(ApiError::from)?;

    println!(
        "Viewing slots for {} ({} to {}, hours {}-{}, closed {})",
        property_id,
        today,
        end,
        calendar.business_hours.start,
        calendar.business_hours.end,
        calendar.excluded_weekdays.join("/")
    );
    for day in &calendar.days {
        let slots = day
            .available_slots
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!("- {} {}: {}", day.weekday, day.date, slots);
    }
    Ok(())
}
