use crate::config::MatchingConfig;
use crate::workflows::listings::domain::PropertyRecord;
use crate::workflows::matching::batch::{match_batch, MatchTrigger};
use crate::workflows::matching::domain::InvestorId;
use crate::workflows::matching::scoring::{MatchFactor, PreferenceMatcher};
use crate::workflows::matching::validation::StoredProfile;
use crate::workflows::testing::{at, london_flat, london_submission, stored, INVESTOR, OTHER_INVESTOR};

fn properties() -> Vec<PropertyRecord> {
    let older = london_flat("listing-a");
    let mut newer = london_flat("listing-b");
    newer.created_at = at(2024, 5, 10);
    let mut leeds = london_flat("listing-c");
    leeds.city = "Leeds".to_string();
    vec![older, newer, leeds]
}

fn profiles() -> Vec<StoredProfile> {
    let mut inactive = stored(OTHER_INVESTOR, &london_submission());
    inactive.active = false;
    let mut broken = stored("investor-3", &london_submission());
    broken.preference_data = None;
    vec![stored(INVESTOR, &london_submission()), inactive, broken]
}

fn ids(results: &[crate::workflows::matching::batch::MatchResult]) -> Vec<(&str, &str, u8)> {
    results
        .iter()
        .map(|result| {
            (
                result.investor_id.0.as_str(),
                result.property_id.0.as_str(),
                result.score,
            )
        })
        .collect()
}

#[test]
fn ranks_by_score_then_newest_listing() {
    let results = match_batch(&PreferenceMatcher::new(), &profiles(), &properties(), 0);

    assert_eq!(
        ids(&results),
        vec![
            (INVESTOR, "listing-b", 100),
            (INVESTOR, "listing-a", 100),
            (INVESTOR, "listing-c", 75),
            ("investor-3", "listing-b", 0),
            ("investor-3", "listing-a", 0),
            ("investor-3", "listing-c", 0),
        ]
    );
}

#[test]
fn inactive_profiles_never_appear() {
    let results = match_batch(&PreferenceMatcher::new(), &profiles(), &properties(), 0);
    assert!(results
        .iter()
        .all(|result| result.investor_id != InvestorId(OTHER_INVESTOR.to_string())));
}

#[test]
fn unreadable_profiles_score_zero_with_reason() {
    let results = match_batch(&PreferenceMatcher::new(), &profiles(), &properties(), 0);
    let broken = results
        .iter()
        .find(|result| result.investor_id.0 == "investor-3")
        .expect("broken profile is reported");
    assert_eq!(broken.breakdown.len(), 1);
    assert_eq!(broken.breakdown[0].factor, MatchFactor::ProfileIncomplete);
    assert!(broken.breakdown[0].note.contains("preference_data"));
}

#[test]
fn trigger_thresholds_filter_results() {
    let config = MatchingConfig::default();
    let matcher = PreferenceMatcher::new();

    let approval = match_batch(
        &matcher,
        &profiles(),
        &properties(),
        MatchTrigger::ListingApproval.threshold(&config),
    );
    assert_eq!(approval.len(), 3);

    let digest = match_batch(
        &matcher,
        &profiles(),
        &properties(),
        MatchTrigger::NightlyDigest.threshold(&config),
    );
    assert_eq!(
        ids(&digest),
        vec![(INVESTOR, "listing-b", 100), (INVESTOR, "listing-a", 100)]
    );
}
