use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::InvestorId;
use super::scoring::{BreakdownEntry, MatchOutcome, PreferenceMatcher};
use super::validation::StoredProfile;
use crate::config::MatchingConfig;
use crate::workflows::listings::domain::{PropertyId, PropertyRecord};

/// Caller of a batch run; each trigger has its own score floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTrigger {
    ListingApproval,
    NightlyDigest,
}

impl MatchTrigger {
    pub fn threshold(self, config: &MatchingConfig) -> u8 {
        match self {
            MatchTrigger::ListingApproval => config.approval_threshold,
            MatchTrigger::NightlyDigest => config.digest_threshold,
        }
    }
}

/// One (investor, property) pairing that cleared the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub investor_id: InvestorId,
    pub property_id: PropertyId,
    pub score: u8,
    pub breakdown: Vec<BreakdownEntry>,
    pub property_created_at: DateTime<Utc>,
}

/// Score every active profile against every property.
///
/// Inactive profiles are skipped outright. A profile whose stored payload fails validation
/// scores 0 against every property (`profile_incomplete`). Results below `min_score` are
/// dropped; the rest are ordered by score descending, then newest property first.
pub fn match_batch(
    matcher: &PreferenceMatcher,
    profiles: &[StoredProfile],
    properties: &[PropertyRecord],
    min_score: u8,
) -> Vec<MatchResult> {
    let mut results = Vec::new();

    for stored in profiles.iter().filter(|stored| stored.active) {
        let parsed = stored.profile();
        if let Err(err) = &parsed {
            debug!(investor = %stored.investor_id, error = %err, "profile incomplete for batch matching");
        }

        for property in properties {
            let outcome = match &parsed {
                Ok(profile) => matcher.score(profile, property),
                Err(err) => MatchOutcome::profile_incomplete(err.to_string()),
            };

            if outcome.score < min_score {
                continue;
            }

            results.push(MatchResult {
                investor_id: stored.investor_id.clone(),
                property_id: property.id.clone(),
                score: outcome.score,
                breakdown: outcome.breakdown,
                property_created_at: property.created_at,
            });
        }
    }

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.property_created_at.cmp(&a.property_created_at))
            .then(a.investor_id.cmp(&b.investor_id))
            .then(a.property_id.cmp(&b.property_id))
    });
    results
}
