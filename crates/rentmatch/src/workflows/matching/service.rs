use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::batch::match_batch;
use super::domain::{InvestorId, PreferenceProfile};
use super::repository::ProfileRepository;
use super::scoring::{MatchOutcome, PreferenceMatcher};
use super::validation::{ProfileSubmission, StoredProfile, ValidationError};
use crate::config::MatchingConfig;
use crate::workflows::listings::domain::{ListingStatus, PropertyId, PropertyRecord};
use crate::workflows::listings::repository::ListingRepository;
use crate::workflows::RepositoryError;

/// Listing paired with its score for the investor dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub property: PropertyRecord,
    pub outcome: MatchOutcome,
}

/// Service composing preference storage, listing storage, and the matcher.
pub struct MatchingService<P, L> {
    profiles: Arc<P>,
    listings: Arc<L>,
    matcher: PreferenceMatcher,
    config: MatchingConfig,
}

impl<P, L> MatchingService<P, L>
where
    P: ProfileRepository + 'static,
    L: ListingRepository + 'static,
{
    pub fn new(profiles: Arc<P>, listings: Arc<L>, config: MatchingConfig) -> Self {
        Self {
            profiles,
            listings,
            matcher: PreferenceMatcher::new(),
            config,
        }
    }

    /// Validate and persist the investor's preferences, replacing any earlier profile.
    pub fn save_preferences(
        &self,
        investor_id: &InvestorId,
        submission: ProfileSubmission,
        now: DateTime<Utc>,
    ) -> Result<PreferenceProfile, MatchingServiceError> {
        let profile = submission.validate(investor_id.clone()).map_err(|err| {
            debug!(investor = %investor_id, error = %err, "rejected preference submission");
            err
        })?;
        let stored = StoredProfile::from_submission(investor_id.clone(), &submission, now)?;
        self.profiles.upsert(stored)?;

        info!(investor = %investor_id, active = profile.active, "preferences saved");
        Ok(profile)
    }

    pub fn preferences(
        &self,
        investor_id: &InvestorId,
    ) -> Result<PreferenceProfile, MatchingServiceError> {
        let stored = self
            .profiles
            .fetch(investor_id)?
            .ok_or_else(|| MatchingServiceError::ProfileNotFound(investor_id.clone()))?;
        Ok(stored.profile()?)
    }

    /// Active listings ranked for the investor. An inactive profile yields no recommendations.
    pub fn recommendations(
        &self,
        investor_id: &InvestorId,
        limit: Option<usize>,
        min_score: Option<u8>,
    ) -> Result<Vec<Recommendation>, MatchingServiceError> {
        let stored = self
            .profiles
            .fetch(investor_id)?
            .ok_or_else(|| MatchingServiceError::ProfileNotFound(investor_id.clone()))?;
        let listings = self.listings.with_status(ListingStatus::Active)?;

        let limit = limit.unwrap_or(self.config.recommendation_limit);
        let results = match_batch(
            &self.matcher,
            std::slice::from_ref(&stored),
            &listings,
            min_score.unwrap_or(0),
        );

        let recommendations = results
            .into_iter()
            .take(limit)
            .filter_map(|result| {
                let property = listings
                    .iter()
                    .find(|listing| listing.id == result.property_id)?
                    .clone();
                Some(Recommendation {
                    property,
                    outcome: MatchOutcome {
                        score: result.score,
                        breakdown: result.breakdown,
                    },
                })
            })
            .collect();

        Ok(recommendations)
    }

    /// Score a single listing for the investor, regardless of listing status.
    pub fn score_property(
        &self,
        investor_id: &InvestorId,
        property_id: &PropertyId,
    ) -> Result<MatchOutcome, MatchingServiceError> {
        let stored = self
            .profiles
            .fetch(investor_id)?
            .ok_or_else(|| MatchingServiceError::ProfileNotFound(investor_id.clone()))?;
        let property = self
            .listings
            .fetch(property_id)?
            .ok_or_else(|| MatchingServiceError::PropertyNotFound(property_id.clone()))?;

        Ok(match stored.profile() {
            Ok(profile) => self.matcher.score(&profile, &property),
            Err(err) => MatchOutcome::profile_incomplete(err.to_string()),
        })
    }
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchingServiceError {
    #[error("no preference profile for investor {0}")]
    ProfileNotFound(InvestorId),
    #[error("property {0} not found")]
    PropertyNotFound(PropertyId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
