use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::batch::{match_batch, MatchResult, MatchTrigger};
use super::domain::InvestorId;
use super::scoring::PreferenceMatcher;
use super::validation::StoredProfile;
use crate::config::MatchingConfig;
use crate::notifications::{
    Notification, NotificationPublisher, NotificationReport, NotificationTemplate,
};
use crate::workflows::listings::domain::PropertyRecord;

/// Turns batch match results into investor notifications.
pub struct MatchNotifier<N> {
    publisher: Arc<N>,
    matcher: PreferenceMatcher,
    config: MatchingConfig,
}

impl<N> MatchNotifier<N>
where
    N: NotificationPublisher + 'static,
{
    pub fn new(publisher: Arc<N>, config: MatchingConfig) -> Self {
        Self {
            publisher,
            matcher: PreferenceMatcher::new(),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Notify every investor whose profile clears the approval threshold for a newly
    /// approved listing.
    pub fn notify_listing_approved(
        &self,
        property: &PropertyRecord,
        profiles: &[StoredProfile],
    ) -> NotificationReport {
        let min_score = MatchTrigger::ListingApproval.threshold(&self.config);
        let results = match_batch(
            &self.matcher,
            profiles,
            std::slice::from_ref(property),
            min_score,
        );

        let mut report = NotificationReport {
            matched: results.len(),
            ..NotificationReport::default()
        };

        for result in results {
            let notification =
                Notification::new(NotificationTemplate::ListingMatch, result.investor_id.0.clone())
                    .with_detail("property_id", &result.property_id)
                    .with_detail("score", result.score)
                    .with_detail("city", &property.city)
                    .with_detail("property_type", &property.property_type);
            self.dispatch(notification, &mut report);
        }

        info!(
            property = %property.id,
            matched = report.matched,
            sent = report.sent,
            failed = report.failed,
            "listing approval match notifications dispatched"
        );
        report
    }

    /// Nightly digest: one notification per investor listing their best matches, highest
    /// score first, capped at `digest_limit`.
    pub fn nightly_digest(
        &self,
        profiles: &[StoredProfile],
        properties: &[PropertyRecord],
    ) -> NotificationReport {
        let min_score = MatchTrigger::NightlyDigest.threshold(&self.config);
        let results = match_batch(&self.matcher, profiles, properties, min_score);

        let mut report = NotificationReport {
            matched: results.len(),
            ..NotificationReport::default()
        };

        for (investor_id, matches) in group_by_investor(results, self.config.digest_limit) {
            let summary = matches
                .iter()
                .map(|result| format!("{} ({})", result.property_id, result.score))
                .collect::<Vec<_>>()
                .join(", ");
            let notification =
                Notification::new(NotificationTemplate::MatchDigest, investor_id.0.clone())
                    .with_detail("match_count", matches.len())
                    .with_detail("top_score", matches[0].score)
                    .with_detail("matches", summary);
            self.dispatch(notification, &mut report);
        }

        info!(
            matched = report.matched,
            sent = report.sent,
            failed = report.failed,
            "nightly match digest dispatched"
        );
        report
    }

    fn dispatch(&self, notification: Notification, report: &mut NotificationReport) {
        let recipient = notification.recipient.clone();
        match self.publisher.publish(notification) {
            Ok(()) => report.sent += 1,
            Err(err) => {
                warn!(%recipient, error = %err, "match notification failed");
                report.failed += 1;
            }
        }
    }
}

/// Results arrive sorted by score, so each investor's bucket keeps that order.
fn group_by_investor(
    results: Vec<MatchResult>,
    limit: usize,
) -> BTreeMap<InvestorId, Vec<MatchResult>> {
    let mut grouped: BTreeMap<InvestorId, Vec<MatchResult>> = BTreeMap::new();
    for result in results {
        let bucket = grouped.entry(result.investor_id.clone()).or_default();
        if bucket.len() < limit {
            bucket.push(result);
        }
    }
    grouped.retain(|_, bucket| !bucket.is_empty());
    grouped
}
