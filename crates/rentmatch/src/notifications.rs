use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Transactional e-mail templates sent by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    ListingMatch,
    MatchDigest,
    ViewingRequested,
    ViewingStatusChanged,
}

impl NotificationTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationTemplate::ListingMatch => "listing_match",
            NotificationTemplate::MatchDigest => "match_digest",
            NotificationTemplate::ViewingRequested => "viewing_requested",
            NotificationTemplate::ViewingStatusChanged => "viewing_status_changed",
        }
    }
}

/// Payload handed to the delivery collaborator. `recipient` is a user id; address lookup
/// happens on the delivery side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(template: NotificationTemplate, recipient: impl Into<String>) -> Self {
        Self {
            template,
            recipient: recipient.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// Outbound delivery hook (transactional e-mail provider or a test double).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("recipient {0} cannot receive notifications")]
    UndeliverableRecipient(String),
}

/// Tally of a notification fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
}
