use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::workflows::listings::domain::PropertyId;
use crate::workflows::matching::domain::InvestorId;

/// Viewing slot length in minutes.
pub const SLOT_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wall-clock slot start, serialized as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(pub NaiveTime);

impl SlotTime {
    pub fn hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn parse(raw: &str) -> Result<Self, chrono::ParseError> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M").map(Self)
    }

    /// True when the time sits on a whole slot boundary (`:00` or `:30`).
    pub fn is_on_grid(self) -> bool {
        self.0.second() == 0 && self.0.nanosecond() == 0 && self.0.minute() % SLOT_MINUTES == 0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SlotTime::parse(&raw).map_err(|err| {
            serde::de::Error::custom(format!("failed to parse '{raw}' as HH:MM ({err})"))
        })
    }
}

/// Viewing request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    /// Only live requests hold a slot against other investors.
    pub const fn occupies_slot(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Rejected)
                | (Approved, Cancelled)
                | (Approved, Completed)
        )
    }

    pub fn transition(self, next: BookingStatus) -> Result<BookingStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("viewing cannot move from {} to {}", .from.label(), .to.label())]
pub struct TransitionError {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

/// Investor's ask for a specific slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingSlotRequest {
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub time: SlotTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingBooking {
    pub id: BookingId,
    pub property_id: PropertyId,
    pub investor_id: InvestorId,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub status: BookingStatus,
    pub requested_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ViewingBooking {
    pub fn occupies(&self, property_id: &PropertyId, date: NaiveDate, time: SlotTime) -> bool {
        self.status.occupies_slot()
            && &self.property_id == property_id
            && self.date == date
            && self.time == time
    }
}

/// Coarse viewing windows a landlord can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Morning,
    Afternoon,
    Evening,
}

impl TimeWindow {
    /// Opening and closing hour, closing exclusive.
    pub const fn hours(self) -> (u32, u32) {
        match self {
            TimeWindow::Morning => (9, 12),
            TimeWindow::Afternoon => (12, 17),
            TimeWindow::Evening => (17, 20),
        }
    }
}

/// Landlord's preferred viewing days and windows; empty lists mean the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandlordAvailabilityPreference {
    pub preferred_days: Vec<String>,
    pub preferred_time_windows: Vec<TimeWindow>,
}

/// Accepts full names and common abbreviations (`Mon`, `tues`, `Thursday`).
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let lowered = raw.trim().to_ascii_lowercase();
    let day = match lowered.as_str() {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tues" | "tuesday" => Weekday::Tue,
        "wed" | "weds" | "wednesday" => Weekday::Wed,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
