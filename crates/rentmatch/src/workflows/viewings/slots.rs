//! Bookable viewing slots for a listing over a date range.
//!
//! The calendar is advisory: it reflects bookings read at request time. The booking insert
//! path re-checks the slot against storage before anything is written.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::Serialize;

use super::domain::{
    parse_weekday, weekday_name, BookingStatus, LandlordAvailabilityPreference, SlotTime,
    ViewingBooking, SLOT_MINUTES,
};
use crate::config::ViewingConfig;
use crate::workflows::listings::domain::{PropertyId, PropertyRecord};

const DEFAULT_OPEN_HOUR: u32 = 9;
const DEFAULT_CLOSE_HOUR: u32 = 18;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookedSlot {
    pub time: SlotTime,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub available_slots: Vec<SlotTime>,
    pub booked_slots: Vec<BookedSlot>,
    pub available_count: usize,
    pub booked_count: usize,
}

/// Earliest window opening and latest window closing across the landlord's windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessHours {
    pub start: SlotTime,
    pub end: SlotTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityCalendar {
    pub property_id: PropertyId,
    pub days: Vec<DayAvailability>,
    pub excluded_weekdays: Vec<&'static str>,
    pub business_hours: BusinessHours,
}

impl AvailabilityCalendar {
    pub fn day(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.days.iter().find(|day| day.date == date)
    }

    pub fn is_available(&self, date: NaiveDate, time: SlotTime) -> bool {
        self.day(date)
            .map(|day| day.available_slots.contains(&time))
            .unwrap_or(false)
    }
}

/// Pure slot calculator; holds only the look-ahead horizon.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilitySlotGenerator {
    lookahead_days: u32,
}

impl Default for AvailabilitySlotGenerator {
    fn default() -> Self {
        Self::new(&ViewingConfig::default())
    }
}

impl AvailabilitySlotGenerator {
    pub fn new(config: &ViewingConfig) -> Self {
        Self {
            lookahead_days: config.lookahead_days,
        }
    }

    pub fn generate(
        &self,
        property: &PropertyRecord,
        preferences: &LandlordAvailabilityPreference,
        bookings: &[ViewingBooking],
        start: NaiveDate,
        end: NaiveDate,
        now: NaiveDateTime,
    ) -> AvailabilityCalendar {
        let allowed_days = allowed_weekdays(preferences);
        let windows = time_windows(preferences);
        let business_hours = envelope(&windows);
        let grid = slot_grid(&windows);

        let excluded_weekdays = WEEK
            .iter()
            .filter(|day| !allowed_days.contains(day))
            .map(|day| weekday_name(*day))
            .collect();

        let today = now.date();
        let first = start.max(today);
        let last = today
            .checked_add_signed(Duration::days(i64::from(self.lookahead_days)))
            .map_or(end, |horizon| end.min(horizon));

        let mut occupied: HashMap<(NaiveDate, SlotTime), BookingStatus> = HashMap::new();
        for booking in bookings.iter().filter(|booking| {
            booking.property_id == property.id && booking.status.occupies_slot()
        }) {
            occupied
                .entry((booking.date, booking.time))
                .and_modify(|status| {
                    if booking.status == BookingStatus::Approved {
                        *status = BookingStatus::Approved;
                    }
                })
                .or_insert(booking.status);
        }

        let mut days = Vec::new();
        if first <= last {
            for date in first.iter_days().take_while(|date| *date <= last) {
                if !allowed_days.contains(&date.weekday()) {
                    continue;
                }

                let mut available_slots = Vec::new();
                let mut booked_slots = Vec::new();
                for slot in &grid {
                    if date == today && slot.0 <= now.time() {
                        continue;
                    }
                    match occupied.get(&(date, *slot)) {
                        Some(status) => booked_slots.push(BookedSlot {
                            time: *slot,
                            status: *status,
                        }),
                        None => available_slots.push(*slot),
                    }
                }

                days.push(DayAvailability {
                    date,
                    weekday: weekday_name(date.weekday()),
                    available_count: available_slots.len(),
                    booked_count: booked_slots.len(),
                    available_slots,
                    booked_slots,
                });
            }
        }

        AvailabilityCalendar {
            property_id: property.id.clone(),
            days,
            excluded_weekdays,
            business_hours,
        }
    }
}

/// Landlord days, or Monday to Saturday when none are set or none parse.
fn allowed_weekdays(preferences: &LandlordAvailabilityPreference) -> HashSet<Weekday> {
    let parsed: HashSet<Weekday> = preferences
        .preferred_days
        .iter()
        .filter_map(|raw| parse_weekday(raw))
        .collect();

    if parsed.is_empty() {
        WEEK.iter().copied().filter(|day| *day != Weekday::Sun).collect()
    } else {
        parsed
    }
}

fn time_windows(preferences: &LandlordAvailabilityPreference) -> Vec<(NaiveTime, NaiveTime)> {
    let hours: Vec<(u32, u32)> = if preferences.preferred_time_windows.is_empty() {
        vec![(DEFAULT_OPEN_HOUR, DEFAULT_CLOSE_HOUR)]
    } else {
        preferences
            .preferred_time_windows
            .iter()
            .map(|window| window.hours())
            .collect()
    };

    hours
        .into_iter()
        .filter_map(|(open, close)| {
            Some((
                NaiveTime::from_hms_opt(open, 0, 0)?,
                NaiveTime::from_hms_opt(close, 0, 0)?,
            ))
        })
        .collect()
}

fn envelope(windows: &[(NaiveTime, NaiveTime)]) -> BusinessHours {
    let start = windows
        .iter()
        .map(|(open, _)| *open)
        .min()
        .or_else(|| NaiveTime::from_hms_opt(DEFAULT_OPEN_HOUR, 0, 0))
        .unwrap_or_default();
    let end = windows
        .iter()
        .map(|(_, close)| *close)
        .max()
        .or_else(|| NaiveTime::from_hms_opt(DEFAULT_CLOSE_HOUR, 0, 0))
        .unwrap_or_default();
    BusinessHours {
        start: SlotTime(start),
        end: SlotTime(end),
    }
}

/// Every slot start whose full slot fits inside a window, deduplicated and ascending.
fn slot_grid(windows: &[(NaiveTime, NaiveTime)]) -> Vec<SlotTime> {
    let step = Duration::minutes(i64::from(SLOT_MINUTES));
    let mut slots = BTreeSet::new();

    for (open, close) in windows {
        let mut cursor = *open;
        loop {
            let (next, wrapped) = cursor.overflowing_add_signed(step);
            if wrapped != 0 || next > *close {
                break;
            }
            slots.insert(SlotTime(cursor));
            cursor = next;
        }
    }

    slots.into_iter().collect()
}
