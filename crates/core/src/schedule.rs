//! Preparation-time slots and restaurant open/closed status.
//!
//! Every function here takes the current local instant as an argument. The
//! restaurant runs on a fixed UTC offset with no daylight saving, so local
//! wall-clock time is represented as [`NaiveDateTime`] throughout.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Display format used for prep times and order timestamps.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Storage marker for "as soon as possible".
pub const ASAP_MARKER: &str = "asap";

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Restaurant operating hours and ordering window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hours {
    /// Business opens (inclusive).
    pub business_open: NaiveTime,
    /// Business closes (exclusive).
    pub business_close: NaiveTime,
    /// First selectable prep time of a day.
    pub window_start: NaiveTime,
    /// Last selectable prep time of a day (inclusive).
    pub window_end: NaiveTime,
    /// "As soon as possible" is offered while local time is before this.
    pub asap_cutoff: NaiveTime,
    /// Distance between consecutive slots, in minutes.
    pub step_minutes: u32,
}

impl Default for Hours {
    fn default() -> Self {
        Self {
            business_open: hm(10, 0),
            business_close: hm(21, 0),
            window_start: hm(10, 0),
            window_end: hm(20, 30),
            asap_cutoff: hm(20, 30),
            step_minutes: 30,
        }
    }
}

impl Hours {
    fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes.max(1)))
    }

    fn window_start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.window_start)
    }

    fn window_end_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.window_end)
    }
}

/// One selectable preparation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Local instant of the slot.
    pub at: NaiveDateTime,
    /// Button label, e.g. `20:00` or `10:00 (tomorrow)`.
    pub label: String,
}

impl Slot {
    /// Canonical `DD.MM.YYYY HH:MM` form.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.at.format(DISPLAY_FORMAT).to_string()
    }
}

/// Round `earliest` up to the next step boundary counted from the window
/// start of its own date.
fn round_up(earliest: NaiveDateTime, hours: &Hours) -> NaiveDateTime {
    let start = hours.window_start_on(earliest.date());
    let step = hours.step().num_seconds();
    let offset = (earliest - start).num_seconds();
    let steps = (offset + step - 1).div_euclid(step);
    start + Duration::seconds(steps * step)
}

/// First slot instant that satisfies the lead time.
fn first_slot(now: NaiveDateTime, lead_minutes: u32, hours: &Hours) -> NaiveDateTime {
    let earliest = now + Duration::minutes(i64::from(lead_minutes));
    let date = earliest.date();

    let floor = if earliest < hours.window_start_on(date) {
        hours.window_start_on(date)
    } else if earliest > hours.window_end_on(date) {
        hours.window_start_on(date + Duration::days(1))
    } else {
        round_up(earliest, hours)
    };

    // Rounding can still push past the end of the window.
    if floor > hours.window_end_on(floor.date()) {
        hours.window_start_on(floor.date() + Duration::days(1))
    } else {
        floor
    }
}

/// Generate the selectable preparation times.
///
/// The first slot is `now + lead_minutes` rounded up to a step boundary,
/// clamped into the ordering window; slots then follow every step through the
/// window end inclusive. Labels carry ` (tomorrow)` when the slot falls on a
/// later date than `now`.
#[must_use]
pub fn generate_slots(now: NaiveDateTime, lead_minutes: u32, hours: &Hours) -> Vec<Slot> {
    let today = now.date();
    let mut at = first_slot(now, lead_minutes, hours);
    let end = hours.window_end_on(at.date());

    let mut slots = Vec::new();
    while at <= end {
        let mut label = at.format("%H:%M").to_string();
        if at.date() != today {
            label.push_str(" (tomorrow)");
        }
        slots.push(Slot { at, label });
        at += hours.step();
    }
    slots
}

/// Look up a slot by instant among freshly generated slots.
///
/// Used to reject stale buttons rendered before the window moved on.
#[must_use]
pub fn find_slot(
    now: NaiveDateTime,
    lead_minutes: u32,
    hours: &Hours,
    at: NaiveDateTime,
) -> Option<Slot> {
    generate_slots(now, lead_minutes, hours)
        .into_iter()
        .find(|slot| slot.at == at)
}

/// Whether the "as soon as possible" option should be offered.
#[must_use]
pub fn asap_available(now: NaiveDateTime, hours: &Hours) -> bool {
    now.time() < hours.asap_cutoff
}

/// The prep time a customer picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepTime {
    /// As soon as possible.
    Asap,
    /// A concrete local instant.
    At(NaiveDateTime),
}

impl PrepTime {
    /// Storage form: `asap` or ISO-8601 local time.
    #[must_use]
    pub fn to_storage(&self) -> String {
        match self {
            Self::Asap => ASAP_MARKER.to_string(),
            Self::At(at) => at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Parse the storage form. Also accepts the legacy `DD.MM.YYYY HH:MM`.
    #[must_use]
    pub fn from_storage(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ASAP_MARKER) {
            return Some(Self::Asap);
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, DISPLAY_FORMAT))
            .ok()
            .map(Self::At)
    }

    /// Customer-facing text.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Asap => "As soon as possible".to_string(),
            Self::At(at) => at.format(DISPLAY_FORMAT).to_string(),
        }
    }

    /// `TODAY`/`TOMORROW` relative to `today`, if applicable.
    #[must_use]
    pub fn day_marker(&self, today: NaiveDate) -> Option<&'static str> {
        match self {
            Self::Asap => None,
            Self::At(at) if at.date() == today => Some("TODAY"),
            Self::At(at) if at.date() == today + Duration::days(1) => Some("TOMORROW"),
            Self::At(_) => None,
        }
    }
}

/// Whether the restaurant is open right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestaurantStatus {
    /// Open. `orders_close` is set when ordering stops before closing time.
    Open {
        /// Order cut-off earlier than business close.
        orders_close: Option<NaiveTime>,
    },
    /// Closed until `next_opening`.
    Closed {
        /// Next opening instant.
        next_opening: NaiveDateTime,
    },
}

impl RestaurantStatus {
    /// Human-readable status line.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Open { orders_close: None } => "We are open".to_string(),
            Self::Open {
                orders_close: Some(cutoff),
            } => format!("We are open. Orders are accepted until {}", cutoff.format("%H:%M")),
            Self::Closed { next_opening } => format!(
                "We are closed. We open on {} at {}",
                next_opening.format("%d.%m.%Y"),
                next_opening.format("%H:%M")
            ),
        }
    }
}

/// Compute the restaurant status for `now`.
#[must_use]
pub fn restaurant_status(now: NaiveDateTime, hours: &Hours) -> RestaurantStatus {
    let time = now.time();
    if time >= hours.business_open && time < hours.business_close {
        let orders_close = (hours.window_end < hours.business_close).then_some(hours.window_end);
        return RestaurantStatus::Open { orders_close };
    }

    let date = if time < hours.business_open {
        now.date()
    } else {
        now.date() + Duration::days(1)
    };
    RestaurantStatus::Closed {
        next_opening: date.and_time(hours.business_open),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn labels(slots: &[Slot]) -> Vec<&str> {
        slots.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_evening_slots_include_window_end() {
        let slots = generate_slots(at(10, 18, 50), 60, &Hours::default());
        assert_eq!(labels(&slots), vec!["20:00", "20:30"]);
        assert_eq!(slots[0].canonical(), "10.05.2024 20:00");
    }

    #[test]
    fn test_after_close_rolls_to_next_day() {
        let slots = generate_slots(at(10, 22, 0), 60, &Hours::default());
        assert_eq!(slots.first().unwrap().at, at(11, 10, 0));
        assert_eq!(slots.first().unwrap().label, "10:00 (tomorrow)");
        assert_eq!(slots.last().unwrap().at, at(11, 20, 30));
        assert_eq!(slots.len(), 22);
    }

    #[test]
    fn test_early_morning_clamps_to_window_start() {
        let slots = generate_slots(at(10, 6, 15), 30, &Hours::default());
        assert_eq!(slots.first().unwrap().label, "10:00");
    }

    #[test]
    fn test_minute_rounding_carries_into_hour() {
        let slots = generate_slots(at(10, 12, 45), 30, &Hours::default());
        assert_eq!(slots.first().unwrap().at, at(10, 13, 30));

        let slots = generate_slots(at(10, 12, 31), 30, &Hours::default());
        assert_eq!(slots.first().unwrap().at, at(10, 13, 30));
    }

    #[test]
    fn test_rounding_past_window_end_rolls_over() {
        // 19:45 + 60 = 20:45 > 20:30
        let slots = generate_slots(at(10, 19, 45), 60, &Hours::default());
        assert_eq!(slots.first().unwrap().at, at(11, 10, 0));
    }

    #[test]
    fn test_exact_boundary_is_not_rounded() {
        let slots = generate_slots(at(10, 19, 0), 60, &Hours::default());
        assert_eq!(labels(&slots), vec!["20:00", "20:30"]);
    }

    #[test]
    fn test_slots_are_step_multiples_within_window() {
        let hours = Hours::default();
        for minute in (0..24 * 60).step_by(7) {
            let now = at(10, minute / 60, minute % 60);
            let slots = generate_slots(now, 60, &hours);
            assert!(!slots.is_empty());
            assert!(slots[0].at >= now + Duration::minutes(60));
            for slot in &slots {
                let t = slot.at.time();
                assert!(t >= hours.window_start && t <= hours.window_end);
                let from_start = (t - hours.window_start).num_minutes();
                assert_eq!(from_start % 30, 0);
            }
        }
    }

    #[test]
    fn test_find_slot_rejects_stale_time() {
        let hours = Hours::default();
        let now = at(10, 18, 50);
        assert!(find_slot(now, 60, &hours, at(10, 20, 0)).is_some());
        assert!(find_slot(now, 60, &hours, at(10, 19, 30)).is_none());
    }

    #[test]
    fn test_asap_cutoff() {
        let hours = Hours::default();
        assert!(asap_available(at(10, 20, 29), &hours));
        assert!(!asap_available(at(10, 20, 30), &hours));
    }

    #[test]
    fn test_prep_time_storage() {
        let prep = PrepTime::At(at(10, 20, 0));
        assert_eq!(prep.to_storage(), "2024-05-10T20:00:00");
        assert_eq!(PrepTime::from_storage(&prep.to_storage()), Some(prep));
        assert_eq!(PrepTime::from_storage("10.05.2024 20:00"), Some(prep));
        assert_eq!(PrepTime::from_storage("asap"), Some(PrepTime::Asap));
        assert_eq!(PrepTime::from_storage("soon"), None);
    }

    #[test]
    fn test_day_marker() {
        let today = at(10, 0, 0).date();
        assert_eq!(PrepTime::At(at(10, 20, 0)).day_marker(today), Some("TODAY"));
        assert_eq!(PrepTime::At(at(11, 10, 0)).day_marker(today), Some("TOMORROW"));
        assert_eq!(PrepTime::At(at(12, 10, 0)).day_marker(today), None);
        assert_eq!(PrepTime::Asap.day_marker(today), None);
    }

    #[test]
    fn test_restaurant_status() {
        let hours = Hours::default();
        assert_eq!(
            restaurant_status(at(10, 12, 0), &hours),
            RestaurantStatus::Open {
                orders_close: Some(hm(20, 30))
            }
        );
        assert_eq!(
            restaurant_status(at(10, 8, 0), &hours),
            RestaurantStatus::Closed {
                next_opening: at(10, 10, 0)
            }
        );
        assert_eq!(
            restaurant_status(at(10, 21, 0), &hours),
            RestaurantStatus::Closed {
                next_opening: at(11, 10, 0)
            }
        );
    }

    #[test]
    fn test_status_without_early_cutoff() {
        let hours = Hours {
            window_end: hm(21, 0),
            ..Hours::default()
        };
        let status = restaurant_status(at(10, 12, 0), &hours);
        assert_eq!(status, RestaurantStatus::Open { orders_close: None });
        assert_eq!(status.render(), "We are open");
    }
}
