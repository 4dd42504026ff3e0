//! Restaurant-local time.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    /// Now, in the restaurant's fixed offset.
    fn now(&self) -> NaiveDateTime;
}

/// Real time shifted into a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    /// Seconds since the epoch, as local wall-clock time.
    secs: AtomicI64,
}

impl FixedClock {
    #[must_use]
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            secs: AtomicI64::new(at.and_utc().timestamp()),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.secs.store(at.and_utc().timestamp(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0)
            .unwrap_or_default()
            .naive_utc()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_fixed_clock() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(18, 50, 0)
            .unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);

        let later = at + chrono::Duration::hours(4);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_applies_offset() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = SystemClock::new(offset).now();
        let utc = Utc::now().naive_utc();
        let diff = (local - utc).num_minutes();
        assert!((479..=481).contains(&diff), "offset was {diff} minutes");
    }
}
