//! Time source for the timestamp line

use chrono::{Local, NaiveDateTime};

/// Format of the timestamp line prepended to every rendered text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the render timestamp
pub trait Clock {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;

    /// Current time formatted with [`TIMESTAMP_FORMAT`]
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Wall clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self(instant)
    }

    /// Build from milliseconds since the Unix epoch; the wall time shown is UTC
    ///
    /// Callers wanting local time shift `millis` by their zone offset first.
    /// Returns `None` when the value is out of range.
    pub fn from_millis(millis: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp_millis(millis).map(|dt| Self(dt.naive_utc()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 30)
            .unwrap()
    }

    #[test]
    fn test_fixed_clock_timestamp() {
        let clock = FixedClock::new(instant());
        assert_eq!(clock.timestamp(), "2024-03-09 07:05:30");
    }

    #[test]
    fn test_fixed_clock_from_millis() {
        let clock = FixedClock::from_millis(0).unwrap();
        assert_eq!(clock.timestamp(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_system_clock_format_shape() {
        let stamp = SystemClock.timestamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[13..14], ":");
    }

    #[test]
    fn test_clock_by_reference() {
        let clock = FixedClock::new(instant());
        let by_ref: &dyn Clock = &clock;
        assert_eq!(by_ref.timestamp(), "2024-03-09 07:05:30");
    }
}
