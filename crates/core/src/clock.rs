//! Source of the date printed on labels.

use chrono::{Local, NaiveDate};

/// Supplies today's date to a session.
pub trait Clock: Send {
    /// The current local date.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock dates in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date. Used for reproducible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_fixed() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let clock = FixedClock(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.today(), clock.today());
    }
}
