//! Experiment clock — walks the inclusive calendar range of the run.

use crate::types::Day;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayClock {
    pub start_date:   NaiveDate,
    pub horizon_days: Day,
    /// Days already simulated. 0 before the first tick.
    pub days_elapsed: Day,
}

impl DayClock {
    pub fn new(start_date: NaiveDate, horizon_days: Day) -> Self {
        Self {
            start_date,
            horizon_days,
            days_elapsed: 0,
        }
    }

    /// Advance one day. Returns the 1-based day number and its calendar
    /// date, or None once the horizon is exhausted.
    pub fn advance(&mut self) -> Option<(Day, NaiveDate)> {
        if self.is_finished() {
            return None;
        }
        let date = self.start_date.checked_add_days(Days::new(self.days_elapsed))?;
        self.days_elapsed += 1;
        Some((self.days_elapsed, date))
    }

    pub fn is_finished(&self) -> bool {
        self.days_elapsed >= self.horizon_days
    }

    pub fn remaining(&self) -> Day {
        self.horizon_days.saturating_sub(self.days_elapsed)
    }

    /// Last calendar day of the run (inclusive).
    pub fn end_date(&self) -> Option<NaiveDate> {
        let span = self.horizon_days.checked_sub(1)?;
        self.start_date.checked_add_days(Days::new(span))
    }

    /// Date of the most recently simulated day.
    pub fn current_date(&self) -> Option<NaiveDate> {
        let span = self.days_elapsed.checked_sub(1)?;
        self.start_date.checked_add_days(Days::new(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    #[test]
    fn walks_exactly_horizon_days_inclusive() {
        let mut clock = DayClock::new(jan_1(), 30);
        let dates: Vec<_> = std::iter::from_fn(|| clock.advance()).collect();
        assert_eq!(dates.len(), 30);
        assert_eq!(dates[0], (1, jan_1()));
        assert_eq!(dates[29].1, NaiveDate::from_ymd_opt(2023, 1, 30).unwrap());
        assert_eq!(clock.end_date(), Some(dates[29].1));
        assert_eq!(clock.current_date(), clock.end_date());
        assert!(clock.is_finished());
        assert_eq!(clock.advance(), None);
    }

    #[test]
    fn fresh_clock_has_no_current_date() {
        let clock = DayClock::new(jan_1(), 3);
        assert_eq!(clock.current_date(), None);
        assert_eq!(clock.remaining(), 3);
    }
}
