//! Calendar with daily steps.

use crate::dates::{add_days, diff_days};
use crate::errors::{SimError, SimResult};
use crate::ranges::in_range;
use chrono::{Datelike, NaiveDate};

const COMPONENT: &str = "Timer";

/// Carries the calendar of a run: start and end date, the current date, an
/// optional pause date and the termination flag.
///
/// The date period is set once via [`Timer::set_date_period`] (or
/// [`Timer::set_date_duration`]); [`Timer::reset`] returns to the start
/// date, [`Timer::clear`] discards the period entirely.
#[derive(Debug, Default)]
pub struct Timer {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    cur_date: Option<NaiveDate>,
    pause_date: Option<NaiveDate>,
    duration: i64,
    terminate: bool,
}

impl Timer {
    pub fn new() -> Timer {
        Timer::default()
    }

    fn period(&self, method: &str) -> SimResult<(NaiveDate, NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date, self.cur_date) {
            (Some(s), Some(e), Some(c)) => Ok((s, e, c)),
            _ => Err(SimError::contract(COMPONENT, method, "date period not set")),
        }
    }

    /// Defines the start and end date of the simulation. Can be set only
    /// once.
    pub fn set_date_period(&mut self, start: NaiveDate, end: NaiveDate) -> SimResult<()> {
        let method = "set_date_period";

        if self.start_date.is_some() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                "date period cannot be set twice",
            ));
        }
        if start > end {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "no period to simulate, end date must be later than start date (start={start}, end={end})"
                ),
            ));
        }

        self.start_date = Some(start);
        self.end_date = Some(end);
        self.cur_date = Some(start);
        self.duration = diff_days(start, end);
        Ok(())
    }

    /// Defines the period through a duration in days (must be >= 1). Can be
    /// set only once.
    pub fn set_date_duration(&mut self, start: NaiveDate, duration: i64) -> SimResult<()> {
        let method = "set_date_duration";

        if self.start_date.is_some() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                "date period cannot be set twice",
            ));
        }
        if duration < 1 {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("no duration to simulate, duration ({duration}) must be 1 or larger"),
            ));
        }

        self.start_date = Some(start);
        self.end_date = Some(add_days(start, duration));
        self.cur_date = Some(start);
        self.duration = duration;
        Ok(())
    }

    /// Reinitialises the calendar on the start date.
    pub fn reset(&mut self) -> SimResult<()> {
        let (start, _, _) = self.period("reset")?;
        self.cur_date = Some(start);
        self.terminate = false;
        Ok(())
    }

    /// Returns to the state immediately after construction: no date period
    /// set. Works differently from [`Timer::reset`].
    pub fn clear(&mut self) {
        self.start_date = None;
        self.end_date = None;
        self.cur_date = None;
        self.pause_date = None;
        self.duration = 0;
        self.terminate = false;
    }

    /// Increases the date by one day. When the increment crosses past the
    /// end date the terminate flag is set and the current date is clamped at
    /// the end date, so the simulation must stop because of time.
    pub fn date_step(&mut self) -> SimResult<()> {
        let method = "date_step";
        let (_, end, cur) = self.period(method)?;

        if self.terminate {
            return Err(SimError::contract(COMPONENT, method, "already terminated"));
        }

        let mut next = cur;
        if cur <= end {
            next = add_days(cur, 1);
        }
        if next > end {
            self.terminate = true;
            next = end;
        }
        self.cur_date = Some(next);
        Ok(())
    }

    /// The current date.
    pub fn date(&self) -> SimResult<NaiveDate> {
        Ok(self.period("date")?.2)
    }

    /// The current year.
    pub fn year(&self) -> SimResult<i32> {
        Ok(self.period("year")?.2.year())
    }

    /// The current month (1-12).
    pub fn month(&self) -> SimResult<u32> {
        Ok(self.period("month")?.2.month())
    }

    /// The current day in the month (e.g. Feb 12 = 12).
    pub fn day_in_month(&self) -> SimResult<u32> {
        Ok(self.period("day_in_month")?.2.day())
    }

    /// The current day in the year (e.g. Feb 1 = 32).
    pub fn day_in_year(&self) -> SimResult<u32> {
        Ok(self.period("day_in_year")?.2.ordinal())
    }

    /// Whether a date period has been set.
    pub fn date_period_set(&self) -> bool {
        self.start_date.is_some()
    }

    pub fn start_date(&self) -> SimResult<NaiveDate> {
        Ok(self.period("start_date")?.0)
    }

    pub fn end_date(&self) -> SimResult<NaiveDate> {
        Ok(self.period("end_date")?.1)
    }

    /// The simulation duration from start to end date, inclusive of both
    /// (Jan 1 to Jan 2 is 1 day).
    pub fn duration(&self) -> SimResult<i64> {
        self.period("duration")?;
        Ok(self.duration)
    }

    /// The number of days passed since the start of date stepping.
    pub fn elapsed(&self) -> SimResult<i64> {
        let (start, _, cur) = self.period("elapsed")?;
        Ok(diff_days(start, cur))
    }

    /// Whether the simulation must stop because the end date was passed.
    pub fn terminate(&self) -> bool {
        self.terminate
    }

    pub fn is_on_start_date(&self) -> SimResult<bool> {
        let (start, _, cur) = self.period("is_on_start_date")?;
        Ok(cur == start)
    }

    pub fn is_on_end_date(&self) -> SimResult<bool> {
        let (_, end, cur) = self.period("is_on_end_date")?;
        Ok(cur == end)
    }

    /// Sets the date on which a pause is required (debug hook, no semantic
    /// effect on the run).
    pub fn set_pause_date(&mut self, pause_date: NaiveDate) -> SimResult<()> {
        let method = "set_pause_date";
        let (start, end, _) = self.period(method)?;

        if !in_range(pause_date, start, end) {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "pause date ({pause_date}) not within start and end date (start={start}, end={end})"
                ),
            ));
        }
        self.pause_date = Some(pause_date);
        Ok(())
    }

    /// Whether the current date is on or after the pause date (when set).
    pub fn pause_now(&self) -> bool {
        match (self.pause_date, self.cur_date) {
            (Some(p), Some(c)) => c >= p,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn timer(start: NaiveDate, end: NaiveDate) -> Timer {
        let mut t = Timer::new();
        t.set_date_period(start, end).unwrap();
        t
    }

    #[test]
    fn period_can_be_set_only_once() {
        let mut t = timer(d(2020, 1, 1), d(2020, 1, 10));
        assert!(t.set_date_period(d(2020, 1, 1), d(2020, 1, 10)).is_err());
    }

    #[test]
    fn accessors_require_period() {
        let t = Timer::new();
        assert!(t.date().is_err());
        assert!(t.duration().is_err());
        assert!(!t.date_period_set());
    }

    #[test]
    fn stepping_to_the_end_sets_terminate_and_clamps() {
        let mut t = timer(d(2020, 1, 1), d(2020, 1, 3));
        assert_eq!(t.duration().unwrap(), 2);
        assert!(t.is_on_start_date().unwrap());

        t.date_step().unwrap();
        assert_eq!(t.elapsed().unwrap(), 1);
        t.date_step().unwrap();
        assert!(t.is_on_end_date().unwrap());
        assert!(!t.terminate());

        // one step past the end terminates and clamps
        t.date_step().unwrap();
        assert!(t.terminate());
        assert_eq!(t.date().unwrap(), d(2020, 1, 3));
        assert!(t.date_step().is_err());
    }

    #[test]
    fn reset_returns_to_start() {
        let mut t = timer(d(2020, 1, 1), d(2020, 1, 3));
        t.date_step().unwrap();
        t.reset().unwrap();
        assert!(t.is_on_start_date().unwrap());
        assert!(!t.terminate());
    }

    #[test]
    fn duration_form_matches_period_form() {
        let mut t = Timer::new();
        t.set_date_duration(d(2020, 1, 1), 2).unwrap();
        assert_eq!(t.end_date().unwrap(), d(2020, 1, 3));
        assert!(Timer::new().set_date_duration(d(2020, 1, 1), 0).is_err());
    }

    #[test]
    fn calendar_accessors() {
        let t = timer(d(2021, 2, 1), d(2021, 3, 1));
        assert_eq!(t.year().unwrap(), 2021);
        assert_eq!(t.month().unwrap(), 2);
        assert_eq!(t.day_in_month().unwrap(), 1);
        assert_eq!(t.day_in_year().unwrap(), 32);
    }

    #[test]
    fn pause_date_is_a_threshold() {
        let mut t = timer(d(2020, 1, 1), d(2020, 1, 5));
        assert!(!t.pause_now());
        t.set_pause_date(d(2020, 1, 3)).unwrap();
        assert!(!t.pause_now());
        t.date_step().unwrap();
        t.date_step().unwrap();
        assert!(t.pause_now());
        t.date_step().unwrap();
        assert!(t.pause_now());

        assert!(t.set_pause_date(d(2021, 1, 1)).is_err());
    }
}
