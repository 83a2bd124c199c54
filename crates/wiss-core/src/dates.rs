//! Calendar-day helpers used throughout the kernel.

use crate::errors::{SimError, SimResult};
use crate::ranges::in_range;
use chrono::{Duration, NaiveDate};

/// Number of days from `from` to `to` (10 March to 11 March is 1 day).
pub fn diff_days(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// The date `days` after `date`. Negative offsets step backwards.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Builds a date from a year and a day-in-year (1 Jan = 1).
pub fn date_from_doy(year: i32, day_in_year: u32) -> SimResult<NaiveDate> {
    let last = if NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|d| d.leap_year())
        .unwrap_or(false)
    {
        366
    } else {
        365
    };

    if !in_range(day_in_year, 1, last) {
        return Err(SimError::contract(
            "dates",
            "date_from_doy",
            format!("illegal day in year {year} (day={day_in_year})"),
        ));
    }

    NaiveDate::from_yo_opt(year, day_in_year).ok_or_else(|| {
        SimError::contract(
            "dates",
            "date_from_doy",
            format!("illegal year/day combination ({year}, {day_in_year})"),
        )
    })
}
