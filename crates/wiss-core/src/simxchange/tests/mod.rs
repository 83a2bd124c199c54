//! Scenario tests of the dynamic store.

mod aggregations;
mod crossings;
mod report;

use super::SimXChange;
use chrono::NaiveDate;

pub(super) fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Store with the period set and a `MOD1` simID registered.
pub(super) fn store(start: NaiveDate, end: NaiveDate) -> SimXChange {
    let mut sim = SimXChange::new("test-run");
    sim.set_date_period(start, end).unwrap();
    sim.register_sim_id("MOD1", "TestModule").unwrap();
    sim
}
