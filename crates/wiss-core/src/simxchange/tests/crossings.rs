//! Crossing detection and interpolator extraction.

use super::{d, store};
use crate::ranges::RangeType;
use crate::simvalues::SimValueAux;
use crate::simxchange::SimXChange;
use crate::units::ScientificUnit;
use approx::assert_abs_diff_eq;

/// Writes the series as an aux variable named `V`, one value per day.
fn write_series(sim: &mut SimXChange, series: &[f64]) -> SimValueAux {
    let mut v = SimValueAux::new("MOD1", "V", ScientificUnit::NoDim, RangeType::All).unwrap();
    for (day, &value) in series.iter().enumerate() {
        if day > 0 {
            sim.update_to_date(d(2020, 1, 1 + day as u32)).unwrap();
        }
        v.v = value;
        sim.set_aux(&mut v).unwrap();
    }
    v
}

#[test]
fn crossing_detection_up_and_down() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 7));
    let v = write_series(&mut sim, &[0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0]);

    let up = sim
        .dates_where_crosses(v.token(), ScientificUnit::NoDim, 1.5, true)
        .unwrap();
    assert_eq!(up, vec![d(2020, 1, 3)]); // day 2

    let down = sim
        .dates_where_crosses(v.token(), ScientificUnit::NoDim, 1.5, false)
        .unwrap();
    assert_eq!(down, vec![d(2020, 1, 6)]); // day 5
}

#[test]
fn touching_the_threshold_is_not_a_crossing() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 5));
    let v = write_series(&mut sim, &[0.0, 1.5, 1.5, 2.0, 0.0]);

    // upward needs strictly above after at-or-below
    let up = sim
        .dates_where_crosses(v.token(), ScientificUnit::NoDim, 1.5, true)
        .unwrap();
    assert_eq!(up, vec![d(2020, 1, 4)]);

    let down = sim
        .dates_where_crosses(v.token(), ScientificUnit::NoDim, 1.5, false)
        .unwrap();
    assert_eq!(down, vec![d(2020, 1, 5)]);
}

#[test]
fn crossings_honour_the_requested_unit() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 3));
    let mut t =
        SimValueAux::new("MOD1", "T", ScientificUnit::Celsius, RangeType::TempCelsius).unwrap();
    for (day, value) in [0.0, 10.0, 0.0].into_iter().enumerate() {
        if day > 0 {
            sim.update_to_date(d(2020, 1, 1 + day as u32)).unwrap();
        }
        t.v = value;
        sim.set_aux(&mut t).unwrap();
    }

    // 278.15 K = 5 degrees C; the 0 -> 10 C rise crosses it on day 1
    let up = sim
        .dates_where_crosses(t.token(), ScientificUnit::Kelvin, 278.15, true)
        .unwrap();
    assert_eq!(up, vec![d(2020, 1, 2)]);
}

#[test]
fn interpolator_extraction() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 4));
    let v = write_series(&mut sim, &[10.0, 20.0, 40.0, 40.0]);

    let ip = sim.interpolator_by_token(v.token()).unwrap();
    assert_eq!(ip.count(), 4);
    assert_abs_diff_eq!(ip.interpolate(0.5).unwrap(), 15.0);
    assert_abs_diff_eq!(ip.interpolate(3.0).unwrap(), 40.0);

    // swapped: value becomes x, day index y; of the equal run only the
    // first day is kept
    let swapped = sim
        .interpolator_by_token_swapped(v.token(), true)
        .unwrap();
    assert_eq!(swapped.count(), 3);
    assert_abs_diff_eq!(swapped.interpolate(40.0).unwrap(), 2.0);
    assert_abs_diff_eq!(swapped.interpolate(15.0).unwrap(), 0.5);
}

#[test]
fn extraction_skips_missing_days() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 10));
    // only three days written at the start of the period
    let v = write_series(&mut sim, &[1.0, 2.0, 3.0]);

    let ip = sim.interpolator_by_token(v.token()).unwrap();
    assert_eq!(ip.count(), 3);
    assert_abs_diff_eq!(ip.x_max().unwrap(), 2.0);
}
