//! Aggregation queries over dense and aggregated storage.

use super::{d, store};
use crate::ranges::RangeType;
use crate::simvalues::{SimValueAux, SimValueState};
use crate::simxchange::{AggregationDate, AggregationY, SimXChange};
use crate::units::ScientificUnit;
use approx::assert_abs_diff_eq;

/// Writes Q = 1..=10 as an aux series over 10 days.
fn run_q_series(sim: &mut SimXChange) -> SimValueAux {
    let mut q = SimValueAux::new("MOD1", "Q", ScientificUnit::NoDim, RangeType::All).unwrap();
    for day in 0..10u32 {
        if day > 0 {
            sim.update_to_date(d(2020, 1, 1 + day)).unwrap();
        }
        q.v = (day + 1) as f64;
        sim.set_aux(&mut q).unwrap();
    }
    q
}

#[test]
fn aggregated_equivalence() {
    // the same series written once densely and once aggregated must agree
    // on every summary operator
    let mut dense = store(d(2020, 1, 1), d(2020, 1, 10));
    let q_dense = run_q_series(&mut dense);

    let mut lean = SimXChange::new("lean");
    lean.set_aggregated("Q").unwrap();
    lean.set_date_period(d(2020, 1, 1), d(2020, 1, 10)).unwrap();
    lean.register_sim_id("MOD1", "TestModule").unwrap();
    let q_lean = run_q_series(&mut lean);

    assert!(lean.var_info(0).unwrap().aggregated);
    assert!(!dense.var_info(0).unwrap().aggregated);

    let u = ScientificUnit::NoDim;
    for agg in [
        AggregationY::First,
        AggregationY::Last,
        AggregationY::Min,
        AggregationY::Max,
        AggregationY::Count,
        AggregationY::Sum,
        AggregationY::Average,
        AggregationY::Delta,
        AggregationY::Range,
    ] {
        assert_abs_diff_eq!(
            dense.agg_value(q_dense.token(), u, agg).unwrap(),
            lean.agg_value(q_lean.token(), u, agg).unwrap()
        );
    }

    assert_abs_diff_eq!(lean.agg_value(q_lean.token(), u, AggregationY::Sum).unwrap(), 55.0);
    assert_abs_diff_eq!(
        lean.agg_value(q_lean.token(), u, AggregationY::Average).unwrap(),
        5.5
    );
    assert_abs_diff_eq!(lean.agg_value(q_lean.token(), u, AggregationY::Min).unwrap(), 1.0);
    assert_abs_diff_eq!(lean.agg_value(q_lean.token(), u, AggregationY::Max).unwrap(), 10.0);
    assert_eq!(
        lean.agg_date(q_lean.token(), AggregationDate::Min).unwrap(),
        d(2020, 1, 1)
    );
    assert_eq!(
        lean.agg_date(q_lean.token(), AggregationDate::Max).unwrap(),
        d(2020, 1, 10)
    );
}

#[test]
fn aggregated_history_is_sealed() {
    let mut lean = SimXChange::new("lean");
    lean.set_aggregated("Q").unwrap();
    lean.set_date_period(d(2020, 1, 1), d(2020, 1, 10)).unwrap();
    lean.register_sim_id("MOD1", "TestModule").unwrap();
    let q = run_q_series(&mut lean);

    // today and yesterday stay readable
    assert_abs_diff_eq!(
        lean.value_by_token(q.token(), ScientificUnit::NoDim).unwrap(),
        10.0
    );
    assert_abs_diff_eq!(
        lean.value_by_token_delta(q.token(), -1, ScientificUnit::NoDim)
            .unwrap(),
        9.0
    );

    // anything older is rejected
    assert!(lean
        .value_by_token_delta(q.token(), -2, ScientificUnit::NoDim)
        .is_err());
    assert!(lean
        .value_by_token_date_index(q.token(), 0, ScientificUnit::NoDim)
        .is_err());
    // and so are the per-day walks
    assert!(lean
        .dates_where_crosses(q.token(), ScientificUnit::NoDim, 5.0, true)
        .is_err());
    assert!(lean.interpolator_by_token(q.token()).is_err());
}

#[test]
fn aggregated_mode_must_be_declared_before_the_period() {
    let mut sim = SimXChange::new("late");
    sim.set_date_period(d(2020, 1, 1), d(2020, 1, 10)).unwrap();
    assert!(sim.set_aggregated("Q").is_err());
}

#[test]
fn min_max_ties_keep_the_first_occurrence() {
    // series 3, 1, 1, 5, 5: min on day 1, max on day 3
    let mut dense = store(d(2020, 1, 1), d(2020, 1, 5));
    let mut lean = SimXChange::new("lean");
    lean.set_aggregated("V").unwrap();
    lean.set_date_period(d(2020, 1, 1), d(2020, 1, 5)).unwrap();
    lean.register_sim_id("MOD1", "TestModule").unwrap();

    let series = [3.0, 1.0, 1.0, 5.0, 5.0];
    let mut handles = Vec::new();
    for sim in [&mut dense, &mut lean] {
        let mut v = SimValueAux::new("MOD1", "V", ScientificUnit::NoDim, RangeType::All).unwrap();
        for (day, &value) in series.iter().enumerate() {
            if day > 0 {
                sim.update_to_date(d(2020, 1, 1 + day as u32)).unwrap();
            }
            v.v = value;
            sim.set_aux(&mut v).unwrap();
        }
        handles.push(v);
    }

    for (sim, v) in [(&dense, &handles[0]), (&lean, &handles[1])] {
        assert_eq!(
            sim.agg_date(v.token(), AggregationDate::Min).unwrap(),
            d(2020, 1, 2),
        );
        assert_eq!(
            sim.agg_date(v.token(), AggregationDate::Max).unwrap(),
            d(2020, 1, 4),
        );
    }
}

#[test]
fn moving_window_aggregations() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 10));
    let q = run_q_series(&mut sim);
    let u = ScientificUnit::NoDim;

    // trailing 3 days of 1..=10 are 8, 9, 10
    assert_abs_diff_eq!(
        sim.agg_value_moving(q.token(), u, AggregationY::Sum, 3).unwrap(),
        27.0
    );
    assert_abs_diff_eq!(
        sim.agg_value_moving(q.token(), u, AggregationY::Min, 3).unwrap(),
        8.0
    );
    // a window longer than the elapsed time clips at the start
    assert_abs_diff_eq!(
        sim.agg_value_moving(q.token(), u, AggregationY::Count, 10).unwrap(),
        10.0
    );

    assert!(sim.agg_value_moving(q.token(), u, AggregationY::Sum, 0).is_err());
    assert!(sim.agg_value_moving(q.token(), u, AggregationY::Sum, 11).is_err());
}

#[test]
fn aggregations_convert_into_the_requested_unit() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 3));
    let mut w =
        SimValueState::new("MOD1", "W", ScientificUnit::KgM2, RangeType::ZeroPositive).unwrap();
    w.v = 1.0;
    sim.force_state(&mut w).unwrap();
    w.r = 1.0;
    sim.set_state_rate(&w).unwrap();
    sim.update_to_date(d(2020, 1, 2)).unwrap();

    assert_abs_diff_eq!(
        sim.agg_value(w.token(), ScientificUnit::KgHa, AggregationY::Max)
            .unwrap(),
        20_000.0
    );
}

#[test]
fn single_value_aggregations() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 5));

    let mut w = SimValueState::new("MOD1", "W", ScientificUnit::NoDim, RangeType::All).unwrap();
    w.v = 1.0;
    sim.force_state(&mut w).unwrap();

    assert!(sim
        .agg_value_opt(w.token(), ScientificUnit::NoDim, AggregationY::Max)
        .unwrap()
        .is_some());
    assert_eq!(
        sim.agg_date_opt(w.token(), AggregationDate::Max).unwrap(),
        Some(d(2020, 1, 1))
    );
}

#[test]
fn per_publisher_aggregates_in_registration_order() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 5));
    sim.register_sim_id("MOD2", "TestModule").unwrap();

    let mut y1 = SimValueState::new("MOD1", "Y", ScientificUnit::NoDim, RangeType::All).unwrap();
    y1.v = 4.0;
    sim.force_state(&mut y1).unwrap();
    sim.update_to_date(d(2020, 1, 2)).unwrap();

    // MOD1 went missing; MOD2 takes the name over
    let mut y2 = SimValueState::new("MOD2", "Y", ScientificUnit::NoDim, RangeType::All).unwrap();
    y2.v = 7.0;
    sim.force_state(&mut y2).unwrap();

    let values = sim
        .values_by_var_name_agg("Y", ScientificUnit::NoDim, AggregationY::Max)
        .unwrap();
    assert_eq!(values.len(), 2);
    assert_abs_diff_eq!(values[0], 4.0);
    assert_abs_diff_eq!(values[1], 7.0);
}
