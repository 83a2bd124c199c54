//! Report writing and round-trip reading.

use super::{d, store};
use crate::ranges::RangeType;
use crate::simvalues::{SimValueAux, SimValueState};
use crate::simxchange::ReportFormat;
use crate::units::ScientificUnit;
use std::fs;

/// Parses the day-by-day section of a report back into a matrix of
/// optional values, one row per day.
fn parse_matrix(text: &str, separator: &str, comment: &str, empty: &str) -> Vec<Vec<Option<f64>>> {
    let mut rows = Vec::new();
    let mut in_data = false;

    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with(comment) {
            continue;
        }
        if line.starts_with("DATE") {
            // the first header opens the matrix, the forced-state header
            // closes it
            if in_data {
                break;
            }
            in_data = true;
            continue;
        }
        if in_data {
            let cells: Vec<&str> = line.split(separator).collect();
            let row = cells[2..]
                .iter()
                .map(|c| {
                    if *c == empty {
                        None
                    } else {
                        Some(c.parse::<f64>().unwrap())
                    }
                })
                .collect();
            rows.push(row);
        }
    }
    rows
}

#[test]
fn report_matrix_round_trips() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 3));

    let mut w =
        SimValueState::new("MOD1", "W", ScientificUnit::KgHa, RangeType::ZeroPositive).unwrap();
    w.v = 100.0;
    sim.force_state(&mut w).unwrap();

    let mut t = SimValueAux::new("MOD1", "T", ScientificUnit::Celsius, RangeType::All).unwrap();
    t.v = 5.5;
    sim.set_aux(&mut t).unwrap();

    w.r = 10.0;
    sim.set_state_rate(&w).unwrap();
    sim.update_to_date(d(2020, 1, 2)).unwrap();
    t.v = 6.5;
    sim.set_aux(&mut t).unwrap();

    w.r = -5.0;
    sim.set_state_rate(&w).unwrap();
    sim.update_to_date(d(2020, 1, 3)).unwrap();
    // no aux write on the last day: T must render as missing there

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.out");
    sim.report(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let matrix = parse_matrix(&text, ",", "//", "-");

    // one row per day of the whole period
    assert_eq!(matrix.len(), 3);
    assert_eq!(matrix[0], vec![Some(100.0), Some(5.5)]);
    assert_eq!(matrix[1], vec![Some(110.0), Some(6.5)]);
    assert_eq!(matrix[2], vec![Some(105.0), None]);

    // a single owner keeps the plain variable names in the header
    assert!(text.lines().any(|l| l == "DATE,ELAPSED,W,T"));
    assert!(text.contains("// Time series of state and auxiliary variables"));
    // W was forced from missing to 100: one ledger row
    assert!(text.contains("// Time series of forced state and auxiliary variables"));
    assert!(text.contains("2020-01-01,MOD1.W,-,100,[kg.ha-1]"));
}

#[test]
fn multiple_owners_qualify_the_header() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 2));
    sim.register_sim_id("MOD2", "TestModule").unwrap();

    let mut a = SimValueAux::new("MOD1", "A", ScientificUnit::NoDim, RangeType::All).unwrap();
    a.v = 1.0;
    sim.set_aux(&mut a).unwrap();
    let mut b = SimValueAux::new("MOD2", "B", ScientificUnit::NoDim, RangeType::All).unwrap();
    b.v = 2.0;
    sim.set_aux(&mut b).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.out");
    sim.report(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.lines().any(|l| l == "DATE,ELAPSED,MOD1.A,MOD2.B"));
}

#[test]
fn custom_format_markers() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 2));
    let mut a = SimValueAux::new("MOD1", "A", ScientificUnit::NoDim, RangeType::All).unwrap();
    a.v = 1.0;
    sim.set_aux(&mut a).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.out");
    let format = ReportFormat {
        separator: ";".to_string(),
        comment_prefix: "#".to_string(),
        empty_value: "NA".to_string(),
    };
    sim.report_with_format(&path, &format).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.lines().any(|l| l == "DATE;ELAPSED;A"));
    assert!(text.lines().any(|l| l == "2020-01-02;1;NA"));

    let matrix = parse_matrix(&text, ";", "#", "NA");
    assert_eq!(matrix, vec![vec![Some(1.0)], vec![None]]);
}

#[test]
fn blank_format_markers_are_rejected() {
    let sim = store(d(2020, 1, 1), d(2020, 1, 2));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.out");

    for (separator, comment_prefix, empty_value) in [
        ("", "//", "-"),
        (",", " ", "-"),
        (",", "//", ""),
    ] {
        let format = ReportFormat {
            separator: separator.to_string(),
            comment_prefix: comment_prefix.to_string(),
            empty_value: empty_value.to_string(),
        };
        assert!(sim.report_with_format(&path, &format).is_err());
    }
}

#[test]
fn unchanged_forcings_stay_out_of_the_ledger_section() {
    let mut sim = store(d(2020, 1, 1), d(2020, 1, 2));

    let mut w = SimValueState::new("MOD1", "W", ScientificUnit::NoDim, RangeType::All).unwrap();
    w.v = 1.0;
    sim.force_state(&mut w).unwrap();
    // forcing the identical value again is legal but not reportable
    sim.force_state(&mut w).unwrap();

    assert_eq!(sim.forced_count(), 2);
    let first = sim.forced_info(0).unwrap();
    assert!(first.old_value.is_nan());
    let second = sim.forced_info(1).unwrap();
    assert_eq!(second.old_value, 1.0);
    assert_eq!(second.new_value, 1.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.out");
    sim.report(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();

    // only the missing -> 1 forcing differs, so exactly one ledger row
    let ledger_rows: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.contains("forced state"))
        .filter(|l| l.starts_with("2020-"))
        .collect();
    assert_eq!(ledger_rows.len(), 1);
    assert!(ledger_rows[0].contains("MOD1.W"));
}
