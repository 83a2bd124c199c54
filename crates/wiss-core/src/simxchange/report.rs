//! Text report of the gathered time series and forced-state ledger.

use super::SimXChange;
use crate::dates::add_days;
use crate::errors::{SimError, SimResult};
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const COMPONENT: &str = "SimXChange";

/// Formatting knobs of [`SimXChange::report_with_format`].
#[derive(Debug, Clone)]
pub struct ReportFormat {
    /// separator between values
    pub separator: String,
    /// prefix marking comment lines
    pub comment_prefix: String,
    /// rendering of a missing value
    pub empty_value: String,
}

impl Default for ReportFormat {
    fn default() -> ReportFormat {
        ReportFormat {
            separator: ",".to_string(),
            comment_prefix: "//".to_string(),
            empty_value: "-".to_string(),
        }
    }
}

impl SimXChange {
    /// Writes the report with the default format (comma separator, `//`
    /// comments, `-` for missing values).
    pub fn report(&self, path: impl AsRef<Path>) -> SimResult<()> {
        self.report_with_format(path, &ReportFormat::default())
    }

    /// Writes a text report with a header, the day-by-day matrix of all
    /// registered variables, and the forced-state ledger entries whose old
    /// and new value differ. Variables in aggregated storage keep no
    /// per-day values and render as missing.
    pub fn report_with_format(
        &self,
        path: impl AsRef<Path>,
        format: &ReportFormat,
    ) -> SimResult<()> {
        let method = "report";
        let path = path.as_ref();

        let sep = &format.separator;
        let comment = &format.comment_prefix;
        let empty = &format.empty_value;

        if path.as_os_str().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "empty file path"));
        }
        if sep.is_empty() {
            return Err(SimError::contract(COMPONENT, method, "empty separator"));
        }
        if comment.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "empty comment prefix"));
        }
        if empty.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "empty empty value"));
        }

        let p = self.p(method)?;

        // column headers carry the simID only when more than one owner
        // contributed variables
        let only_one_sim_id = self
            .vars
            .windows(2)
            .all(|w| w[0].sim_id == w[1].sim_id);

        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        writeln!(w, "{} WISS version {}", comment, env!("CARGO_PKG_VERSION"))?;
        writeln!(w, "{comment}")?;
        writeln!(w, "{} RUN_ID   = {}", comment, self.run_id)?;
        writeln!(w, "{} RUN_DATE = {}", comment, Local::now().date_naive())?;
        writeln!(w, "{comment}")?;

        if !self.vars.is_empty() {
            writeln!(w)?;
            writeln!(w, "{comment} Time series of state and auxiliary variables")?;
            writeln!(w)?;

            // unit line
            write!(w, "{comment} Column units: ")?;
            write!(w, "{sep}Days")?;
            for rec in &self.vars {
                write!(w, "{sep}{}", rec.unit.caption())?;
            }
            writeln!(w)?;

            // header line
            writeln!(w)?;
            write!(w, "DATE{sep}ELAPSED")?;
            for rec in &self.vars {
                if only_one_sim_id {
                    write!(w, "{sep}{}", rec.var_name)?;
                } else {
                    write!(w, "{sep}{}", rec.sim_id_var_name)?;
                }
            }
            writeln!(w)?;

            // data lines, one per day of the whole period
            for day in 0..=p.end_index {
                write!(w, "{}{sep}{day}", add_days(p.start_date, day as i64))?;
                for rec in &self.vars {
                    let v = if rec.aggregated {
                        f64::NAN
                    } else {
                        rec.values[day]
                    };
                    if v.is_nan() {
                        write!(w, "{sep}{empty}")?;
                    } else {
                        write!(w, "{sep}{v}")?;
                    }
                }
                writeln!(w)?;
            }
        }

        // ledger entries where forcing actually changed the value
        let changed: Vec<_> = self
            .forced_records()
            .filter(|&(_, _, old, new)| old != new)
            .collect();

        if !changed.is_empty() {
            writeln!(w)?;
            writeln!(w, "{comment} Time series of forced state and auxiliary variables")?;
            writeln!(w)?;
            writeln!(w, "DATE{sep}VAR{sep}OldValue{sep}NewValue{sep}Unit")?;

            for (day_index, var_index, old, new) in changed {
                let rec = &self.vars[var_index];
                write!(w, "{}{sep}{}", add_days(p.start_date, day_index as i64), rec.sim_id_var_name)?;
                if old.is_nan() {
                    write!(w, "{sep}{empty}")?;
                } else {
                    write!(w, "{sep}{old}")?;
                }
                if new.is_nan() {
                    write!(w, "{sep}{empty}")?;
                } else {
                    write!(w, "{sep}{new}")?;
                }
                writeln!(w, "{sep}{}", rec.unit.caption())?;
            }
        }

        w.flush()?;
        Ok(())
    }
}
