//! Aggregation queries, crossing detection and interpolator extraction.
//!
//! Aggregations run either over the whole simulated period or over a
//! trailing window ending on the current day. For variables in aggregated
//! storage mode the same queries are answered from the rolling summaries;
//! anything that needs a per-day walk (crossings, interpolator extraction,
//! historical reads) is rejected for them.

use super::{SimXChange, TypeRequirement, VarRecord, VarToken, COMPONENT};
use crate::dates::add_days;
use crate::errors::{SimError, SimResult};
use crate::interpolate::Interpolator;
use crate::units::{convert, ScientificUnit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Numerical aggregation over the values of one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationY {
    /// the first valid value ever
    First,
    /// the last valid value ever
    Last,
    /// the lowest value ever
    Min,
    /// the highest value ever
    Max,
    /// the count of valid values
    Count,
    /// the sum of valid values
    Sum,
    /// the average of valid values
    Average,
    /// the change from the first to the last value (`last - first`)
    Delta,
    /// the spread between highest and lowest value (`max - min`)
    Range,
}

/// Aggregation over the time coordinate of one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationDate {
    /// the date of the first valid value
    First,
    /// the date of the last valid value
    Last,
    /// the date of the lowest value
    Min,
    /// the date of the highest value
    Max,
}

/// One aggregation pass over `[first, last]` of a variable record. Answers
/// from the dense series or from the rolling summaries depending on the
/// record's storage mode.
struct AggWindow<'a> {
    rec: &'a VarRecord,
    first: usize,
    last: usize,
}

impl<'a> AggWindow<'a> {
    fn new(rec: &'a VarRecord, first: usize, last: usize) -> AggWindow<'a> {
        AggWindow { rec, first, last }
    }

    fn days(&self) -> impl Iterator<Item = usize> + '_ {
        (self.first..=self.last).filter(|&d| self.rec.has_values[d])
    }

    fn first_y(&self) -> f64 {
        if self.rec.aggregated {
            self.rec.agg.first
        } else {
            self.days()
                .next()
                .map(|d| self.rec.values[d])
                .unwrap_or(f64::NAN)
        }
    }

    fn last_y(&self) -> f64 {
        if self.rec.aggregated {
            self.rec.agg.last
        } else {
            self.days()
                .last()
                .map(|d| self.rec.values[d])
                .unwrap_or(f64::NAN)
        }
    }

    fn min_y(&self) -> f64 {
        if self.rec.aggregated {
            self.rec.agg.min
        } else {
            self.days()
                .map(|d| self.rec.values[d])
                .fold(f64::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc })
        }
    }

    fn max_y(&self) -> f64 {
        if self.rec.aggregated {
            self.rec.agg.max
        } else {
            self.days()
                .map(|d| self.rec.values[d])
                .fold(f64::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
        }
    }

    fn sum_y(&self) -> f64 {
        if self.rec.aggregated {
            self.rec.agg.sum
        } else {
            let mut found = false;
            let mut sum = 0.0;
            for d in self.days() {
                found = true;
                sum += self.rec.values[d];
            }
            if found {
                sum
            } else {
                f64::NAN
            }
        }
    }

    fn count_y(&self) -> f64 {
        if self.rec.aggregated {
            self.rec.agg.count as f64
        } else {
            self.days().count() as f64
        }
    }

    fn delta_y(&self) -> f64 {
        self.last_y() - self.first_y()
    }

    fn first_x_index(&self) -> Option<usize> {
        self.days().next()
    }

    fn last_x_index(&self) -> Option<usize> {
        self.days().last()
    }

    /// Index of the lowest value; the first occurrence wins on ties.
    fn min_x_index(&self) -> Option<usize> {
        if self.rec.aggregated {
            self.rec.agg.min_index
        } else {
            let mut result = None;
            let mut least = f64::INFINITY;
            for d in self.days() {
                if self.rec.values[d] < least {
                    least = self.rec.values[d];
                    result = Some(d);
                }
            }
            result
        }
    }

    /// Index of the highest value; the first occurrence wins on ties.
    fn max_x_index(&self) -> Option<usize> {
        if self.rec.aggregated {
            self.rec.agg.max_index
        } else {
            let mut result = None;
            let mut highest = f64::NEG_INFINITY;
            for d in self.days() {
                if self.rec.values[d] > highest {
                    highest = self.rec.values[d];
                    result = Some(d);
                }
            }
            result
        }
    }

    fn evaluate(&self, aggregation: AggregationY) -> f64 {
        match aggregation {
            AggregationY::First => self.first_y(),
            AggregationY::Last => self.last_y(),
            AggregationY::Min => self.min_y(),
            AggregationY::Max => self.max_y(),
            AggregationY::Count => self.count_y(),
            AggregationY::Sum => self.sum_y(),
            AggregationY::Average => {
                let cnt = self.count_y();
                if cnt != 0.0 {
                    self.sum_y() / cnt
                } else {
                    f64::NAN
                }
            }
            AggregationY::Delta => self.delta_y(),
            AggregationY::Range => {
                let max = self.max_y();
                if max.is_nan() {
                    max
                } else {
                    max - self.min_y()
                }
            }
        }
    }

    fn evaluate_date(&self, aggregation: AggregationDate) -> Option<usize> {
        match aggregation {
            AggregationDate::First => self.first_x_index(),
            AggregationDate::Last => self.last_x_index(),
            AggregationDate::Min => self.min_x_index(),
            AggregationDate::Max => self.max_x_index(),
        }
    }
}

impl SimXChange {
    /// Aggregated value over the whole simulation period, converted into
    /// `unit`. An undeterminable aggregation (no values) is an error.
    pub fn agg_value(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        aggregation: AggregationY,
    ) -> SimResult<f64> {
        self.agg_value_impl(token, unit, aggregation, true)
            .map(|v| v.expect("checked aggregation always yields a value"))
    }

    /// As [`SimXChange::agg_value`]; `None` when undeterminable.
    pub fn agg_value_opt(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        aggregation: AggregationY,
    ) -> SimResult<Option<f64>> {
        self.agg_value_impl(token, unit, aggregation, false)
    }

    fn agg_value_impl(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        aggregation: AggregationY,
        check_missing: bool,
    ) -> SimResult<Option<f64>> {
        let method = "agg_value";

        self.p(method)?;
        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;
        let rec = &self.vars[index];

        let window = AggWindow::new(rec, 0, rec.has_values.len() - 1);
        let result = window.evaluate(aggregation);

        if check_missing && result.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("variable {} is missing", rec.sim_id_var_name),
            ));
        }

        let converted = convert(&rec.var_name, result, rec.unit, unit)?;
        Ok(if converted.is_nan() { None } else { Some(converted) })
    }

    /// Aggregated value over the trailing window of `day_count` days ending
    /// on the current day, converted into `unit`.
    pub fn agg_value_moving(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        aggregation: AggregationY,
        day_count: i64,
    ) -> SimResult<f64> {
        self.agg_value_moving_impl(token, unit, aggregation, day_count, true)
            .map(|v| v.expect("checked aggregation always yields a value"))
    }

    /// As [`SimXChange::agg_value_moving`]; `None` when undeterminable.
    pub fn agg_value_moving_opt(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        aggregation: AggregationY,
        day_count: i64,
    ) -> SimResult<Option<f64>> {
        self.agg_value_moving_impl(token, unit, aggregation, day_count, false)
    }

    fn agg_value_moving_impl(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        aggregation: AggregationY,
        day_count: i64,
        check_missing: bool,
    ) -> SimResult<Option<f64>> {
        let method = "agg_value_moving";

        if day_count <= 0 {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("illegal value for day count ({day_count}) (must be > 0)"),
            ));
        }
        let p = self.p(method)?;
        if day_count > p.end_index as i64 + 1 {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "illegal value for day count ({day_count}) (must be <= {})",
                    p.end_index + 1
                ),
            ));
        }

        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;
        let rec = &self.vars[index];

        let last = p.cur_index;
        let first = (last as i64 - day_count + 1).max(0) as usize;

        let window = AggWindow::new(rec, first, last);
        let result = window.evaluate(aggregation);

        if check_missing && result.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "variable {} is missing on date {}",
                    rec.sim_id_var_name, p.cur_date
                ),
            ));
        }

        let converted = convert(&rec.var_name, result, rec.unit, unit)?;
        Ok(if converted.is_nan() { None } else { Some(converted) })
    }

    /// The date of an extremum or endpoint of the variable's series (first
    /// occurrence wins for min/max ties). Undeterminable is an error.
    pub fn agg_date(&self, token: VarToken, aggregation: AggregationDate) -> SimResult<NaiveDate> {
        match self.agg_date_opt(token, aggregation)? {
            Some(date) => Ok(date),
            None => {
                let index =
                    self.check_token(token, "agg_date", false, TypeRequirement::NoRequirement)?;
                Err(SimError::contract(
                    COMPONENT,
                    "agg_date",
                    format!("variable {} is missing", self.vars[index].sim_id_var_name),
                ))
            }
        }
    }

    /// As [`SimXChange::agg_date`]; `None` when undeterminable.
    pub fn agg_date_opt(
        &self,
        token: VarToken,
        aggregation: AggregationDate,
    ) -> SimResult<Option<NaiveDate>> {
        let method = "agg_date";

        let p = self.p(method)?;
        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;
        let rec = &self.vars[index];

        let window = AggWindow::new(rec, 0, rec.has_values.len() - 1);
        Ok(window
            .evaluate_date(aggregation)
            .map(|day| add_days(p.start_date, day as i64)))
    }

    /// Aggregates for every publisher of `var_name`, in registration order.
    /// Undeterminable entries come back as NaN.
    pub fn values_by_var_name_agg(
        &self,
        var_name: &str,
        unit: ScientificUnit,
        aggregation: AggregationY,
    ) -> SimResult<Vec<f64>> {
        self.p("values_by_var_name_agg")?;

        let var_name = var_name.to_uppercase();
        let mut result = Vec::new();

        if let Some(indices) = self.by_name.get(&var_name) {
            for &i in indices {
                let token = self.encode_token(i, false);
                let v = self.agg_value_opt(token, unit, aggregation)?;
                result.push(v.unwrap_or(f64::NAN));
            }
        }
        Ok(result)
    }

    /// The dates on which the series crosses `value` in the requested
    /// direction. Upward: today's value above, yesterday's at or below;
    /// downward mirrored. Rejected for aggregated storage.
    pub fn dates_where_crosses(
        &self,
        token: VarToken,
        unit: ScientificUnit,
        value: f64,
        upwards: bool,
    ) -> SimResult<Vec<NaiveDate>> {
        let method = "dates_where_crosses";

        let p = self.p(method)?;
        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;
        let rec = &self.vars[index];

        if rec.aggregated {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} is defined aggregated, so time series data are not available",
                    rec.sim_id_var_name
                ),
            ));
        }

        let mut result = Vec::new();

        let mut prev = rec.values[0];
        if !prev.is_nan() {
            prev = convert(&rec.var_name, prev, rec.unit, unit)?;
        }

        for day in 1..rec.values.len() {
            let mut v = rec.values[day];
            if !v.is_nan() {
                v = convert(&rec.var_name, v, rec.unit, unit)?;
            }

            if !prev.is_nan() && !v.is_nan() {
                let crossed = if upwards {
                    v > value && prev <= value
                } else {
                    v < value && prev >= value
                };
                if crossed {
                    result.push(add_days(p.start_date, day as i64));
                }
            }
            prev = v;
        }
        Ok(result)
    }

    /// Extracts the variable's valid values into an interpolator, day index
    /// as x and value as y. Rejected for aggregated storage.
    pub fn interpolator_by_token(&self, token: VarToken) -> SimResult<Interpolator> {
        self.interpolator_by_token_swapped(token, false)
    }

    /// As [`SimXChange::interpolator_by_token`]. With `xy_swapped` the
    /// value becomes x and the day index y; of runs of equal values only
    /// the first is added, so x stays strictly increasing (useful for
    /// staged quantities such as a development stage).
    pub fn interpolator_by_token_swapped(
        &self,
        token: VarToken,
        xy_swapped: bool,
    ) -> SimResult<Interpolator> {
        let method = "interpolator_by_token";

        self.p(method)?;
        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;
        let rec = &self.vars[index];

        if rec.aggregated {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} is defined aggregated, so time series data are not available",
                    rec.sim_id_var_name
                ),
            ));
        }

        let (x_unit, y_unit) = if xy_swapped {
            (rec.unit, ScientificUnit::Date)
        } else {
            (ScientificUnit::Date, rec.unit)
        };
        let mut interpolator = Interpolator::new(&rec.sim_id_var_name, x_unit, y_unit);

        for day in 0..rec.has_values.len() {
            if !rec.has_values[day] {
                continue;
            }
            let v = rec.values[day];
            if !xy_swapped {
                // day index is strictly ascending by construction
                interpolator.add(day as f64, v)?;
            } else if interpolator.count() == 0 || v != interpolator.x_max()? {
                interpolator.add(v, day as f64)?;
            }
        }
        Ok(interpolator)
    }
}
