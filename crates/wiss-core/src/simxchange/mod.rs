//! The dynamic exchange: day-indexed storage and exchange of simulation
//! variables.
//!
//! [`SimXChange`] is the heart of the kernel. Every module writes its state
//! and auxiliary variables into it and reads other modules' variables out of
//! it; the store enforces the ownership, continuity and bounds rules that
//! make the coupling deterministic:
//!
//! - the first publisher of a variable name locks every other variable of
//!   that name against writes; at most one publisher is active per name per
//!   day,
//! - a state variable's value series is contiguous: once a day is missing
//!   the state stays missing for the rest of the run,
//! - every write is converted to the variable's native unit and checked
//!   against its declared bounds,
//! - pending rates are integrated by [`SimXChange::update_to_date`], the
//!   only operation that advances the store's clock, and it advances by
//!   exactly one day.
//!
//! Access goes through opaque [`VarToken`] capabilities: write privilege is
//! encoded in the token, and tokens are biased by a per-store random offset
//! so they cannot be forged trivially or reused across stores.

mod aggregation;
mod report;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregationDate, AggregationY};
pub use report::ReportFormat;

use crate::dates::{add_days, diff_days};
use crate::errors::{SimError, SimResult};
use crate::ranges::{in_range, RangeLimits};
use crate::simvalues::{SimValueAux, SimValueExternal, SimValueState};
use crate::units::{convert, ScientificUnit};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::trace;

const COMPONENT: &str = "SimXChange";

/// Opaque capability to one registered variable of one store.
///
/// Encodes `(variable index, write-capable?)` with a per-store random
/// offset; the write privilege lives in the low bit. The reserved
/// [`VarToken::INVALID`] value is rejected by every store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarToken(pub(crate) i64);

impl VarToken {
    /// The sentinel for "no token".
    pub const INVALID: VarToken = VarToken(i64::MIN);

    pub fn is_valid(self) -> bool {
        self != VarToken::INVALID
    }
}

/// Lifecycle state of a registered simID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimIdState {
    Running,
    TerminatedNormally,
    TerminatedError,
}

/// Registration record of one simID, returned by
/// [`SimXChange::sim_id_info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimIdInfo {
    pub sim_id: String,
    pub class_name: String,
    pub start_day_index: i64,
    pub end_day_index: Option<i64>,
    pub state: SimIdState,
    pub message: String,
}

/// Read-only metadata of one registered variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarInfo {
    pub sim_id: String,
    pub var_name: String,
    pub sim_id_var_name: String,
    pub is_state: bool,
    pub unit: ScientificUnit,
    pub limits: RangeLimits,
    pub locked: bool,
    pub aggregated: bool,
}

/// One entry of the forced-state ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedStateInfo {
    pub date: NaiveDate,
    pub sim_id_var_name: String,
    pub old_value: f64,
    pub new_value: f64,
    pub unit: ScientificUnit,
}

/// Rolling summaries kept for a variable in aggregated storage mode. Also
/// carries the previous and last value so yesterday remains readable.
#[derive(Debug, Clone)]
pub(crate) struct AggTotals {
    pub(crate) count: usize,
    pub(crate) first: f64,
    pub(crate) previous: f64,
    pub(crate) last: f64,
    pub(crate) min: f64,
    pub(crate) min_index: Option<usize>,
    pub(crate) max: f64,
    pub(crate) max_index: Option<usize>,
    pub(crate) sum: f64,
}

impl AggTotals {
    fn new() -> AggTotals {
        AggTotals {
            count: 0,
            first: f64::NAN,
            previous: f64::NAN,
            last: f64::NAN,
            min: f64::NAN,
            min_index: None,
            max: f64::NAN,
            max_index: None,
            sum: f64::NAN,
        }
    }

    /// Folds one written value into the summaries. Ties keep the first
    /// index at which the extremum occurred.
    fn push(&mut self, value: f64, day_index: usize) {
        self.previous = self.last;
        self.last = value;

        if self.count == 0 {
            self.first = value;
            self.min = value;
            self.min_index = Some(day_index);
            self.max = value;
            self.max_index = Some(day_index);
            self.sum = value;
        } else {
            if value < self.min {
                self.min = value;
                self.min_index = Some(day_index);
            }
            if value > self.max {
                self.max = value;
                self.max_index = Some(day_index);
            }
            self.sum += value;
        }
        self.count += 1;
    }
}

/// Internal storage of one registered `(simID, varName)` variable.
#[derive(Debug, Clone)]
pub(crate) struct VarRecord {
    pub(crate) sim_id_var_name: String,
    pub(crate) sim_id: String,
    pub(crate) var_name: String,
    pub(crate) sim_id_index: usize,
    pub(crate) is_state: bool,
    pub(crate) unit: ScientificUnit,
    pub(crate) limits: RangeLimits,
    pub(crate) locked: bool,
    pub(crate) pending_rate: f64,
    pub(crate) aggregated: bool,
    /// presence bitmap, always allocated over the full period
    pub(crate) has_values: Vec<bool>,
    /// dense day-indexed values; empty in aggregated mode
    pub(crate) values: Vec<f64>,
    pub(crate) agg: AggTotals,
}

#[derive(Debug, Clone)]
struct SimIdRecord {
    sim_id: String,
    class_name: String,
    start_day_index: usize,
    end_day_index: Option<usize>,
    state: SimIdState,
    message: String,
}

#[derive(Debug, Clone)]
struct ForcedRecord {
    day_index: usize,
    var_index: usize,
    old_value: f64,
    new_value: f64,
}

#[derive(Debug, Clone, Copy)]
struct Period {
    start_date: NaiveDate,
    end_date: NaiveDate,
    end_index: usize,
    cur_date: NaiveDate,
    cur_index: usize,
}

/// What kind of variable a token must point at for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeRequirement {
    State,
    Auxiliary,
    NoRequirement,
}

/// The dynamic variable-exchange store of one run.
#[derive(Debug)]
pub struct SimXChange {
    run_id: String,
    token_offset: i64,
    period: Option<Period>,

    sim_id_map: HashMap<String, usize>,
    sim_ids: Vec<SimIdRecord>,

    var_map: HashMap<String, usize>,
    pub(crate) vars: Vec<VarRecord>,
    by_name: HashMap<String, Vec<usize>>,

    forced: Vec<ForcedRecord>,

    aggregated_names: HashSet<String>,

    trace_logging: bool,
    pause: bool,
}

impl SimXChange {
    /// Constructs a store identified by `run_id` in reports.
    pub fn new(run_id: &str) -> SimXChange {
        // random negative bias so tokens are not trivially forgeable; the
        // low bit stays available for the write capability
        let token_offset = -rand::thread_rng().gen_range(0..i64::from(i32::MAX));

        SimXChange {
            run_id: run_id.to_string(),
            token_offset,
            period: None,
            sim_id_map: HashMap::new(),
            sim_ids: Vec::new(),
            var_map: HashMap::new(),
            vars: Vec::new(),
            by_name: HashMap::new(),
            forced: Vec::new(),
            aggregated_names: HashSet::new(),
            trace_logging: false,
            pause: false,
        }
    }

    // period plumbing ------------------------------------------------------

    fn p(&self, method: &str) -> SimResult<&Period> {
        self.period
            .as_ref()
            .ok_or_else(|| SimError::invariant(COMPONENT, method, "date period not set"))
    }

    /// Defines the start and end date of the simulation. Can be set only
    /// once.
    pub fn set_date_period(&mut self, start: NaiveDate, end: NaiveDate) -> SimResult<()> {
        let method = "set_date_period";

        if self.period.is_some() {
            return Err(SimError::invariant(
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

        self.period = Some(Period {
            start_date: start,
            end_date: end,
            end_index: diff_days(start, end) as usize,
            cur_date: start,
            cur_index: 0,
        });
        Ok(())
    }

    /// Clears all gathered data and resets the clock to the start date (if a
    /// period was set) and trace logging to off. Aggregated-storage
    /// declarations survive a reset.
    pub fn reset(&mut self) {
        self.sim_id_map.clear();
        self.sim_ids.clear();
        self.var_map.clear();
        self.vars.clear();
        self.by_name.clear();
        self.forced.clear();

        if let Some(p) = self.period.as_mut() {
            p.cur_date = p.start_date;
            p.cur_index = 0;
        }
        self.trace_logging = false;
    }

    /// Explicit end-of-life call. No resources are held beyond memory, so
    /// this only exists for lifecycle symmetry with [`SimXChange::reset`].
    pub fn terminate(&mut self) {}

    // simple info ----------------------------------------------------------

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn set_trace_logging(&mut self, trace_logging: bool) {
        self.trace_logging = trace_logging;
    }

    /// Debug hook flag, forwarded from the timer's pause date. No semantic
    /// effect.
    pub fn set_pause(&mut self, pause: bool) {
        self.pause = pause;
    }

    pub fn pause_now(&self) -> bool {
        self.pause
    }

    pub fn start_date(&self) -> SimResult<NaiveDate> {
        Ok(self.p("start_date")?.start_date)
    }

    pub fn end_date(&self) -> SimResult<NaiveDate> {
        Ok(self.p("end_date")?.end_date)
    }

    pub fn cur_date(&self) -> SimResult<NaiveDate> {
        Ok(self.p("cur_date")?.cur_date)
    }

    /// Days passed since the start date.
    pub fn elapsed(&self) -> SimResult<i64> {
        Ok(self.p("elapsed")?.cur_index as i64)
    }

    /// The number of days from start date to end date; day indices run
    /// from `0` to this value inclusive.
    pub fn max_duration(&self) -> SimResult<i64> {
        Ok(self.p("max_duration")?.end_index as i64)
    }

    pub fn is_on_start_date(&self) -> SimResult<bool> {
        let p = self.p("is_on_start_date")?;
        Ok(p.cur_date == p.start_date)
    }

    pub fn is_on_end_date(&self) -> SimResult<bool> {
        let p = self.p("is_on_end_date")?;
        Ok(p.cur_date == p.end_date)
    }

    pub fn year(&self) -> SimResult<i32> {
        Ok(self.p("year")?.cur_date.year())
    }

    pub fn month(&self) -> SimResult<u32> {
        Ok(self.p("month")?.cur_date.month())
    }

    pub fn day_in_month(&self) -> SimResult<u32> {
        Ok(self.p("day_in_month")?.cur_date.day())
    }

    pub fn day_in_year(&self) -> SimResult<u32> {
        Ok(self.p("day_in_year")?.cur_date.ordinal())
    }

    /// Whether `day_index` lies within the simulated period.
    pub fn is_valid_date_index(&self, day_index: i64) -> SimResult<bool> {
        let p = self.p("is_valid_date_index")?;
        Ok(in_range(day_index, 0, p.end_index as i64))
    }

    /// Whether `date` lies within the simulated period.
    pub fn is_valid_date(&self, date: NaiveDate) -> SimResult<bool> {
        let p = self.p("is_valid_date")?;
        Ok(in_range(date, p.start_date, p.end_date))
    }

    /// The date for a day index (0 = start date).
    pub fn date_by_date_index(&self, day_index: i64) -> SimResult<NaiveDate> {
        let method = "date_by_date_index";
        if !self.is_valid_date_index(day_index)? {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the date index ({day_index}) is not valid"),
            ));
        }
        Ok(add_days(self.p(method)?.start_date, day_index))
    }

    // token protocol -------------------------------------------------------

    fn encode_token(&self, index: usize, can_write: bool) -> VarToken {
        let mut t = self.token_offset + 2 * index as i64;
        if !can_write {
            t += 1;
        }
        VarToken(t)
    }

    /// Validates a token and returns the variable index it points at.
    fn check_token(
        &self,
        token: VarToken,
        method: &str,
        check_can_write: bool,
        requirement: TypeRequirement,
    ) -> SimResult<usize> {
        let invalid = || {
            SimError::contract(
                COMPONENT,
                method,
                format!("the token {} is not valid", token.0),
            )
        };

        if !token.is_valid() {
            return Err(invalid());
        }

        let tmp = token.0.wrapping_sub(self.token_offset);
        if tmp < 0 {
            return Err(invalid());
        }
        let index = (tmp / 2) as usize;
        if index >= self.vars.len() {
            return Err(invalid());
        }

        let rec = &self.vars[index];

        if check_can_write {
            if tmp % 2 != 0 {
                return Err(SimError::contract(
                    COMPONENT,
                    method,
                    format!(
                        "the token for {} cannot be used to write",
                        rec.sim_id_var_name
                    ),
                ));
            }
            if rec.locked {
                return Err(SimError::invariant(
                    COMPONENT,
                    method,
                    format!(
                        "the token for {} cannot be used to write because the variable is locked",
                        rec.sim_id_var_name
                    ),
                ));
            }
        }

        match requirement {
            TypeRequirement::State if !rec.is_state => Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} is an auxiliary variable, not a state variable",
                    rec.sim_id_var_name
                ),
            )),
            TypeRequirement::Auxiliary if rec.is_state => Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} is a state variable, not an auxiliary variable",
                    rec.sim_id_var_name
                ),
            )),
            _ => Ok(index),
        }
    }

    pub fn sim_id_from_token(&self, token: VarToken) -> SimResult<String> {
        let index = self.check_token(token, "sim_id_from_token", false, TypeRequirement::NoRequirement)?;
        Ok(self.vars[index].sim_id.clone())
    }

    pub fn var_name_from_token(&self, token: VarToken) -> SimResult<String> {
        let index = self.check_token(token, "var_name_from_token", false, TypeRequirement::NoRequirement)?;
        Ok(self.vars[index].var_name.clone())
    }

    // registration ---------------------------------------------------------

    fn compose_sim_id_var_name(sim_id: &str, var_name: &str) -> String {
        format!("{sim_id}.{var_name}")
    }

    fn sim_id_index(&self, sim_id_uc: &str) -> Option<usize> {
        self.sim_id_map.get(sim_id_uc).copied()
    }

    /// Registers a simID with the class name of the module that owns it.
    /// Done once per module, from the module constructor.
    pub fn register_sim_id(&mut self, sim_id: &str, class_name: &str) -> SimResult<()> {
        let method = "register_sim_id";

        if sim_id.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the simID is empty"));
        }
        if class_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the class name is empty"));
        }
        let start_day_index = self.p(method)?.cur_index;

        let sim_id_uc = sim_id.to_uppercase();
        if self.sim_id_index(&sim_id_uc).is_some() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the simID {sim_id} is already registered"),
            ));
        }

        self.sim_ids.push(SimIdRecord {
            sim_id: sim_id_uc.clone(),
            class_name: class_name.to_uppercase(),
            start_day_index,
            end_day_index: None,
            state: SimIdState::Running,
            message: String::new(),
        });
        self.sim_id_map.insert(sim_id_uc, self.sim_ids.len() - 1);
        Ok(())
    }

    /// Normal termination of a simID: its end day becomes the current day.
    pub fn terminate_sim_id(&mut self, sim_id: &str) -> SimResult<()> {
        self.terminate_sim_id_impl(sim_id, false, "")
    }

    /// Termination recording an error message.
    pub fn terminate_sim_id_error(&mut self, sim_id: &str, message: &str) -> SimResult<()> {
        self.terminate_sim_id_impl(sim_id, true, message)
    }

    fn terminate_sim_id_impl(&mut self, sim_id: &str, error: bool, message: &str) -> SimResult<()> {
        let method = "terminate_sim_id";

        if sim_id.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the simID is empty"));
        }
        let cur_index = self.p(method)?.cur_index;

        let index = self.sim_id_index(&sim_id.to_uppercase()).ok_or_else(|| {
            SimError::contract(
                COMPONENT,
                method,
                format!("the simID {sim_id} is not registered"),
            )
        })?;

        let rec = &mut self.sim_ids[index];
        if rec.state != SimIdState::Running {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the simID {sim_id} is already terminated"),
            ));
        }
        if error {
            rec.state = SimIdState::TerminatedError;
            rec.message = message.to_string();
        } else {
            rec.state = SimIdState::TerminatedNormally;
            rec.message.clear();
        }
        rec.end_day_index = Some(cur_index);
        Ok(())
    }

    /// All simIDs in order of registration.
    pub fn sim_ids(&self) -> Vec<String> {
        self.sim_ids.iter().map(|r| r.sim_id.clone()).collect()
    }

    /// The simIDs that published `var_name`, ordered by the day their first
    /// value appeared.
    pub fn sim_ids_by_var_name(&self, var_name: &str) -> SimResult<Vec<String>> {
        let method = "sim_ids_by_var_name";
        if var_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the variable is empty"));
        }
        let var_name = var_name.to_uppercase();

        let days = match self.vars.first() {
            Some(rec) => rec.has_values.len(),
            None => 0,
        };

        let mut result: Vec<String> = Vec::new();
        for day in 0..days {
            for rec in &self.vars {
                if rec.var_name == var_name
                    && rec.has_values[day]
                    && !result.contains(&rec.sim_id)
                {
                    result.push(rec.sim_id.clone());
                }
            }
        }
        Ok(result)
    }

    /// All simIDs registered under the given module class name.
    pub fn sim_ids_by_class_name(&self, class_name: &str) -> SimResult<Vec<String>> {
        let method = "sim_ids_by_class_name";
        if class_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the class name is empty"));
        }
        let class_name = class_name.to_uppercase();
        Ok(self
            .sim_ids
            .iter()
            .filter(|r| r.class_name == class_name)
            .map(|r| r.sim_id.clone())
            .collect())
    }

    /// Whether at least one simID of the given class name is registered.
    pub fn is_class_name_running(&self, class_name: &str) -> SimResult<bool> {
        let method = "is_class_name_running";
        if class_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the class name is empty"));
        }
        let class_name = class_name.to_uppercase();
        Ok(self.sim_ids.iter().any(|r| r.class_name == class_name))
    }

    /// Registration record of a simID.
    pub fn sim_id_info(&self, sim_id: &str) -> SimResult<SimIdInfo> {
        let method = "sim_id_info";
        if sim_id.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the simID is empty"));
        }
        let index = self.sim_id_index(&sim_id.to_uppercase()).ok_or_else(|| {
            SimError::contract(
                COMPONENT,
                method,
                format!("the simID {sim_id} is not registered"),
            )
        })?;
        let rec = &self.sim_ids[index];
        Ok(SimIdInfo {
            sim_id: rec.sim_id.clone(),
            class_name: rec.class_name.clone(),
            start_day_index: rec.start_day_index as i64,
            end_day_index: rec.end_day_index.map(|v| v as i64),
            state: rec.state,
            message: rec.message.clone(),
        })
    }

    /// Days the simID has been active (registration day to current day).
    pub fn elapsed_by_sim_id(&self, sim_id: &str) -> SimResult<i64> {
        let method = "elapsed_by_sim_id";
        if sim_id.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the simID is empty"));
        }
        let cur_index = self.p(method)?.cur_index;
        let index = self.sim_id_index(&sim_id.to_uppercase()).ok_or_else(|| {
            SimError::contract(
                COMPONENT,
                method,
                format!("the simID {sim_id} is not registered"),
            )
        })?;
        Ok(cur_index as i64 - self.sim_ids[index].start_day_index as i64)
    }

    // storage mode ---------------------------------------------------------

    /// Switches the named variable to memory-lean aggregated storage: only
    /// rolling summaries plus the previous and last value are kept, and
    /// historical per-day queries are rejected. Must be declared before the
    /// simulation period is set.
    pub fn set_aggregated(&mut self, var_name: &str) -> SimResult<()> {
        let method = "set_aggregated";

        if var_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "empty variable"));
        }
        if self.period.is_some() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("{var_name} cannot be set to aggregated storage once simulation has started"),
            ));
        }
        self.aggregated_names.insert(var_name.to_uppercase());
        Ok(())
    }

    // variable registration ------------------------------------------------

    /// Whether no other simID than `sim_id_uc` has an active value for
    /// `var_name_uc` on the current day.
    fn is_var_name_value_missing(&self, var_name_uc: &str, sim_id_uc: &str) -> SimResult<bool> {
        let cur_index = self.p("is_var_name_value_missing")?.cur_index;

        if let Some(indices) = self.by_name.get(var_name_uc) {
            for &i in indices {
                let rec = &self.vars[i];
                if rec.sim_id != sim_id_uc && rec.has_values[cur_index] {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Registers `(simID, varName)` and returns a write-capable token. The
    /// first registration of a name locks every same-named variable of
    /// other simIDs against writes.
    fn register_var(
        &mut self,
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        limits: RangeLimits,
        is_state: bool,
        caller: &str,
    ) -> SimResult<VarToken> {
        if sim_id.trim().is_empty() {
            return Err(SimError::contract(
                COMPONENT,
                caller,
                format!("the simID of variable {var_name} is empty"),
            ));
        }
        if var_name.trim().is_empty() {
            return Err(SimError::contract(
                COMPONENT,
                caller,
                format!("the variable of simID {sim_id} is empty"),
            ));
        }

        let max_duration = self.p(caller)?.end_index;

        let sim_id_uc = sim_id.to_uppercase();
        let sim_id_index = self.sim_id_index(&sim_id_uc).ok_or_else(|| {
            SimError::contract(
                COMPONENT,
                caller,
                format!("the simID {sim_id} of variable {var_name} is not registered"),
            )
        })?;

        let var_name_uc = var_name.to_uppercase();
        let sim_id_var_name = Self::compose_sim_id_var_name(&sim_id_uc, &var_name_uc);

        if self.var_map.contains_key(&sim_id_var_name) {
            return Err(SimError::contract(
                COMPONENT,
                caller,
                format!("the variable {sim_id_var_name} is already registered"),
            ));
        }

        // the newcomer owns the name: everyone else holding it gets locked
        for rec in self.vars.iter_mut() {
            if rec.var_name == var_name_uc {
                rec.locked = true;
            }
        }

        let aggregated = self.aggregated_names.contains(&var_name_uc);
        let slots = max_duration + 1;

        let rec = VarRecord {
            sim_id_var_name: sim_id_var_name.clone(),
            sim_id: sim_id_uc,
            var_name: var_name_uc.clone(),
            sim_id_index,
            is_state,
            unit,
            limits,
            locked: false,
            pending_rate: f64::NAN,
            aggregated,
            has_values: vec![false; slots],
            values: if aggregated {
                Vec::new()
            } else {
                vec![f64::NAN; slots]
            },
            agg: AggTotals::new(),
        };

        self.vars.push(rec);
        let index = self.vars.len() - 1;
        self.var_map.insert(sim_id_var_name, index);
        self.by_name.entry(var_name_uc).or_default().push(index);

        Ok(self.encode_token(index, true))
    }

    // active checks --------------------------------------------------------

    fn var_active(&self, index: usize, delta: i64, method: &str) -> SimResult<bool> {
        let p = self.p(method)?;
        let day = p.cur_index as i64 + delta;
        if !self.is_valid_date_index(day)? {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the delta value ({delta}) is not valid"),
            ));
        }
        Ok(self.vars[index].has_values[day as usize])
    }

    fn sim_id_active(&self, index: usize, delta: i64, method: &str) -> SimResult<bool> {
        let p = self.p(method)?;
        let day = p.cur_index as i64 + delta;
        if !self.is_valid_date_index(day)? {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the delta value ({delta}) is not valid"),
            ));
        }
        let end = self.sim_ids[self.vars[index].sim_id_index].end_day_index;
        Ok(match end {
            None => true,
            Some(e) => day as usize <= e,
        })
    }

    // integration ----------------------------------------------------------

    /// Advances the store clock to `date` (which must be exactly one day
    /// after the current date) and integrates every state variable with a
    /// pending rate: `state_new = state_prev + rate`. A state without a
    /// pending rate becomes missing for this day, permanently. Auxiliary
    /// variables are untouched; they are rewritten during the coming AUX
    /// phase. Returns the number of integrations performed.
    pub fn update_to_date(&mut self, date: NaiveDate) -> SimResult<usize> {
        let method = "update_to_date";

        if self.trace_logging {
            trace!("{}.{}: date={}", COMPONENT, method, date);
        }

        let p = self.p(method)?;
        if date != add_days(p.cur_date, 1) {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "cannot set date to {}, previous date is more than 1 day different ({}) (time step error)",
                    date, p.cur_date
                ),
            ));
        }

        let p = self.period.as_mut().expect("period checked above");
        p.cur_date = date;
        p.cur_index += 1;
        let cur = p.cur_index;

        let mut integrated = 0;
        for index in 0..self.vars.len() {
            if !self.vars[index].is_state {
                continue;
            }

            // a missing rate leaves the state missing on this day; by the
            // continuity rule it can never be integrated again
            if self.var_active(index, -1, method)?
                && self.sim_id_active(index, 0, method)?
                && !self.vars[index].pending_rate.is_nan()
            {
                let rec = &mut self.vars[index];
                rec.has_values[cur] = true;
                if rec.aggregated {
                    let next = rec.agg.last + rec.pending_rate;
                    rec.agg.push(next, cur);
                } else {
                    rec.values[cur] = rec.values[cur - 1] + rec.pending_rate;
                }
                rec.pending_rate = f64::NAN;
                integrated += 1;
            }
        }
        Ok(integrated)
    }

    // module write operations ----------------------------------------------

    /// Forces a state value on the current day. Used for initialisation,
    /// registration and overriding; not for normal integration. The first
    /// call registers the variable and assigns the handle's token. Every
    /// forcing is appended to the forced-state ledger.
    pub fn force_state(&mut self, value: &mut SimValueState) -> SimResult<()> {
        let method = "force_state";

        if self.trace_logging {
            trace!("{}.{}: {}", COMPONENT, method, value.caption_state());
        }

        let cur = self.p(method)?.cur_index;
        let cur_date = self.p(method)?.cur_date;

        if !self.is_var_name_value_missing(&value.name, &value.sim_id)? {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} cannot be forced on date {} because this variable with a different simID is already active",
                    value.caption_state(),
                    cur_date
                ),
            ));
        }

        if value.v.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be forced on date {} because this value is missing",
                    value.caption_state(),
                    cur_date
                ),
            ));
        }

        if !value.token().is_valid() {
            let token = self.register_var(
                &value.sim_id,
                &value.name,
                value.unit,
                value.limits,
                true,
                method,
            )?;
            value.set_token(token)?;
        }

        let index = self.check_token(value.token(), method, true, TypeRequirement::State)?;

        // forcing may overwrite today's value; when today is still missing
        // every earlier day must be missing too (first-assignment rule)
        if !self.vars[index].has_values[cur] {
            for day in 0..cur {
                if self.vars[index].has_values[day] {
                    return Err(SimError::invariant(
                        COMPONENT,
                        method,
                        format!(
                            "{} cannot be forced on date {} because previous values are not missing",
                            value.caption_state(),
                            cur_date
                        ),
                    ));
                }
            }
        }

        let candidate = convert(&value.name, value.v, value.unit, self.vars[index].unit)?;

        if !self.vars[index].limits.contains(candidate) {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be forced on date {} because of a range violation: value={}, unit={}, range={}",
                    value.caption_state(),
                    cur_date,
                    candidate,
                    self.vars[index].unit.caption(),
                    self.vars[index].limits.caption()
                ),
            ));
        }

        let old_value = if self.vars[index].aggregated {
            self.vars[index].agg.last
        } else {
            self.vars[index].values[cur]
        };
        self.forced.push(ForcedRecord {
            day_index: cur,
            var_index: index,
            old_value,
            new_value: candidate,
        });

        let rec = &mut self.vars[index];
        if rec.aggregated {
            rec.agg.push(candidate, cur);
        } else {
            rec.values[cur] = candidate;
        }
        rec.has_values[cur] = true;
        Ok(())
    }

    /// Stores the rate of change of a state for integration on the next
    /// [`SimXChange::update_to_date`]. At most one rate per state per day;
    /// the resulting state must stay within the declared bounds.
    pub fn set_state_rate(&mut self, value: &SimValueState) -> SimResult<()> {
        let method = "set_state_rate";

        if self.trace_logging {
            trace!("{}.{}: {}", COMPONENT, method, value.caption_rate());
        }

        let cur_date = self.p(method)?.cur_date;
        let cur = self.p(method)?.cur_index;

        if !self.is_var_name_value_missing(&value.name, &value.sim_id)? {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because this variable with a different simID is already active",
                    value.caption_rate(),
                    cur_date
                ),
            ));
        }

        if value.r.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because this value is missing",
                    value.caption_rate(),
                    cur_date
                ),
            ));
        }

        let index = self.check_token(value.token(), method, true, TypeRequirement::State)?;

        if !self.vars[index].pending_rate.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because this value is already set",
                    value.caption_rate(),
                    cur_date
                ),
            ));
        }

        if !self.var_active(index, 0, method)? {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because the state is inactive",
                    value.caption_rate(),
                    cur_date
                ),
            ));
        }

        let rate = convert(&value.name, value.r, value.unit, self.vars[index].unit)?;

        let rec = &self.vars[index];
        let today = if rec.aggregated {
            rec.agg.last
        } else {
            rec.values[cur]
        };
        let candidate = today + rate;

        if !rec.limits.contains(candidate) {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because of a range violation for the new value of the corresponding state: oldvalue={}, newvalue={}, unit={}, range={}",
                    value.caption_rate(),
                    cur_date,
                    today,
                    candidate,
                    rec.unit.caption(),
                    rec.limits.caption()
                ),
            ));
        }

        self.vars[index].pending_rate = rate;
        Ok(())
    }

    /// Refreshes the handle with the state on the current date (`v`) and
    /// the previous date (`vp`), converted to the handle's unit.
    pub fn get_state(&self, value: &mut SimValueState) -> SimResult<()> {
        let method = "get_state";

        let cur = self.p(method)?.cur_index;
        let index =
            self.check_token(value.token(), method, false, TypeRequirement::NoRequirement)?;

        if !self.vars[index].is_state {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!("variable {} is not registered as a state variable", value.name),
            ));
        }

        value.v = self.value_by_index(index, cur, value.unit, false)?;
        value.vp = if cur >= 1 {
            self.value_by_index(index, cur - 1, value.unit, false)?
        } else {
            f64::NAN
        };
        Ok(())
    }

    /// Writes an auxiliary value on the current day. The first call
    /// registers the variable and assigns the handle's token.
    pub fn set_aux(&mut self, value: &mut SimValueAux) -> SimResult<()> {
        let method = "set_aux";

        if self.trace_logging {
            trace!("{}.{}: {}", COMPONENT, method, value.caption());
        }

        let cur = self.p(method)?.cur_index;
        let cur_date = self.p(method)?.cur_date;

        if !self.is_var_name_value_missing(&value.name, &value.sim_id)? {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because this variable with a different simID is already active",
                    value.caption(),
                    cur_date
                ),
            ));
        }

        if value.v.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because this is a missing value",
                    value.caption(),
                    cur_date
                ),
            ));
        }

        if !value.token().is_valid() {
            let token = self.register_var(
                &value.sim_id,
                &value.name,
                value.unit,
                value.limits,
                false,
                method,
            )?;
            value.set_token(token)?;
        }

        let index = self.check_token(value.token(), method, true, TypeRequirement::Auxiliary)?;

        // same continuity discipline as states: a gap before today means
        // the variable was abandoned and may not restart
        if cur >= 1 && !self.vars[index].has_values[cur - 1] {
            for day in 0..cur - 1 {
                if self.vars[index].has_values[day] {
                    return Err(SimError::invariant(
                        COMPONENT,
                        method,
                        format!(
                            "{} cannot be set on date {} because previous values are not missing",
                            value.caption(),
                            cur_date
                        ),
                    ));
                }
            }
        }

        let candidate = convert(&value.name, value.v, value.unit, self.vars[index].unit)?;

        if !self.vars[index].limits.contains(candidate) {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "{} cannot be set on date {} because of a range violation: value={}, unit={}, range={}",
                    value.caption(),
                    cur_date,
                    candidate,
                    self.vars[index].unit.caption(),
                    self.vars[index].limits.caption()
                ),
            ));
        }

        let rec = &mut self.vars[index];
        rec.has_values[cur] = true;
        if rec.aggregated {
            rec.agg.push(candidate, cur);
        } else {
            rec.values[cur] = candidate;
        }
        Ok(())
    }

    // external reads -------------------------------------------------------

    fn refresh_external(&self, ext: &mut SimValueExternal, day_index: usize) -> SimResult<()> {
        let method = "refresh_external";

        let index = self.check_token(ext.token, method, false, TypeRequirement::NoRequirement)?;
        let v = self.value_by_index(index, day_index, ext.unit, false)?;
        ext.set_v(v);

        let end = self.sim_ids[self.vars[index].sim_id_index].end_day_index;
        ext.set_terminated(match end {
            None => false,
            Some(e) => day_index >= e,
        });
        Ok(())
    }

    /// Refreshes the external handle with the unique active publisher of its
    /// variable name on the current date. When the cached token stops
    /// producing values the store re-resolves to another publisher.
    pub fn get_external_by_var_name(&self, ext: &mut SimValueExternal) -> SimResult<()> {
        self.get_external_by_var_name_delta(ext, 0)
    }

    /// As [`SimXChange::get_external_by_var_name`], for the day at
    /// `current + delta` (delta must be zero or negative).
    pub fn get_external_by_var_name_delta(
        &self,
        ext: &mut SimValueExternal,
        delta: i64,
    ) -> SimResult<()> {
        let method = "get_external_by_var_name_delta";

        if delta > 0 {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "delta value cannot be positive (call info: variable={}, delta={delta})",
                    ext.name
                ),
            ));
        }

        let day = self.p(method)?.cur_index as i64 + delta;
        if day < 0 {
            ext.token = VarToken::INVALID;
            ext.set_v(f64::NAN);
            return Ok(());
        }
        self.resolve_external(ext, day as usize)
    }

    /// As [`SimXChange::get_external_by_var_name`], for an explicit date.
    pub fn get_external_by_var_name_date(
        &self,
        ext: &mut SimValueExternal,
        date: NaiveDate,
    ) -> SimResult<()> {
        let method = "get_external_by_var_name_date";

        if !self.is_valid_date(date)? {
            let p = self.p(method)?;
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "date value ({date}) not in valid range ({}, {}) for variable {}",
                    p.start_date, p.end_date, ext.name
                ),
            ));
        }

        let day = diff_days(self.p(method)?.start_date, date) as usize;
        self.resolve_external(ext, day)
    }

    fn resolve_external(&self, ext: &mut SimValueExternal, day_index: usize) -> SimResult<()> {
        if !ext.token.is_valid() {
            if let Some(token) = self.token_by_var_name_at(&ext.name, day_index)? {
                ext.token = token;
            }
        }

        if ext.token.is_valid() {
            self.refresh_external(ext, day_index)?;

            if ext.is_missing() {
                // the cached publisher went silent; try to lock on to
                // another source providing this quantity
                match self.token_by_var_name_at(&ext.name, day_index)? {
                    Some(token) => {
                        ext.token = token;
                        self.refresh_external(ext, day_index)?;
                    }
                    None => ext.token = VarToken::INVALID,
                }
            }
        }
        Ok(())
    }

    // single-value reads ---------------------------------------------------

    /// Raw read at a day index, converting into `unit`. With
    /// `check_missing` a NaN result is an error.
    fn value_by_index(
        &self,
        index: usize,
        day_index: usize,
        unit: ScientificUnit,
        check_missing: bool,
    ) -> SimResult<f64> {
        let method = "value_by_index";

        let cur = self.p(method)?.cur_index;
        if !in_range(day_index, 0, cur) {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("day index value ({day_index}) not in valid range (0, {cur})"),
            ));
        }

        let rec = &self.vars[index];

        if rec.aggregated && day_index + 1 < cur {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!(
                    "{} day index value ({day_index}) illegal for aggregated storage",
                    rec.sim_id_var_name
                ),
            ));
        }

        let mut result = if rec.aggregated {
            if day_index == cur {
                rec.agg.last
            } else {
                rec.agg.previous
            }
        } else {
            rec.values[day_index]
        };

        if !result.is_nan() {
            result = convert(&rec.var_name, result, rec.unit, unit)?;
        }

        if check_missing && result.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("variable {} is missing", rec.sim_id_var_name),
            ));
        }
        Ok(result)
    }

    /// The token's value on the current date, converted into `unit`.
    /// Missing is an error.
    pub fn value_by_token(&self, token: VarToken, unit: ScientificUnit) -> SimResult<f64> {
        let date = self.cur_date()?;
        self.value_by_token_date(token, date, unit)
    }

    /// The token's value on `date`, converted into `unit`. Missing is an
    /// error.
    pub fn value_by_token_date(
        &self,
        token: VarToken,
        date: NaiveDate,
        unit: ScientificUnit,
    ) -> SimResult<f64> {
        self.value_by_token_date_impl(token, date, unit, true)
            .map(|v| v.expect("checked read always yields a value"))
    }

    /// As [`SimXChange::value_by_token_date`]; `None` when missing.
    pub fn value_by_token_date_opt(
        &self,
        token: VarToken,
        date: NaiveDate,
        unit: ScientificUnit,
    ) -> SimResult<Option<f64>> {
        self.value_by_token_date_impl(token, date, unit, false)
    }

    fn value_by_token_date_impl(
        &self,
        token: VarToken,
        date: NaiveDate,
        unit: ScientificUnit,
        check_missing: bool,
    ) -> SimResult<Option<f64>> {
        let method = "value_by_token_date";

        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;

        if !self.is_valid_date(date)? {
            let p = self.p(method)?;
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "date value ({date}) not in valid range ({}, {}) for {}",
                    p.start_date, p.end_date, self.vars[index].sim_id_var_name
                ),
            ));
        }

        let day = diff_days(self.p(method)?.start_date, date) as usize;
        let v = self.value_by_index(index, day, unit, check_missing)?;
        Ok(if v.is_nan() { None } else { Some(v) })
    }

    /// The token's value at a day index. Missing is an error.
    pub fn value_by_token_date_index(
        &self,
        token: VarToken,
        day_index: i64,
        unit: ScientificUnit,
    ) -> SimResult<f64> {
        self.value_by_token_date_index_impl(token, day_index, unit, true)
            .map(|v| v.expect("checked read always yields a value"))
    }

    /// As [`SimXChange::value_by_token_date_index`]; `None` when missing.
    pub fn value_by_token_date_index_opt(
        &self,
        token: VarToken,
        day_index: i64,
        unit: ScientificUnit,
    ) -> SimResult<Option<f64>> {
        self.value_by_token_date_index_impl(token, day_index, unit, false)
    }

    fn value_by_token_date_index_impl(
        &self,
        token: VarToken,
        day_index: i64,
        unit: ScientificUnit,
        check_missing: bool,
    ) -> SimResult<Option<f64>> {
        let method = "value_by_token_date_index";

        let index = self.check_token(token, method, false, TypeRequirement::NoRequirement)?;

        if !self.is_valid_date_index(day_index)? {
            let p = self.p(method)?;
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "day index value ({day_index}) not in valid range (0, {}) for {}",
                    p.end_index, self.vars[index].sim_id_var_name
                ),
            ));
        }

        let v = self.value_by_index(index, day_index as usize, unit, check_missing)?;
        Ok(if v.is_nan() { None } else { Some(v) })
    }

    /// The token's value at `current + delta` (delta zero or negative).
    /// Missing is an error.
    pub fn value_by_token_delta(
        &self,
        token: VarToken,
        delta: i64,
        unit: ScientificUnit,
    ) -> SimResult<f64> {
        let day = self.delta_to_day_index(token, delta)?;
        self.value_by_token_date_index(token, day, unit)
    }

    /// As [`SimXChange::value_by_token_delta`]; `None` when missing.
    pub fn value_by_token_delta_opt(
        &self,
        token: VarToken,
        delta: i64,
        unit: ScientificUnit,
    ) -> SimResult<Option<f64>> {
        let day = self.delta_to_day_index(token, delta)?;
        self.value_by_token_date_index_opt(token, day, unit)
    }

    fn delta_to_day_index(&self, token: VarToken, delta: i64) -> SimResult<i64> {
        let method = "value_by_token_delta";
        if delta > 0 {
            let sim_id = self.sim_id_from_token(token)?;
            let var_name = self.var_name_from_token(token)?;
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "delta value cannot be positive (call info: simID={sim_id}, variable={var_name}, delta={delta})"
                ),
            ));
        }
        Ok(self.p(method)?.cur_index as i64 + delta)
    }

    // token lookup by name -------------------------------------------------

    /// Read-only token for an explicit `(simID, varName)` pair.
    pub fn token_read_by_sim_id_var_name(
        &self,
        sim_id: &str,
        var_name: &str,
    ) -> SimResult<VarToken> {
        let method = "token_read_by_sim_id_var_name";

        if sim_id.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the simID is empty"));
        }
        if var_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the variable is empty"));
        }

        let key = Self::compose_sim_id_var_name(&sim_id.to_uppercase(), &var_name.to_uppercase());
        match self.var_map.get(&key) {
            Some(&index) => Ok(self.encode_token(index, false)),
            None => Err(SimError::contract(
                COMPONENT,
                method,
                format!("the simID ({sim_id}) and variable ({var_name}) are not registered"),
            )),
        }
    }

    /// Read-only token for the unique publisher of `var_name` that is
    /// active on the current date. Erroring when there is none.
    pub fn token_read_by_var_name(&self, var_name: &str) -> SimResult<VarToken> {
        let method = "token_read_by_var_name";
        let cur = self.p(method)?.cur_index;
        match self.token_by_var_name_at(var_name, cur)? {
            Some(token) => Ok(token),
            None => Err(SimError::invariant(
                COMPONENT,
                method,
                format!("the variable {var_name} is not active"),
            )),
        }
    }

    /// As [`SimXChange::token_read_by_var_name`]; `None` when no publisher
    /// is active.
    pub fn token_read_by_var_name_opt(&self, var_name: &str) -> SimResult<Option<VarToken>> {
        let cur = self.p("token_read_by_var_name")?.cur_index;
        self.token_by_var_name_at(var_name, cur)
    }

    /// Read-only token for the publisher active at `current + delta`.
    pub fn token_read_by_var_name_delta(
        &self,
        var_name: &str,
        delta: i64,
    ) -> SimResult<Option<VarToken>> {
        let method = "token_read_by_var_name_delta";
        if delta > 0 {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "delta value cannot be positive (call info: variable={var_name}, delta={delta})"
                ),
            ));
        }
        let day = self.p(method)?.cur_index as i64 + delta;
        if !self.is_valid_date_index(day)? {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the date index ({day}) is not valid"),
            ));
        }
        self.token_by_var_name_at(var_name, day as usize)
    }

    /// Read-only token for the publisher active on `date`.
    pub fn token_read_by_var_name_date(
        &self,
        var_name: &str,
        date: NaiveDate,
    ) -> SimResult<Option<VarToken>> {
        let method = "token_read_by_var_name_date";
        if !self.is_valid_date(date)? {
            let p = self.p(method)?;
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "date value ({date}) not in valid range ({}, {}) for variable {var_name}",
                    p.start_date, p.end_date
                ),
            ));
        }
        let day = diff_days(self.p(method)?.start_date, date) as usize;
        self.token_by_var_name_at(var_name, day)
    }

    /// Scans for the publisher of `var_name` holding a value at
    /// `day_index`; exactly one may be active (invariant I1).
    fn token_by_var_name_at(
        &self,
        var_name: &str,
        day_index: usize,
    ) -> SimResult<Option<VarToken>> {
        let method = "token_by_var_name_at";

        if var_name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the variable is empty"));
        }
        if !self.is_valid_date_index(day_index as i64)? {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("the date index ({day_index}) is not valid"),
            ));
        }

        let var_name = var_name.to_uppercase();
        let mut result: Option<VarToken> = None;

        if let Some(indices) = self.by_name.get(&var_name) {
            for &i in indices {
                if self.vars[i].has_values[day_index] {
                    if result.is_some() {
                        return Err(SimError::invariant(
                            COMPONENT,
                            method,
                            format!("more than one active value for variable {var_name}"),
                        ));
                    }
                    result = Some(self.encode_token(i, false));
                }
            }
        }
        Ok(result)
    }

    // info across all variables --------------------------------------------

    /// Number of registered variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Read-only metadata of the variable at a registration index.
    pub fn var_info(&self, index: usize) -> SimResult<VarInfo> {
        let method = "var_info";
        if index >= self.vars.len() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "index ({index}) not in valid range (0 to {})",
                    self.vars.len().saturating_sub(1)
                ),
            ));
        }
        let rec = &self.vars[index];
        Ok(VarInfo {
            sim_id: rec.sim_id.clone(),
            var_name: rec.var_name.clone(),
            sim_id_var_name: rec.sim_id_var_name.clone(),
            is_state: rec.is_state,
            unit: rec.unit,
            limits: rec.limits,
            locked: rec.locked,
            aggregated: rec.aggregated,
        })
    }

    /// Number of entries in the forced-state ledger.
    pub fn forced_count(&self) -> usize {
        self.forced.len()
    }

    /// One entry of the forced-state ledger.
    pub fn forced_info(&self, index: usize) -> SimResult<ForcedStateInfo> {
        let method = "forced_info";
        if index >= self.forced.len() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!(
                    "index ({index}) not in valid range (0 to {})",
                    self.forced.len().saturating_sub(1)
                ),
            ));
        }
        let f = &self.forced[index];
        let rec = &self.vars[f.var_index];
        Ok(ForcedStateInfo {
            date: self.date_by_date_index(f.day_index as i64)?,
            sim_id_var_name: rec.sim_id_var_name.clone(),
            old_value: f.old_value,
            new_value: f.new_value,
            unit: rec.unit,
        })
    }

    pub(crate) fn forced_records(&self) -> impl Iterator<Item = (usize, usize, f64, f64)> + '_ {
        self.forced
            .iter()
            .map(|f| (f.day_index, f.var_index, f.old_value, f.new_value))
    }
}
