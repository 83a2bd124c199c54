//! Value handles through which modules talk to the dynamic exchange.
//!
//! A module declares each owned state variable as a [`SimValueState`], each
//! owned auxiliary variable as a [`SimValueAux`] and each read of another
//! module's output as a [`SimValueExternal`]. The handle carries the
//! immutable registration metadata (simID, name, unit, bounds) plus the
//! mutable value slots the store refreshes; `NaN` is the missing sentinel
//! throughout.

use crate::errors::{SimError, SimResult};
use crate::ranges::{RangeLimits, RangeType};
use crate::simxchange::VarToken;
use crate::units::ScientificUnit;

fn check_sim_id(component: &str, sim_id: &str) -> SimResult<()> {
    if sim_id.trim().is_empty() {
        return Err(SimError::contract(component, "new", "the simID is empty"));
    }
    Ok(())
}

fn check_var_name(component: &str, sim_id: &str, var_name: &str) -> SimResult<()> {
    if var_name.trim().is_empty() {
        return Err(SimError::contract(
            component,
            "new",
            format!("the variable is empty (simID={sim_id})"),
        ));
    }
    Ok(())
}

/// Handle for a state variable owned by a module.
///
/// `v` is the state on the current date, `r` the pending rate of change and
/// `vp` the state on the previous date. The token starts invalid and is
/// assigned once by the store on first registration.
#[derive(Debug, Clone)]
pub struct SimValueState {
    token: VarToken,
    /// state value on the current date
    pub v: f64,
    /// rate of change, integrated by the store on the next day step
    pub r: f64,
    /// state value on the previous date
    pub vp: f64,
    pub unit: ScientificUnit,
    pub name: String,
    pub sim_id: String,
    pub limits: RangeLimits,
}

impl SimValueState {
    /// Handle with a predefined range preset.
    pub fn new(
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        range: RangeType,
    ) -> SimResult<SimValueState> {
        Self::with_limits(sim_id, var_name, unit, range.limits())
    }

    /// Handle with explicit inclusive bounds.
    pub fn with_bounds(
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        lower: f64,
        upper: f64,
    ) -> SimResult<SimValueState> {
        Self::with_limits(sim_id, var_name, unit, RangeLimits::new(lower, upper)?)
    }

    pub fn with_limits(
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        limits: RangeLimits,
    ) -> SimResult<SimValueState> {
        check_sim_id("SimValueState", sim_id)?;
        check_var_name("SimValueState", sim_id, var_name)?;

        Ok(SimValueState {
            token: VarToken::INVALID,
            v: f64::NAN,
            r: f64::NAN,
            vp: f64::NAN,
            unit,
            name: var_name.to_uppercase(),
            sim_id: sim_id.to_uppercase(),
            limits,
        })
    }

    pub fn token(&self) -> VarToken {
        self.token
    }

    /// Assigns the token. Only the invalid-to-valid transition is allowed.
    pub(crate) fn set_token(&mut self, token: VarToken) -> SimResult<()> {
        if self.token.is_valid() || !token.is_valid() {
            return Err(SimError::invariant(
                "SimValueState",
                "set_token",
                format!("the token cannot be set twice (simID={})", self.sim_id),
            ));
        }
        self.token = token;
        Ok(())
    }

    pub fn is_missing(&self) -> bool {
        self.v.is_nan()
    }

    pub fn is_not_missing(&self) -> bool {
        !self.v.is_nan()
    }

    pub fn check_not_missing(&self) -> SimResult<()> {
        if self.v.is_nan() {
            return Err(SimError::invariant(
                "SimValueState",
                "check_not_missing",
                format!("{}.{} is not allowed to be empty", self.sim_id, self.name),
            ));
        }
        Ok(())
    }

    pub fn caption_state(&self) -> String {
        format!(
            "{}.{}: state={} (unit={})",
            self.sim_id,
            self.name,
            self.v,
            self.unit.caption()
        )
    }

    pub fn caption_rate(&self) -> String {
        format!(
            "{}.{}: rate={} (unit={})",
            self.sim_id,
            self.name,
            self.r,
            self.unit.caption()
        )
    }
}

/// Handle for an auxiliary variable owned by a module. Recomputed and
/// overwritten each day; no rate, no previous-day slot.
#[derive(Debug, Clone)]
pub struct SimValueAux {
    token: VarToken,
    /// value on the current date
    pub v: f64,
    pub unit: ScientificUnit,
    pub name: String,
    pub sim_id: String,
    pub limits: RangeLimits,
}

impl SimValueAux {
    pub fn new(
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        range: RangeType,
    ) -> SimResult<SimValueAux> {
        Self::with_limits(sim_id, var_name, unit, range.limits())
    }

    pub fn with_bounds(
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        lower: f64,
        upper: f64,
    ) -> SimResult<SimValueAux> {
        Self::with_limits(sim_id, var_name, unit, RangeLimits::new(lower, upper)?)
    }

    pub fn with_limits(
        sim_id: &str,
        var_name: &str,
        unit: ScientificUnit,
        limits: RangeLimits,
    ) -> SimResult<SimValueAux> {
        check_sim_id("SimValueAux", sim_id)?;
        check_var_name("SimValueAux", sim_id, var_name)?;

        Ok(SimValueAux {
            token: VarToken::INVALID,
            v: f64::NAN,
            unit,
            name: var_name.to_uppercase(),
            sim_id: sim_id.to_uppercase(),
            limits,
        })
    }

    pub fn token(&self) -> VarToken {
        self.token
    }

    pub(crate) fn set_token(&mut self, token: VarToken) -> SimResult<()> {
        if self.token.is_valid() || !token.is_valid() {
            return Err(SimError::invariant(
                "SimValueAux",
                "set_token",
                format!("the token cannot be set twice (simID={})", self.sim_id),
            ));
        }
        self.token = token;
        Ok(())
    }

    pub fn is_missing(&self) -> bool {
        self.v.is_nan()
    }

    pub fn is_not_missing(&self) -> bool {
        !self.v.is_nan()
    }

    pub fn caption(&self) -> String {
        format!(
            "{}.{}: value={} (unit={})",
            self.sim_id,
            self.name,
            self.v,
            self.unit.caption()
        )
    }
}

/// Handle for reading a variable published by some other module, resolved
/// by name. Only the dynamic exchange writes into an instance: the token is
/// re-resolved whenever the current publisher stops producing values.
#[derive(Debug, Clone)]
pub struct SimValueExternal {
    pub(crate) token: VarToken,
    v: f64,
    pub unit: ScientificUnit,
    pub name: String,
    caller: String,
    terminated: bool,
}

impl SimValueExternal {
    pub fn new(var_name: &str, unit: ScientificUnit, caller: &str) -> SimResult<SimValueExternal> {
        if caller.trim().is_empty() {
            return Err(SimError::contract(
                "SimValueExternal",
                "new",
                "the caller is empty",
            ));
        }
        if var_name.trim().is_empty() {
            return Err(SimError::contract(
                "SimValueExternal",
                "new",
                format!("the variable is empty (caller={caller})"),
            ));
        }

        Ok(SimValueExternal {
            token: VarToken::INVALID,
            v: f64::NAN,
            unit,
            name: var_name.to_uppercase(),
            caller: caller.to_string(),
            terminated: true,
        })
    }

    /// The value on the refreshed date. Erroring when missing keeps silent
    /// NaN propagation out of module arithmetic.
    pub fn v(&self) -> SimResult<f64> {
        self.check_not_missing()?;
        Ok(self.v)
    }

    pub(crate) fn set_v(&mut self, v: f64) {
        self.v = v;
    }

    /// Whether the publishing simID has ended on the refreshed date.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub(crate) fn set_terminated(&mut self, terminated: bool) {
        self.terminated = terminated;
    }

    pub fn token(&self) -> VarToken {
        self.token
    }

    pub fn is_missing(&self) -> bool {
        self.v.is_nan()
    }

    pub fn is_not_missing(&self) -> bool {
        !self.v.is_nan()
    }

    pub fn check_not_missing(&self) -> SimResult<()> {
        if self.v.is_nan() {
            return Err(SimError::invariant(
                "SimValueExternal",
                "check_not_missing",
                format!(
                    "value of {} is not allowed to be empty (caller={})",
                    self.name, self.caller
                ),
            ));
        }
        Ok(())
    }

    pub fn caption(&self) -> String {
        format!(
            "{}: value={} (unit={})",
            self.name,
            self.v,
            self.unit.caption()
        )
    }
}
