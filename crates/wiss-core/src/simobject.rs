//! Module base and lifecycle.
//!
//! A concrete simulation module implements [`SimObject`] and embeds a
//! [`SimObjectBase`] that carries its identity and phase state machine.
//! The legal phase order of a module is
//!
//! `Initialising -> Aux -> Rate -> (next day) -> Intervene -> Aux -> Rate
//! -> ... -> Terminating -> Terminated`
//!
//! and [`SimObject::do_model_action`] enforces it: each phase entry checks
//! its legal predecessor. A module constructor must register its simID with
//! the dynamic store (done by [`SimObjectBase::new`]) and end by running the
//! AUX phase once, so its auxiliary variables exist the moment the module
//! joins the run.
//!
//! Modules do not hold references to the stores; every phase method
//! receives the exchanges as parameters, which keeps ownership in the
//! [`Model`](crate::model::Model) and the object graph acyclic.

use crate::dates::diff_days;
use crate::errors::{SimError, SimResult};
use crate::parxchange::{ParType, ParXChange};
use crate::simxchange::SimXChange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The per-day phase actions the driver dispatches to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelAction {
    Intervene,
    AuxCalculations,
    RateCalculations,
}

/// Lifecycle phase of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    Initialising,
    Intervening,
    AuxCalculating,
    RateCalculating,
    Terminating,
    Terminated,
}

/// Identity, version and phase state of a module. Concrete modules embed
/// one and hand it out through [`SimObject::base`].
#[derive(Debug)]
pub struct SimObjectBase {
    sim_id: String,
    class_name: String,
    title: String,
    description: String,
    major_version: u32,
    minor_version: u32,
    phase: SimPhase,
    initial_date: NaiveDate,
    trace_logging: bool,
}

impl SimObjectBase {
    /// Validates the module identity and registers `sim_id` with the
    /// dynamic store. `class_name` is the module type name used for
    /// by-class queries.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sim_id: &str,
        class_name: &str,
        par: &ParXChange,
        sim: &mut SimXChange,
        major_version: u32,
        minor_version: u32,
        title: &str,
        description: &str,
    ) -> SimResult<SimObjectBase> {
        let method = "new";
        let component = "SimObjectBase";

        if sim_id.trim().is_empty() {
            return Err(SimError::contract(component, method, "simID is empty"));
        }
        if title.trim().is_empty() {
            return Err(SimError::contract(component, method, "title is empty"));
        }
        if description.trim().is_empty() {
            return Err(SimError::contract(component, method, "description is empty"));
        }

        let initial_date = sim.cur_date()?;
        sim.register_sim_id(sim_id, class_name)?;

        let trace_logging = if par.contains(crate::driver::TRACELOGGING, ParType::Boolean) {
            par.get_bool(crate::driver::TRACELOGGING, class_name)?
        } else {
            false
        };

        Ok(SimObjectBase {
            sim_id: sim_id.to_uppercase(),
            class_name: class_name.to_uppercase(),
            title: title.to_string(),
            description: description.to_string(),
            major_version,
            minor_version,
            phase: SimPhase::Initialising,
            initial_date,
            trace_logging,
        })
    }

    pub fn sim_id(&self) -> &str {
        &self.sim_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn major_version(&self) -> u32 {
        self.major_version
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn trace_logging(&self) -> bool {
        self.trace_logging
    }

    pub fn is_initialising(&self) -> bool {
        self.phase == SimPhase::Initialising
    }

    pub fn is_intervening(&self) -> bool {
        self.phase == SimPhase::Intervening
    }

    pub fn is_aux_calculating(&self) -> bool {
        self.phase == SimPhase::AuxCalculating
    }

    pub fn is_rate_calculating(&self) -> bool {
        self.phase == SimPhase::RateCalculating
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == SimPhase::Terminated
    }

    /// Days elapsed since this module was constructed; can differ from the
    /// elapsed time of the whole simulation.
    pub fn elapsed(&self, sim: &SimXChange) -> SimResult<i64> {
        Ok(diff_days(self.initial_date, sim.cur_date()?))
    }

    pub fn is_version(&self, major: u32, minor: u32) -> bool {
        self.major_version == major && self.minor_version == minor
    }

    pub fn is_same_or_newer_version(&self, major_minimal: u32, minor_minimal: u32) -> bool {
        major_minimal < self.major_version
            || (major_minimal == self.major_version && minor_minimal <= self.minor_version)
    }

    /// Errors when the module is older than the required version.
    pub fn check_minimal_version(&self, major_minimal: u32, minor_minimal: u32) -> SimResult<()> {
        if !self.is_same_or_newer_version(major_minimal, minor_minimal) {
            return Err(SimError::contract(
                &self.class_name,
                "check_minimal_version",
                format!(
                    "module with version {}.{} cannot be used, minimum version required is {}.{}",
                    self.major_version, self.minor_version, major_minimal, minor_minimal
                ),
            ));
        }
        Ok(())
    }

    fn enter(&mut self, action: ModelAction) -> SimResult<()> {
        let (next, legal) = match action {
            ModelAction::Intervene => (
                SimPhase::Intervening,
                self.phase == SimPhase::RateCalculating,
            ),
            ModelAction::AuxCalculations => (
                SimPhase::AuxCalculating,
                matches!(
                    self.phase,
                    SimPhase::Initialising | SimPhase::Intervening | SimPhase::AuxCalculating
                ),
            ),
            ModelAction::RateCalculations => (
                SimPhase::RateCalculating,
                self.phase == SimPhase::AuxCalculating,
            ),
        };

        if !legal {
            return Err(SimError::invariant(
                &self.class_name,
                "do_model_action",
                format!(
                    "internal error, {action:?} wanted on phase {:?} of simID {}",
                    self.phase, self.sim_id
                ),
            ));
        }
        self.phase = next;
        Ok(())
    }
}

/// The capability set of a simulation module.
///
/// Hooks are invoked through [`SimObject::do_model_action`] and
/// [`SimObject::terminate`], which run the phase state machine; concrete
/// modules implement the hooks only. `aux_calculations` is required, the
/// rest default to no-ops.
pub trait SimObject {
    fn base(&self) -> &SimObjectBase;

    fn base_mut(&mut self) -> &mut SimObjectBase;

    /// Hook for intervening in own states (forcing) at the start of a day.
    fn intervene(&mut self, _sim: &mut SimXChange, _par: &mut ParXChange) -> SimResult<()> {
        Ok(())
    }

    /// Hook recomputing the module's auxiliary variables.
    fn aux_calculations(&mut self, sim: &mut SimXChange, par: &mut ParXChange) -> SimResult<()>;

    /// Hook setting the rates of the module's states.
    fn rate_calculations(&mut self, _sim: &mut SimXChange, _par: &mut ParXChange) -> SimResult<()> {
        Ok(())
    }

    /// Whether the module can go to the next time step. Returning false
    /// requests normal self-termination; it is not an error.
    fn can_continue(&self, _sim: &SimXChange) -> bool {
        true
    }

    /// Hook for cleanup during termination (e.g. deleting parameters the
    /// module set).
    fn on_terminate(&mut self, _sim: &mut SimXChange, _par: &mut ParXChange) -> SimResult<()> {
        Ok(())
    }

    /// Runs one phase action: enforces the phase state machine, then calls
    /// the matching hook.
    fn do_model_action(
        &mut self,
        action: ModelAction,
        sim: &mut SimXChange,
        par: &mut ParXChange,
    ) -> SimResult<()> {
        if self.base().trace_logging() {
            trace!(
                "{}.{:?} (simID={})",
                self.base().class_name(),
                action,
                self.base().sim_id()
            );
        }
        self.base_mut().enter(action)?;

        match action {
            ModelAction::Intervene => self.intervene(sim, par),
            ModelAction::AuxCalculations => self.aux_calculations(sim, par),
            ModelAction::RateCalculations => self.rate_calculations(sim, par),
        }
    }

    /// Terminates the module: runs the cleanup hook and records the end of
    /// its simID in the dynamic store. Legal from any phase.
    fn terminate(&mut self, sim: &mut SimXChange, par: &mut ParXChange) -> SimResult<()> {
        if self.base().trace_logging() {
            trace!(
                "{}.terminate (simID={})",
                self.base().class_name(),
                self.base().sim_id()
            );
        }
        self.base_mut().phase = SimPhase::Terminating;
        self.on_terminate(sim, par)?;
        let sim_id = self.base().sim_id().to_string();
        sim.terminate_sim_id(&sim_id)?;
        self.base_mut().phase = SimPhase::Terminated;
        Ok(())
    }
}
