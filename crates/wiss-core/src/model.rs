//! The model: running modules and controllers under one phase regime.
//!
//! [`Model`] owns both exchanges, the list of running modules and the list
//! of controllers. [`Model::do_model_action`] fans a phase action out to
//! every running module in registration order (the order decides which
//! publisher wins a variable-name race, so it is part of the semantics).
//! The driver asks the model once per day which modules to start, which to
//! terminate, and whether the run is over because every module is gone.

use crate::controller::SimController;
use crate::errors::{SimError, SimResult};
use crate::parxchange::ParXChange;
use crate::simobject::{ModelAction, SimObject, SimPhase};
use crate::simxchange::SimXChange;
use serde::{Deserialize, Serialize};
use tracing::debug;

const COMPONENT: &str = "Model";

/// Model-level phase, checked when dispatching phase actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelState {
    Initialising,
    Intervening,
    AuxCalculating,
    RateCalculating,
    Terminating,
}

/// A coupled set of modules and the controllers that manage them.
pub struct Model {
    par: ParXChange,
    sim: SimXChange,
    controllers: Vec<Box<dyn SimController>>,
    running: Vec<Box<dyn SimObject>>,
    /// modules started over the whole run; can only increase
    started_count: usize,
    state: ModelState,
    info: Option<ModelInfo>,
}

/// Descriptive metadata of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub title: String,
    pub description: String,
    pub major_version: u32,
    pub minor_version: u32,
}

impl Model {
    pub fn new(par: ParXChange, sim: SimXChange) -> Model {
        Model {
            par,
            sim,
            controllers: Vec::new(),
            running: Vec::new(),
            started_count: 0,
            state: ModelState::Initialising,
            info: None,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Attaches descriptive metadata.
    pub fn set_info(&mut self, info: ModelInfo) {
        self.info = Some(info);
    }

    pub fn info(&self) -> SimResult<&ModelInfo> {
        self.info
            .as_ref()
            .ok_or_else(|| SimError::invariant(COMPONENT, "info", "model info not set"))
    }

    pub fn par_xchange(&self) -> &ParXChange {
        &self.par
    }

    pub fn par_xchange_mut(&mut self) -> &mut ParXChange {
        &mut self.par
    }

    pub fn sim_xchange(&self) -> &SimXChange {
        &self.sim
    }

    pub fn sim_xchange_mut(&mut self) -> &mut SimXChange {
        &mut self.sim
    }

    /// Registers a controller. Controllers run for the whole simulation,
    /// in registration order.
    pub fn add_controller(&mut self, controller: Box<dyn SimController>) {
        self.controllers.push(controller);
    }

    /// Number of modules currently running.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Number of modules started over the whole run.
    pub fn started_count(&self) -> usize {
        self.started_count
    }

    /// Index into the running list for a simID.
    pub fn sim_object_index_by_sim_id(&self, sim_id: &str) -> Option<usize> {
        self.running
            .iter()
            .position(|m| m.base().sim_id().eq_ignore_ascii_case(sim_id))
    }

    /// The running module with the given simID.
    pub fn sim_object_by_sim_id(&self, sim_id: &str) -> SimResult<&dyn SimObject> {
        if sim_id.trim().is_empty() {
            return Err(SimError::contract(
                COMPONENT,
                "sim_object_by_sim_id",
                "the simID is empty",
            ));
        }
        self.sim_object_index_by_sim_id(sim_id)
            .map(|i| self.running[i].as_ref())
            .ok_or_else(|| {
                SimError::contract(
                    COMPONENT,
                    "sim_object_by_sim_id",
                    format!("cannot find simID={sim_id}"),
                )
            })
    }

    /// Runs one phase action on every running module, in registration
    /// order, after checking the model-level phase machine.
    pub fn do_model_action(&mut self, action: ModelAction) -> SimResult<()> {
        let method = "do_model_action";

        let legal = match action {
            ModelAction::Intervene => matches!(
                self.state,
                ModelState::Initialising | ModelState::RateCalculating
            ),
            ModelAction::AuxCalculations => matches!(
                self.state,
                ModelState::Initialising | ModelState::Intervening | ModelState::AuxCalculating
            ),
            ModelAction::RateCalculations => self.state == ModelState::AuxCalculating,
        };
        if !legal {
            return Err(SimError::invariant(
                COMPONENT,
                method,
                format!("internal error, {action:?} wanted on state {:?}", self.state),
            ));
        }
        self.state = match action {
            ModelAction::Intervene => ModelState::Intervening,
            ModelAction::AuxCalculations => ModelState::AuxCalculating,
            ModelAction::RateCalculations => ModelState::RateCalculating,
        };

        for module in self.running.iter_mut() {
            module.do_model_action(action, &mut self.sim, &mut self.par)?;
        }
        Ok(())
    }

    /// Asks every controller which modules to start; returns the number
    /// started. Newly started modules have run their initialisation and
    /// one AUX pass; the driver re-runs the AUX phase so they catch up
    /// with everyone else.
    pub fn test_for_sim_objects_to_start(&mut self) -> SimResult<usize> {
        let mut started = 0;

        for i in 0..self.controllers.len() {
            let before = self.running.len();
            self.controllers[i].test_for_sim_objects_to_start(
                &mut self.running,
                &mut self.sim,
                &mut self.par,
            )?;
            started += self.running.len() - before;
        }

        self.started_count += started;
        Ok(started)
    }

    /// Asks every controller which modules to terminate, then every
    /// remaining module whether it can continue. Terminated modules are
    /// removed from the running list.
    pub fn test_for_sim_objects_to_terminate(&mut self) -> SimResult<()> {
        for i in 0..self.controllers.len() {
            let sim_ids =
                self.controllers[i].test_for_sim_objects_to_terminate(&self.running, &self.sim)?;

            for sim_id in sim_ids {
                if let Some(index) = self.sim_object_index_by_sim_id(&sim_id) {
                    debug!(
                        "terminating {} with simID={} (by controller request)",
                        self.running[index].base().class_name(),
                        self.running[index].base().sim_id()
                    );
                    self.running[index].terminate(&mut self.sim, &mut self.par)?;
                    self.running.remove(index);
                }
            }
        }

        let mut index = 0;
        while index < self.running.len() {
            if self.running[index].can_continue(&self.sim) {
                index += 1;
                continue;
            }
            debug!(
                "terminating {} with simID={} (by their own request)",
                self.running[index].base().class_name(),
                self.running[index].base().sim_id()
            );
            self.running[index].terminate(&mut self.sim, &mut self.par)?;
            self.running.remove(index);
        }
        Ok(())
    }

    /// Whether modules have run in the past but none are running any more,
    /// which ends the simulation from the model side.
    pub fn test_for_terminate_by_model(&self) -> bool {
        self.started_count >= 1 && self.running.is_empty()
    }

    /// Terminates every still-running module, last to first.
    pub fn sim_objects_terminate(&mut self) -> SimResult<()> {
        self.state = ModelState::Terminating;

        for index in (0..self.running.len()).rev() {
            if self.running[index].base().phase() == SimPhase::Terminated {
                continue;
            }
            debug!(
                "terminating {} with simID={}",
                self.running[index].base().class_name(),
                self.running[index].base().sim_id()
            );
            self.running[index].terminate(&mut self.sim, &mut self.par)?;
        }
        Ok(())
    }
}
