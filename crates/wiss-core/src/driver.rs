//! The time driver: runs a model from start date to end date.
//!
//! Construction wires the timer and the dynamic store to the
//! `STARTDATE`/`ENDDATE` parameters; [`TimeDriver::run`] then executes the
//! daily loop:
//!
//! 1. integrate pending rates (`update_to_date`, skipped on the start day),
//! 2. INTERVENE phase,
//! 3. AUX phase,
//! 4. controller spawn loop: while controllers start modules, re-run AUX so
//!    newcomers see a consistent day,
//! 5. RATE phase,
//! 6. controller- and module-requested terminations,
//! 7. step the timer, unless the model terminated the run.
//!
//! On exit remaining modules are terminated and the store is closed.

use crate::errors::SimResult;
use crate::model::Model;
use crate::parxchange::ParType;
use crate::simobject::ModelAction;
use crate::timer::Timer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const COMPONENT: &str = "TimeDriver";

/// Well-known parameter: start date of the run (`Date`, required).
pub const STARTDATE: &str = "STARTDATE";
/// Well-known parameter: end date of the run (`Date`, required).
pub const ENDDATE: &str = "ENDDATE";
/// Well-known parameter: pause date for debugging (`Date`, optional).
pub const PAUSEDATE: &str = "PAUSEDATE";
/// Well-known parameter: trace logging of store writes (`Boolean`,
/// optional).
pub const TRACELOGGING: &str = "TRACELOGGING";

/// Progress of the driver, visible for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Constructed,
    Initialising,
    Updating,
    Intervening,
    TestingForStart,
    AuxCalculating,
    RateCalculating,
    TestingForTermination,
    TerminatedByTimeDriver,
    TerminatedByModel,
}

/// Drives a [`Model`] from start to finish.
pub struct TimeDriver {
    timer: Timer,
    model: Model,
    state: DriverState,
}

impl TimeDriver {
    /// Wires the timer and the dynamic store to the model's date
    /// parameters. `STARTDATE` and `ENDDATE` must be present.
    pub fn new(mut model: Model) -> SimResult<TimeDriver> {
        let start = model.par_xchange().get_date(STARTDATE, COMPONENT)?;
        let end = model.par_xchange().get_date(ENDDATE, COMPONENT)?;

        let mut timer = Timer::new();
        timer.set_date_period(start, end)?;
        model.sim_xchange_mut().set_date_period(start, end)?;

        if model.par_xchange().contains(PAUSEDATE, ParType::Date) {
            timer.set_pause_date(model.par_xchange().get_date(PAUSEDATE, COMPONENT)?)?;
        }

        Ok(TimeDriver {
            timer,
            model,
            state: DriverState::Constructed,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Consumes the driver and hands the model back, e.g. for reporting
    /// after the run.
    pub fn into_model(self) -> Model {
        self.model
    }

    /// Runs the model from start date to end date (or until the model
    /// terminates the run itself). A contract or invariant violation from
    /// any phase aborts the run and propagates.
    pub fn run(&mut self) -> SimResult<()> {
        let mut terminate_by_driver = false;
        let mut terminate_by_model = false;

        self.state = DriverState::Initialising;

        self.timer.reset()?;
        self.model.sim_xchange_mut().reset();

        // after the reset, which clears the flag
        if self.model.par_xchange().contains(TRACELOGGING, ParType::Boolean) {
            let flag = self.model.par_xchange().get_bool(TRACELOGGING, COMPONENT)?;
            self.model.sim_xchange_mut().set_trace_logging(flag);
        }

        info!(
            "running from {} to {} (duration={} days)",
            self.timer.start_date()?,
            self.timer.end_date()?,
            self.timer.duration()?
        );

        while !terminate_by_driver && !terminate_by_model {
            self.state = DriverState::Updating;

            // move to the next day and integrate state variables
            if self.timer.date()? > self.timer.start_date()? {
                let date = self.timer.date()?;
                self.model.sim_xchange_mut().update_to_date(date)?;
            }

            let pause = self.timer.pause_now();
            self.model.sim_xchange_mut().set_pause(pause);
            if pause {
                debug!(
                    "pause point reached on date={}",
                    self.model.sim_xchange().cur_date()?
                );
            }

            self.state = DriverState::Intervening;
            self.model.do_model_action(ModelAction::Intervene)?;

            self.state = DriverState::AuxCalculating;
            self.model.do_model_action(ModelAction::AuxCalculations)?;

            // everything is now up to date on the current time; see which
            // modules have to be started (after AUX, so the variables they
            // trigger on exist)
            self.state = DriverState::TestingForStart;
            let mut started = self.model.test_for_sim_objects_to_start()?;
            while started > 0 {
                self.model.do_model_action(ModelAction::AuxCalculations)?;
                started = self.model.test_for_sim_objects_to_start()?;
            }

            self.state = DriverState::RateCalculating;
            self.model.do_model_action(ModelAction::RateCalculations)?;

            self.state = DriverState::TestingForTermination;
            self.model.test_for_sim_objects_to_terminate()?;

            // stop the loop when modules ran in the past but none remain
            terminate_by_model = self.model.test_for_terminate_by_model();

            if !terminate_by_model {
                self.timer.date_step()?;
                terminate_by_driver = self.timer.terminate();
            }

            if !terminate_by_driver && !terminate_by_model {
                debug!(
                    "date={} (elapsed={} days)",
                    self.timer.date()?,
                    self.timer.elapsed()?
                );
            } else if terminate_by_model {
                info!(
                    "terminating on date={}, elapsed={} days (on request of the model)",
                    self.timer.date()?,
                    self.timer.elapsed()?
                );
            } else {
                info!(
                    "terminating on date={}, elapsed={} days (final date reached)",
                    self.timer.date()?,
                    self.timer.elapsed()?
                );
            }
        }

        // terminate any modules left running, close the store
        self.model.sim_objects_terminate()?;
        self.model.sim_xchange_mut().terminate();

        self.state = if terminate_by_model {
            DriverState::TerminatedByModel
        } else {
            DriverState::TerminatedByTimeDriver
        };

        info!("terminated");
        Ok(())
    }
}
