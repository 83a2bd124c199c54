//! Minimal modules and controllers exercising the kernel in the test
//! suites. They stand in for the scientific modules a hosting application
//! provides: a growth module owning a state, a weather module publishing an
//! auxiliary variable, and controllers that sow, harvest and spawn them.

use crate::controller::SimController;
use crate::errors::{SimError, SimResult};
use crate::parxchange::ParXChange;
use crate::ranges::RangeType;
use crate::simobject::{ModelAction, SimObject, SimObjectBase};
use crate::simvalues::{SimValueAux, SimValueState};
use crate::simxchange::SimXChange;
use crate::units::ScientificUnit;
use chrono::NaiveDate;

pub(crate) const BIOMASS: &str = "BIOMASS";
pub(crate) const TEMPERATURE: &str = "TEMPERATURE";

// ============================================================================
// GrowthModule - a state variable integrated with a fixed daily gain
// ============================================================================

pub(crate) struct GrowthModule {
    base: SimObjectBase,
    biomass: SimValueState,
    daily_gain: f64,
    max_days: Option<i64>,
}

impl GrowthModule {
    /// Constructs the module, forces the initial biomass and runs the
    /// initial AUX pass, leaving it ready to join the running list.
    pub(crate) fn start(
        sim_id: &str,
        par: &mut ParXChange,
        sim: &mut SimXChange,
        initial: f64,
        daily_gain: f64,
        max_days: Option<i64>,
    ) -> SimResult<GrowthModule> {
        let base = SimObjectBase::new(
            sim_id,
            "GrowthModule",
            par,
            sim,
            1,
            0,
            "Growth",
            "Biomass growing by a fixed daily gain",
        )?;

        let mut biomass =
            SimValueState::new(sim_id, BIOMASS, ScientificUnit::KgHa, RangeType::ZeroPositive)?;
        biomass.v = initial;
        sim.force_state(&mut biomass)?;

        let mut module = GrowthModule {
            base,
            biomass,
            daily_gain,
            max_days,
        };
        module.do_model_action(ModelAction::AuxCalculations, sim, par)?;
        Ok(module)
    }
}

impl SimObject for GrowthModule {
    fn base(&self) -> &SimObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SimObjectBase {
        &mut self.base
    }

    fn aux_calculations(&mut self, sim: &mut SimXChange, _par: &mut ParXChange) -> SimResult<()> {
        sim.get_state(&mut self.biomass)
    }

    fn rate_calculations(&mut self, sim: &mut SimXChange, _par: &mut ParXChange) -> SimResult<()> {
        sim.get_state(&mut self.biomass)?;
        self.biomass.r = self.daily_gain;
        sim.set_state_rate(&self.biomass)
    }

    fn can_continue(&self, sim: &SimXChange) -> bool {
        match self.max_days {
            Some(max) => self.base.elapsed(sim).map(|e| e < max).unwrap_or(false),
            None => true,
        }
    }
}

// ============================================================================
// WeatherModule - an auxiliary variable fed from a daily series
// ============================================================================

pub(crate) struct WeatherModule {
    base: SimObjectBase,
    temperature: SimValueAux,
    temps: Vec<f64>,
}

impl WeatherModule {
    pub(crate) fn start(
        sim_id: &str,
        par: &mut ParXChange,
        sim: &mut SimXChange,
        temps: Vec<f64>,
    ) -> SimResult<WeatherModule> {
        let base = SimObjectBase::new(
            sim_id,
            "WeatherModule",
            par,
            sim,
            1,
            0,
            "Weather",
            "Daily temperature from a fixed series",
        )?;

        let temperature = SimValueAux::new(
            sim_id,
            TEMPERATURE,
            ScientificUnit::Celsius,
            RangeType::TempCelsius,
        )?;

        let mut module = WeatherModule {
            base,
            temperature,
            temps,
        };
        module.do_model_action(ModelAction::AuxCalculations, sim, par)?;
        Ok(module)
    }
}

impl SimObject for WeatherModule {
    fn base(&self) -> &SimObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SimObjectBase {
        &mut self.base
    }

    fn aux_calculations(&mut self, sim: &mut SimXChange, _par: &mut ParXChange) -> SimResult<()> {
        let day = sim.elapsed()? as usize;
        let t = *self.temps.get(day).ok_or_else(|| {
            SimError::contract(
                "WeatherModule",
                "aux_calculations",
                format!("no temperature for day index {day}"),
            )
        })?;
        self.temperature.v = t;
        sim.set_aux(&mut self.temperature)
    }
}

// ============================================================================
// Controllers
// ============================================================================

/// Starts one [`GrowthModule`] when the sowing date is reached.
pub(crate) struct SowingController {
    sim_id: String,
    sow_date: NaiveDate,
    initial: f64,
    daily_gain: f64,
    max_days: Option<i64>,
    sown: bool,
}

impl SowingController {
    pub(crate) fn new(
        sim_id: &str,
        sow_date: NaiveDate,
        initial: f64,
        daily_gain: f64,
    ) -> SowingController {
        SowingController {
            sim_id: sim_id.to_string(),
            sow_date,
            initial,
            daily_gain,
            max_days: None,
            sown: false,
        }
    }

    /// The sown module stops itself after this many active days.
    pub(crate) fn with_max_days(mut self, max_days: i64) -> SowingController {
        self.max_days = Some(max_days);
        self
    }
}

impl SimController for SowingController {
    fn test_for_sim_objects_to_start(
        &mut self,
        running: &mut Vec<Box<dyn SimObject>>,
        sim: &mut SimXChange,
        par: &mut ParXChange,
    ) -> SimResult<()> {
        if !self.sown && sim.cur_date()? >= self.sow_date {
            let module = GrowthModule::start(
                &self.sim_id,
                par,
                sim,
                self.initial,
                self.daily_gain,
                self.max_days,
            )?;
            running.push(Box::new(module));
            self.sown = true;
        }
        Ok(())
    }

    fn test_for_sim_objects_to_terminate(
        &mut self,
        _running: &[Box<dyn SimObject>],
        _sim: &SimXChange,
    ) -> SimResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Starts one [`WeatherModule`] on the start date.
pub(crate) struct WeatherController {
    sim_id: String,
    temps: Option<Vec<f64>>,
}

impl WeatherController {
    pub(crate) fn new(sim_id: &str, temps: Vec<f64>) -> WeatherController {
        WeatherController {
            sim_id: sim_id.to_string(),
            temps: Some(temps),
        }
    }
}

impl SimController for WeatherController {
    fn test_for_sim_objects_to_start(
        &mut self,
        running: &mut Vec<Box<dyn SimObject>>,
        sim: &mut SimXChange,
        par: &mut ParXChange,
    ) -> SimResult<()> {
        if let Some(temps) = self.temps.take() {
            let module = WeatherModule::start(&self.sim_id, par, sim, temps)?;
            running.push(Box::new(module));
        }
        Ok(())
    }

    fn test_for_sim_objects_to_terminate(
        &mut self,
        _running: &[Box<dyn SimObject>],
        _sim: &SimXChange,
    ) -> SimResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Terminates the publisher of a variable once its value exceeds a
/// threshold.
pub(crate) struct HarvestController {
    var_name: String,
    unit: ScientificUnit,
    threshold: f64,
}

impl HarvestController {
    pub(crate) fn new(var_name: &str, unit: ScientificUnit, threshold: f64) -> HarvestController {
        HarvestController {
            var_name: var_name.to_string(),
            unit,
            threshold,
        }
    }
}

impl SimController for HarvestController {
    fn test_for_sim_objects_to_start(
        &mut self,
        _running: &mut Vec<Box<dyn SimObject>>,
        _sim: &mut SimXChange,
        _par: &mut ParXChange,
    ) -> SimResult<()> {
        Ok(())
    }

    fn test_for_sim_objects_to_terminate(
        &mut self,
        _running: &[Box<dyn SimObject>],
        sim: &SimXChange,
    ) -> SimResult<Vec<String>> {
        if let Some(token) = sim.token_read_by_var_name_opt(&self.var_name)? {
            let value = sim.value_by_token(token, self.unit)?;
            if value > self.threshold {
                return Ok(vec![sim.sim_id_from_token(token)?]);
            }
        }
        Ok(Vec::new())
    }
}
