//! Controllers: per-model spawn and terminate policies.
//!
//! A controller decides *when* modules join or leave the run; the
//! [`Model`](crate::model::Model) performs the bookkeeping. Controllers run
//! from start to end of the simulation, in registration order, on the
//! shared running-module list.

use crate::errors::SimResult;
use crate::parxchange::ParXChange;
use crate::simobject::SimObject;
use crate::simxchange::SimXChange;

/// The capability set of a controller.
pub trait SimController {
    /// Tests whether modules need to be started on the current day and
    /// appends them to `running`. Called at every time step, after the AUX
    /// phase; a newly constructed module has completed its initialisation
    /// and one AUX pass by the time this method returns (its constructor
    /// runs both).
    fn test_for_sim_objects_to_start(
        &mut self,
        running: &mut Vec<Box<dyn SimObject>>,
        sim: &mut SimXChange,
        par: &mut ParXChange,
    ) -> SimResult<()>;

    /// Returns the simIDs of modules that must stop now. The model
    /// terminates them and removes them from the running list.
    fn test_for_sim_objects_to_terminate(
        &mut self,
        running: &[Box<dyn SimObject>],
        sim: &SimXChange,
    ) -> SimResult<Vec<String>>;
}
