//! Deterministic daily-step simulation kernel.
//!
//! WISS couples independent process modules (crop growth, weather drivers,
//! soil dynamics, ...) into a single coherent model run. The kernel supplies
//! the pieces that make such a coupling work, the science stays outside:
//!
//! - [`timer::Timer`] and [`driver::TimeDriver`] advance a calendar
//!   day-by-day and sequence the phases of each day,
//! - [`simxchange::SimXChange`] is the dynamic exchange: a day-indexed,
//!   variable-oriented store with single-publisher ownership, unit-aware
//!   reads and writes, explicit Euler integration, aggregation queries and
//!   time-series reporting,
//! - [`parxchange::ParXChange`] holds the static, typed, unit-aware
//!   parameters of a run,
//! - [`simobject::SimObject`] and [`controller::SimController`] are the
//!   capability sets concrete modules and spawn/terminate policies
//!   implement, orchestrated by [`model::Model`].
//!
//! Execution is single-threaded and strictly deterministic: given the same
//! parameter set and module list, two runs produce byte-identical output.
//! All contract and invariant violations surface as [`errors::SimError`]
//! values; the kernel never silently recovers.

pub mod controller;
pub mod dates;
pub mod driver;
pub mod errors;
#[cfg(test)]
mod example_components;
pub mod interpolate;
pub mod model;
pub mod parxchange;
pub mod ranges;
pub mod simobject;
pub mod simvalues;
pub mod simxchange;
pub mod timer;
pub mod units;

pub use errors::{SimError, SimResult};
