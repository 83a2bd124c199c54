//! Piecewise-linear interpolation over ordered (x, y) pairs.
//!
//! [`SimXChange::interpolator_by_token`](crate::simxchange::SimXChange::interpolator_by_token)
//! extracts a variable's series into an [`Interpolator`]; it is also usable
//! standalone for tabulated model functions. X values must be strictly
//! increasing; behaviour outside the covered span is governed by the
//! [`ExtrapolationPolicy`].

use crate::errors::{SimError, SimResult};
use crate::units::ScientificUnit;
use serde::{Deserialize, Serialize};

const COMPONENT: &str = "Interpolator";

/// What to do when interpolating outside the covered x span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtrapolationPolicy {
    /// interpolating outside the span is an error
    None,
    /// clamp to the boundary y value
    Constant,
    /// extend the slope of the boundary segment
    Linear,
}

/// Ordered (x, y) pairs with linear interpolation between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpolator {
    /// identifies the data in error messages
    id: String,
    x_unit: ScientificUnit,
    y_unit: ScientificUnit,
    x: Vec<f64>,
    y: Vec<f64>,
    policy: ExtrapolationPolicy,
}

impl Interpolator {
    /// Empty interpolator; extrapolation defaults to
    /// [`ExtrapolationPolicy::None`].
    pub fn new(id: &str, x_unit: ScientificUnit, y_unit: ScientificUnit) -> Interpolator {
        Interpolator {
            id: id.to_string(),
            x_unit,
            y_unit,
            x: Vec::new(),
            y: Vec::new(),
            policy: ExtrapolationPolicy::None,
        }
    }

    /// Builds an interpolator from parallel x and y slices.
    pub fn from_pairs(
        id: &str,
        policy: ExtrapolationPolicy,
        xs: &[f64],
        x_unit: ScientificUnit,
        ys: &[f64],
        y_unit: ScientificUnit,
    ) -> SimResult<Interpolator> {
        if xs.len() != ys.len() {
            return Err(SimError::contract(
                COMPONENT,
                "from_pairs",
                format!("x and y arrays do not have the same size, id={id}"),
            ));
        }
        let mut ip = Interpolator::new(id, x_unit, y_unit);
        ip.set_extrapolation(policy);
        for (&x, &y) in xs.iter().zip(ys) {
            ip.add(x, y)?;
        }
        Ok(ip)
    }

    pub fn set_extrapolation(&mut self, policy: ExtrapolationPolicy) {
        self.policy = policy;
    }

    pub fn extrapolation(&self) -> ExtrapolationPolicy {
        self.policy
    }

    /// Appends a pair; x must be strictly greater than the last x.
    pub fn add(&mut self, x: f64, y: f64) -> SimResult<()> {
        let method = "add";

        if x.is_nan() || y.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("missing x or y value (id={})", self.id),
            ));
        }
        if let Some(&last) = self.x.last() {
            if x <= last {
                return Err(SimError::contract(
                    COMPONENT,
                    method,
                    format!(
                        "x values must be strictly increasing (id={}, last={last}, new={x})",
                        self.id
                    ),
                ));
            }
        }
        self.x.push(x);
        self.y.push(y);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x_unit(&self) -> ScientificUnit {
        self.x_unit
    }

    pub fn y_unit(&self) -> ScientificUnit {
        self.y_unit
    }

    pub fn x_min(&self) -> SimResult<f64> {
        self.x.first().copied().ok_or_else(|| {
            SimError::contract(COMPONENT, "x_min", format!("no data (id={})", self.id))
        })
    }

    pub fn x_max(&self) -> SimResult<f64> {
        self.x.last().copied().ok_or_else(|| {
            SimError::contract(COMPONENT, "x_max", format!("no data (id={})", self.id))
        })
    }

    /// The (x, y) pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Interpolates the y value at `x`.
    pub fn interpolate(&self, x: f64) -> SimResult<f64> {
        let method = "interpolate";

        if x.is_nan() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("missing x value (id={})", self.id),
            ));
        }
        if self.x.is_empty() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("no data (id={})", self.id),
            ));
        }

        let n = self.x.len();

        if x < self.x[0] {
            return match self.policy {
                ExtrapolationPolicy::None => Err(self.outside_error(method, x)),
                ExtrapolationPolicy::Constant => Ok(self.y[0]),
                ExtrapolationPolicy::Linear => {
                    if n < 2 {
                        Ok(self.y[0])
                    } else {
                        Ok(self.y[0] + self.slope(0) * (x - self.x[0]))
                    }
                }
            };
        }
        if x > self.x[n - 1] {
            return match self.policy {
                ExtrapolationPolicy::None => Err(self.outside_error(method, x)),
                ExtrapolationPolicy::Constant => Ok(self.y[n - 1]),
                ExtrapolationPolicy::Linear => {
                    if n < 2 {
                        Ok(self.y[n - 1])
                    } else {
                        Ok(self.y[n - 1] + self.slope(n - 2) * (x - self.x[n - 1]))
                    }
                }
            };
        }

        // x is inside the span; find the segment ending at or after it
        let seg = self.x.partition_point(|&xi| xi < x);
        if self.x[seg] == x {
            return Ok(self.y[seg]);
        }
        let i = seg - 1;
        Ok(self.y[i] + self.slope(i) * (x - self.x[i]))
    }

    fn slope(&self, segment: usize) -> f64 {
        // no divide by zero: equal x values are rejected on add
        (self.y[segment + 1] - self.y[segment]) / (self.x[segment + 1] - self.x[segment])
    }

    fn outside_error(&self, method: &str, x: f64) -> SimError {
        SimError::contract(
            COMPONENT,
            method,
            format!(
                "extrapolation is not allowed (id={}, x={x}, span={}..{})",
                self.id,
                self.x.first().copied().unwrap_or(f64::NAN),
                self.x.last().copied().unwrap_or(f64::NAN)
            ),
        )
    }
}
