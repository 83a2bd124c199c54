//! Numeric and calendar-date range checks.
//!
//! Dynamic variables declare the range their values must stay inside;
//! [`RangeType`] provides the common presets and [`RangeLimits`] the
//! explicit inclusive/exclusive form the store checks against.

use crate::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Predefined simple range presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeType {
    /// all real numbers
    All,
    /// zero to positive infinity
    ZeroPositive,
    /// strictly positive (zero excluded)
    Positive,
    /// negative infinity to zero
    ZeroNegative,
    /// strictly negative (zero excluded)
    Negative,
    /// zero to one inclusive, a fraction
    ZeroOne,
    /// -273.15 to infinity
    TempCelsius,
}

impl RangeType {
    /// The explicit bounds of the preset. Presets that exclude zero carry a
    /// zero bound marked exclusive; consumers must honour the inclusivity
    /// flags.
    pub fn limits(self) -> RangeLimits {
        match self {
            RangeType::All => RangeLimits {
                lower: f64::NEG_INFINITY,
                lower_inclusive: true,
                upper: f64::INFINITY,
                upper_inclusive: true,
            },
            RangeType::ZeroPositive => RangeLimits {
                lower: 0.0,
                lower_inclusive: true,
                upper: f64::INFINITY,
                upper_inclusive: true,
            },
            RangeType::Positive => RangeLimits {
                lower: 0.0,
                lower_inclusive: false,
                upper: f64::INFINITY,
                upper_inclusive: true,
            },
            RangeType::ZeroNegative => RangeLimits {
                lower: f64::NEG_INFINITY,
                lower_inclusive: true,
                upper: 0.0,
                upper_inclusive: true,
            },
            RangeType::Negative => RangeLimits {
                lower: f64::NEG_INFINITY,
                lower_inclusive: true,
                upper: 0.0,
                upper_inclusive: false,
            },
            RangeType::ZeroOne => RangeLimits {
                lower: 0.0,
                lower_inclusive: true,
                upper: 1.0,
                upper_inclusive: true,
            },
            RangeType::TempCelsius => RangeLimits {
                lower: -273.15,
                lower_inclusive: true,
                upper: f64::INFINITY,
                upper_inclusive: true,
            },
        }
    }
}

/// Explicit numeric bounds with inclusivity flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeLimits {
    pub lower: f64,
    pub lower_inclusive: bool,
    pub upper: f64,
    pub upper_inclusive: bool,
}

impl RangeLimits {
    /// Inclusive bounds from two raw values.
    pub fn new(lower: f64, upper: f64) -> SimResult<RangeLimits> {
        if lower.is_nan() || upper.is_nan() {
            return Err(SimError::contract(
                "RangeLimits",
                "new",
                "a bound is missing",
            ));
        }
        if lower > upper {
            return Err(SimError::contract(
                "RangeLimits",
                "new",
                format!("the lower bound ({lower}) is larger than the upper bound ({upper})"),
            ));
        }
        Ok(RangeLimits {
            lower,
            lower_inclusive: true,
            upper,
            upper_inclusive: true,
        })
    }

    /// Whether `value` lies within the bounds, honouring the inclusivity
    /// flags. A missing value is never in range.
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() || value < self.lower || value > self.upper {
            return false;
        }
        if !self.lower_inclusive && value == self.lower {
            return false;
        }
        if !self.upper_inclusive && value == self.upper {
            return false;
        }
        true
    }

    /// A caption such as `(0.00000 <= x < 1.00000)` for error messages.
    pub fn caption(&self) -> String {
        format!(
            "({} {} x {} {})",
            self.lower,
            if self.lower_inclusive { "<=" } else { "<" },
            if self.upper_inclusive { "<=" } else { "<" },
            self.upper
        )
    }
}

/// Inclusive range test over any ordered type (numbers, dates, indices).
pub fn in_range<T: PartialOrd>(value: T, lower: T, upper: T) -> bool {
    debug_assert!(lower <= upper);
    value >= lower && value <= upper
}

/// Clamps `value` into `[lower, upper]`.
pub fn ensure_range<T: PartialOrd>(value: T, lower: T, upper: T) -> T {
    debug_assert!(lower <= upper);
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

/// Rejects NaN and infinite intermediate results. Useful around divisions
/// where a silent non-finite value would otherwise travel on.
pub fn safe_expr(value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else if value == f64::INFINITY {
        Err(SimError::contract(
            "ranges",
            "safe_expr",
            "the expression gives a positive infinite result",
        ))
    } else if value == f64::NEG_INFINITY {
        Err(SimError::contract(
            "ranges",
            "safe_expr",
            "the expression gives a negative infinite result",
        ))
    } else {
        Err(SimError::contract(
            "ranges",
            "safe_expr",
            "the expression gives a NaN result",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn presets_honour_exclusive_zero() {
        let positive = RangeType::Positive.limits();
        assert!(!positive.contains(0.0));
        assert!(positive.contains(f64::MIN_POSITIVE));
        assert!(positive.contains(1e30));

        let negative = RangeType::Negative.limits();
        assert!(!negative.contains(0.0));
        assert!(negative.contains(-1e-300));
    }

    #[test]
    fn zero_one_is_inclusive() {
        let frac = RangeType::ZeroOne.limits();
        assert!(frac.contains(0.0));
        assert!(frac.contains(1.0));
        assert!(!frac.contains(1.0001));
    }

    #[test]
    fn temp_celsius_floor() {
        let t = RangeType::TempCelsius.limits();
        assert!(t.contains(-273.15));
        assert!(!t.contains(-273.16));
    }

    #[test]
    fn missing_value_is_never_in_range() {
        assert!(!RangeType::All.limits().contains(f64::NAN));
    }

    #[test]
    fn invalid_limits_rejected() {
        assert!(RangeLimits::new(2.0, 1.0).is_err());
        assert!(RangeLimits::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn generic_in_range_works_for_dates() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let x = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        assert!(in_range(x, a, b));
        assert!(in_range(a, a, b));
        assert!(!in_range(b.succ_opt().unwrap(), a, b));
    }

    #[test]
    fn ensure_range_clamps() {
        assert_eq!(ensure_range(5, 0, 3), 3);
        assert_eq!(ensure_range(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(ensure_range(2, 0, 3), 2);
    }

    #[test]
    fn safe_expr_rejects_non_finite() {
        assert!(safe_expr(1.0 / 0.0).is_err());
        assert!(safe_expr(0.0 / 0.0).is_err());
        assert_eq!(safe_expr(42.0).unwrap(), 42.0);
    }
}
