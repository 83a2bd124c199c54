//! Pairwise unit conversion.
//!
//! Conversion is a pure function over the closed tag set. Identity when
//! source and target are equal or the value is missing, an error when either
//! side is `NA`, otherwise a table lookup. The table is symmetric by
//! construction; a pair it does not list has no physical conversion and is
//! reported as [`SimError::ConversionUndefined`].

use super::ScientificUnit;
use crate::errors::{SimError, SimResult};

/// Converts a value between two unit tags. Does not bounds-check,
/// intentionally: range checks belong to the variable the value is written
/// to, not to the conversion.
///
/// `name` identifies the converted quantity in error messages.
pub fn convert(
    name: &str,
    value: f64,
    from: ScientificUnit,
    to: ScientificUnit,
) -> SimResult<f64> {
    if from == to || value.is_nan() {
        return Ok(value);
    }

    if from == ScientificUnit::NA || to == ScientificUnit::NA {
        return Err(SimError::ConversionNotApplicable {
            name: name.to_string(),
            from: from.caption().to_string(),
            to: to.caption().to_string(),
        });
    }

    pair_convert(value, from, to).ok_or_else(|| SimError::ConversionUndefined {
        name: name.to_string(),
        value,
        from: from.caption().to_string(),
        to: to.caption().to_string(),
    })
}

/// Integer flavour of [`convert`]: converts through `f64` and rounds back
/// with a range check.
pub fn convert_int(
    name: &str,
    value: i64,
    from: ScientificUnit,
    to: ScientificUnit,
) -> SimResult<i64> {
    double_to_int(convert(name, value as f64, from, to)?)
}

/// Rounds a double to an integer, checking that the value fits.
pub fn double_to_int(value: f64) -> SimResult<i64> {
    const LO: f64 = i64::MIN as f64;
    const HI: f64 = i64::MAX as f64;
    if value.is_nan() || value < LO || value > HI {
        return Err(SimError::contract(
            "units",
            "double_to_int",
            format!("the double argument ({value}) is not in the integer bounds"),
        ));
    }
    Ok(value.round() as i64)
}

fn pair_convert(v: f64, from: ScientificUnit, to: ScientificUnit) -> Option<f64> {
    use ScientificUnit::*;

    let result = match (from, to) {
        (HPa, MBar) | (MBar, HPa) => v,

        (CntM2, CntHa) => v * 10_000.0,
        (CntHa, CntM2) => v * 0.0001,

        (KgM2, KgHa) => v * 10_000.0,
        (KgHa, KgM2) => v * 0.0001,

        (MjM2Day, KjM2Day) => v * 1_000.0,
        (MjM2Day, JM2Day) => v * 1_000_000.0,
        (KjM2Day, MjM2Day) => v * 0.001,
        (KjM2Day, JM2Day) => v * 1_000.0,
        (JM2Day, MjM2Day) => v * 0.000_001,
        (JM2Day, KjM2Day) => v * 0.001,

        (Mm, Cm) => v * 0.1,
        (Mm, M) => v * 0.001,
        (Cm, Mm) => v * 10.0,
        (Cm, M) => v * 0.01,
        (M, Mm) => v * 1_000.0,
        (M, Cm) => v * 100.0,

        (MmDay, CmDay) => v * 0.1,
        (MmDay, MDay) => v * 0.001,
        (CmDay, MmDay) => v * 10.0,
        (CmDay, MDay) => v * 0.01,
        (MDay, MmDay) => v * 1_000.0,
        (MDay, CmDay) => v * 100.0,

        (Celsius, Fahrenheit) => 32.0 + v * 9.0 / 5.0,
        (Celsius, Kelvin) => v + 273.15,
        (Kelvin, Celsius) => v - 273.15,
        (Kelvin, Fahrenheit) => 32.0 + (v - 273.15) * 9.0 / 5.0,
        (Fahrenheit, Celsius) => (v - 32.0) * 5.0 / 9.0,
        (Fahrenheit, Kelvin) => 273.15 + (v - 32.0) * 5.0 / 9.0,

        _ => return None,
    };

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ScientificUnit::*;

    #[test]
    fn identity_when_units_equal() {
        assert_eq!(convert("X", 12.5, KgHa, KgHa).unwrap(), 12.5);
    }

    #[test]
    fn missing_value_passes_through() {
        assert!(convert("X", f64::NAN, KgHa, KgM2).unwrap().is_nan());
    }

    #[test]
    fn na_unit_is_rejected() {
        assert!(convert("X", 1.0, NA, KgHa).is_err());
        assert!(convert("X", 1.0, KgHa, NA).is_err());
    }

    #[test]
    fn mass_per_area_factor() {
        assert_abs_diff_eq!(convert("W", 2.0, KgM2, KgHa).unwrap(), 20_000.0);
        assert_abs_diff_eq!(convert("W", 20_000.0, KgHa, KgM2).unwrap(), 2.0);
    }

    #[test]
    fn pressure_identity_pair() {
        assert_eq!(convert("P", 1013.0, HPa, MBar).unwrap(), 1013.0);
    }

    #[test]
    fn temperature_affine_transforms() {
        assert_abs_diff_eq!(convert("T", 0.0, Celsius, Kelvin).unwrap(), 273.15);
        assert_abs_diff_eq!(convert("T", 100.0, Celsius, Fahrenheit).unwrap(), 212.0);
        assert_abs_diff_eq!(
            convert("T", 212.0, Fahrenheit, Celsius).unwrap(),
            100.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(convert("T", 273.15, Kelvin, Celsius).unwrap(), 0.0);
    }

    #[test]
    fn temperature_round_trip() {
        let t = 21.4;
        let f = convert("T", t, Celsius, Fahrenheit).unwrap();
        let back = convert("T", f, Fahrenheit, Celsius).unwrap();
        assert_abs_diff_eq!(back, t, epsilon = 1e-12);
    }

    #[test]
    fn energy_flux_chain() {
        assert_abs_diff_eq!(convert("R", 1.5, MjM2Day, JM2Day).unwrap(), 1_500_000.0);
        assert_abs_diff_eq!(convert("R", 1_500.0, KjM2Day, MjM2Day).unwrap(), 1.5);
    }

    #[test]
    fn undefined_pair_is_an_error() {
        let err = convert("X", 1.0, KgHa, Celsius).unwrap_err();
        assert!(matches!(err, SimError::ConversionUndefined { .. }));
    }

    #[test]
    fn integer_conversion_rounds() {
        assert_eq!(convert_int("N", 3, CntM2, CntHa).unwrap(), 30_000);
        assert_eq!(double_to_int(2.5).unwrap(), 3);
        assert!(double_to_int(f64::NAN).is_err());
        assert!(double_to_int(1e300).is_err());
    }
}
