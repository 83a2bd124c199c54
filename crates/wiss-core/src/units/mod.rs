//! Scientific unit tags and pairwise conversion.
//!
//! The kernel works with a closed enumeration of unit tags rather than a
//! general unit-algebra library. Every dynamic and parameter variable
//! carries one tag; [`convert`] translates numeric values between tags using
//! a fixed table of factors and affine transforms. A pair missing from the
//! table is a programming error in the table, surfaced as
//! [`SimError::ConversionUndefined`](crate::errors::SimError) rather than
//! silently passed through.

mod conversion;

pub use conversion::{convert, convert_int, double_to_int};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit tags for simulation variables.
///
/// Captions follow the `[...]` bracket notation used in report files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScientificUnit {
    /// not applicable
    NA,
    /// dimensionless
    NoDim,
    /// dimensionless, volume per volume, 0-1 range
    NoDimVolume,
    /// dimensionless, mass per mass, 0-1 range
    NoDimMass,
    /// dimensionless, area per area (leaf area index etc.)
    NoDimArea,
    /// dimensionless, radiation energy per radiation energy
    NoDimRadiation,
    /// percentage
    Percent,
    /// hectopascal
    HPa,
    /// millibar
    MBar,
    /// parts per million
    Ppm,
    /// yearly change in ppm
    PpmPerYear,
    /// count per square metre
    CntM2,
    /// count per hectare
    CntHa,
    /// kilogram per square metre
    KgM2,
    /// kilogram per hectare
    KgHa,
    /// kilogram per kilogram per day
    KgKgDay,
    /// kilogram per hectare per hour
    KgHaHour,
    /// hectare per hectare per day
    HaHaDay,
    /// hectare per kilogram
    HaKg,
    /// degrees Celsius
    Celsius,
    /// Celsius degree days
    CelsiusDays,
    /// degrees Fahrenheit
    Fahrenheit,
    /// Kelvin
    Kelvin,
    /// megajoule per square metre per day
    MjM2Day,
    /// kilojoule per square metre per day
    KjM2Day,
    /// joule per square metre per day
    JM2Day,
    /// millimetre
    Mm,
    /// millimetre per day
    MmDay,
    /// centimetre
    Cm,
    /// centimetre per day
    CmDay,
    /// metre
    M,
    /// metre per second
    MSec,
    /// metre per day
    MDay,
    /// angular decimal degrees (latitude, longitude)
    AngularDegrees,
    /// decimal hours
    Hour,
    /// calendar date
    Date,
    /// relative number of days
    DateRelative,
    /// day
    Days,
    /// per day
    PerDay,
    /// day number in the year (1 Jan = 1)
    DayOfYear,
    /// year
    Year,
    /// light use efficiency
    KgHaHourPerJM2Sec,
}

impl ScientificUnit {
    /// The textual caption used in reports and error messages.
    pub fn caption(self) -> &'static str {
        match self {
            ScientificUnit::NA => "[NA]",
            ScientificUnit::NoDim => "[-]",
            ScientificUnit::NoDimVolume => "[volume.volume-1]",
            ScientificUnit::NoDimMass => "[mass.mass-1]",
            ScientificUnit::NoDimArea => "[area.area-1]",
            ScientificUnit::NoDimRadiation => "[radiation energy.radiation energy-1]",
            ScientificUnit::Percent => "[%]",
            ScientificUnit::HPa => "[hpa]",
            ScientificUnit::MBar => "[mbar]",
            ScientificUnit::Ppm => "[ppm]",
            ScientificUnit::PpmPerYear => "[ppm.y-1]",
            ScientificUnit::CntM2 => "[no.m-2]",
            ScientificUnit::CntHa => "[no.ha-1]",
            ScientificUnit::KgM2 => "[kg.m-2]",
            ScientificUnit::KgHa => "[kg.ha-1]",
            ScientificUnit::KgKgDay => "[kg.kg-1.d-1]",
            ScientificUnit::KgHaHour => "[kg.ha-1.hr-1]",
            ScientificUnit::HaHaDay => "[ha.ha-1.d-1]",
            ScientificUnit::HaKg => "[ha.kg-1]",
            ScientificUnit::Celsius => "[C]",
            ScientificUnit::CelsiusDays => "[C.d]",
            ScientificUnit::Fahrenheit => "[F]",
            ScientificUnit::Kelvin => "[K]",
            ScientificUnit::MjM2Day => "[mj.m-2.d-1]",
            ScientificUnit::KjM2Day => "[kj.m-2.d-1]",
            ScientificUnit::JM2Day => "[j.m-2.d-1]",
            ScientificUnit::Mm => "[mm]",
            ScientificUnit::MmDay => "[mm.d-1]",
            ScientificUnit::Cm => "[cm]",
            ScientificUnit::CmDay => "[cm.d-1]",
            ScientificUnit::M => "[m]",
            ScientificUnit::MSec => "[m.s-1]",
            ScientificUnit::MDay => "[m.d-1]",
            ScientificUnit::AngularDegrees => "[deg]",
            ScientificUnit::Hour => "[hr]",
            ScientificUnit::Date => "[date]",
            ScientificUnit::DateRelative => "[Date relative]",
            ScientificUnit::Days => "[d]",
            ScientificUnit::PerDay => "[d-1]",
            ScientificUnit::DayOfYear => "[doy]",
            ScientificUnit::Year => "[year]",
            ScientificUnit::KgHaHourPerJM2Sec => "[kg.ha-1.hr-1.J-1.m2.s1]",
        }
    }

    /// Looks up a unit by its caption, case insensitive.
    pub fn find_by_caption(txt: &str) -> Option<ScientificUnit> {
        ALL_UNITS
            .iter()
            .copied()
            .find(|u| u.caption().eq_ignore_ascii_case(txt))
    }
}

impl fmt::Display for ScientificUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

/// Every unit tag, in declaration order.
pub static ALL_UNITS: &[ScientificUnit] = &[
    ScientificUnit::NA,
    ScientificUnit::NoDim,
    ScientificUnit::NoDimVolume,
    ScientificUnit::NoDimMass,
    ScientificUnit::NoDimArea,
    ScientificUnit::NoDimRadiation,
    ScientificUnit::Percent,
    ScientificUnit::HPa,
    ScientificUnit::MBar,
    ScientificUnit::Ppm,
    ScientificUnit::PpmPerYear,
    ScientificUnit::CntM2,
    ScientificUnit::CntHa,
    ScientificUnit::KgM2,
    ScientificUnit::KgHa,
    ScientificUnit::KgKgDay,
    ScientificUnit::KgHaHour,
    ScientificUnit::HaHaDay,
    ScientificUnit::HaKg,
    ScientificUnit::Celsius,
    ScientificUnit::CelsiusDays,
    ScientificUnit::Fahrenheit,
    ScientificUnit::Kelvin,
    ScientificUnit::MjM2Day,
    ScientificUnit::KjM2Day,
    ScientificUnit::JM2Day,
    ScientificUnit::Mm,
    ScientificUnit::MmDay,
    ScientificUnit::Cm,
    ScientificUnit::CmDay,
    ScientificUnit::M,
    ScientificUnit::MSec,
    ScientificUnit::MDay,
    ScientificUnit::AngularDegrees,
    ScientificUnit::Hour,
    ScientificUnit::Date,
    ScientificUnit::DateRelative,
    ScientificUnit::Days,
    ScientificUnit::PerDay,
    ScientificUnit::DayOfYear,
    ScientificUnit::Year,
    ScientificUnit::KgHaHourPerJM2Sec,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_lookup_is_case_insensitive() {
        assert_eq!(
            ScientificUnit::find_by_caption("[KG.HA-1]"),
            Some(ScientificUnit::KgHa)
        );
        assert_eq!(ScientificUnit::find_by_caption("[nosuch]"), None);
    }

    #[test]
    fn captions_are_unique() {
        for (i, a) in ALL_UNITS.iter().enumerate() {
            for b in &ALL_UNITS[i + 1..] {
                assert_ne!(a.caption(), b.caption(), "{a:?} vs {b:?}");
            }
        }
    }
}
