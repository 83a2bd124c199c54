//! Static parameter exchange.
//!
//! [`ParXChange`] is the typed, unit-aware map of run parameters. Entries
//! are keyed by `(uppercase name, type tag)`; a payload is one
//! [`ParValue`] variant plus a unit, an immutability flag and a tombstone.
//! Numeric reads go through the unit-aware getters so a conversion always
//! takes place; a `Double` lookup falls back to an `Integer` entry of the
//! same name and widens.

use crate::errors::{SimError, SimResult};
use crate::units::{convert, double_to_int, ScientificUnit};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const COMPONENT: &str = "ParXChange";

/// Type tag of a parameter payload. Dispatching on the tag replaces the
/// reflective class key of older designs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParType {
    Double,
    Integer,
    Boolean,
    Text,
    Date,
}

/// One parameter payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParValue {
    Double(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
    Date(NaiveDate),
}

impl ParValue {
    pub fn par_type(&self) -> ParType {
        match self {
            ParValue::Double(_) => ParType::Double,
            ParValue::Integer(_) => ParType::Integer,
            ParValue::Boolean(_) => ParType::Boolean,
            ParValue::Text(_) => ParType::Text,
            ParValue::Date(_) => ParType::Date,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ParValue::Double(_) | ParValue::Integer(_))
    }
}

/// Unique key of a parameter: uppercase name plus type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParKey {
    pub name: String,
    pub par_type: ParType,
}

impl ParKey {
    pub fn new(name: &str, par_type: ParType) -> ParKey {
        ParKey {
            name: name.to_uppercase(),
            par_type,
        }
    }
}

/// Metadata of a stored parameter, returned by [`ParXChange::get_info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParInfo {
    pub key: ParKey,
    pub unit: ScientificUnit,
    pub immutable: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParEntry {
    value: ParValue,
    unit: ScientificUnit,
    immutable: bool,
    deleted: bool,
}

/// Collection of static simulation parameters.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ParXChange {
    data: IndexMap<ParKey, ParEntry>,
}

impl ParXChange {
    pub fn new() -> ParXChange {
        ParXChange::default()
    }

    fn check_name(name: &str, method: &str) -> SimResult<()> {
        if name.trim().is_empty() {
            return Err(SimError::contract(COMPONENT, method, "the variable is empty"));
        }
        Ok(())
    }

    fn set_inner(
        &mut self,
        name: &str,
        value: ParValue,
        unit: ScientificUnit,
        immutable: bool,
    ) -> SimResult<()> {
        let method = "set";
        Self::check_name(name, method)?;

        let key = ParKey::new(name, value.par_type());

        if let Some(entry) = self.data.get_mut(&key) {
            // writing a tombstoned entry revives it, even if immutable
            if !entry.deleted && entry.immutable {
                return Err(SimError::contract(
                    COMPONENT,
                    method,
                    format!("{} cannot be set more than once", key.name),
                ));
            }
            entry.value = value;
            entry.unit = unit;
            entry.immutable = immutable;
            entry.deleted = false;
            return Ok(());
        }

        self.data.insert(
            key,
            ParEntry {
                value,
                unit,
                immutable,
                deleted: false,
            },
        );
        Ok(())
    }

    /// Creates or replaces a non-numeric parameter. Numeric payloads must go
    /// through [`ParXChange::set_with_unit`] so a unit is always recorded.
    pub fn set(&mut self, name: &str, value: ParValue) -> SimResult<()> {
        if value.is_numeric() {
            return Err(SimError::contract(
                COMPONENT,
                "set",
                format!("to store numeric data for variable {name} use set_with_unit"),
            ));
        }
        self.set_inner(name, value, ScientificUnit::NA, false)
    }

    /// [`ParXChange::set`] with the immutability flag raised.
    pub fn set_immutable(&mut self, name: &str, value: ParValue) -> SimResult<()> {
        if value.is_numeric() {
            return Err(SimError::contract(
                COMPONENT,
                "set",
                format!("to store numeric data for variable {name} use set_with_unit"),
            ));
        }
        self.set_inner(name, value, ScientificUnit::NA, true)
    }

    /// Creates or replaces a numeric parameter with its unit. The unit may
    /// not be `NA`.
    pub fn set_with_unit(
        &mut self,
        name: &str,
        value: ParValue,
        unit: ScientificUnit,
    ) -> SimResult<()> {
        self.set_with_unit_inner(name, value, unit, false)
    }

    /// [`ParXChange::set_with_unit`] with the immutability flag raised.
    pub fn set_with_unit_immutable(
        &mut self,
        name: &str,
        value: ParValue,
        unit: ScientificUnit,
    ) -> SimResult<()> {
        self.set_with_unit_inner(name, value, unit, true)
    }

    fn set_with_unit_inner(
        &mut self,
        name: &str,
        value: ParValue,
        unit: ScientificUnit,
        immutable: bool,
    ) -> SimResult<()> {
        let method = "set";
        if !value.is_numeric() {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("variable {name} is not numeric, store it without a unit"),
            ));
        }
        if unit == ScientificUnit::NA {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("numeric variable {name} requires a concrete unit"),
            ));
        }
        if let ParValue::Double(v) = value {
            if v.is_nan() {
                return Err(SimError::contract(
                    COMPONENT,
                    method,
                    format!("the double value of {name} is missing"),
                ));
            }
        }
        self.set_inner(name, value, unit, immutable)
    }

    fn lookup(&self, name: &str, par_type: ParType) -> Option<(&ParKey, &ParEntry)> {
        self.data.get_key_value(&ParKey::new(name, par_type))
    }

    fn live_entry(&self, name: &str, par_type: ParType, caller: &str, method: &str) -> SimResult<&ParEntry> {
        match self.lookup(name, par_type) {
            None => Err(SimError::contract(
                COMPONENT,
                method,
                format!("could not locate {name} (caller={caller})"),
            )),
            Some((_, entry)) if entry.deleted => Err(SimError::contract(
                COMPONENT,
                method,
                format!("attempt to retrieve variable {name} that is marked as deleted (caller={caller})"),
            )),
            Some((_, entry)) => Ok(entry),
        }
    }

    /// Numeric getter with the Double→Integer fallback: looks for a
    /// `Double` entry first, then an `Integer` entry of the same name, and
    /// returns the value widened and converted into `target_unit`.
    pub fn get_double(
        &self,
        name: &str,
        caller: &str,
        target_unit: ScientificUnit,
    ) -> SimResult<f64> {
        let method = "get_double";
        Self::check_name(name, method)?;

        let entry = if self.lookup(name, ParType::Double).is_some() {
            self.live_entry(name, ParType::Double, caller, method)?
        } else if self.lookup(name, ParType::Integer).is_some() {
            self.live_entry(name, ParType::Integer, caller, method)?
        } else {
            return Err(SimError::contract(
                COMPONENT,
                method,
                format!("could not locate {name} (caller={caller}), neither as double nor integer"),
            ));
        };

        let raw = match entry.value {
            ParValue::Double(v) => v,
            ParValue::Integer(v) => v as f64,
            _ => unreachable!("numeric key always stores a numeric payload"),
        };
        convert(name, raw, entry.unit, target_unit)
    }

    /// Integer getter; the converted value is rounded back with a range
    /// check.
    pub fn get_integer(
        &self,
        name: &str,
        caller: &str,
        target_unit: ScientificUnit,
    ) -> SimResult<i64> {
        let method = "get_integer";
        Self::check_name(name, method)?;

        let entry = self.live_entry(name, ParType::Integer, caller, method)?;
        let raw = match entry.value {
            ParValue::Integer(v) => v,
            _ => unreachable!("integer key always stores an integer payload"),
        };
        double_to_int(convert(name, raw as f64, entry.unit, target_unit)?)
    }

    pub fn get_bool(&self, name: &str, caller: &str) -> SimResult<bool> {
        let method = "get_bool";
        Self::check_name(name, method)?;
        match self.live_entry(name, ParType::Boolean, caller, method)?.value {
            ParValue::Boolean(v) => Ok(v),
            _ => unreachable!("boolean key always stores a boolean payload"),
        }
    }

    pub fn get_text(&self, name: &str, caller: &str) -> SimResult<String> {
        let method = "get_text";
        Self::check_name(name, method)?;
        match &self.live_entry(name, ParType::Text, caller, method)?.value {
            ParValue::Text(v) => Ok(v.clone()),
            _ => unreachable!("text key always stores a text payload"),
        }
    }

    pub fn get_date(&self, name: &str, caller: &str) -> SimResult<NaiveDate> {
        let method = "get_date";
        Self::check_name(name, method)?;
        match self.live_entry(name, ParType::Date, caller, method)?.value {
            ParValue::Date(v) => Ok(v),
            _ => unreachable!("date key always stores a date payload"),
        }
    }

    /// Whether a live (non-tombstoned) parameter exists. A `Double` check
    /// also accepts an `Integer` entry of the same name, matching the
    /// getter fallback.
    pub fn contains(&self, name: &str, par_type: ParType) -> bool {
        self.contains_impl(name, par_type, false)
    }

    /// [`ParXChange::contains`], optionally including tombstoned entries.
    pub fn contains_deleted(&self, name: &str, par_type: ParType) -> bool {
        self.contains_impl(name, par_type, true)
    }

    fn contains_impl(&self, name: &str, par_type: ParType, include_deleted: bool) -> bool {
        let found = self.lookup(name, par_type).or_else(|| {
            if par_type == ParType::Double {
                self.lookup(name, ParType::Integer)
            } else {
                None
            }
        });
        match found {
            Some((_, entry)) => include_deleted || !entry.deleted,
            None => false,
        }
    }

    /// Tombstones a parameter. Tombstoned parameters can no longer be
    /// retrieved; a later `set` revives them.
    pub fn delete(&mut self, name: &str, par_type: ParType) -> SimResult<()> {
        let method = "delete";
        Self::check_name(name, method)?;

        match self.data.get_mut(&ParKey::new(name, par_type)) {
            None => Err(SimError::contract(
                COMPONENT,
                method,
                format!("could not locate {name}"),
            )),
            Some(entry) if entry.deleted => Err(SimError::contract(
                COMPONENT,
                method,
                format!("attempt to delete variable {name} that is already marked deleted"),
            )),
            Some(entry) => {
                entry.deleted = true;
                Ok(())
            }
        }
    }

    /// Metadata of a stored parameter, tombstoned or not.
    pub fn get_info(&self, name: &str, par_type: ParType) -> Option<ParInfo> {
        self.lookup(name, par_type).map(|(key, entry)| ParInfo {
            key: key.clone(),
            unit: entry.unit,
            immutable: entry.immutable,
            deleted: entry.deleted,
        })
    }

    /// Number of stored parameters, tombstoned ones included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Snapshot of all keys in insertion order.
    pub fn keys(&self) -> Vec<ParKey> {
        self.data.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn numeric_set_requires_a_unit() {
        let mut par = ParXChange::new();
        assert!(par.set("T", ParValue::Double(1.0)).is_err());
        assert!(par
            .set_with_unit("T", ParValue::Double(1.0), ScientificUnit::NA)
            .is_err());
        assert!(par
            .set_with_unit("T", ParValue::Double(1.0), ScientificUnit::Celsius)
            .is_ok());
    }

    #[test]
    fn non_numeric_set_stores_na_unit() {
        let mut par = ParXChange::new();
        par.set("NAME", ParValue::Text("run-1".into())).unwrap();
        let info = par.get_info("NAME", ParType::Text).unwrap();
        assert_eq!(info.unit, ScientificUnit::NA);
        assert_eq!(par.get_text("name", "test").unwrap(), "run-1");
    }

    #[test]
    fn keys_are_case_insensitive() {
        let mut par = ParXChange::new();
        par.set_with_unit("Lai", ParValue::Double(3.0), ScientificUnit::NoDimArea)
            .unwrap();
        assert!(par.contains("LAI", ParType::Double));
        assert_eq!(
            par.get_double("lai", "test", ScientificUnit::NoDimArea).unwrap(),
            3.0
        );
    }

    #[test]
    fn immutable_entries_reject_overwrite() {
        let mut par = ParXChange::new();
        par.set_with_unit_immutable("K", ParValue::Double(1.0), ScientificUnit::NoDim)
            .unwrap();
        assert!(par
            .set_with_unit("K", ParValue::Double(2.0), ScientificUnit::NoDim)
            .is_err());

        // a different type tag is a different variable
        par.set_with_unit("K", ParValue::Integer(2), ScientificUnit::NoDim)
            .unwrap();
    }

    #[test]
    fn tombstone_and_revival() {
        let mut par = ParXChange::new();
        par.set_immutable("FLAG", ParValue::Boolean(true)).unwrap();
        par.delete("FLAG", ParType::Boolean).unwrap();

        assert!(par.get_bool("FLAG", "test").is_err());
        assert!(!par.contains("FLAG", ParType::Boolean));
        assert!(par.contains_deleted("FLAG", ParType::Boolean));
        assert!(par.delete("FLAG", ParType::Boolean).is_err());

        // writing a tombstoned entry revives it, even though it was immutable
        par.set("FLAG", ParValue::Boolean(false)).unwrap();
        assert!(!par.get_bool("FLAG", "test").unwrap());
    }

    #[test]
    fn double_lookup_falls_back_to_integer() {
        let mut par = ParXChange::new();
        par.set_with_unit("T", ParValue::Integer(42), ScientificUnit::Celsius)
            .unwrap();

        assert!(par.contains("T", ParType::Double));
        assert_eq!(
            par.get_double("T", "test", ScientificUnit::Celsius).unwrap(),
            42.0
        );
        assert_abs_diff_eq!(
            par.get_double("T", "test", ScientificUnit::Kelvin).unwrap(),
            315.15,
            epsilon = 1e-9
        );
    }

    #[test]
    fn integer_getter_converts_and_rounds() {
        let mut par = ParXChange::new();
        par.set_with_unit("N", ParValue::Integer(3), ScientificUnit::CntM2)
            .unwrap();
        assert_eq!(
            par.get_integer("N", "test", ScientificUnit::CntHa).unwrap(),
            30_000
        );
    }

    #[test]
    fn missing_and_wrong_type_are_contract_errors() {
        let par = ParXChange::new();
        assert!(par.get_bool("NOPE", "test").is_err());
        assert!(par.get_double("NOPE", "test", ScientificUnit::NoDim).is_err());
    }

    #[test]
    fn keys_snapshot_preserves_insertion_order() {
        let mut par = ParXChange::new();
        par.set("B", ParValue::Boolean(true)).unwrap();
        par.set("A", ParValue::Text("x".into())).unwrap();
        let keys: Vec<String> = par.keys().into_iter().map(|k| k.name).collect();
        assert_eq!(keys, vec!["B", "A"]);
    }
}
