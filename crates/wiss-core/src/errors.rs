use thiserror::Error;

/// Error type for invalid kernel operations.
///
/// Two taxonomies exist: [`SimError::Contract`] for broken method
/// preconditions (caller misuse) and [`SimError::Invariant`] for operations
/// that would violate a store invariant. Both are fatal; the run is
/// considered ruined once one propagates out of a phase.
#[derive(Error, Debug)]
pub enum SimError {
    /// A caller broke a method precondition.
    #[error("{0}")]
    Contract(String),
    /// An operation would violate a store invariant.
    #[error("{0}")]
    Invariant(String),
    /// No conversion is defined between two concrete unit tags. This is a
    /// programming error in the unit table, not a runtime condition.
    #[error("no conversion defined for {name}: value={value}, unit={from} into unit={to}")]
    ConversionUndefined {
        name: String,
        value: f64,
        from: String,
        to: String,
    },
    /// Conversion was requested from or into the `NA` unit.
    #[error("cannot convert {name}: unit={from} into unit={to}")]
    ConversionNotApplicable {
        name: String,
        from: String,
        to: String,
    },
    /// Failure while writing a report file.
    #[error("report i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Contract violation with the `Component.method: message` context
    /// discipline used throughout the kernel.
    pub fn contract(component: &str, method: &str, msg: impl AsRef<str>) -> Self {
        SimError::Contract(format!("{}.{}: {}", component, method, msg.as_ref()))
    }

    /// Invariant violation, same context discipline.
    pub fn invariant(component: &str, method: &str, msg: impl AsRef<str>) -> Self {
        SimError::Invariant(format!("{}.{}: {}", component, method, msg.as_ref()))
    }
}

/// Convenience type for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_message_carries_context() {
        let err = SimError::contract("SimXChange", "force_state", "value is missing");
        assert_eq!(
            err.to_string(),
            "SimXChange.force_state: value is missing"
        );
    }
}
