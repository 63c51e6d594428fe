use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StrategyError {
    /// A caller broke a precondition (probability outside [0, 1], negative
    /// stake, inconsistent decision). Not recoverable.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Fail with an invariant violation unless `value` lies in [0, 1].
pub(crate) fn ensure_unit_interval(name: &str, value: f64) -> Result<(), StrategyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(StrategyError::InvariantViolation(format!(
            "{name}={value} is outside [0, 1]"
        )))
    }
}

/// Fail with an invariant violation unless `value` is finite and >= 0.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<(), StrategyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StrategyError::InvariantViolation(format!(
            "{name}={value} must be finite and >= 0"
        )))
    }
}
