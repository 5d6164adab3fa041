//! Unified error type.
//!
//! Degenerate data (empty traces, zero-length segments, repeated timestamps)
//! never produces an error; it resolves to a defined fallback. Errors are
//! reserved for configuration that would make an algorithm meaningless.

use thiserror::Error;

/// Errors raised at the API boundary before an algorithm runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    /// A parameter is out of its valid range.
    #[error("invalid configuration: {parameter} = {value} ({reason})")]
    InvalidConfiguration {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },

    /// An operation that needs a minimum amount of data did not get it.
    #[error("{context}: got {point_count} points, need at least {minimum_required}")]
    InsufficientPoints {
        context: String,
        point_count: usize,
        minimum_required: usize,
    },
}

impl TraceError {
    pub(crate) fn invalid(
        parameter: &'static str,
        value: impl ToString,
        reason: &'static str,
    ) -> Self {
        TraceError::InvalidConfiguration {
            parameter,
            value: value.to_string(),
            reason,
        }
    }

    /// True for `InvalidConfiguration`.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, TraceError::InvalidConfiguration { .. })
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// Conversions from `Option` into a [`TraceError`].
pub trait OptionExt<T> {
    fn ok_or_insufficient_points(
        self,
        context: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(
        self,
        context: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T> {
        self.ok_or_else(|| TraceError::InsufficientPoints {
            context: context.to_string(),
            point_count,
            minimum_required,
        })
    }
}

/// Check that `value` is finite and `>= 0`.
pub(crate) fn check_non_negative(parameter: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(TraceError::invalid(parameter, value, "must be finite"));
    }
    if value < 0.0 {
        return Err(TraceError::invalid(parameter, value, "must not be negative"));
    }
    Ok(())
}

/// Check that `value` is finite and `> 0`.
pub(crate) fn check_positive(parameter: &'static str, value: f64) -> Result<()> {
    check_non_negative(parameter, value)?;
    if value == 0.0 {
        return Err(TraceError::invalid(parameter, value, "must be greater than zero"));
    }
    Ok(())
}

/// Check that an angle in degrees lies in `[0, max]`.
pub(crate) fn check_angle(parameter: &'static str, value: f64, max: f64) -> Result<()> {
    check_non_negative(parameter, value)?;
    if value > max {
        return Err(TraceError::invalid(parameter, value, "angle out of range"));
    }
    Ok(())
}
