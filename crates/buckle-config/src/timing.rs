//! Validation of the health-check timings.
//!
//! Zero values are accepted by the configuration layers but break the
//! readiness wait: a zero request timeout fails every probe, and a zero poll
//! interval turns the attached run into a busy loop.

use thiserror::Error;

use crate::Config;

/// Errors raised when the configured health timings cannot be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthTimingError {
    /// A timing that must be positive was configured as zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Configuration key holding the zero value.
        field: &'static str,
    },
}

impl Config {
    /// Checks that every health timing is positive.
    ///
    /// # Errors
    ///
    /// Returns [`HealthTimingError::Zero`] naming the first zero field.
    pub fn validate_health_timings(&self) -> Result<(), HealthTimingError> {
        let timings = [
            ("health_timeout_ms", self.health_timeout_ms),
            ("health_request_timeout_ms", self.health_request_timeout_ms),
            ("health_poll_interval_ms", self.health_poll_interval_ms),
        ];
        match timings.into_iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(HealthTimingError::Zero { field }),
            None => Ok(()),
        }
    }
}
