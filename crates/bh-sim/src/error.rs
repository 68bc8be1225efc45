//! Error types for simulation setup and runners.
//!
//! The per-tick path (driver, slot, plant step) never produces these.

use thiserror::Error;

/// Errors encountered while configuring or running a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<bh_core::BhError> for SimError {
    fn from(e: bh_core::BhError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
