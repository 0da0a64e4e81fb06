//! The module contains the errors the engine can throw.
//!
//! Both variants are caller errors: the engine never retries, logs, or
//! partially applies an allocation, and a corrected request can always be
//! resubmitted.
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The request violates a structural precondition: non-positive total,
    /// unknown policy, duplicate or missing participants, missing or
    /// ill-typed split values.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Percentage or exact shares do not reconcile with the total within
    /// the 0.01 tolerance.
    #[error("Unbalanced split: {0}")]
    UnbalancedSplit(String),
}
