//! Policy error taxonomy.
//!
//! Validation errors are local and immediately returned to the caller
//! without side effects. Persistence failures are NOT represented here:
//! saves are best-effort and report a status flag instead of erroring.

use thiserror::Error;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A bet result was neither `W` nor `L`.
    #[error("invalid result '{0}': expected W or L")]
    InvalidResult(String),

    /// Odds-band bounds were malformed or out of range.
    #[error("invalid odds band: {0}")]
    InvalidRange(String),

    /// A confirmation step was requested with no pending plan present.
    #[error("nothing planned: compute a stake plan first")]
    NothingPlanned,
}
