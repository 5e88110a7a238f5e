//! # Session Module
//!
//! The flow orchestrator. A [`Session`] owns the one "last transaction"
//! slot, the register/explain trigger flags, and the status and
//! explanation views a front end renders.
//!
//! ## Invariants
//!
//! - At most one [`TransactionRecord`] is stored; a successful
//!   registration replaces it, a failed one leaves it alone.
//! - The register trigger is off for exactly the duration of a run. A
//!   second `register()` while it is off is rejected, not queued.
//! - The explain trigger turns on only after a successful registration and
//!   stays off while a run or an explanation is in flight.
//! - A registration started while an explanation is in flight supersedes
//!   it: the late answer is dropped and does not turn the trigger back on.
//! - An explanation request with no stored record makes no network call.

pub mod flow;
pub mod record;
pub mod state;

use thiserror::Error;

use crate::ledger::LedgerError;

pub use flow::{Session, SessionBuilder};
pub use record::TransactionRecord;
pub use state::{ExplanationView, Phase, SessionSnapshot, StatusKind, StatusView};

/// Errors returned by [`Session`] actions.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// A registration is already running.
    #[error("registration already in progress")]
    RegisterDisabled,

    /// An explanation is running, or no registration has succeeded since
    /// the last run started.
    #[error("explanation is not available right now")]
    ExplainDisabled,

    /// Nothing to explain yet.
    #[error("no transaction registered yet")]
    NoTransaction,

    /// The ledger rejected the submission.
    #[error("registration failed: {0}")]
    Registration(#[from] LedgerError),
}
