//! # Ledger Module
//!
//! The "blockchain" the demo registers DIDs on. There is no chain: the
//! [`Ledger`] trait is the seam where one would plug in, and
//! [`SimulatedLedger`] stands in for it by sleeping through a pretend
//! confirmation and handing back a random transaction hash.
//!
//! ## Failure Modes
//!
//! A real submission can fail. The simulator never does on its own, so
//! [`FailureMode`] exists to drive the failure branch of the registration
//! flow from tests and from the `--fail-every` CLI flag.

pub mod simulator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use simulator::{FailureMode, SimulatedLedger};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a ledger submission can produce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// What a successful submission returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// `0x`-prefixed hex string standing in for a transaction hash.
    pub transaction_hash: String,
    /// When the pretend block confirmed.
    pub confirmed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Something a DID can be registered on.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Submit a DID and its public key, resolving once "confirmed".
    async fn submit(&self, did: &str, public_key: &str) -> Result<Receipt, LedgerError>;
}
