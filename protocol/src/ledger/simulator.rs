//! Sleep-then-succeed ledger simulator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::{CONFIRMATION_DELAY, TX_HASH_BYTES};
use crate::identity::random::{random_bytes, RandomSource, RngSource};

use super::{Ledger, LedgerError, Receipt};

// ---------------------------------------------------------------------------
// FailureMode
// ---------------------------------------------------------------------------

/// When the simulator should pretend the chain rejected a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Every submission confirms.
    #[default]
    Never,
    /// Every submission fails with this message.
    Always(String),
    /// The n-th, 2n-th, ... submissions fail. `EveryNth(1)` behaves like
    /// `Always`, `EveryNth(0)` like `Never`.
    EveryNth(u64),
}

impl FailureMode {
    /// The failure message for the `attempt`-th submission (1-based), if any.
    fn check(&self, attempt: u64) -> Option<String> {
        match self {
            FailureMode::Never => None,
            FailureMode::Always(msg) => Some(msg.clone()),
            FailureMode::EveryNth(0) => None,
            FailureMode::EveryNth(n) if attempt % n == 0 => {
                Some(format!("simulated rejection of submission #{}", attempt))
            }
            FailureMode::EveryNth(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SimulatedLedger
// ---------------------------------------------------------------------------

/// In-process stand-in for a blockchain.
///
/// Each [`submit`](Ledger::submit) sleeps for the confirmation delay and
/// then returns `0x` followed by 64 hex digits drawn from the ledger's
/// random source. The hash is not derived from the inputs.
pub struct SimulatedLedger {
    delay: Duration,
    source: Mutex<Box<dyn RandomSource>>,
    failure: FailureMode,
    submissions: AtomicU64,
}

impl SimulatedLedger {
    /// Simulator with the given delay and an entropy-seeded random source.
    pub fn new(delay: Duration) -> Self {
        Self::with_source(delay, Box::new(RngSource::from_entropy()))
    }

    /// Simulator drawing hashes from `source`.
    pub fn with_source(delay: Duration, source: Box<dyn RandomSource>) -> Self {
        Self {
            delay,
            source: Mutex::new(source),
            failure: FailureMode::Never,
            submissions: AtomicU64::new(0),
        }
    }

    /// Replace the failure mode.
    pub fn with_failure(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }

    /// Configured confirmation delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Submissions received so far, failed ones included.
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    fn next_hash(&self) -> String {
        let bytes = {
            let mut source = self.source.lock();
            random_bytes(source.as_mut(), TX_HASH_BYTES)
        };
        format!("0x{}", hex::encode(bytes))
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new(CONFIRMATION_DELAY)
    }
}

#[async_trait::async_trait]
impl Ledger for SimulatedLedger {
    async fn submit(&self, did: &str, _public_key: &str) -> Result<Receipt, LedgerError> {
        let attempt = self.submissions.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(%did, attempt, delay_ms = self.delay.as_millis() as u64, "waiting for simulated confirmation");

        tokio::time::sleep(self.delay).await;

        if let Some(msg) = self.failure.check(attempt) {
            warn!(%did, attempt, reason = %msg, "simulated submission failed");
            return Err(LedgerError::Rejected(msg));
        }

        let transaction_hash = self.next_hash();
        debug!(%did, %transaction_hash, "simulated submission confirmed");

        Ok(Receipt {
            transaction_hash,
            confirmed_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
