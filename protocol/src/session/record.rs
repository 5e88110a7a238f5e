//! The last simulated transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{key_preview, DemoIdentity};
use crate::ledger::Receipt;

/// A completed (simulated) DID registration.
///
/// A session holds at most one. Each successful registration replaces the
/// previous record outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The registered DID.
    pub did: String,
    /// The placeholder public key submitted with it.
    pub public_key: String,
    /// Synthetic hash returned by the ledger.
    pub transaction_hash: String,
    /// Ledger confirmation time.
    pub registered_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(identity: DemoIdentity, receipt: Receipt) -> Self {
        Self {
            did: identity.did,
            public_key: identity.public_key,
            transaction_hash: receipt.transaction_hash,
            registered_at: receipt.confirmed_at,
        }
    }

    /// Multi-line summary shown in the success status.
    pub fn details(&self, key_preview_chars: usize) -> String {
        format!(
            "Transaction Hash: {}\nDID: {}\nPublic Key: {}",
            self.transaction_hash,
            self.did,
            key_preview(&self.public_key, key_preview_chars)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_lists_hash_did_and_preview() {
        let record = TransactionRecord {
            did: "did:example:0123456789".into(),
            public_key: "0123456789abcdef".into(),
            transaction_hash: "0xfeed".into(),
            registered_at: Utc::now(),
        };
        assert_eq!(
            record.details(4),
            "Transaction Hash: 0xfeed\nDID: did:example:0123456789\nPublic Key: 0123..."
        );
    }
}
