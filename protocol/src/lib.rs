// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # QR-DID Protocol — Core Library
//!
//! The logic behind the QR-DID conceptual demo: register a decentralized
//! identifier on a (pretend) blockchain, then have a language model explain
//! the resulting transaction to a beginner.
//!
//! Nothing here is real cryptography or a real chain, and it says so on the
//! tin. The DID lives under `did:example:`, the "post-quantum" public key is
//! a placeholder, and the ledger is a `tokio::time::sleep` followed by a
//! random hex string. What *is* real is the flow: a small state machine
//! with guarded triggers, a must-run cleanup step, and an HTTP call to
//! Gemini whose answer is shape-checked before anyone sees it.
//!
//! ## Architecture
//!
//! - **config** — Constants, user-facing messages, runtime settings.
//! - **identity** — DID generation and the injectable random source.
//! - **ledger** — The `Ledger` seam and its simulator.
//! - **explain** — Prompt building, response parsing, the Gemini client.
//! - **session** — The orchestrator: state machine, triggers, snapshots.
//! - **behavior** — Typing-rhythm anomaly detection for continuous auth.

pub mod behavior;
pub mod config;
pub mod explain;
pub mod identity;
pub mod ledger;
pub mod session;

pub use session::{Session, SessionBuilder, SessionError, SessionSnapshot, TransactionRecord};
