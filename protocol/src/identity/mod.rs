//! # Identity Module
//!
//! Synthetic identity material for the registration demo. Nothing in here
//! is real: the DID is a random string under the `did:example:` namespace
//! and the "post-quantum" public key is a fixed PEM-shaped placeholder.
//!
//! The layers:
//!
//! 1. **Random** — the [`RandomSource`] seam every random draw goes through.
//!    Production uses an entropy-seeded `StdRng`; tests use
//!    [`ScriptedSource`] to pin exact output.
//! 2. **DID** — [`DemoIdentity`] generation plus the key-preview and
//!    shape-check helpers used by the status display and the prompt.

pub mod did;
pub mod random;

pub use did::{is_demo_did, key_preview, DemoIdentity};
pub use random::{random_bytes, random_string, RandomSource, RngSource, ScriptedSource};
