//! # Demo DID Generation
//!
//! Produces the synthetic `(identifier, public key)` pair that the
//! registration flow submits to the simulated ledger.
//!
//! ## DID Format
//!
//! ```text
//! did:example:<10 base-36 chars>
//! ```
//!
//! Example: `did:example:k3v9q0x1zt`
//!
//! The suffix is random but not guaranteed unique. Two registrations can
//! collide, and nothing checks for it. The public key is the constant
//! [`PLACEHOLDER_PUBLIC_KEY`](crate::config::PLACEHOLDER_PUBLIC_KEY).

use serde::{Deserialize, Serialize};

use crate::config::{DID_PREFIX, DID_SUFFIX_ALPHABET, DID_SUFFIX_LENGTH, PLACEHOLDER_PUBLIC_KEY};
use crate::identity::random::{random_string, RandomSource};

// ---------------------------------------------------------------------------
// DemoIdentity
// ---------------------------------------------------------------------------

/// A generated identifier plus its (placeholder) public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoIdentity {
    /// The DID string, e.g. `did:example:k3v9q0x1zt`.
    pub did: String,
    /// PEM-shaped placeholder. Carries no key material.
    pub public_key: String,
}

impl DemoIdentity {
    /// Draw a fresh identity from `source`.
    pub fn generate(source: &mut dyn RandomSource) -> Self {
        let suffix = random_string(source, DID_SUFFIX_ALPHABET, DID_SUFFIX_LENGTH);
        Self {
            did: format!("{}{}", DID_PREFIX, suffix),
            public_key: PLACEHOLDER_PUBLIC_KEY.to_string(),
        }
    }
}

impl std::fmt::Display for DemoIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.did)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First `chars` characters of `public_key`, followed by `...`.
///
/// Counts characters, not bytes, so a multi-byte key never gets split
/// mid-codepoint.
pub fn key_preview(public_key: &str, chars: usize) -> String {
    let head: String = public_key.chars().take(chars).collect();
    format!("{}...", head)
}

/// Whether `s` has the shape of a generated demo DID.
pub fn is_demo_did(s: &str) -> bool {
    match s.strip_prefix(DID_PREFIX) {
        Some(suffix) => {
            suffix.len() == DID_SUFFIX_LENGTH
                && suffix.bytes().all(|b| DID_SUFFIX_ALPHABET.contains(&b))
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KEY_PREVIEW_CHARS;
    use crate::identity::random::{RngSource, ScriptedSource};

    #[test]
    fn generated_did_has_demo_shape() {
        let mut src = RngSource::from_entropy();
        for _ in 0..200 {
            let id = DemoIdentity::generate(&mut src);
            assert!(is_demo_did(&id.did), "got: {}", id.did);
            assert_eq!(id.public_key, PLACEHOLDER_PUBLIC_KEY);
        }
    }

    #[test]
    fn scripted_source_gives_exact_did() {
        // 10 -> 'a', 11 -> 'b', ... cycling through the script.
        let mut src = ScriptedSource::new(vec![10, 11, 12, 0, 1]);
        let id = DemoIdentity::generate(&mut src);
        assert_eq!(id.did, "did:example:abc01abc01");
    }

    #[test]
    fn display_matches_did() {
        let mut src = ScriptedSource::constant(35);
        let id = DemoIdentity::generate(&mut src);
        assert_eq!(id.to_string(), "did:example:zzzzzzzzzz");
    }

    #[test]
    fn key_preview_truncates_placeholder() {
        let mut src = ScriptedSource::constant(0);
        let id = DemoIdentity::generate(&mut src);
        let preview = key_preview(&id.public_key, KEY_PREVIEW_CHARS);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), KEY_PREVIEW_CHARS + 3);
        assert!(preview.starts_with("-----BEGIN PUBLIC KEY-----\n"));
    }

    #[test]
    fn key_preview_short_input_is_kept_whole() {
        assert_eq!(key_preview("abc", 50), "abc...");
    }

    #[test]
    fn key_preview_counts_chars_not_bytes() {
        assert_eq!(key_preview("ééé", 2), "éé...");
    }

    #[test]
    fn is_demo_did_rejects_bad_shapes() {
        assert!(!is_demo_did("did:nova:abcdefghij"));
        assert!(!is_demo_did("did:example:short"));
        assert!(!is_demo_did("did:example:ABCDEFGHIJ"));
        assert!(!is_demo_did("did:example:abcdefghijk"));
        assert!(is_demo_did("did:example:0123456789"));
    }

    #[test]
    fn identity_serde_roundtrip() {
        let mut src = RngSource::seeded(7);
        let id = DemoIdentity::generate(&mut src);
        let json = serde_json::to_string(&id).unwrap();
        let back: DemoIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
