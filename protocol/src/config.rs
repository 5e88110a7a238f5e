//! # Demo Configuration & Constants
//!
//! Every fixed string and magic number of the QR-DID demo lives here. The
//! user-facing messages are part of the observable contract (tests assert
//! on them verbatim), so edit them here or not at all.
//!
//! Runtime-tunable settings (confirmation delay, Gemini endpoint, API key)
//! are grouped into [`SessionConfig`] and [`GeminiConfig`]; the node binary
//! fills them from CLI flags and environment variables.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Version string reported by the node's `version` command and status page.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Identifier Parameters
// ---------------------------------------------------------------------------

/// Namespace prefix of every generated DID. `example` is the method name the
/// DID Core spec reserves for documentation, which is exactly what this is.
pub const DID_PREFIX: &str = "did:example:";

/// Length of the random suffix after [`DID_PREFIX`].
pub const DID_SUFFIX_LENGTH: usize = 10;

/// Alphabet the DID suffix is drawn from (lowercase base-36).
pub const DID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The "post-quantum" public key. A placeholder, not key material.
pub const PLACEHOLDER_PUBLIC_KEY: &str =
    "-----BEGIN PUBLIC KEY-----\n...[PQC_KEY_DATA]...\n-----END PUBLIC KEY-----";

/// Number of public-key characters shown before the `...` ellipsis.
pub const KEY_PREVIEW_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Simulated Ledger
// ---------------------------------------------------------------------------

/// Pretend block-confirmation latency.
pub const CONFIRMATION_DELAY: Duration = Duration::from_secs(3);

/// Number of random bytes behind a synthetic transaction hash. Rendered as
/// `0x` + 64 hex digits so it at least looks like a 256-bit digest.
pub const TX_HASH_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Gemini Endpoint
// ---------------------------------------------------------------------------

/// Base URL of the Generative Language API.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for the transaction narrative.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";

// ---------------------------------------------------------------------------
// User-Facing Messages
// ---------------------------------------------------------------------------

/// Initial status shown before the first registration.
pub const MSG_WELCOME: &str = "Click the \"Register DID\" button to begin the process.";

pub const MSG_STARTING_TITLE: &str = "Starting DID registration process...";
pub const MSG_STARTING_DETAILS: &str = "Please wait...";
pub const MSG_GENERATED_TITLE: &str = "Generated DID and PQC Public Key.";
pub const MSG_BROADCASTING_TITLE: &str = "Broadcasting transaction to the blockchain...";
pub const MSG_BROADCASTING_DETAILS: &str = "This may take a moment...";
pub const MSG_REGISTERED_TITLE: &str = "✅ DID successfully registered on the blockchain.";
pub const MSG_FAILED_TITLE: &str = "❌ Registration Failed.";

/// Guard message when an explanation is requested before any registration.
pub const MSG_REGISTER_FIRST: &str = "Please register a DID first!";

/// Placeholder shown in the explanation area while the API call is in flight.
pub const MSG_EXPLAIN_LOADING: &str = "Generating explanation with Gemini...";

/// Shown when the API answered but not in the expected shape.
pub const MSG_EXPLAIN_UNAVAILABLE: &str =
    "Sorry, I couldn't generate an explanation at this time.";

/// Shown when the API could not be reached at all.
pub const MSG_EXPLAIN_TRANSPORT_ERROR: &str = "An error occurred while contacting the Gemini API.";

// ---------------------------------------------------------------------------
// Runtime Settings
// ---------------------------------------------------------------------------

/// Settings for the registration flow.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the simulated ledger "waits for a block".
    pub confirmation_delay: Duration,
    /// Public-key characters kept in previews.
    pub key_preview_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confirmation_delay: CONFIRMATION_DELAY,
            key_preview_chars: KEY_PREVIEW_CHARS,
        }
    }
}

/// Settings for the text-generation client.
#[derive(Clone)]
pub struct GeminiConfig {
    /// Base URL, without a trailing slash.
    pub endpoint: String,
    /// Model name, as it appears in the request path.
    pub model: String,
    /// API key sent as the `key` query parameter. Empty by default; the
    /// operator supplies it out of band.
    pub api_key: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: String::new(),
        }
    }
}

// Hand-written so the key never ends up in a log line.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key_set", &!self.api_key.is_empty())
            .finish()
    }
}
