//! # Explanation Module
//!
//! Turns the last simulated transaction into a plain-language narrative by
//! asking an external text-generation model.
//!
//! ## Pieces
//!
//! - `prompt.rs` — prompt text and HTML rendering of the answer.
//! - `gemini.rs` — wire types, the response shape check, and the `reqwest`
//!   client for Gemini's `generateContent`.
//!
//! The [`TextGenerator`] trait is the seam between the session and the
//! network. It returns the raw JSON response; deciding whether that
//! response is usable happens in [`extract_text`], so a malformed answer
//! can be logged verbatim.

pub mod gemini;
pub mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use gemini::{extract_text, Content, GeminiClient, GenerateContentRequest, Part};
pub use prompt::{build_prompt, render_html};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an explanation could not be produced.
#[derive(Debug, Clone, Error)]
pub enum ExplainError {
    /// The endpoint could not be reached or did not answer with JSON.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The endpoint answered, but without generated text where expected.
    #[error("unexpected response shape")]
    MalformedResponse(Value),
}

// ---------------------------------------------------------------------------
// TextGenerator
// ---------------------------------------------------------------------------

/// A single-shot text-generation backend.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit `prompt` and return the raw JSON response.
    async fn generate(&self, prompt: &str) -> Result<Value, ExplainError>;
}

// ---------------------------------------------------------------------------
// ExplanationStatus
// ---------------------------------------------------------------------------

/// What the explanation area currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationStatus {
    /// Request in flight.
    Loading,
    /// Model text rendered.
    Generated,
    /// The response had the wrong shape; fallback message shown.
    Unavailable,
    /// The request itself failed; error message shown.
    Failed,
}
