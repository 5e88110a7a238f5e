//! # CLI Interface
//!
//! Defines the command-line argument structure for `qrdid-node` using
//! `clap` derive. Supports four subcommands: `serve`, `register`,
//! `behavior`, and `version`.
//!
//! Every runtime knob also reads a `QRDID_*` environment variable, so the
//! API key never has to appear on a command line.

use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use qrdid_protocol::config::{
    GeminiConfig, SessionConfig, CONFIRMATION_DELAY, DEFAULT_GEMINI_ENDPOINT,
    DEFAULT_GEMINI_MODEL, KEY_PREVIEW_CHARS,
};
use qrdid_protocol::ledger::{FailureMode, SimulatedLedger};

/// QR-DID demo node.
///
/// Registers `did:example:` identifiers on a simulated blockchain and asks
/// Gemini to explain the result. Serves the demo page and a JSON API, or
/// runs the same flow once in the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "qrdid-node",
    about = "QR-DID conceptual demo node",
    version,
    propagate_version = true
)]
pub struct QrdidNodeCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "QRDID_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the demo page, the JSON/WebSocket API, and metrics.
    Serve(ServeArgs),
    /// Run one registration in the terminal, optionally followed by an
    /// explanation.
    Register(RegisterArgs),
    /// Train the typing-rhythm model and classify access attempts.
    Behavior(BehaviorArgs),
    /// Print version information and exit.
    Version,
}

/// Text-generation endpoint settings.
#[derive(Args, Debug, Clone)]
pub struct GeminiArgs {
    /// API key for the Generative Language API.
    ///
    /// Empty by default. Without a key the endpoint answers with an error
    /// object and the explanation falls back to a fixed message.
    #[arg(long, env = "QRDID_GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Model name used in the request path.
    #[arg(long, env = "QRDID_GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// Base URL of the API, up to and including the version segment.
    #[arg(long, env = "QRDID_GEMINI_ENDPOINT", default_value = DEFAULT_GEMINI_ENDPOINT)]
    pub gemini_endpoint: String,
}

impl GeminiArgs {
    pub fn to_config(&self) -> GeminiConfig {
        GeminiConfig {
            endpoint: self.gemini_endpoint.clone(),
            model: self.gemini_model.clone(),
            api_key: self.gemini_api_key.clone(),
        }
    }
}

/// Simulated ledger settings.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// How long the simulated chain takes to confirm, in milliseconds.
    #[arg(
        long,
        env = "QRDID_CONFIRMATION_DELAY_MS",
        default_value_t = CONFIRMATION_DELAY.as_millis() as u64
    )]
    pub confirmation_delay_ms: u64,

    /// Reject every n-th submission, to exercise the failure path.
    #[arg(long, env = "QRDID_FAIL_EVERY")]
    pub fail_every: Option<u64>,
}

impl LedgerArgs {
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            confirmation_delay: self.confirmation_delay(),
            key_preview_chars: KEY_PREVIEW_CHARS,
        }
    }

    pub fn build_ledger(&self) -> SimulatedLedger {
        let failure = match self.fail_every {
            Some(n) => FailureMode::EveryNth(n),
            None => FailureMode::Never,
        };
        SimulatedLedger::new(self.confirmation_delay()).with_failure(failure)
    }
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind both listeners to.
    #[arg(long, env = "QRDID_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port for the demo page and API.
    #[arg(long, env = "QRDID_HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "QRDID_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    #[command(flatten)]
    pub gemini: GeminiArgs,

    #[command(flatten)]
    pub ledger: LedgerArgs,
}

/// Arguments for the `register` subcommand.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Ask the model to explain the transaction once it is registered.
    #[arg(long)]
    pub explain: bool,

    #[command(flatten)]
    pub gemini: GeminiArgs,

    #[command(flatten)]
    pub ledger: LedgerArgs,
}

/// Arguments for the `behavior` subcommand.
#[derive(Parser, Debug)]
pub struct BehaviorArgs {
    /// Seed for the simulated telemetry and the train/test shuffle.
    #[arg(long, default_value_t = qrdid_protocol::behavior::DEFAULT_SEED)]
    pub seed: u64,

    /// Typing speed (chars/s) of an attempt to classify. Requires
    /// `--latency-variation`; without both, two canonical attempts are
    /// classified instead.
    #[arg(long, requires = "latency_variation")]
    pub typing_speed: Option<f64>,

    /// Inter-key latency standard deviation (seconds) of the attempt.
    #[arg(long, requires = "typing_speed")]
    pub latency_variation: Option<f64>,
}
