// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # QR-DID Demo Node
//!
//! Entry point for the `qrdid-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and either serves the demo or runs it
//! once in the terminal.
//!
//! The binary supports four subcommands:
//!
//! - `serve`    — demo page, JSON/WebSocket API, and metrics endpoint
//! - `register` — one registration (and optional explanation) on stdout
//! - `behavior` — train the typing-rhythm model and classify attempts
//! - `version`  — print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use qrdid_protocol::behavior::BehaviorModel;
use qrdid_protocol::explain::GeminiClient;
use qrdid_protocol::Session;

use cli::{Commands, QrdidNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = QrdidNodeCli::parse();
    let format = LogFormat::from_str_lossy(&cli.log_format);

    match cli.command {
        Commands::Serve(args) => serve(args, format).await,
        Commands::Register(args) => {
            logging::init_logging(logging::TERMINAL_FILTER, format);
            terminal::run_register(args).await
        }
        Commands::Behavior(args) => {
            logging::init_logging(logging::TERMINAL_FILTER, format);
            terminal::run_behavior(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds a session from the shared ledger and Gemini arguments.
pub(crate) fn build_session(gemini: &cli::GeminiArgs, ledger: &cli::LedgerArgs) -> Session {
    Session::builder()
        .config(ledger.session_config())
        .ledger(Arc::new(ledger.build_ledger()))
        .generator(Arc::new(GeminiClient::new(gemini.to_config())))
        .build()
}

/// Serves the demo page, API, and metrics until a shutdown signal.
async fn serve(args: cli::ServeArgs, format: LogFormat) -> Result<()> {
    logging::init_logging(logging::SERVE_FILTER, format);

    let gemini = args.gemini.to_config();
    tracing::info!(
        http_port = args.http_port,
        metrics_port = args.metrics_port,
        confirmation_delay_ms = args.ledger.confirmation_delay_ms,
        fail_every = ?args.ledger.fail_every,
        gemini = ?gemini,
        "starting qrdid-node"
    );
    if gemini.api_key.is_empty() {
        tracing::warn!("no Gemini API key configured; explanations will use the fallback message");
    }

    // --- Session ---
    let session = Arc::new(build_session(&args.gemini, &args.ledger));

    // --- Behavior model ---
    let behavior = BehaviorModel::train_default().context("failed to train behavior model")?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            qrdid_protocol::config::PROTOCOL_VERSION,
        ),
        session,
        metrics: Arc::clone(&node_metrics),
        behavior: Arc::new(behavior),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.http_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", api_addr))?;
    tracing::info!("demo page and API listening on http://{}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("qrdid-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("qrdid-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", qrdid_protocol::config::PROTOCOL_VERSION);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. A handler that cannot
/// be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
