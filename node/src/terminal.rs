//! Terminal front end.
//!
//! Drives the same [`Session`](qrdid_protocol::Session) the server uses and
//! prints each status change as it is published, so a run reads like the
//! status box updating in the browser.

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use qrdid_protocol::behavior::{Assessment, BehaviorModel, Sample, TrainingConfig};
use qrdid_protocol::session::StatusView;
use qrdid_protocol::{SessionError, SessionSnapshot};

use crate::cli::{BehaviorArgs, RegisterArgs};

/// Runs one registration, then optionally one explanation.
///
/// A rejected registration is reported on stdout like any other status and
/// then turned into an error so the exit code is non-zero.
pub async fn run_register(args: RegisterArgs) -> Result<()> {
    let session = crate::build_session(&args.gemini, &args.ledger);

    let rx = session.subscribe();
    println!("{}", session.snapshot().status);
    let printer = tokio::spawn(print_status_changes(rx, session.snapshot()));

    let registered = session.register().await;
    if registered.is_ok() && args.explain {
        match session.explain().await {
            Ok(view) => {
                println!();
                println!("Gemini's explanation:");
                println!("{}", html_to_text(&view.html));
            }
            Err(e) => tracing::warn!(error = %e, "explanation refused"),
        }
    }

    // Dropping the session closes the channel, which ends the printer.
    drop(session);
    printer.await.context("status printer panicked")?;

    match registered {
        Ok(record) => {
            tracing::debug!(did = %record.did, "terminal registration done");
            Ok(())
        }
        Err(SessionError::Registration(e)) => Err(e).context("registration failed"),
        Err(e) => Err(e.into()),
    }
}

/// Prints the status box whenever it changes.
async fn print_status_changes(
    mut rx: broadcast::Receiver<SessionSnapshot>,
    initial: SessionSnapshot,
) {
    let mut last: StatusView = initial.status;
    loop {
        match rx.recv().await {
            Ok(snap) => {
                if snap.status != last {
                    println!("{}", snap.status);
                    last = snap.status;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("status printer lagged by {} snapshots", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Turns the rendered explanation back into plain text for a terminal.
fn html_to_text(html: &str) -> String {
    html.replace("<br>", "\n")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Trains the model and classifies either the given attempt or the two
/// canonical ones.
pub fn run_behavior(args: BehaviorArgs) -> Result<()> {
    let model = BehaviorModel::train(args.seed, &TrainingConfig::default())
        .context("failed to train behavior model")?;
    let (train, test) = model.split_sizes();

    println!("--- QR-DID behavioral analytics ---");
    println!("Simulated telemetry: {} training / {} test samples", train, test);
    println!("Model accuracy on test data: {:.2}", model.accuracy());
    println!();

    let samples = match (args.typing_speed, args.latency_variation) {
        (Some(speed), Some(variation)) => vec![("Submitted attempt", Sample::new(speed, variation))],
        _ => vec![
            ("Steady typist", Sample::new(3.2, 0.03)),
            ("Erratic typist", Sample::new(1.5, 0.15)),
        ],
    };

    for (label, sample) in samples {
        print_assessment(label, &model.classify(sample));
    }
    Ok(())
}

fn print_assessment(label: &str, a: &Assessment) {
    println!(
        "{}: typing speed {:.2} chars/s, latency variation {:.3} s",
        label, a.sample.typing_speed, a.sample.latency_variation
    );
    println!(
        "  -> {} (anomaly probability {:.2}): {}",
        a.verdict, a.anomaly_probability, a.advice
    );
}
