//! The registration and explanation flows.
//!
//! ```text
//!            register()                identity drawn
//!   Idle ──────────────► Generating ─────────────────► Broadcasting
//!    ▲                                                   │      │
//!    │               cleanup (always)                 ok │      │ err
//!    └───────────── Completed ◄──────────────────────────┘      │
//!    └───────────── Failed    ◄─────────────────────────────────┘
//! ```
//!
//! Both flows publish a [`SessionSnapshot`] after every visible change.
//! The state lock is never held across an `.await`; the two suspension
//! points are the ledger confirmation and the text-generation call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{
    GeminiConfig, SessionConfig, MSG_BROADCASTING_DETAILS, MSG_BROADCASTING_TITLE,
    MSG_EXPLAIN_LOADING, MSG_EXPLAIN_TRANSPORT_ERROR, MSG_EXPLAIN_UNAVAILABLE, MSG_FAILED_TITLE,
    MSG_GENERATED_TITLE, MSG_REGISTERED_TITLE, MSG_REGISTER_FIRST, MSG_STARTING_DETAILS,
    MSG_STARTING_TITLE,
};
use crate::explain::{
    build_prompt, extract_text, render_html, ExplainError, ExplanationStatus, GeminiClient,
    TextGenerator,
};
use crate::identity::{DemoIdentity, RandomSource, RngSource};
use crate::ledger::{Ledger, SimulatedLedger};

use super::record::TransactionRecord;
use super::state::{ExplanationView, Phase, SessionSnapshot, StatusKind, StatusView};
use super::SessionError;

/// Capacity of the snapshot broadcast channel. A registration run publishes
/// five snapshots; slow observers that fall further behind just skip ahead.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One demo session: the last-transaction slot, the two trigger flags, and
/// the collaborators that do the actual work.
pub struct Session {
    config: SessionConfig,
    identities: Mutex<Box<dyn RandomSource>>,
    ledger: Arc<dyn Ledger>,
    generator: Arc<dyn TextGenerator>,
    state: Mutex<SessionSnapshot>,
    /// Identifies the current explanation request. Bumped when an
    /// explanation or a registration starts; only read or written while
    /// `state` is locked.
    explain_ticket: AtomicU64,
    events: broadcast::Sender<SessionSnapshot>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().clone()
    }

    /// The stored record, if any registration has completed.
    pub fn last_transaction(&self) -> Option<TransactionRecord> {
        self.state.lock().record.clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one registration: draw an identity, submit it, store the record.
    ///
    /// Ledger failures are reported in the status box *and* returned as
    /// [`SessionError::Registration`]. Either way the register trigger is
    /// enabled again when this returns, or when the future is dropped.
    pub async fn register(&self) -> Result<TransactionRecord, SessionError> {
        let run_id = Uuid::new_v4();

        self.mutate(|s| {
            if !s.register_enabled {
                return Err(SessionError::RegisterDisabled);
            }
            s.register_enabled = false;
            s.explain_enabled = false;
            s.explanation = ExplanationView::hidden();
            // Any explanation still in flight is for the old record.
            self.explain_ticket.fetch_add(1, Ordering::Relaxed);
            s.notice = None;
            s.phase = Phase::Generating;
            s.status = StatusView::new(StatusKind::Loading, MSG_STARTING_TITLE, MSG_STARTING_DETAILS);
            Ok(())
        })?;
        let _cleanup = RegisterCleanup { session: self };
        info!(%run_id, "registration started");

        let identity = {
            let mut source = self.identities.lock();
            DemoIdentity::generate(source.as_mut())
        };
        info!(%run_id, did = %identity.did, "identity generated");

        self.mutate(|s| {
            s.status = StatusView::new(
                StatusKind::Loading,
                MSG_GENERATED_TITLE,
                format!("DID: {}", identity.did),
            );
        });
        self.mutate(|s| {
            s.phase = Phase::Broadcasting;
            s.status = StatusView::new(
                StatusKind::Loading,
                MSG_BROADCASTING_TITLE,
                MSG_BROADCASTING_DETAILS,
            );
        });

        let submitted = self
            .ledger
            .submit(&identity.did, &identity.public_key)
            .await;

        match submitted {
            Ok(receipt) => {
                let record = TransactionRecord::new(identity, receipt);
                let details = record.details(self.config.key_preview_chars);
                self.mutate(|s| {
                    s.record = Some(record.clone());
                    s.phase = Phase::Completed;
                    s.status = StatusView::new(StatusKind::Success, MSG_REGISTERED_TITLE, details);
                    s.explain_enabled = true;
                });
                info!(%run_id, did = %record.did, tx_hash = %record.transaction_hash, "registration completed");
                Ok(record)
            }
            Err(e) => {
                self.mutate(|s| {
                    s.phase = Phase::Failed;
                    s.status = StatusView::new(
                        StatusKind::Error,
                        MSG_FAILED_TITLE,
                        format!("An error occurred: {}", e),
                    );
                });
                error!(%run_id, did = %identity.did, error = %e, "registration failed");
                Err(SessionError::Registration(e))
            }
        }
    }

    /// Ask the text generator to narrate the stored record.
    ///
    /// Returns the explanation view that was rendered. Transport and shape
    /// failures are not errors here: they render a fixed message. The only
    /// errors are the guards: no record yet, or the trigger is disabled.
    ///
    /// If a registration starts before the answer arrives, the answer is
    /// still returned but no longer shown, and the explain trigger is left
    /// to the new run.
    pub async fn explain(&self) -> Result<ExplanationView, SessionError> {
        let started = self.mutate(|s| {
            let Some(record) = s.record.clone() else {
                s.notice = Some(MSG_REGISTER_FIRST.to_string());
                return Err(SessionError::NoTransaction);
            };
            if !s.explain_enabled {
                return Err(SessionError::ExplainDisabled);
            }
            s.explain_enabled = false;
            s.explanation = ExplanationView::shown(ExplanationStatus::Loading, MSG_EXPLAIN_LOADING);
            let ticket = self.explain_ticket.fetch_add(1, Ordering::Relaxed) + 1;
            Ok((record, ticket))
        });
        let (record, ticket) = match started {
            Ok(started) => started,
            Err(e) => {
                warn!(error = %e, "explanation refused");
                return Err(e);
            }
        };
        let _cleanup = ExplainCleanup {
            session: self,
            ticket,
        };
        info!(did = %record.did, "explanation requested");

        let prompt = build_prompt(&record, self.config.key_preview_chars);
        let generated = self
            .generator
            .generate(&prompt)
            .await
            .and_then(|response| extract_text(&response));

        let view = match generated {
            Ok(text) => {
                info!(did = %record.did, chars = text.len(), "explanation generated");
                ExplanationView::shown(ExplanationStatus::Generated, render_html(&text))
            }
            Err(ExplainError::MalformedResponse(raw)) => {
                error!(response = %raw, "text-generation response was not in the expected format");
                ExplanationView::shown(ExplanationStatus::Unavailable, MSG_EXPLAIN_UNAVAILABLE)
            }
            Err(ExplainError::Transport(e)) => {
                error!(error = %e, "text-generation call failed");
                ExplanationView::shown(ExplanationStatus::Failed, MSG_EXPLAIN_TRANSPORT_ERROR)
            }
        };

        self.mutate(|s| {
            if self.owns_explanation(ticket) {
                s.explanation = view.clone();
            } else {
                info!(did = %record.did, "explanation superseded by a newer registration");
            }
        });
        Ok(view)
    }

    /// Whether `ticket` still names the current explanation request. Call
    /// with the state lock held.
    fn owns_explanation(&self, ticket: u64) -> bool {
        self.explain_ticket.load(Ordering::Relaxed) == ticket
    }

    /// Apply `f` under the lock and publish the result.
    ///
    /// A closure returning `Err` should leave the state untouched apart
    /// from fields it deliberately sets (the guard notice); it is still
    /// published so observers see the notice.
    fn mutate<T>(&self, f: impl FnOnce(&mut SessionSnapshot) -> T) -> T {
        let mut state = self.state.lock();
        let out = f(&mut state);
        state.revision += 1;
        // No receivers is fine: nobody is watching.
        let _ = self.events.send(state.clone());
        out
    }
}

// ---------------------------------------------------------------------------
// Cleanup Guards
// ---------------------------------------------------------------------------

/// Re-enables the register trigger however the run ends.
struct RegisterCleanup<'a> {
    session: &'a Session,
}

impl Drop for RegisterCleanup<'_> {
    fn drop(&mut self) {
        self.session.mutate(|s| {
            if s.phase.in_flight() {
                // Dropped before the ledger answered.
                s.status = StatusView::new(
                    StatusKind::Error,
                    MSG_FAILED_TITLE,
                    "An error occurred: registration was interrupted",
                );
            }
            s.phase = Phase::Idle;
            s.register_enabled = true;
        });
    }
}

/// Re-enables the explain trigger however the request ends, unless a
/// registration has taken over since.
struct ExplainCleanup<'a> {
    session: &'a Session,
    ticket: u64,
}

impl Drop for ExplainCleanup<'_> {
    fn drop(&mut self) {
        self.session.mutate(|s| {
            if !self.session.owns_explanation(self.ticket) {
                return;
            }
            if s.explanation.status == Some(ExplanationStatus::Loading) {
                s.explanation =
                    ExplanationView::shown(ExplanationStatus::Failed, MSG_EXPLAIN_TRANSPORT_ERROR);
            }
            s.explain_enabled = true;
        });
    }
}

// ---------------------------------------------------------------------------
// SessionBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Session`]. Anything left unset gets the production
/// default: entropy-seeded identities, a [`SimulatedLedger`] using the
/// configured delay, and a [`GeminiClient`] with [`GeminiConfig::default`].
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    identities: Option<Box<dyn RandomSource>>,
    ledger: Option<Arc<dyn Ledger>>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl SessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Random source for DID suffixes.
    pub fn identity_source(mut self, source: Box<dyn RandomSource>) -> Self {
        self.identities = Some(source);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn build(self) -> Session {
        let config = self.config;
        let identities = self
            .identities
            .unwrap_or_else(|| Box::new(RngSource::from_entropy()));
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(SimulatedLedger::new(config.confirmation_delay)));
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(GeminiClient::new(GeminiConfig::default())));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Session {
            config,
            identities: Mutex::new(identities),
            ledger,
            generator,
            state: Mutex::new(SessionSnapshot::default()),
            explain_ticket: AtomicU64::new(0),
            events,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
