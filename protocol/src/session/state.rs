//! Observable session state.
//!
//! [`SessionSnapshot`] is everything a front end needs to draw the demo:
//! which triggers are enabled, the status box, the explanation box, and
//! the last record. The server hands it out as JSON; the terminal runner
//! prints it.

use serde::{Deserialize, Serialize};

use crate::config::MSG_WELCOME;
use crate::explain::ExplanationStatus;

use super::record::TransactionRecord;

/// Where the registration state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Generating,
    Broadcasting,
    Completed,
    Failed,
}

impl Phase {
    /// Whether a registration run is between start and cleanup.
    pub fn in_flight(self) -> bool {
        matches!(self, Phase::Generating | Phase::Broadcasting)
    }
}

/// Visual style of the status box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Loading,
    Success,
    Error,
}

/// Contents of the status box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub kind: StatusKind,
    pub title: String,
    pub details: String,
}

impl StatusView {
    pub fn new(kind: StatusKind, title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            details: details.into(),
        }
    }
}

impl std::fmt::Display for StatusView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.kind {
            StatusKind::Info => "info",
            StatusKind::Loading => "....",
            StatusKind::Success => " ok ",
            StatusKind::Error => "FAIL",
        };
        write!(f, "[{}] {}", tag, self.title)?;
        for line in self.details.lines() {
            write!(f, "\n       {}", line)?;
        }
        Ok(())
    }
}

/// Contents of the explanation box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationView {
    /// Hidden until the first explanation request, and again whenever a
    /// new registration starts.
    pub visible: bool,
    pub status: Option<ExplanationStatus>,
    /// HTML fragment to render.
    pub html: String,
}

impl ExplanationView {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            status: None,
            html: String::new(),
        }
    }

    pub fn shown(status: ExplanationStatus, html: impl Into<String>) -> Self {
        Self {
            visible: true,
            status: Some(status),
            html: html.into(),
        }
    }
}

/// The full observable state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Bumped on every published change.
    pub revision: u64,
    pub phase: Phase,
    pub register_enabled: bool,
    pub explain_enabled: bool,
    pub status: StatusView,
    pub explanation: ExplanationView,
    /// Last guard message, cleared when a registration starts.
    pub notice: Option<String>,
    pub record: Option<TransactionRecord>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            revision: 0,
            phase: Phase::Idle,
            register_enabled: true,
            explain_enabled: false,
            status: StatusView::new(StatusKind::Info, MSG_WELCOME, ""),
            explanation: ExplanationView::hidden(),
            notice: None,
            record: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot() {
        let snap = SessionSnapshot::default();
        assert_eq!(snap.phase, Phase::Idle);
        assert!(snap.register_enabled);
        assert!(!snap.explain_enabled);
        assert!(!snap.explanation.visible);
        assert!(snap.record.is_none());
        assert_eq!(snap.status.kind, StatusKind::Info);
    }

    #[test]
    fn snapshot_json_uses_snake_case_enums() {
        let json = serde_json::to_value(SessionSnapshot::default()).unwrap();
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["status"]["kind"], "info");
        assert_eq!(json["explanation"]["status"], serde_json::Value::Null);
    }

    #[test]
    fn status_display_indents_details() {
        let view = StatusView::new(StatusKind::Success, "done", "a\nb");
        assert_eq!(view.to_string(), "[ ok ] done\n       a\n       b");
    }

    #[test]
    fn in_flight_phases() {
        assert!(Phase::Generating.in_flight());
        assert!(Phase::Broadcasting.in_flight());
        assert!(!Phase::Idle.in_flight());
        assert!(!Phase::Completed.in_flight());
        assert!(!Phase::Failed.in_flight());
    }
}
