//! Diagnostics for page authors.
//!
//! The cookie writer never fails; everything that goes wrong (a malformed
//! `writeCookies` block, an unsupported template, a failing expansion) is
//! turned into a [`Diagnostic`] and handed to a [`Reporter`].
//!
//! Two reporters are provided:
//! - [`LogReporter`] logs through the `log` facade.
//! - [`BroadcastReporter`] publishes diagnostics on a channel, so a host (or a
//!   test) can observe them.

use std::fmt;
use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the [`BroadcastReporter`] channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    InvalidConfig,
    EmptyCookieName,
    UnsupportedMacro,
    ExpansionFailed,
    WriteFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Prefix identifying the emitting component.
    pub tag: String,
    pub message: String,
    /// Underlying error, surfaced on its own by reporters.
    pub cause: Option<String>,
}

impl Diagnostic {
    pub fn new<T: Into<String>, M: Into<String>>(kind: DiagnosticKind, tag: T, message: M) -> Self {
        Self {
            kind,
            tag: tag.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<C: Into<String>>(mut self, cause: C) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag, self.message)
    }
}

/// Receives diagnostics. Must not block and must not panic.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Logs diagnostics at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        log::error!("{diagnostic}");
        if let Some(cause) = &diagnostic.cause {
            log::error!("{cause}");
        }
    }
}

/// A handle for receiving diagnostics from a [`BroadcastReporter`].
pub type DiagnosticSubscription = broadcast::Receiver<Diagnostic>;

#[derive(Debug, Clone)]
pub struct BroadcastReporter {
    tx: broadcast::Sender<Diagnostic>,
}

impl Default for BroadcastReporter {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl BroadcastReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> DiagnosticSubscription {
        self.tx.subscribe()
    }
}

impl Reporter for BroadcastReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        // Only fails when nobody is subscribed.
        let _ = self.tx.send(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_tag() {
        let d = Diagnostic::new(DiagnosticKind::InvalidConfig, "[tag]", "writeCookies config must be an object");
        assert_eq!(d.to_string(), "[tag] writeCookies config must be an object");
        assert!(d.cause.is_none());

        let d = d.with_cause("boom");
        assert_eq!(d.cause.as_deref(), Some("boom"));
    }

    #[test]
    fn broadcast_without_subscribers_is_ignored() {
        let r = BroadcastReporter::new();
        r.report(&Diagnostic::new(DiagnosticKind::WriteFailed, "[t]", "nobody listens"));
    }

    #[tokio::test]
    async fn broadcast_delivers_to_subscribers() {
        let r = BroadcastReporter::new();
        let mut rx = r.subscribe();

        r.report(&Diagnostic::new(DiagnosticKind::UnsupportedMacro, "[t]", "one"));
        r.report(&Diagnostic::new(DiagnosticKind::ExpansionFailed, "[t]", "two").with_cause("inner"));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, DiagnosticKind::UnsupportedMacro);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.message, "two");
        assert_eq!(second.cause.as_deref(), Some("inner"));
    }

    #[test]
    fn log_reporter_does_not_panic() {
        let _ = env_logger::builder().is_test(true).try_init();
        LogReporter.report(&Diagnostic::new(DiagnosticKind::ExpansionFailed, "[t]", "msg").with_cause("cause"));
    }
}
