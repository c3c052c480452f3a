//! The cookie writer.
//!
//! A [`CookieWriter`] takes the analytics configuration of one element, and on
//! every [`write`](CookieWriter::write) call:
//!
//! 1. validates the `writeCookies` block,
//! 2. checks whether the execution context allows writing at all,
//! 3. resolves every template concurrently (`QUERY_PARAM` through the
//!    [`UrlExpander`](crate::expansion::UrlExpander), `LINKER_PARAM` through the
//!    [`LinkerReader`](crate::linker::LinkerReader)),
//! 4. writes every non-empty value into the cookie store.
//!
//! `write()` never fails. Problems page authors should know about are sent to
//! the [`Reporter`](crate::reporter::Reporter); an ineligible context is
//! silently skipped.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use url::Url;
//! use gosub_analytics::context::ExecutionContext;
//! use gosub_analytics::cookies::InMemoryCookieStore;
//! use gosub_analytics::linker::LinkerFingerprint;
//! use gosub_analytics::writer::{CookieWriter, WriterServices};
//!
//! # async fn run() {
//! let page = Url::parse("https://www.example.com/?campaign=spring").unwrap();
//! let services = WriterServices::for_page(
//!     Arc::new(InMemoryCookieStore::new()),
//!     &page,
//!     LinkerFingerprint::default(),
//! );
//! let writer = CookieWriter::new(
//!     json!({"writeCookies": {"_campaign": "QUERY_PARAM(campaign)"}}),
//!     ExecutionContext::new(page),
//!     services,
//! );
//! writer.write().await;
//! # }
//! ```

mod services;
mod validate;

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::config::WriterConfig;
use crate::context::{Eligibility, EligibilityGuard, ExecutionContext, ProxyOriginDetector, ViewerDetector};
use crate::cookies::ExpirationPolicy;
use crate::macros::MacroKind;
use crate::reporter::{Diagnostic, DiagnosticKind};

pub use services::WriterServices;
pub use validate::{validate, CookieWriteEntry, ValidatedConfig, WRITE_COOKIES_KEY};

/// Progress of a single `write()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    /// Checking the shape of `writeCookies`.
    Validating,
    /// Checking the execution context.
    Gating,
    /// Resolving templates; all entries are in flight.
    Resolving,
    /// Issuing cookie store writes.
    Writing,
    /// Nothing to do, or not allowed to do it.
    Skipped,
    /// All entries resolved and all writes issued.
    Done,
}

/// Why a `write()` call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No `writeCookies`, or an empty mapping.
    NothingToWrite,
    /// `writeCookies` is malformed (reported).
    InvalidConfig,
    /// The execution context forbids writing (not reported).
    Ineligible(Eligibility),
}

/// Result of resolving one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Resolved(String),
    /// Resolved to the empty string; skipped silently.
    Empty,
    Unsupported,
    Failed,
}

/// What a completed `write()` call did, per cookie name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// `(name, value)` pairs handed to the cookie store.
    pub written: Vec<(String, String)>,
    pub empty: Vec<String>,
    pub unsupported: Vec<String>,
    /// Expansion or store failures.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Skipped(SkipReason),
    Done(WriteReport),
}

impl WriteOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, WriteOutcome::Skipped(_))
    }

    pub fn report(&self) -> Option<&WriteReport> {
        match self {
            WriteOutcome::Done(report) => Some(report),
            WriteOutcome::Skipped(_) => None,
        }
    }
}

pub struct CookieWriter {
    config: WriterConfig,
    /// Analytics configuration holding `writeCookies`. Never mutated.
    analytics_config: Value,
    context: ExecutionContext,
    services: WriterServices,
    guard: EligibilityGuard,
    policy: ExpirationPolicy,
}

impl CookieWriter {
    pub fn new(analytics_config: Value, context: ExecutionContext, services: WriterServices) -> Self {
        Self::with_config(WriterConfig::default(), analytics_config, context, services)
    }

    pub fn with_config(
        config: WriterConfig,
        analytics_config: Value,
        context: ExecutionContext,
        services: WriterServices,
    ) -> Self {
        let detector = services
            .viewer_detector
            .clone()
            .unwrap_or_else(|| {
                Arc::new(ProxyOriginDetector::new(config.proxy_origin_suffixes.clone())) as Arc<dyn ViewerDetector>
            });
        let policy = ExpirationPolicy::from(&config);

        Self {
            config,
            analytics_config,
            context,
            services,
            guard: EligibilityGuard::new(detector),
            policy,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Resolves and writes all configured cookies.
    ///
    /// Settles once every entry is resolved and every write issued. Never
    /// fails: per-entry problems end up in diagnostics and in the returned
    /// [`WriteReport`]. A template whose expansion never completes keeps this
    /// future pending.
    pub async fn write(&self) -> WriteOutcome {
        self.enter(WritePhase::Validating);
        let entries = match validate(&self.analytics_config, &self.config.tag, self.services.reporter.as_ref()) {
            ValidatedConfig::Nothing => return self.skip(SkipReason::NothingToWrite),
            ValidatedConfig::Invalid => return self.skip(SkipReason::InvalidConfig),
            ValidatedConfig::Entries(entries) => entries,
        };

        self.enter(WritePhase::Gating);
        let eligibility = self.guard.check(&self.context);
        if !eligibility.is_eligible() {
            return self.skip(SkipReason::Ineligible(eligibility));
        }

        self.enter(WritePhase::Resolving);
        let outcomes = join_all(entries.iter().map(|entry| self.resolve(entry))).await;

        self.enter(WritePhase::Writing);
        let mut report = WriteReport::default();
        for (entry, outcome) in entries.into_iter().zip(outcomes) {
            match outcome {
                EntryOutcome::Resolved(value) => {
                    match self.services.cookie_store.set_cookie(&self.context.location, &entry.name, &value, &self.policy) {
                        Ok(()) => report.written.push((entry.name, value)),
                        Err(e) => {
                            self.report(
                                Diagnostic::new(
                                    DiagnosticKind::WriteFailed,
                                    &self.config.tag,
                                    format!("Failed to write cookie {}: {e:#}", entry.name),
                                )
                                .with_cause(e.to_string()),
                            );
                            report.failed.push(entry.name);
                        }
                    }
                }
                EntryOutcome::Empty => report.empty.push(entry.name),
                EntryOutcome::Unsupported => report.unsupported.push(entry.name),
                EntryOutcome::Failed => report.failed.push(entry.name),
            }
        }

        self.enter(WritePhase::Done);
        WriteOutcome::Done(report)
    }

    /// Blocking variant of [`write`](Self::write), driving the future on the current thread.
    ///
    /// The expander must not depend on a tokio runtime being current.
    pub fn write_blocking(&self) -> WriteOutcome {
        pollster::block_on(self.write())
    }

    async fn resolve(&self, entry: &CookieWriteEntry) -> EntryOutcome {
        match MacroKind::parse(&entry.template) {
            MacroKind::QueryParam(_) => {
                match self.services.expander.expand_string_async(&entry.template).await {
                    Ok(value) if value.is_empty() => EntryOutcome::Empty,
                    Ok(value) => EntryOutcome::Resolved(value),
                    Err(e) => self.expansion_failed(&e),
                }
            }
            MacroKind::LinkerParam { linker_name, param_id } => match self.services.linker_reader.get(&linker_name, &param_id) {
                Ok(value) if value.is_empty() => EntryOutcome::Empty,
                Ok(value) => EntryOutcome::Resolved(value),
                Err(e) => self.expansion_failed(&e),
            },
            MacroKind::Unsupported(raw) => {
                self.report(Diagnostic::new(
                    DiagnosticKind::UnsupportedMacro,
                    &self.config.tag,
                    format!("cookie value {raw} not supported. Only QUERY_PARAM and LINKER_PARAM are supported"),
                ));
                EntryOutcome::Unsupported
            }
        }
    }

    /// Reports a failed resolution; the error text is kept as the cause.
    fn expansion_failed(&self, error: &dyn std::error::Error) -> EntryOutcome {
        self.report(
            Diagnostic::new(
                DiagnosticKind::ExpansionFailed,
                &self.config.tag,
                format!("Error expanding cookie string Error: {error}"),
            )
            .with_cause(error.to_string()),
        );
        EntryOutcome::Failed
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.services.reporter.report(&diagnostic);
    }

    fn skip(&self, reason: SkipReason) -> WriteOutcome {
        log::debug!("{} {:?}: {:?}", self.config.tag, WritePhase::Skipped, reason);
        WriteOutcome::Skipped(reason)
    }

    fn enter(&self, phase: WritePhase) {
        log::debug!("{} {:?}", self.config.tag, phase);
    }
}
