//! Conditional cookie writing for an analytics runtime.
//!
//! A [`CookieWriter`] takes a declarative `writeCookies` mapping (cookie name
//! to value template), decides whether the current execution context allows
//! writing, resolves the `QUERY_PARAM` / `LINKER_PARAM` templates and writes
//! the non-empty results into a [`CookieStore`](cookies::CookieStore).

pub mod config;
pub mod context;
pub mod cookies;
pub mod errors;
pub mod expansion;
pub mod linker;
pub mod macros;
pub mod reporter;
pub mod writer;

pub use config::WriterConfig;
pub use context::{EligibilityGuard, ExecutionContext, RuntimeMode};
pub use errors::{ExpansionError, LinkerError};
pub use writer::{CookieWriter, WriteOutcome, WriteReport, WriterServices};
