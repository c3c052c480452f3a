//! Cookie store infrastructure.
//!
//! A **cookie store** is the host's cookie storage primitive as seen by the
//! writer: it persists a name/value pair for a document location under an
//! [`ExpirationPolicy`].
//!
//! This module exports two reference implementations:
//! - [`InMemoryCookieStore`]: no persistence (tests, private sessions).
//! - [`JsonCookieStore`]: file-backed JSON store.
//!
//! ## Design notes
//! - Implementations must be `Send + Sync` and safe for concurrent access.
//! - `set_cookie` is synchronous from the caller's viewpoint and idempotent:
//!   writing the same name twice keeps the last value.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use gosub_analytics::cookies::{CookieStoreHandle, JsonCookieStore};
//!
//! let store: CookieStoreHandle = Arc::new(JsonCookieStore::open("cookies.json").unwrap());
//! ```
mod in_memory;
mod json;

use anyhow::Result;
use url::Url;

use crate::cookies::{Cookie, ExpirationPolicy};

pub use in_memory::InMemoryCookieStore;
pub use json::JsonCookieStore;

pub trait CookieStore: Send + Sync {
    /// Persists `name=value` as set by a document at `location`.
    fn set_cookie(&self, location: &Url, name: &str, value: &str, policy: &ExpirationPolicy) -> Result<()>;

    /// Returns the value of cookie `name` visible to `location`, if any.
    fn get_cookie(&self, location: &Url, name: &str) -> Option<String>;

    /// Returns all unexpired cookies visible to `location`.
    ///
    /// This is primarily intended for diagnostics/inspection.
    fn cookies_for(&self, location: &Url) -> Vec<Cookie>;

    /// Removes all cookies from the store.
    fn clear(&self) -> Result<()>;
}
