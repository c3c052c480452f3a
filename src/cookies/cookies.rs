//! Cookie core types.
//!
//! This module defines the type-erased [`CookieStoreHandle`], the
//! serializable [`Cookie`] record and the [`ExpirationPolicy`] applied to
//! every cookie the writer sets.
//!
//! # Concurrency model
//! - [`CookieStoreHandle`] is `Arc<dyn CookieStore + Send + Sync>`.
//!   - Stores manage their **own internal synchronization**; the trait methods take `&self`.
//!
//! ```rust
//! use gosub_analytics::cookies::Cookie;
//!
//! let c = Cookie {
//!     name: "_cid".into(),
//!     value: "abc123".into(),
//!     path: Some("/".into()),
//!     domain: Some("example.com".into()),
//!     secure: true,
//!     expires: Some("2026-12-31T23:59:59Z".into()), // RFC 3339
//!     same_site: None,
//!     http_only: false,
//! };
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use url::Url;

use crate::config::WriterConfig;
use crate::cookies::domain::cookie_domain;
use crate::cookies::store::CookieStore;

/// A handle to a cookie store trait.
///
/// Store implementations must be **`Send + Sync` and internally synchronized**,
/// since callers hold only `&self` when invoking trait methods.
pub type CookieStoreHandle = Arc<dyn CookieStore + Send + Sync>;

/// How long a written cookie lives and where it is scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationPolicy {
    pub max_age: Duration,
    /// Scope to the registrable domain (`example.com` for `www.example.com`).
    pub highest_available_domain: bool,
    pub path: String,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::from(&WriterConfig::default())
    }
}

impl From<&WriterConfig> for ExpirationPolicy {
    fn from(config: &WriterConfig) -> Self {
        Self {
            max_age: config.cookie_max_age,
            highest_available_domain: config.highest_available_domain,
            path: config.cookie_path.clone(),
        }
    }
}

/// A cookie as stored/serialized by the stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value.
    pub value: String,

    /// Path scoping (e.g., `"/"`).
    pub path: Option<String>,

    /// Domain scoping. `None` only for locations without a host (e.g. `file:` URLs).
    pub domain: Option<String>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// Expiration timestamp (RFC 3339). Session cookies have `None`.
    pub expires: Option<String>,

    /// SameSite policy (`"Strict"`, `"Lax"`, or `"None"`).
    pub same_site: Option<String>,

    /// Script-written cookies are never http-only, but stores keep the flag for inspection.
    pub http_only: bool,
}

impl Cookie {
    /// Builds the cookie a script on `location` would set for `name=value` under `policy`.
    pub fn for_location(
        location: &Url,
        name: &str,
        value: &str,
        policy: &ExpirationPolicy,
        now: OffsetDateTime,
    ) -> Result<Cookie> {
        let expires = (now + policy.max_age)
            .format(&Rfc3339)
            .context("cannot format cookie expiry")?;

        Ok(Cookie {
            name: name.to_string(),
            value: value.to_string(),
            path: Some(policy.path.clone()),
            domain: cookie_domain(location, policy.highest_available_domain),
            secure: location.scheme() == "https",
            expires: Some(expires),
            same_site: None,
            http_only: false,
        })
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires
            .as_deref()
            .and_then(|e| OffsetDateTime::parse(e, &Rfc3339).ok())
            .is_some_and(|expiry| expiry <= now)
    }

    /// Whether this cookie would be visible to a document at `location`.
    pub fn matches(&self, location: &Url) -> bool {
        let host = location.host_str().unwrap_or_default().to_ascii_lowercase();

        let domain_ok = match &self.domain {
            Some(domain) => host == *domain || host.ends_with(&format!(".{domain}")),
            None => true,
        };
        let path_ok = match &self.path {
            Some(cookie_path) => location.path().starts_with(cookie_path.as_str()),
            None => true,
        };
        let secure_ok = !self.secure || location.scheme() == "https";

        domain_ok && path_ok && secure_ok
    }
}
