//! Cookie writer configuration.
//!
//! `WriterConfig` controls the ambient behaviour of a
//! [`CookieWriter`](crate::writer::CookieWriter): how diagnostics are tagged,
//! how long written cookies live and on which domain they land, and which
//! origins are considered viewer/proxy origins.
//!
//! It is *not* the analytics configuration itself (the `writeCookies` mapping),
//! which is supplied per writer as JSON.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use gosub_analytics::config::WriterConfig;
//! let cfg = WriterConfig::default();
//! assert_eq!(cfg.tag, "[amp-analytics/cookie-writer]");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use std::time::Duration;
//! use gosub_analytics::config::WriterConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = WriterConfig::builder()
//!     .cookie_max_age(Duration::from_secs(30 * 24 * 60 * 60))
//!     .highest_available_domain(false)
//!     .proxy_origin_suffix("proxy.example.net")
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`WriterConfigError`] for a zero max age, an
//! empty tag or a cookie path not starting with `/`.

use std::time::Duration;

/// Tag prepended to every diagnostic message.
pub const DEFAULT_TAG: &str = "[amp-analytics/cookie-writer]";

/// Lifetime of cookies written by the writer (one year).
pub const DEFAULT_COOKIE_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Hosts (and their subdomains) that serve pages through a caching proxy.
pub const DEFAULT_PROXY_ORIGIN_SUFFIXES: &[&str] =
    &["cdn.ampproject.org", "amp.cloudflare.com", "bing-amp.com"];

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Prefix for diagnostics, e.g. `[amp-analytics/cookie-writer]`.
    pub tag: String,
    /// How long a written cookie stays valid.
    pub cookie_max_age: Duration,
    /// Scope cookies to the registrable domain instead of the exact host.
    pub highest_available_domain: bool,
    /// Path attribute of written cookies.
    pub cookie_path: String,
    /// Proxy/viewer host suffixes used by the default viewer detector.
    pub proxy_origin_suffixes: Vec<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            cookie_max_age: DEFAULT_COOKIE_MAX_AGE,
            highest_available_domain: true,
            cookie_path: "/".to_string(),
            proxy_origin_suffixes: DEFAULT_PROXY_ORIGIN_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl WriterConfig {
    pub fn builder() -> WriterConfigBuilder {
        WriterConfigBuilder::default()
    }
}

/// Builder for [`WriterConfig`].
#[derive(Debug, Clone, Default)]
pub struct WriterConfigBuilder {
    inner: WriterConfig,
}

impl WriterConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut WriterConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn tag<S: Into<String>>(self, tag: S) -> Self { self.map(|c| c.tag = tag.into()) }
    pub fn cookie_max_age(self, age: Duration) -> Self { self.map(|c| c.cookie_max_age = age) }
    pub fn highest_available_domain(self, on: bool) -> Self { self.map(|c| c.highest_available_domain = on) }
    pub fn cookie_path<S: Into<String>>(self, path: S) -> Self { self.map(|c| c.cookie_path = path.into()) }

    /// Adds one proxy host suffix to the defaults.
    pub fn proxy_origin_suffix<S: Into<String>>(self, suffix: S) -> Self {
        self.map(|c| c.proxy_origin_suffixes.push(suffix.into()))
    }

    /// Replaces all proxy host suffixes.
    pub fn proxy_origin_suffixes<I, S>(self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|c| c.proxy_origin_suffixes = suffixes.into_iter().map(Into::into).collect())
    }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut WriterConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<WriterConfig, WriterConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriterConfigError {
    #[error("cookie_max_age must be greater than zero")]
    ZeroMaxAge,
    #[error("tag must not be empty")]
    EmptyTag,
    #[error("cookie_path \"{0}\" must start with '/'")]
    InvalidCookiePath(String),
}

fn validate(c: &WriterConfig) -> Result<(), WriterConfigError> {
    if c.cookie_max_age.is_zero() {
        return Err(WriterConfigError::ZeroMaxAge);
    }
    if c.tag.trim().is_empty() {
        return Err(WriterConfigError::EmptyTag);
    }
    if !c.cookie_path.starts_with('/') {
        return Err(WriterConfigError::InvalidCookiePath(c.cookie_path.clone()));
    }
    Ok(())
}
