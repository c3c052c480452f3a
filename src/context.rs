//! Execution context and cookie write eligibility.
//!
//! Whether cookies may be written depends on *where* the writer runs:
//!
//! - inside a friendly embedded frame (an ancestor of the writing element
//!   carries [`FRIENDLY_EMBED_MARKER`]): no,
//! - as an inabox ad ([`RuntimeMode::Inabox`]): no,
//! - on a viewer/proxy origin (decided by a [`ViewerDetector`]): no,
//! - otherwise: yes.
//!
//! Ineligibility is an expected mode of operation and never reported as an error.

use std::sync::Arc;
use url::Url;

/// Marker class carried by the container of a friendly embedded frame.
pub const FRIENDLY_EMBED_MARKER: &str = "i-amphtml-fie";

/// The mode the runtime is executing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    /// A regular, full page.
    #[default]
    Single,
    /// The whole content of an ad slot.
    Inabox,
    /// A document embedded in a shadow root by a host application.
    Shadow,
}

/// Read-only view of the host environment, as seen by one writer.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Location of the document the writer runs in.
    pub location: Url,
    pub runtime_mode: RuntimeMode,
    /// Marker classes of the writing element's ancestors, nearest first.
    pub ancestor_markers: Vec<Vec<String>>,
}

impl ExecutionContext {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            runtime_mode: RuntimeMode::default(),
            ancestor_markers: Vec::new(),
        }
    }

    pub fn with_runtime_mode(mut self, mode: RuntimeMode) -> Self {
        self.runtime_mode = mode;
        self
    }

    /// Appends an ancestor (further away than the ones already added) with the given classes.
    pub fn with_ancestor<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestor_markers.push(classes.into_iter().map(Into::into).collect());
        self
    }

    /// True when any ancestor is the container of a friendly embedded frame.
    pub fn in_friendly_embed(&self) -> bool {
        self.ancestor_markers
            .iter()
            .any(|classes| classes.iter().any(|c| c == FRIENDLY_EMBED_MARKER))
    }
}

/// Decides whether a location is served through a viewer or caching proxy.
pub trait ViewerDetector: Send + Sync {
    fn is_proxy_origin(&self, location: &Url) -> bool;
}

/// Matches `https` locations on a known proxy host or one of its subdomains.
#[derive(Debug, Clone)]
pub struct ProxyOriginDetector {
    suffixes: Vec<String>,
}

impl ProxyOriginDetector {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }
}

impl ViewerDetector for ProxyOriginDetector {
    fn is_proxy_origin(&self, location: &Url) -> bool {
        if location.scheme() != "https" {
            return false;
        }
        let Some(host) = location.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.suffixes
            .iter()
            .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
    }
}

/// Why writing is (not) allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    FriendlyEmbed,
    Inabox,
    ViewerProxy,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Pure, synchronous eligibility check.
#[derive(Clone)]
pub struct EligibilityGuard {
    viewer_detector: Arc<dyn ViewerDetector>,
}

impl EligibilityGuard {
    pub fn new(viewer_detector: Arc<dyn ViewerDetector>) -> Self {
        Self { viewer_detector }
    }

    pub fn check(&self, ctx: &ExecutionContext) -> Eligibility {
        if ctx.in_friendly_embed() {
            return Eligibility::FriendlyEmbed;
        }
        if ctx.runtime_mode == RuntimeMode::Inabox {
            return Eligibility::Inabox;
        }
        if self.viewer_detector.is_proxy_origin(&ctx.location) {
            return Eligibility::ViewerProxy;
        }
        Eligibility::Eligible
    }

    pub fn is_eligible(&self, ctx: &ExecutionContext) -> bool {
        self.check(ctx).is_eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PROXY_ORIGIN_SUFFIXES;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn guard() -> EligibilityGuard {
        EligibilityGuard::new(Arc::new(ProxyOriginDetector::new(DEFAULT_PROXY_ORIGIN_SUFFIXES.iter().copied())))
    }

    struct Always(bool);

    impl ViewerDetector for Always {
        fn is_proxy_origin(&self, _location: &Url) -> bool {
            self.0
        }
    }

    #[test]
    fn top_level_publisher_page_is_eligible() {
        let ctx = ExecutionContext::new(url("https://www.example.com/article"));
        assert_eq!(guard().check(&ctx), Eligibility::Eligible);
        assert!(guard().is_eligible(&ctx));
    }

    #[test]
    fn friendly_embed_ancestor_is_ineligible() {
        let ctx = ExecutionContext::new(url("https://www.example.com/"))
            .with_ancestor(["wrapper"])
            .with_ancestor(["foo", FRIENDLY_EMBED_MARKER]);
        assert!(ctx.in_friendly_embed());
        assert_eq!(guard().check(&ctx), Eligibility::FriendlyEmbed);
    }

    #[test]
    fn inabox_is_ineligible() {
        let ctx = ExecutionContext::new(url("https://www.example.com/")).with_runtime_mode(RuntimeMode::Inabox);
        assert_eq!(guard().check(&ctx), Eligibility::Inabox);

        let ctx = ExecutionContext::new(url("https://www.example.com/")).with_runtime_mode(RuntimeMode::Shadow);
        assert!(guard().is_eligible(&ctx));
    }

    #[test]
    fn proxy_origin_detection() {
        let d = ProxyOriginDetector::new(DEFAULT_PROXY_ORIGIN_SUFFIXES.iter().copied());
        assert!(d.is_proxy_origin(&url("https://www-example-com.cdn.ampproject.org")));
        assert!(d.is_proxy_origin(&url("https://cdn.ampproject.org/c/s/example.com")));
        assert!(d.is_proxy_origin(&url("https://WWW-EXAMPLE-COM.bing-amp.com/")));
        assert!(!d.is_proxy_origin(&url("http://www-example-com.cdn.ampproject.org")));
        assert!(!d.is_proxy_origin(&url("https://notcdn.ampproject.org.example.com")));
        assert!(!d.is_proxy_origin(&url("https://evilcdn.ampproject.org")));
        assert!(!d.is_proxy_origin(&url("file:///tmp/page.html")));
    }

    #[test]
    fn viewer_check_uses_injected_detector() {
        let ctx = ExecutionContext::new(url("https://www.example.com/"));
        let g = EligibilityGuard::new(Arc::new(Always(true)));
        assert_eq!(g.check(&ctx), Eligibility::ViewerProxy);
        let g = EligibilityGuard::new(Arc::new(Always(false)));
        assert_eq!(g.check(&ctx), Eligibility::Eligible);
    }
}
