use std::sync::Arc;

use url::Url;

use crate::context::ViewerDetector;
use crate::cookies::CookieStoreHandle;
use crate::expansion::{QueryParamExpander, UrlExpander};
use crate::linker::{DefaultLinkerReader, LinkerFingerprint, LinkerReader};
use crate::reporter::{LogReporter, Reporter};

/// Collaborators of a [`CookieWriter`](crate::writer::CookieWriter).
///
/// All services are passed in explicitly; the writer never looks anything up
/// from ambient state.
#[derive(Clone)]
pub struct WriterServices {
    /// Where resolved cookies are written
    pub cookie_store: CookieStoreHandle,
    /// Asynchronous expansion of `QUERY_PARAM` templates
    pub expander: Arc<dyn UrlExpander>,
    /// Synchronous lookup of `LINKER_PARAM` templates
    pub linker_reader: Arc<dyn LinkerReader>,
    /// Receives diagnostics
    pub reporter: Arc<dyn Reporter>,
    /// Decides whether the page is served by a viewer/proxy. When `None`, the writer uses a
    /// [`ProxyOriginDetector`](crate::context::ProxyOriginDetector) built from its [`WriterConfig`](crate::config::WriterConfig).
    pub viewer_detector: Option<Arc<dyn ViewerDetector>>,
}

impl WriterServices {
    /// Services reporting through a [`LogReporter`].
    pub fn new(
        cookie_store: CookieStoreHandle,
        expander: Arc<dyn UrlExpander>,
        linker_reader: Arc<dyn LinkerReader>,
    ) -> Self {
        Self {
            cookie_store,
            expander,
            linker_reader,
            reporter: Arc::new(LogReporter),
            viewer_detector: None,
        }
    }

    /// The stock services for a page at `page_url`: query parameters and linkers are read from
    /// that URL.
    pub fn for_page(cookie_store: CookieStoreHandle, page_url: &Url, fingerprint: LinkerFingerprint) -> Self {
        Self::new(
            cookie_store,
            Arc::new(QueryParamExpander::new(page_url.clone())),
            Arc::new(DefaultLinkerReader::new(page_url.clone(), fingerprint)),
        )
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_viewer_detector(mut self, detector: Arc<dyn ViewerDetector>) -> Self {
        self.viewer_detector = Some(detector);
        self
    }
}
