//! Asynchronous URL macro expansion.
//!
//! The cookie writer hands `QUERY_PARAM` templates to a [`UrlExpander`]. The
//! expander is free to recognize more macros than the writer does; the writer
//! only decides *which* templates are handed over.

use futures::future::BoxFuture;
use url::Url;

use crate::errors::ExpansionError;
use crate::macros::QUERY_PARAM;

/// Expands macros inside a string.
pub trait UrlExpander: Send + Sync {
    /// Expands every macro found in `template`.
    ///
    /// Rejects with an [`ExpansionError`] when a macro is malformed (for
    /// instance a `QUERY_PARAM` without its required argument).
    fn expand_string_async<'a>(&'a self, template: &'a str) -> BoxFuture<'a, Result<String, ExpansionError>>;
}

/// Expands `QUERY_PARAM(name[, default])` against the query string of a page URL.
///
/// Text around macros is kept verbatim. A missing parameter expands to the
/// default argument, or to the empty string.
#[derive(Debug, Clone)]
pub struct QueryParamExpander {
    page_url: Url,
}

impl QueryParamExpander {
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }

    fn query_value(&self, name: &str) -> Option<String> {
        self.page_url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn expand(&self, template: &str) -> Result<String, ExpansionError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find(QUERY_PARAM) {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + QUERY_PARAM.len()..];

            // QUERY_PARAMS, QUERY_PARAM_X, ... are not this macro
            if after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
                out.push_str(QUERY_PARAM);
                rest = after;
                continue;
            }

            let Some(args) = after.strip_prefix('(') else {
                return Err(ExpansionError::MissingArgument { macro_name: QUERY_PARAM.to_string() });
            };
            let Some(close) = args.find(')') else {
                return Err(ExpansionError::UnterminatedArguments {
                    macro_name: QUERY_PARAM.to_string(),
                    template: template.to_string(),
                });
            };

            let mut parts = args[..close].splitn(2, ',');
            let name = parts.next().unwrap_or_default().trim();
            if name.is_empty() {
                return Err(ExpansionError::MissingArgument { macro_name: QUERY_PARAM.to_string() });
            }
            let default = parts.next().map(str::trim).unwrap_or_default();

            match self.query_value(name) {
                Some(value) => out.push_str(&value),
                None => out.push_str(default),
            }
            rest = &args[close + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl UrlExpander for QueryParamExpander {
    fn expand_string_async<'a>(&'a self, template: &'a str) -> BoxFuture<'a, Result<String, ExpansionError>> {
        Box::pin(async move { self.expand(template) })
    }
}
