//! Cookie value templates.
//!
//! A template is only recognized when the *whole* string is one of the
//! supported macro forms:
//!
//! - `QUERY_PARAM(<param>[, <default>])` (or a bare `QUERY_PARAM`), expanded
//!   asynchronously by a [`UrlExpander`](crate::expansion::UrlExpander).
//! - `LINKER_PARAM(<linker>, <id>)`, looked up synchronously through a
//!   [`LinkerReader`](crate::linker::LinkerReader).
//!
//! Everything else is [`MacroKind::Unsupported`]; no partial expansion is
//! attempted.

pub const QUERY_PARAM: &str = "QUERY_PARAM";
pub const LINKER_PARAM: &str = "LINKER_PARAM";

/// How a recognized template gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Async,
    Sync,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroKind {
    /// Query string parameter; the name is empty when the template has no argument.
    QueryParam(String),
    LinkerParam { linker_name: String, param_id: String },
    Unsupported(String),
}

impl MacroKind {
    pub fn parse(template: &str) -> MacroKind {
        if template == QUERY_PARAM {
            return MacroKind::QueryParam(String::new());
        }

        if let Some(args) = call_args(template, QUERY_PARAM) {
            let name = args.split(',').next().unwrap_or_default().trim();
            return MacroKind::QueryParam(name.to_string());
        }

        if let Some(args) = call_args(template, LINKER_PARAM) {
            if let Some((linker_name, param_id)) = args.split_once(',') {
                let (linker_name, param_id) = (linker_name.trim(), param_id.trim());
                if !linker_name.is_empty() && !param_id.is_empty() && !param_id.contains(',') {
                    return MacroKind::LinkerParam {
                        linker_name: linker_name.to_string(),
                        param_id: param_id.to_string(),
                    };
                }
            }
        }

        MacroKind::Unsupported(template.to_string())
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            MacroKind::QueryParam(_) => Strategy::Async,
            MacroKind::LinkerParam { .. } => Strategy::Sync,
            MacroKind::Unsupported(_) => Strategy::None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, MacroKind::Unsupported(_))
    }
}

/// Returns the text between `NAME(` and the final `)` when `template` is exactly such a call.
///
/// Arguments never contain parentheses, so `NAME(a)-x(b)` is not a call.
fn call_args<'a>(template: &'a str, name: &str) -> Option<&'a str> {
    let args = template
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')?;
    if args.contains(['(', ')']) {
        return None;
    }
    Some(args)
}
