/// Errors raised by a [`UrlExpander`](crate::expansion::UrlExpander) while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    #[error("The first argument to {macro_name}, the query string param is required")]
    MissingArgument { macro_name: String },

    #[error("Unterminated argument list for {macro_name} in \"{template}\"")]
    UnterminatedArguments { macro_name: String, template: String },

    #[error("Expansion failed: {0}")]
    Other(String),
}

/// Errors raised while parsing a linker value.
///
/// Returned by [`LinkerReader::get`](crate::linker::LinkerReader::get) when a
/// linker is present but cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkerError {
    #[error("Linker value is empty")]
    Empty,

    #[error("Unsupported linker version {0}")]
    UnsupportedVersion(String),

    #[error("Malformed linker value: {0}")]
    Malformed(String),

    #[error("Linker checksum mismatch")]
    ChecksumMismatch,

    #[error("Cannot decode linker param {key}")]
    Decode { key: String },
}
