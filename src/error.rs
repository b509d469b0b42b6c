use std::fmt;
use std::io;
use thiserror::Error;

/// Result type used across the library
pub type Result<T> = std::result::Result<T, StudioError>;

/// Which input was missing when a search was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyInput {
    NoFiles,
    NoKeywords,
}

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyInput::NoFiles => write!(f, "no PDF files loaded"),
            EmptyInput::NoKeywords => write!(f, "no keywords given"),
        }
    }
}

/// Custom error type for studio operations
#[derive(Debug, Error)]
pub enum StudioError {
    /// The byte stream could not be parsed as a PDF
    #[error("cannot parse {name} as PDF: {source}")]
    DocumentParse {
        name: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("empty input: {0}")]
    EmptyInput(EmptyInput),

    /// Search completed without a single matching page
    #[error("no page matched the given keywords")]
    NoMatch,

    /// The selection references a file or page that is not available
    #[error("merge failed: {0}")]
    Merge(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StudioError {
    pub(crate) fn parse(name: &str, source: lopdf::Error) -> Self {
        StudioError::DocumentParse {
            name: name.to_string(),
            source,
        }
    }
}
