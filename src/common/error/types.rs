//! Unified error types for xpsview.
//!
//! Errors raised by the package layer, the font resolver and the markup
//! readers are folded into a single `Error` so callers see one API.
use thiserror::Error;

/// Main error type for xpsview operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error occurred
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A part the document cannot be loaded without is absent
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Stream or part not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Font loading error
    #[error("Font error: {0}")]
    FontError(String),

    /// Page index past the end of the document
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for xpsview operations.
pub type Result<T> = std::result::Result<T, Error>;
