//! Error types for the transpdf library.

use std::io;
use thiserror::Error;

/// Result type alias for transpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF translation.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// No extractable text was found in the document.
    #[error("No text extracted from PDF")]
    NoText,

    /// Invalid engine or provider configuration, detected at setup time.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Translation provider failure (after retries were exhausted).
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP transport failure when talking to a provider.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The requested model does not exist or is unsupported.
    #[error("Model '{0}' not found or unsupported")]
    ModelNotFound(String),

    /// Unknown provider name.
    #[error("Unknown provider '{0}' (available: {1})")]
    UnknownProvider(String, String),

    /// Error while writing the output document.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Http(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Error::Http(format!("failed to connect: {err}"))
        } else {
            Error::Http(err.to_string())
        }
    }
}
