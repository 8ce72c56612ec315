//! Error types for console operations.

use thiserror::Error;

/// Errors that can occur while writing to a console.
#[derive(Debug, Error)]
pub enum Error {
    /// The write template could not be applied to its arguments.
    #[error("Format error: {0}")]
    Format(#[from] jobmail_text::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
