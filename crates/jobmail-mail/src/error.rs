//! Error types for message composition and delivery.

use std::io;

/// Result type alias for composition and settings operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building messages or loading settings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed address in a recipient list.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Header name the provider sets itself.
    #[error("Header {0} is reserved and cannot be set")]
    ReservedHeader(String),

    /// I/O error (settings file, runtime startup).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Settings file is not valid JSON.
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file is valid JSON but not a flat object.
    #[error("Invalid settings file: {0}")]
    Settings(String),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure reason returned by a transport.
///
/// `Ok(())` from a send means the provider accepted the message (or the
/// caller chose not to wait for the answer). The `Display` text of this
/// error is the human-readable reason written to the console.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Message has no `to` address.
    #[error("No recipients")]
    NoRecipients,

    /// No provider API key could be resolved.
    #[error("Missing SendGrid API key (SendGridApiKey)")]
    MissingApiKey,

    /// Provider answered with a non-success status.
    #[error("Provider rejected the message with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the provider.
        body: String,
    },

    /// Request could not be delivered.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Message could not be serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Send task ended without reporting a result.
    #[error("Send task ended without a result")]
    Interrupted,
}

impl SendError {
    /// Creates a rejection from a status code and response body.
    #[must_use]
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Returns true if the provider rejected the request as invalid (4xx).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status >= 400 && *status < 500)
    }

    /// Returns true if the failure may go away on retry (5xx or network).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => *status >= 500,
            Self::Http(_) | Self::Interrupted => true,
            _ => false,
        }
    }
}
