//! Typed errors for the session and the completion interface.

use thiserror::Error;

/// Errors a caller of [`crate::ChatSession`] can see. Both leave the session
/// untouched; completion failures are never surfaced here, they become an
/// error-status message in the log instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("message text is empty")]
    EmptyInput,

    #[error("a completion request is already in flight")]
    RequestInFlight,
}

/// Failure of the remote completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion response contained no choices")]
    MalformedResponse,
}
