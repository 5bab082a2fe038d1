//! # Platform Errors
//!
//! Every verb on a [`PlatformClient`](crate::PlatformClient) resolves to
//! `Result<_, PlatformError>`. Remote rejections carry the platform's own
//! message text so callers can surface it verbatim.

/// Errors returned by platform clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("Platform store closed")]
    Closed,
    #[error("Platform store dropped response channel")]
    Dropped,
    #[error("The requested resource does not exist: {0}")]
    NotFound(String),
    #[error("resource already exists: {0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Rejected(String),
}

impl PlatformError {
    /// Shorthand for a remote rejection carrying `message`.
    pub fn rejected(message: impl Into<String>) -> Self {
        PlatformError::Rejected(message.into())
    }

    /// The error text as reported to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
