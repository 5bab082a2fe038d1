//! # Deploy Errors
//!
//! Compilation fails synchronously with [`DeployError::Validation`] or
//! [`DeployError::Packaging`] before any remote call. Deployment fails fast
//! with [`DeployError::Deployment`]. Removal never fails: each rejected
//! delete becomes a [`RemovalError`] value collected in a [`RemovalReport`].

use std::fmt::{Display, Formatter};
use whisk_platform::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    /// Malformed manifest input.
    #[error("{0}")]
    Validation(String),
    /// Local artifact problem: missing handler file, unreadable archive,
    /// unsupported runtime.
    #[error("{0}")]
    Packaging(String),
    /// The platform rejected a create or enable call.
    #[error("Failed to deploy {kind} ({name}) due to error: {message}")]
    Deployment {
        kind: &'static str,
        name: String,
        message: String,
    },
    /// The external binding tool could not be run or reported failure.
    #[error("{0}")]
    ServiceBinding(String),
    /// The manifest file could not be read or parsed.
    #[error("{0}")]
    Config(String),
    #[error("Platform request failed: {0}")]
    Platform(#[from] PlatformError),
}

impl DeployError {
    pub fn validation(message: impl Into<String>) -> Self {
        DeployError::Validation(message.into())
    }

    pub fn packaging(message: impl Into<String>) -> Self {
        DeployError::Packaging(message.into())
    }

    pub fn deployment(kind: &'static str, name: impl Into<String>, err: &PlatformError) -> Self {
        DeployError::Deployment {
            kind,
            name: name.into(),
            message: err.message(),
        }
    }
}

/// A delete the platform rejected during removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalError {
    pub operation: &'static str,
    pub resource: String,
    pub message: String,
}

impl Display for RemovalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to {} ({}) due to error: {}",
            self.operation, self.resource, self.message
        )
    }
}

/// Outcome of a removal run. The run itself always succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub failures: Vec<RemovalError>,
}

impl RemovalReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
