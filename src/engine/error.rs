// SPDX-License-Identifier: MIT

//! Typed error handling for featureflags-rs
//!
//! Refresh failures never reach evaluation calls; they are returned from
//! explicit `load`/`sync` calls or logged by the background loop. Lookup and
//! type failures surface only through the error-returning accessors.

use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum FlagsError {
    /// Initial load exchange failed; local state was left untouched
    #[error("can not load flags: {0}")]
    Load(#[source] TransportError),

    /// Periodic sync exchange failed; local state was left untouched
    #[error("can not sync flags: {0}")]
    Sync(#[source] TransportError),

    /// Value is not known to the client
    #[error("value {name} not found")]
    ValueNotFound { name: String },

    /// Evaluated value does not have the requested shape
    #[error("value {name} cannot be cast to {expected} (type: {actual})")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Configuration errors (missing env vars, invalid URL, unreadable defaults)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures of a single round-trip with the remote authority
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or client-level HTTP failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("http request to {url} failed with status: {status}")]
    Status { url: String, status: u16 },

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure reported by a custom transport
    #[error("{0}")]
    Other(String),
}

impl FlagsError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn wrong_type(name: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self::WrongType {
            name: name.into(),
            expected,
            actual,
        }
    }
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FlagsError>;
