//! Error types for visreg-dl
//!
//! This module provides error handling for the library, including:
//! - Protocol errors (malformed handle URLs, unexpected response shapes)
//! - Transport errors (network-level send failures, retried with a budget)
//! - Terminal long-request failures (expired jobs, unclassified statuses)

use thiserror::Error;

/// Result type alias for visreg-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for visreg-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// A URL or response did not have the shape the service contract promises
    /// (e.g., no batch/session ids in the results-handle URL, a 202 without a
    /// `Location` header). Never retried.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Network-level failure while sending a request. Send attempts are retried
    /// up to the configured budget before this surfaces.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered `410 Gone`: the long-running job no longer exists
    #[error("the server task has gone")]
    JobExpired,

    /// The service answered with a status code outside the long-request contract
    #[error("unknown status during long request: {0}")]
    UnknownStatus(u16),

    /// I/O error while creating directories or writing artifact files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session metadata document could not be parsed
    #[error("malformed session document: {0}")]
    Json(#[from] serde_json::Error),
}
