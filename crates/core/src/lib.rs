//! Shared primitives for all Rust crates in Summitdesk.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Summitdesk crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Upstream failures are folded into a small taxonomy so that callers can
/// react to the shape of a failure (retry, skip, surface) without knowing
/// which Roblox endpoint produced it.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream request-rate ceiling hit (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Upstream returned a non-retryable failure.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a retry of the same operation may succeed.
    ///
    /// Only rate-limit responses are considered transient; every other
    /// category propagates immediately.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}
