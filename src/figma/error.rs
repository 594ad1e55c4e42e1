//! Error types for Figma API operations.
//!
//! Messages never include credentials or request headers.

use thiserror::Error;

/// Result type for Figma operations.
pub type FigmaResult<T> = Result<T, FigmaError>;

/// Errors that can occur while fetching data from the Figma API.
#[derive(Debug, Error)]
pub enum FigmaError {
    /// Figma rejected the configured credentials.
    #[error("Figma rejected the credentials (HTTP {status})")]
    Auth {
        /// HTTP status returned by Figma (401 or 403).
        status: u16,
    },

    /// The requested file or node does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// Figma is throttling requests. Callers may retry with backoff.
    #[error("Rate limited by Figma{}", retry_hint(.retry_after))]
    RateLimited {
        /// Seconds to wait, from the `Retry-After` header when present.
        retry_after: Option<u64>,
    },

    /// Network failure or timeout.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// Whether the failure was a timeout.
        timeout: bool,
    },

    /// Figma returned an unexpected status.
    #[error("Figma API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, if any.
        message: String,
    },

    /// The client could not be constructed.
    #[error("Invalid Figma client setup: {message}")]
    Setup {
        /// Description of the problem.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode Figma response: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
}

#[allow(clippy::ref_option)] // thiserror passes fields by reference
fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after.map_or_else(String::new, |secs| format!(" (retry after {secs}s)"))
}

impl FigmaError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller may retry the same request later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport { .. })
    }
}

impl From<reqwest::Error> for FigmaError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the URL in its Display output; strip it so that
        // query parameters never end up in tool results.
        let err = err.without_url();
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        Self::Transport {
            timeout: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display() {
        let err = FigmaError::RateLimited {
            retry_after: Some(30),
        };
        assert_eq!(err.to_string(), "Rate limited by Figma (retry after 30s)");

        let err = FigmaError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "Rate limited by Figma");
    }

    #[test]
    fn not_found_display() {
        let err = FigmaError::not_found("node 1:2 in file abc");
        assert_eq!(err.to_string(), "Not found: node 1:2 in file abc");
    }

    #[test]
    fn retryable_classification() {
        assert!(FigmaError::RateLimited { retry_after: None }.is_retryable());
        assert!(FigmaError::Transport {
            message: "connection reset".to_string(),
            timeout: false,
        }
        .is_retryable());
        assert!(!FigmaError::Auth { status: 403 }.is_retryable());
        assert!(!FigmaError::not_found("file").is_retryable());
    }
}
