//! TrainTicket client error types

use ttload_resilience::Retryable;

/// Longest response body kept in an error
const MAX_BODY_LEN: usize = 512;

/// Error type for TrainTicket API calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("Invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub(crate) fn status(endpoint: &str, status: u16, body: &str) -> Self {
        let mut body = body.trim().to_string();
        if body.len() > MAX_BODY_LEN {
            let mut cut = MAX_BODY_LEN;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }

        ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        }
    }

    pub(crate) fn unexpected(endpoint: &str, message: impl Into<String>) -> Self {
        ApiError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status code, for errors that carry one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The gateway refused the call with 403
    pub fn is_forbidden(&self) -> bool {
        self.http_status() == Some(403)
    }
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// A failed cancellation attempt.
///
/// Cancellation is retried on every failed status, not only on server-side
/// ones: the cancel service answers 4xx while the order is still settling.
#[derive(Debug)]
pub(crate) struct CancelAttempt(pub ApiError);

impl std::fmt::Display for CancelAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Retryable for CancelAttempt {
    fn is_retryable(&self) -> bool {
        matches!(self.0, ApiError::Network(_) | ApiError::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_retry_on_server_side_failures() {
        assert!(ApiError::status("/cancel", 503, "").is_retryable());
        assert!(ApiError::status("/cancel", 429, "").is_retryable());
        assert!(!ApiError::status("/cancel", 404, "").is_retryable());
        assert!(!ApiError::NotLoggedIn.is_retryable());
        assert!(!ApiError::Rejected {
            endpoint: "/preserve".to_string(),
            message: "no seats".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_cancel_attempts_retry_any_status() {
        assert!(CancelAttempt(ApiError::status("/cancel", 400, "")).is_retryable());
        assert!(CancelAttempt(ApiError::status("/cancel", 409, "")).is_retryable());
        assert!(CancelAttempt(ApiError::status("/cancel", 503, "")).is_retryable());
        assert!(!CancelAttempt(ApiError::NotLoggedIn).is_retryable());
    }

    #[test]
    fn test_forbidden_detection() {
        assert!(ApiError::status("/consigns", 403, "Forbidden").is_forbidden());
        assert!(!ApiError::status("/consigns", 500, "").is_forbidden());
        assert_eq!(ApiError::NotLoggedIn.http_status(), None);
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match ApiError::status("/refresh", 500, &body) {
            ApiError::Status { body, .. } => {
                assert_eq!(body.len(), MAX_BODY_LEN + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
