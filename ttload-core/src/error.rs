//! Core error types

use thiserror::Error;

/// Errors raised while parsing or validating domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown bursty service: '{0}'. Supported services are: ts-basic-service, ts-cancel-service, ts-seat-service, ts-travel-service")]
    UnknownService(String),

    #[error("Invalid seat type: '{0}' (expected 2 or 3)")]
    InvalidSeatType(String),

    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Invalid route: {0}")]
    InvalidRoute(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
