//! Error types for the load engine

use thiserror::Error;
use ttload_http::ApiError;

/// Load engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid scenario mask '{mask}': {reason}")]
    InvalidScenarioMask { mask: String, reason: String },

    #[error("Unknown scenario: '{0}'")]
    UnknownScenario(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Login failed after {attempts} attempts: {source}")]
    LoginFailed {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error("No trips available for {route} on {date}")]
    NoTrips { route: String, date: String },

    #[error("No contacts registered for the user")]
    NoContacts,

    #[error("No {0} orders found")]
    NoOrders(String),

    #[error("No worker managed to log in")]
    NoActiveWorkers,

    #[error("Refresh gate closed")]
    GateClosed,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
