//! TrainTicket REST client for ttload
//!
//! [`TrainTicketClient`] wraps one logged-in user session: the bearer token,
//! the session cookies and every gateway endpoint the load scenarios touch.
//! The load engine only sees the [`TicketApi`] trait, so it can be driven by
//! an in-memory fake in tests.

pub mod api;
pub mod client;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use client::{TicketApi, TrainTicketClient, LOGIN_PATH};
pub use config::ClientConfig;
pub use cookies::SessionCookies;
pub use errors::ApiError;
pub use session::Session;
pub use types::{ApiResponse, ConsignRequest, RebookRequest, Reservation};
