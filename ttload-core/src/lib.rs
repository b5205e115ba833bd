//! Core domain types for the TrainTicket load generator
//!
//! This crate contains the vocabulary shared by the HTTP client and the
//! load engine: orders and their lifecycle, train kinds, routes, seat types
//! and the services that accept burst parameters. It has minimal
//! dependencies and no I/O.

pub mod error;
pub mod order;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CoreError, Result};
pub use order::{OrderPartition, OrderRecord, OrderStatus};
pub use types::{
    parse_date, AdvancedSearch, BurstParams, BurstyService, PlacePair, SeatType, TrainKind, TripSearch,
    DATE_FORMAT, DATE_TIME_FORMAT,
};
