//! Endpoints outside the load scenarios
//!
//! Read-only probes of the auxiliary services and the burst-injection
//! controls. These live on [`TrainTicketClient`](crate::TrainTicketClient)
//! only; the load engine never calls them.

pub mod burst;
pub mod probe;
