//! Creation of per-task API sessions

use crate::error::EngineError;
use std::sync::Arc;
use ttload_http::{ApiError, TicketApi};
use ttload_resilience::StopListener;

/// Opens a fresh, not yet logged-in session for a worker or the refresher.
///
/// Every task gets its own session so tokens and cookies are never shared.
pub trait ApiFactory: Send + Sync {
    fn create(&self, stop: StopListener) -> Result<Arc<dyn TicketApi>, EngineError>;
}

impl<F> ApiFactory for F
where
    F: Fn(StopListener) -> Result<Arc<dyn TicketApi>, ApiError> + Send + Sync,
{
    fn create(&self, stop: StopListener) -> Result<Arc<dyn TicketApi>, EngineError> {
        self(stop).map_err(EngineError::from)
    }
}
