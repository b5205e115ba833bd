//! Drain barrier between running scenarios and cache refreshes
//!
//! Each worker holds one permit for the length of a scenario. The refresher
//! takes every permit at once, which waits for the scenarios in flight and,
//! because the semaphore is fair, holds back scenarios that arrive later.

use crate::error::EngineError;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// N-permit semaphore shared by the workers and the refresher
#[derive(Debug, Clone)]
pub struct RefreshGate {
    semaphore: Arc<Semaphore>,
    slots: u32,
}

impl RefreshGate {
    /// A gate for `slots` workers
    pub fn new(slots: u32) -> Self {
        let slots = slots.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(slots as usize)),
            slots,
        }
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    /// Permits not held by anyone
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot to run one scenario in
    pub async fn enter(&self) -> Result<SemaphorePermit<'_>, EngineError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| EngineError::GateClosed)
    }

    /// Wait until no scenario is running; all slots return when the guard drops
    pub async fn drain(&self) -> Result<SemaphorePermit<'_>, EngineError> {
        self.semaphore
            .acquire_many(self.slots)
            .await
            .map_err(|_| EngineError::GateClosed)
    }

    /// Fail every pending and future `enter` and `drain`
    pub fn close(&self) {
        self.semaphore.close();
    }
}
