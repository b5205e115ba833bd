//! Background refresh of the shared order cache

use crate::cache::OrderCache;
use crate::error::EngineError;
use crate::gate::RefreshGate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use ttload_config::LoadConfig;
use ttload_core::OrderPartition;
use ttload_http::TicketApi;
use ttload_resilience::{spread_delay, StopListener};

/// Keeps the [`OrderCache`] current while workers run.
///
/// Each cycle drains the [`RefreshGate`], refreshes one partition, releases
/// the gate, logs in again and sleeps `interval + rand(0..jitter)`.
pub struct CacheRefresher {
    api: Arc<dyn TicketApi>,
    cache: Arc<OrderCache>,
    gate: RefreshGate,
    stop: StopListener,
    interval: Duration,
    jitter: Duration,
    next: OrderPartition,
    cycles: u64,
    rng: StdRng,
}

impl CacheRefresher {
    pub fn new(
        api: Arc<dyn TicketApi>,
        cache: Arc<OrderCache>,
        gate: RefreshGate,
        config: &LoadConfig,
        stop: StopListener,
    ) -> Self {
        Self {
            api,
            cache,
            gate,
            stop,
            interval: config.refresh_interval,
            jitter: config.refresh_jitter,
            next: OrderPartition::HighSpeed,
            cycles: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Log in and load both partitions before any worker starts
    pub async fn prime(&mut self) -> Result<(), EngineError> {
        self.api.login().await?;
        for partition in OrderPartition::all() {
            self.refresh(*partition).await;
        }
        info!(
            "Order cache primed: {} high-speed, {} other orders",
            self.cache.len(OrderPartition::HighSpeed),
            self.cache.len(OrderPartition::Other)
        );
        Ok(())
    }

    /// Refresh one partition; failures keep the previous snapshot
    async fn refresh(&self, partition: OrderPartition) {
        match self.api.fetch_orders(partition).await {
            Ok(orders) => {
                let count = orders.len();
                if self.cache.replace(partition, orders) {
                    debug!("Refreshed {} orders: {}", partition, count);
                } else {
                    debug!("No {} orders returned, keeping previous snapshot", partition);
                }
            }
            Err(e) => warn!("Failed to refresh {} orders: {}", partition, e),
        }
    }

    /// Run refresh cycles until the stop signal fires.
    ///
    /// Returns the number of completed cycles.
    pub async fn run(mut self) -> u64 {
        loop {
            let delay = spread_delay(&mut self.rng, self.interval, self.jitter);
            if !self.stop.sleep(delay).await {
                break;
            }

            let guard = tokio::select! {
                guard = self.gate.drain() => match guard {
                    Ok(guard) => guard,
                    Err(e) => {
                        debug!("Refresher leaving: {}", e);
                        break;
                    }
                },
                _ = self.stop.stopped() => break,
            };

            self.refresh(self.next).await;
            drop(guard);

            self.next = self.next.toggled();
            self.cycles += 1;

            if let Err(e) = self.api.login().await {
                warn!("Refresher failed to renew its session: {}", e);
            }
        }

        info!("Cache refresher stopped after {} cycles", self.cycles);
        self.cycles
    }
}
