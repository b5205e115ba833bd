//! Load worker: one simulated user running scenarios until stopped

use crate::dates::TravelDates;
use crate::gate::RefreshGate;
use crate::scenario::ScenarioSet;
use crate::scenarios::ScenarioRunner;
use crate::stats::ScenarioStats;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use ttload_resilience::StopListener;

/// Settings shared by every worker of a run
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub scenarios: ScenarioSet,
    pub dates: TravelDates,
}

/// Summary of a finished worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub executed: u64,
    pub logged_in: bool,
}

pub struct LoadWorker {
    id: usize,
    runner: ScenarioRunner,
    config: WorkerConfig,
    gate: RefreshGate,
    stats: Arc<ScenarioStats>,
    stop: StopListener,
    rng: StdRng,
}

impl LoadWorker {
    pub fn new(
        id: usize,
        runner: ScenarioRunner,
        config: WorkerConfig,
        gate: RefreshGate,
        stats: Arc<ScenarioStats>,
        stop: StopListener,
    ) -> Self {
        Self {
            id,
            runner,
            config,
            gate,
            stats,
            stop,
            rng: StdRng::seed_from_u64(time_seed().wrapping_add(id as u64)),
        }
    }

    /// Replace the time-based seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Log in, then run scenarios until the stop signal fires.
    ///
    /// A failed login ends the worker without running anything.
    pub async fn run(self) -> WorkerSummary {
        let LoadWorker {
            id,
            runner,
            config,
            gate,
            stats,
            mut stop,
            mut rng,
        } = self;
        let mut summary = WorkerSummary {
            worker_id: id,
            ..WorkerSummary::default()
        };

        if let Err(e) = runner.api().login().await {
            warn!("Worker {} failed to log in: {}", id, e);
            return summary;
        }
        summary.logged_in = true;
        debug!("Worker {} logged in", id);

        while !stop.is_stopped() {
            let travel_date = config.dates.pick(&mut rng);
            let kind = config.scenarios.pick(&mut rng);

            let slot = tokio::select! {
                slot = gate.enter() => match slot {
                    Ok(slot) => slot,
                    Err(e) => {
                        debug!("Worker {} leaving: {}", id, e);
                        break;
                    }
                },
                _ = stop.stopped() => break,
            };

            let outcome = runner.run(kind, travel_date, &mut rng).await;
            drop(slot);

            stats.record(id, kind, &outcome);
            summary.executed += 1;
        }

        info!("Worker {} finished after {} scenarios", id, summary.executed);
        summary
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::OrderCache;
    use crate::testing::{FakeApi, FakeBackend};
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use ttload_resilience::{StopCoordinator, StopReason};

    fn config(mask: &str) -> WorkerConfig {
        WorkerConfig {
            scenarios: ScenarioSet::from_mask(mask).unwrap(),
            dates: TravelDates::new(NaiveDate::from_ymd_opt(2024, 9, 29).unwrap(), 30),
        }
    }

    fn worker(backend: &Arc<FakeBackend>, mask: &str, stop: StopListener, stats: Arc<ScenarioStats>) -> LoadWorker {
        let runner = ScenarioRunner::new(FakeApi::shared(backend), Arc::new(OrderCache::new()), 60);
        LoadWorker::new(0, runner, config(mask), RefreshGate::new(1), stats, stop).with_seed(42)
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_runs_until_stopped() {
        let backend = FakeBackend::new();
        *backend.call_delay.lock() = Duration::from_millis(100);
        let coordinator = Arc::new(StopCoordinator::new());
        let stats = Arc::new(ScenarioStats::new());
        coordinator.stop_after(Duration::from_secs(2));

        let summary = worker(&backend, "00000001", coordinator.listener(), stats.clone())
            .run()
            .await;

        assert!(summary.logged_in);
        assert!(summary.executed >= 19 && summary.executed <= 21, "{}", summary.executed);
        assert_eq!(stats.total(), summary.executed);
        assert!(backend
            .calls()
            .iter()
            .all(|call| call.starts_with("trips:high-speed:Shang Hai -> Su Zhou")));
    }

    #[tokio::test]
    async fn test_failed_login_ends_worker() {
        let backend = FakeBackend::new();
        backend.failed_logins_left.store(1, Ordering::SeqCst);
        let coordinator = StopCoordinator::new();
        let stats = Arc::new(ScenarioStats::new());

        let summary = worker(&backend, "11111111", coordinator.listener(), stats.clone())
            .run()
            .await;

        assert!(!summary.logged_in);
        assert_eq!(summary.executed, 0);
        assert_eq!(stats.total(), 0);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_worker_runs_nothing() {
        let backend = FakeBackend::new();
        let coordinator = StopCoordinator::new();
        coordinator.stop(StopReason::Interrupted);

        let summary = worker(&backend, "11111111", coordinator.listener(), Arc::new(ScenarioStats::new()))
            .run()
            .await;
        assert!(summary.logged_in);
        assert_eq!(summary.executed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_travel_dates_do_not_drift() {
        let backend = FakeBackend::new();
        *backend.call_delay.lock() = Duration::from_millis(10);
        let coordinator = Arc::new(StopCoordinator::new());
        coordinator.stop_after(Duration::from_secs(5));

        worker(&backend, "00000001", coordinator.listener(), Arc::new(ScenarioStats::new()))
            .run()
            .await;

        let base = NaiveDate::from_ymd_opt(2024, 9, 29).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 10, 28).unwrap();
        for call in backend.calls() {
            let date = call.rsplit(':').next().unwrap();
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
            assert!(date >= base && date <= last, "{} out of range", date);
        }
    }
}
