//! Load test orchestration

use crate::cache::OrderCache;
use crate::dates::TravelDates;
use crate::error::EngineError;
use crate::factory::ApiFactory;
use crate::gate::RefreshGate;
use crate::refresher::CacheRefresher;
use crate::scenario::{ScenarioKind, ScenarioSet};
use crate::scenarios::{ScenarioOutcome, ScenarioRunner};
use crate::stats::{ScenarioStats, StatsReport};
use crate::worker::{LoadWorker, WorkerConfig};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use ttload_config::LoadConfig;
use ttload_core::OrderPartition;
use ttload_http::TicketApi;
use ttload_resilience::{StopCoordinator, StopReason};

/// What a load test runs
#[derive(Debug, Clone)]
pub struct LoadTestSettings {
    pub threads: usize,
    pub duration: Duration,
    pub base_date: NaiveDate,
    pub scenarios: ScenarioSet,
    pub load: LoadConfig,
}

impl LoadTestSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.threads == 0 {
            return Err(EngineError::InvalidSettings(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.threads > u32::MAX as usize {
            return Err(EngineError::InvalidSettings(format!(
                "thread count {} is too large",
                self.threads
            )));
        }
        if self.duration.is_zero() {
            return Err(EngineError::InvalidSettings(
                "duration must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dates(&self) -> TravelDates {
        TravelDates::new(self.base_date, self.load.date_spread_days)
    }
}

/// N workers plus one cache refresher, run for a fixed duration.
///
/// The refresher primes the order cache before any worker starts. The run
/// ends when the deadline passes, the shared stop signal fires, or every
/// worker has exited.
pub struct LoadTest {
    settings: LoadTestSettings,
    factory: Arc<dyn ApiFactory>,
    stop: Arc<StopCoordinator>,
}

impl LoadTest {
    pub fn new(settings: LoadTestSettings, factory: Arc<dyn ApiFactory>) -> Self {
        Self {
            settings,
            factory,
            stop: Arc::new(StopCoordinator::new()),
        }
    }

    /// Share a stop signal, e.g. one fired on Ctrl-C
    pub fn with_stop(mut self, stop: Arc<StopCoordinator>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> Arc<StopCoordinator> {
        Arc::clone(&self.stop)
    }

    pub async fn run(self) -> Result<StatsReport, EngineError> {
        self.settings.validate()?;
        let settings = &self.settings;
        let threads = settings.threads as u32;

        info!(
            "Starting load test: {} workers for {:?}, scenarios {}",
            settings.threads, settings.duration, settings.scenarios
        );

        let cache = Arc::new(OrderCache::new());
        let gate = RefreshGate::new(threads);

        let mut refresher = CacheRefresher::new(
            self.factory.create(self.stop.listener())?,
            Arc::clone(&cache),
            gate.clone(),
            &settings.load,
            self.stop.listener(),
        );
        refresher.prime().await?;
        let refresher = tokio::spawn(refresher.run());

        let stats = Arc::new(ScenarioStats::new());
        let deadline = self.stop.stop_after(settings.duration);
        let config = WorkerConfig {
            scenarios: settings.scenarios.clone(),
            dates: settings.dates(),
        };

        let mut workers = JoinSet::new();
        for id in 0..settings.threads {
            let api = match self.factory.create(self.stop.listener()) {
                Ok(api) => api,
                Err(e) => {
                    self.stop.stop(StopReason::Completed);
                    gate.close();
                    return Err(e);
                }
            };
            let runner = ScenarioRunner::new(api, Arc::clone(&cache), settings.load.high_speed_weight);
            let worker = LoadWorker::new(
                id,
                runner,
                config.clone(),
                gate.clone(),
                Arc::clone(&stats),
                self.stop.listener(),
            );
            workers.spawn(worker.run());
        }

        let mut logged_in = 0;
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(summary) => {
                    debug!(
                        "Worker {} done: {} scenarios",
                        summary.worker_id, summary.executed
                    );
                    if summary.logged_in {
                        logged_in += 1;
                    }
                }
                Err(e) => warn!("Worker task failed: {}", e),
            }
        }

        // Workers also end early when none of them could log in
        self.stop.stop(StopReason::Completed);
        gate.close();

        match refresher.await {
            Ok(cycles) => debug!("Refresher ran {} cycles", cycles),
            Err(e) => warn!("Refresher task failed: {}", e),
        }
        if let Err(e) = deadline.await {
            warn!("Deadline task failed: {}", e);
        }

        if logged_in == 0 {
            return Err(EngineError::NoActiveWorkers);
        }

        let report = stats.report();
        info!(
            "Load test finished: {} scenarios in {:.2} seconds",
            report.total_executed(),
            report.duration_secs
        );
        Ok(report)
    }
}

/// Log in, load the order cache and run one scenario.
///
/// Handy for checking a single flow against a live backend.
pub async fn run_single(
    api: Arc<dyn TicketApi>,
    kind: ScenarioKind,
    travel_date: NaiveDate,
    high_speed_weight: u32,
) -> Result<ScenarioOutcome, EngineError> {
    api.login().await?;

    let cache = Arc::new(OrderCache::new());
    for partition in OrderPartition::all() {
        cache.replace(*partition, api.fetch_orders(*partition).await?);
    }

    let runner = ScenarioRunner::new(api, cache, high_speed_weight);
    let mut rng = StdRng::from_entropy();
    Ok(runner.run(kind, travel_date, &mut rng).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, FakeBackend};
    use std::sync::atomic::Ordering;
    use ttload_core::OrderStatus;
    use ttload_http::ApiError;
    use ttload_resilience::StopListener;

    fn factory(backend: &Arc<FakeBackend>) -> Arc<dyn ApiFactory> {
        let backend = Arc::clone(backend);
        Arc::new(move |_stop: StopListener| -> Result<Arc<dyn TicketApi>, ApiError> {
            Ok(FakeApi::shared(&backend))
        })
    }

    fn settings(threads: usize, seconds: u64, mask: &str) -> LoadTestSettings {
        LoadTestSettings {
            threads,
            duration: Duration::from_secs(seconds),
            base_date: NaiveDate::from_ymd_opt(2024, 9, 29).unwrap(),
            scenarios: ScenarioSet::from_mask(mask).unwrap(),
            load: LoadConfig::default(),
        }
    }

    fn seeded_backend() -> Arc<FakeBackend> {
        let backend = FakeBackend::new();
        backend.set_orders(
            OrderPartition::HighSpeed,
            (0..20)
                .map(|i| FakeBackend::order(&format!("h-{}", i), OrderStatus::from(i % 3)))
                .collect(),
        );
        backend.set_orders(
            OrderPartition::Other,
            (0..20)
                .map(|i| FakeBackend::order(&format!("o-{}", i), OrderStatus::from(i % 3)))
                .collect(),
        );
        backend
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_test_counts_every_scenario() {
        let backend = seeded_backend();
        *backend.call_delay.lock() = Duration::from_millis(50);

        let report = LoadTest::new(settings(4, 90, "11111111"), factory(&backend))
            .run()
            .await
            .unwrap();

        assert!(report.total_executed() > 0);
        assert_eq!(report.workers.len(), 4);
        assert_eq!(
            report.global.iter().map(|line| line.executed).sum::<u64>(),
            report.total_executed()
        );
        assert!(report.duration_secs >= 90.0);
        // Refresher plus four workers
        assert!(backend.logins.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_never_overlaps_scenarios() {
        let backend = seeded_backend();
        *backend.call_delay.lock() = Duration::from_millis(40);

        let report = LoadTest::new(settings(6, 120, "11111111"), factory(&backend))
            .run()
            .await
            .unwrap();

        assert!(report.total_executed() > 0);
        // Two priming fetches plus at least three refresh cycles
        assert!(backend.fetches.load(Ordering::SeqCst) >= 5);
        assert_eq!(backend.overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_signal_ends_run_early() {
        let backend = seeded_backend();
        *backend.call_delay.lock() = Duration::from_millis(10);
        let stop = Arc::new(StopCoordinator::new());

        let test = LoadTest::new(settings(2, 3600, "00000001"), factory(&backend)).with_stop(stop.clone());
        let handle = tokio::spawn(test.run());
        tokio::time::sleep(Duration::from_secs(5)).await;
        stop.stop(StopReason::Interrupted);

        let report = handle.await.unwrap().unwrap();
        assert!(report.duration_secs < 3600.0);
        assert_eq!(stop.reason(), Some(StopReason::Interrupted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_login_failure_aborts() {
        let backend = seeded_backend();
        backend.failed_logins_left.store(1, Ordering::SeqCst);

        let result = LoadTest::new(settings(2, 10, "11111111"), factory(&backend))
            .run()
            .await;
        assert!(matches!(result, Err(EngineError::Api(_))));
    }

    #[tokio::test]
    async fn test_settings_validation() {
        let backend = seeded_backend();
        let result = LoadTest::new(settings(0, 10, "11111111"), factory(&backend))
            .run()
            .await;
        assert!(matches!(result, Err(EngineError::InvalidSettings(_))));

        let mut zero_duration = settings(1, 10, "11111111");
        zero_duration.duration = Duration::ZERO;
        assert!(zero_duration.validate().is_err());
    }

    #[tokio::test]
    async fn test_run_single_uses_primed_cache() {
        let backend = seeded_backend();
        let date = NaiveDate::from_ymd_opt(2024, 9, 29).unwrap();

        let outcome = run_single(FakeApi::shared(&backend), ScenarioKind::QueryAndCollect, date, 60)
            .await
            .unwrap();
        assert!(outcome.is_completed(), "{}", outcome);
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(backend.calls_starting_with("collect").len(), 1);
    }
}
