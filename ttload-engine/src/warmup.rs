//! Warm-up: fill the backend with orders in every lifecycle state
//!
//! Workers share four quotas filled in order: unpaid, paid, collected,
//! consigned. A worker claims a slot before creating an order and gives it
//! back when the creation fails, so concurrent workers never overshoot.

use crate::dates::TravelDates;
use crate::error::EngineError;
use crate::factory::ApiFactory;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use ttload_config::WarmupConfig;
use ttload_core::{parse_date, OrderPartition, OrderRecord, OrderStatus, SeatType, TrainKind};
use ttload_http::{ApiError, Reservation, TicketApi};
use ttload_resilience::{RetryExecutor, RetryPolicy, StopCoordinator, StopListener, StopReason};

/// Lifecycle state a warm-up order is driven to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderClass {
    Unpaid,
    Paid,
    Collected,
    Consigned,
}

impl OrderClass {
    /// Fill order of the quotas
    pub fn all() -> &'static [OrderClass; 4] {
        &[
            OrderClass::Unpaid,
            OrderClass::Paid,
            OrderClass::Collected,
            OrderClass::Consigned,
        ]
    }

    fn index(&self) -> usize {
        match self {
            OrderClass::Unpaid => 0,
            OrderClass::Paid => 1,
            OrderClass::Collected => 2,
            OrderClass::Consigned => 3,
        }
    }
}

impl fmt::Display for OrderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderClass::Unpaid => write!(f, "unpaid"),
            OrderClass::Paid => write!(f, "paid"),
            OrderClass::Collected => write!(f, "collected"),
            OrderClass::Consigned => write!(f, "consigned"),
        }
    }
}

/// Per-class order targets and claimed slots
#[derive(Debug)]
pub struct Quotas {
    targets: [u32; 4],
    claimed: [AtomicU32; 4],
}

impl Quotas {
    pub fn new(config: &WarmupConfig) -> Self {
        Self {
            targets: [
                config.unpaid_target,
                config.paid_target,
                config.collected_target,
                config.consigned_target,
            ],
            claimed: Default::default(),
        }
    }

    /// Reserve a slot in the first class that is not yet full
    pub fn claim(&self) -> Option<OrderClass> {
        OrderClass::all().iter().copied().find(|class| {
            let target = self.targets[class.index()];
            self.claimed[class.index()]
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |claimed| {
                    (claimed < target).then_some(claimed + 1)
                })
                .is_ok()
        })
    }

    /// Hand back a slot whose order could not be created
    pub fn release(&self, class: OrderClass) {
        self.claimed[class.index()].fetch_sub(1, Ordering::SeqCst);
    }

    pub fn claimed(&self, class: OrderClass) -> u32 {
        self.claimed[class.index()].load(Ordering::SeqCst)
    }

    pub fn target(&self, class: OrderClass) -> u32 {
        self.targets[class.index()]
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WarmupWorkerSummary {
    logged_in: bool,
    created: u64,
    failures: u64,
}

struct WarmupWorker {
    id: usize,
    api: Arc<dyn TicketApi>,
    config: WarmupConfig,
    dates: TravelDates,
    quotas: Arc<Quotas>,
    stop: StopListener,
    rng: StdRng,
}

impl WarmupWorker {
    async fn login(&self) -> Result<(), EngineError> {
        let policy = RetryPolicy::linear(self.config.login_attempts, self.config.login_retry_delay);
        RetryExecutor::new(policy)
            .with_stop(self.stop.clone())
            .execute(|| self.api.login())
            .await
            .map_err(|e| EngineError::LoginFailed {
                attempts: e.attempts(),
                source: e.into_inner(),
            })
    }

    async fn run(mut self) -> WarmupWorkerSummary {
        let mut summary = WarmupWorkerSummary::default();

        if let Err(e) = self.login().await {
            warn!("Warm-up worker {}: {}", self.id, e);
            return summary;
        }
        summary.logged_in = true;

        while !self.stop.is_stopped() {
            let Some(class) = self.quotas.claim() else {
                debug!("Warm-up worker {}: all quotas met", self.id);
                break;
            };

            let date = self.dates.pick(&mut self.rng);
            match self.create(class, date).await {
                Ok(()) => {
                    summary.created += 1;
                    info!(
                        "Worker {}: created {} order. Total {}: {}/{}",
                        self.id,
                        class,
                        class,
                        self.quotas.claimed(class),
                        self.quotas.target(class)
                    );
                }
                Err(e) => {
                    self.quotas.release(class);
                    summary.failures += 1;
                    warn!("Worker {}: error creating {} order: {}", self.id, class, e);
                    if !self.stop.sleep(self.config.failure_pause).await {
                        break;
                    }
                }
            }
        }

        summary
    }

    async fn create(&mut self, class: OrderClass, date: NaiveDate) -> Result<(), EngineError> {
        match class {
            OrderClass::Unpaid => self.create_unpaid(date).await,
            OrderClass::Paid => self.create_paid(date).await.map(|_| ()),
            OrderClass::Collected => {
                let paid = self.create_paid(date).await?;
                self.settle().await;
                let order = self.latest_order(&paid, &[OrderStatus::Paid]).await?;
                self.api.collect_ticket(&order.order_id).await?;
                Ok(())
            }
            OrderClass::Consigned => {
                let paid = self.create_paid(date).await?;
                self.settle().await;
                let order = self.latest_order(&paid, &[]).await?;
                self.api.put_consign(&order).await?;
                Ok(())
            }
        }
    }

    async fn settle(&self) {
        tokio::time::sleep(self.config.settle_delay).await;
    }

    /// Reserve a high-speed Shang Hai to Su Zhou ticket
    async fn create_unpaid(&mut self, date: NaiveDate) -> Result<(), EngineError> {
        let kind = TrainKind::HighSpeed;
        let route = kind.default_route();

        let search = self.api.query_trips(kind, &route, date).await?;
        let trip_id = search
            .trip_ids
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| EngineError::NoTrips {
                route: route.to_string(),
                date: date.to_string(),
            })?;

        let contacts = self.api.query_contacts().await?;
        let contact_id = contacts
            .choose(&mut self.rng)
            .cloned()
            .ok_or(EngineError::NoContacts)?;
        let user_id = self.api.user_id().ok_or(ApiError::NotLoggedIn)?;
        let seat = *SeatType::all()
            .choose(&mut self.rng)
            .unwrap_or(&SeatType::SecondClass);
        let trip_date = search
            .trip_date
            .as_deref()
            .and_then(|value| parse_date(value).ok())
            .unwrap_or(date);

        let reservation = Reservation::new(user_id, contact_id, trip_id, seat, trip_date, &route);
        self.api.preserve(kind, &reservation).await?;
        Ok(())
    }

    /// Reserve a ticket, then pay the first unpaid high-speed order
    async fn create_paid(&mut self, date: NaiveDate) -> Result<OrderRecord, EngineError> {
        self.create_unpaid(date).await?;
        self.settle().await;

        let orders = self.api.fetch_orders(OrderPartition::HighSpeed).await?;
        let mut order = orders
            .into_iter()
            .find(|order| order.status == OrderStatus::NotPaid)
            .ok_or_else(|| EngineError::NoOrders(OrderStatus::NotPaid.to_string()))?;

        self.api.pay_order(&order.order_id, &order.train_number).await?;
        order.status = OrderStatus::Paid;
        Ok(order)
    }

    /// `preferred` when still listed in one of `statuses`, else the first
    /// such order. Empty `statuses` accepts any order.
    async fn latest_order(&self, preferred: &OrderRecord, statuses: &[OrderStatus]) -> Result<OrderRecord, EngineError> {
        let orders = self.api.fetch_orders(OrderPartition::HighSpeed).await?;
        let accepts = |order: &OrderRecord| statuses.is_empty() || order.has_status(statuses);

        let pick = orders
            .iter()
            .find(|order| order.order_id == preferred.order_id && accepts(order))
            .or_else(|| orders.iter().find(|order| accepts(order)))
            .cloned();

        pick.ok_or_else(|| {
            let wanted = statuses
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("/");
            EngineError::NoOrders(if wanted.is_empty() { "high-speed".to_string() } else { wanted })
        })
    }
}

/// Orders created per class against their targets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub class: OrderClass,
    pub created: u32,
    pub target: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmupReport {
    pub duration_secs: f64,
    pub classes: Vec<ClassReport>,
    pub failures: u64,
    pub workers: usize,
    pub workers_logged_in: usize,
}

impl WarmupReport {
    pub fn total_created(&self) -> u32 {
        self.classes.iter().map(|class| class.created).sum()
    }

    pub fn total_target(&self) -> u32 {
        self.classes.iter().map(|class| class.target).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.classes.iter().all(|class| class.created >= class.target)
    }
}

impl fmt::Display for WarmupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Warm-up Statistics:")?;
        writeln!(f, "Total Duration: {:.2} seconds", self.duration_secs)?;
        writeln!(
            f,
            "Workers: {} of {} logged in",
            self.workers_logged_in, self.workers
        )?;
        writeln!(f)?;
        for class in &self.classes {
            writeln!(
                f,
                "  {:<20}: {:>5} / {:>5}",
                class.class.to_string(),
                class.created,
                class.target
            )?;
        }
        writeln!(
            f,
            "  {:<20}: {:>5} / {:>5}",
            "Total",
            self.total_created(),
            self.total_target()
        )?;
        writeln!(f, "  {:<20}: {:>5}", "Failed attempts", self.failures)
    }
}

/// Runs warm-up workers until every quota is met or the run is stopped
pub struct Warmup {
    factory: Arc<dyn ApiFactory>,
    config: WarmupConfig,
    dates: TravelDates,
    threads: usize,
    stop: Arc<StopCoordinator>,
}

impl Warmup {
    pub fn new(factory: Arc<dyn ApiFactory>, config: WarmupConfig, dates: TravelDates, threads: usize) -> Self {
        Self {
            factory,
            config,
            dates,
            threads,
            stop: Arc::new(StopCoordinator::new()),
        }
    }

    /// Share a stop signal, e.g. one fired on Ctrl-C
    pub fn with_stop(mut self, stop: Arc<StopCoordinator>) -> Self {
        self.stop = stop;
        self
    }

    pub async fn run(self) -> Result<WarmupReport, EngineError> {
        if self.threads == 0 {
            return Err(EngineError::InvalidSettings(
                "warm-up needs at least one worker".to_string(),
            ));
        }

        info!(
            "Starting warm-up with {} workers, {} orders to create",
            self.threads,
            self.config.total_target()
        );
        let started = Instant::now();
        let quotas = Arc::new(Quotas::new(&self.config));

        let mut workers = JoinSet::new();
        for id in 0..self.threads {
            let api = self.factory.create(self.stop.listener())?;
            let worker = WarmupWorker {
                id,
                api,
                config: self.config.clone(),
                dates: self.dates,
                quotas: Arc::clone(&quotas),
                stop: self.stop.listener(),
                rng: StdRng::from_entropy(),
            };
            workers.spawn(worker.run());
        }

        let mut failures = 0;
        let mut logged_in = 0;
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(summary) => {
                    failures += summary.failures;
                    if summary.logged_in {
                        logged_in += 1;
                    }
                }
                Err(e) => warn!("Warm-up worker task failed: {}", e),
            }
        }
        self.stop.stop(StopReason::Completed);

        if logged_in == 0 {
            return Err(EngineError::NoActiveWorkers);
        }

        let report = WarmupReport {
            duration_secs: started.elapsed().as_secs_f64(),
            classes: OrderClass::all()
                .iter()
                .map(|class| ClassReport {
                    class: *class,
                    created: quotas.claimed(*class),
                    target: quotas.target(*class),
                })
                .collect(),
            failures,
            workers: self.threads,
            workers_logged_in: logged_in,
        };
        info!(
            "Warm-up finished: {}/{} orders created",
            report.total_created(),
            report.total_target()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, FakeBackend};
    use std::time::Duration;

    fn config(unpaid: u32, paid: u32, collected: u32, consigned: u32) -> WarmupConfig {
        WarmupConfig {
            unpaid_target: unpaid,
            paid_target: paid,
            collected_target: collected,
            consigned_target: consigned,
            login_attempts: 3,
            login_retry_delay: Duration::from_secs(1),
            failure_pause: Duration::from_millis(100),
            settle_delay: Duration::from_millis(200),
        }
    }

    fn factory(backend: &Arc<FakeBackend>) -> Arc<dyn ApiFactory> {
        let backend = Arc::clone(backend);
        Arc::new(move |_stop: StopListener| -> Result<Arc<dyn TicketApi>, ApiError> {
            Ok(FakeApi::shared(&backend))
        })
    }

    fn dates() -> TravelDates {
        TravelDates::new(NaiveDate::from_ymd_opt(2024, 9, 29).unwrap(), 30)
    }

    #[test]
    fn test_quotas_fill_in_order_and_never_overshoot() {
        let quotas = Quotas::new(&config(2, 1, 0, 1));

        assert_eq!(quotas.claim(), Some(OrderClass::Unpaid));
        assert_eq!(quotas.claim(), Some(OrderClass::Unpaid));
        assert_eq!(quotas.claim(), Some(OrderClass::Paid));
        assert_eq!(quotas.claim(), Some(OrderClass::Consigned));
        assert_eq!(quotas.claim(), None);

        quotas.release(OrderClass::Paid);
        assert_eq!(quotas.claim(), Some(OrderClass::Paid));
        assert_eq!(quotas.claimed(OrderClass::Unpaid), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_builds_each_class() {
        let backend = FakeBackend::new();
        let report = Warmup::new(factory(&backend), config(4, 2, 2, 2), dates(), 1)
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.total_created(), 10);
        assert_eq!(report.failures, 0);

        // Each paid, collected and consigned order needs its own payment
        assert_eq!(backend.calls_starting_with("preserve").len(), 10);
        assert_eq!(backend.calls_starting_with("pay").len(), 6);
        assert_eq!(backend.calls_starting_with("collect").len(), 2);
        assert_eq!(backend.calls_starting_with("consign").len(), 2);

        let statuses = backend.statuses(OrderPartition::HighSpeed);
        assert_eq!(statuses.iter().filter(|s| **s == OrderStatus::NotPaid).count(), 4);
        assert_eq!(statuses.iter().filter(|s| **s == OrderStatus::Collected).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_workers_meet_quotas_exactly() {
        let backend = FakeBackend::new();
        let report = Warmup::new(factory(&backend), config(6, 3, 3, 3), dates(), 4)
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.workers_logged_in, 4);
        for class in &report.classes {
            assert_eq!(class.created, class.target, "{} overshot", class.class);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_is_retried() {
        let backend = FakeBackend::new();
        backend.failed_logins_left.store(2, Ordering::SeqCst);

        let report = Warmup::new(factory(&backend), config(1, 0, 0, 0), dates(), 1)
            .run()
            .await
            .unwrap();
        assert_eq!(report.total_created(), 1);
        assert_eq!(backend.logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_worker_logged_in_is_an_error() {
        let backend = FakeBackend::new();
        backend.failed_logins_left.store(3, Ordering::SeqCst);

        let result = Warmup::new(factory(&backend), config(1, 0, 0, 0), dates(), 1)
            .run()
            .await;
        assert!(matches!(result, Err(EngineError::NoActiveWorkers)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_release_slots_until_stopped() {
        let backend = FakeBackend::new();
        backend.trips.lock().clear();
        let stop = Arc::new(StopCoordinator::new());
        stop.stop_after(Duration::from_secs(1));

        let report = Warmup::new(factory(&backend), config(1, 0, 0, 0), dates(), 2)
            .with_stop(stop)
            .run()
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.total_created(), 0);
        assert!(report.failures >= 10, "{} failures", report.failures);
    }

    #[test]
    fn test_report_text() {
        let report = WarmupReport {
            duration_secs: 1.5,
            classes: vec![ClassReport {
                class: OrderClass::Paid,
                created: 3,
                target: 5,
            }],
            failures: 2,
            workers: 2,
            workers_logged_in: 2,
        };
        let text = report.to_string();
        assert!(text.contains("Total Duration: 1.50 seconds"));
        assert!(text.contains("  paid                :     3 /     5"));
        assert!(!report.is_complete());
    }
}
