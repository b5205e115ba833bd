//! The user actions a worker simulates
//!
//! Every scenario reads its candidate orders from the shared [`OrderCache`]
//! rather than asking the order services, so the refresh endpoints only see
//! the refresher's traffic.

use crate::cache::OrderCache;
use crate::error::EngineError;
use crate::scenario::ScenarioKind;
use chrono::{Local, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};
use ttload_core::{parse_date, OrderPartition, OrderRecord, OrderStatus, SeatType, TrainKind};
use ttload_http::{RebookRequest, Reservation, TicketApi};

/// How one scenario attempt ended
#[derive(Debug)]
pub enum ScenarioOutcome {
    /// Every call went through
    Completed,
    /// Nothing to work on, e.g. no cached order in the right state
    Skipped(String),
    /// A call failed; the worker carries on with the next scenario
    Failed(EngineError),
}

impl ScenarioOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ScenarioOutcome::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ScenarioOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScenarioOutcome::Failed(_))
    }
}

impl std::fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioOutcome::Completed => write!(f, "completed"),
            ScenarioOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            ScenarioOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

type StepResult = Result<ScenarioOutcome, EngineError>;

fn skipped(reason: impl Into<String>) -> StepResult {
    Ok(ScenarioOutcome::Skipped(reason.into()))
}

/// Runs scenarios for one logged-in user
#[derive(Clone)]
pub struct ScenarioRunner {
    api: Arc<dyn TicketApi>,
    cache: Arc<OrderCache>,
    high_speed_weight: u32,
}

impl ScenarioRunner {
    /// `high_speed_weight` is the percentage of scenarios aimed at the
    /// high-speed order service
    pub fn new(api: Arc<dyn TicketApi>, cache: Arc<OrderCache>, high_speed_weight: u32) -> Self {
        Self {
            api,
            cache,
            high_speed_weight: high_speed_weight.min(100),
        }
    }

    pub fn api(&self) -> &Arc<dyn TicketApi> {
        &self.api
    }

    /// Run `kind` once for `travel_date`. Never fails: errors become
    /// [`ScenarioOutcome::Failed`].
    pub async fn run<R>(&self, kind: ScenarioKind, travel_date: NaiveDate, rng: &mut R) -> ScenarioOutcome
    where
        R: Rng + Send + ?Sized,
    {
        let result = match kind {
            ScenarioKind::QueryAndPreserve => self.query_and_preserve(travel_date, rng).await,
            ScenarioKind::QueryAndPay => self.query_and_pay(rng).await,
            ScenarioKind::QueryAndCancel => self.query_and_cancel(rng).await,
            ScenarioKind::QueryAndCollect => self.query_and_collect(rng).await,
            ScenarioKind::QueryAndExecute => self.query_and_execute(rng).await,
            ScenarioKind::QueryAndConsign => self.query_and_consign(rng).await,
            ScenarioKind::QueryAndRebook => self.query_and_rebook(rng).await,
            ScenarioKind::QueryOnlyHighSpeed => self.query_only_high_speed(travel_date).await,
        };

        match result {
            Ok(outcome) => {
                debug!("{} {}", kind, outcome);
                outcome
            }
            Err(e) => {
                warn!("{} failed: {}", kind, e);
                ScenarioOutcome::Failed(e)
            }
        }
    }

    fn pick_partition<R: Rng + ?Sized>(&self, rng: &mut R) -> OrderPartition {
        if rng.gen_range(0..100) < self.high_speed_weight {
            OrderPartition::HighSpeed
        } else {
            OrderPartition::Other
        }
    }

    /// A random cached order of a random partition in one of `statuses`
    fn pick_order<R: Rng + ?Sized>(&self, rng: &mut R, statuses: &[OrderStatus]) -> Option<OrderRecord> {
        let partition = self.pick_partition(rng);
        let candidates = self.cache.with_status(partition, statuses);
        candidates.choose(rng).cloned()
    }

    async fn query_and_preserve<R>(&self, travel_date: NaiveDate, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let kind = match self.pick_partition(rng) {
            OrderPartition::HighSpeed => TrainKind::HighSpeed,
            OrderPartition::Other => TrainKind::Normal,
        };
        let route = kind.default_route();

        let search = self.api.query_trips(kind, &route, travel_date).await?;
        if search.is_empty() {
            return skipped(format!("no {} trips for {} on {}", kind, route, travel_date));
        }

        let contacts = self.api.query_contacts().await?;
        let user_id = self.api.user_id().ok_or(ttload_http::ApiError::NotLoggedIn)?;

        let (Some(trip_id), Some(contact_id)) = (search.trip_ids.choose(rng), contacts.choose(rng)) else {
            return Err(EngineError::NoContacts);
        };
        let seat = *SeatType::all().choose(rng).unwrap_or(&SeatType::SecondClass);
        let date = search
            .trip_date
            .as_deref()
            .and_then(|date| parse_date(date).ok())
            .unwrap_or(travel_date);

        let reservation = Reservation::new(user_id, contact_id.as_str(), trip_id.as_str(), seat, date, &route);
        self.api.preserve(kind, &reservation).await?;
        Ok(ScenarioOutcome::Completed)
    }

    async fn query_and_pay<R>(&self, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let Some(order) = self.pick_order(rng, OrderStatus::open()) else {
            return skipped("no open order to pay");
        };

        self.api.pay_order(&order.order_id, &order.train_number).await?;
        Ok(ScenarioOutcome::Completed)
    }

    async fn query_and_cancel<R>(&self, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let Some(order) = self.pick_order(rng, OrderStatus::open()) else {
            return skipped("no open order to cancel");
        };

        self.api.cancel_order(&order.order_id).await?;
        Ok(ScenarioOutcome::Completed)
    }

    async fn query_and_collect<R>(&self, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let Some(order) = self.pick_order(rng, &[OrderStatus::Paid]) else {
            return skipped("no paid order to collect");
        };

        self.api.collect_ticket(&order.order_id).await?;
        Ok(ScenarioOutcome::Completed)
    }

    async fn query_and_execute<R>(&self, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let Some(order) = self.pick_order(rng, &[OrderStatus::Collected]) else {
            return skipped("no collected order to enter the station with");
        };

        self.api.enter_station(&order.order_id).await?;
        Ok(ScenarioOutcome::Completed)
    }

    /// Try cached orders in turn; 403 means this order cannot be consigned
    async fn query_and_consign<R>(&self, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let partition = self.pick_partition(rng);
        let orders = self.cache.orders(partition);
        if orders.is_empty() {
            return skipped(format!("no {} orders to consign", partition));
        }

        for order in &orders {
            match self.api.put_consign(order).await {
                Ok(()) => return Ok(ScenarioOutcome::Completed),
                Err(e) if e.is_forbidden() => {
                    debug!("Consign refused for order {}, trying the next one", order.order_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        skipped(format!("all {} cached orders refused consignment", orders.len()))
    }

    /// Cancel an open order, then book its trip again for today
    async fn query_and_rebook<R>(&self, rng: &mut R) -> StepResult
    where
        R: Rng + Send + ?Sized,
    {
        let Some(order) = self.pick_order(rng, OrderStatus::open()) else {
            return skipped("no open order to rebook");
        };

        self.api.cancel_order(&order.order_id).await?;

        let seat = *SeatType::all().choose(rng).unwrap_or(&SeatType::SecondClass);
        let today = Local::now().date_naive();
        let request = RebookRequest::new(&order, order.train_number.as_str(), today, seat);
        self.api.rebook(&request).await?;
        Ok(ScenarioOutcome::Completed)
    }

    async fn query_only_high_speed(&self, travel_date: NaiveDate) -> StepResult {
        let kind = TrainKind::HighSpeed;
        self.api
            .query_trips(kind, &kind.default_route(), travel_date)
            .await?;
        Ok(ScenarioOutcome::Completed)
    }
}
