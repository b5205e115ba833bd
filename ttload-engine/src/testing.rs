//! In-memory TrainTicket backend for engine tests

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use ttload_core::{
    AdvancedSearch, OrderPartition, OrderRecord, OrderStatus, PlacePair, TrainKind, TripSearch,
};
use ttload_http::{ApiError, RebookRequest, Reservation, TicketApi};

/// State shared by every session of the fake backend
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub orders: Mutex<HashMap<OrderPartition, Vec<OrderRecord>>>,
    pub trips: Mutex<Vec<String>>,
    pub contacts: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<String>>,
    pub forbidden_consigns: Mutex<HashSet<String>>,
    pub failing_calls: Mutex<HashSet<&'static str>>,
    pub logins: AtomicUsize,
    pub failed_logins_left: AtomicUsize,
    pub fetches: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub overlaps: AtomicUsize,
    pub call_delay: Mutex<Duration>,
    next_order: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        *backend.trips.lock() = vec!["D1345".to_string(), "G1234".to_string()];
        *backend.contacts.lock() = vec!["c-1".to_string(), "c-2".to_string()];
        Arc::new(backend)
    }

    pub fn order(id: &str, status: OrderStatus) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            account_id: "u-1".to_string(),
            from: "Shang Hai".to_string(),
            to: "Su Zhou".to_string(),
            train_number: "D1345".to_string(),
            status,
            target_date: "2024-09-29 10:00:00".to_string(),
        }
    }

    pub fn set_orders(&self, partition: OrderPartition, orders: Vec<OrderRecord>) {
        self.orders.lock().insert(partition, orders);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing_calls.lock().insert(operation);
    }

    pub fn statuses(&self, partition: OrderPartition) -> Vec<OrderStatus> {
        self.orders
            .lock()
            .get(&partition)
            .map(|orders| orders.iter().map(|order| order.status).collect())
            .unwrap_or_default()
    }

    fn set_status(&self, order_id: &str, status: OrderStatus) {
        for orders in self.orders.lock().values_mut() {
            for order in orders.iter_mut().filter(|order| order.order_id == order_id) {
                order.status = status;
            }
        }
    }

    /// Record a scenario call and hold it open for the configured delay
    async fn call(&self, operation: &'static str, detail: String) -> Result<(), ApiError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let delay = *self.call_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.calls.lock().push(format!("{}:{}", operation, detail));
        if self.failing_calls.lock().contains(operation) {
            return Err(ApiError::Status {
                endpoint: format!("/{}", operation),
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

/// One logged-in user of the fake backend
#[derive(Debug)]
pub struct FakeApi {
    backend: Arc<FakeBackend>,
    user: Mutex<Option<String>>,
}

impl FakeApi {
    pub fn new(backend: Arc<FakeBackend>) -> Self {
        Self {
            backend,
            user: Mutex::new(None),
        }
    }

    pub fn shared(backend: &Arc<FakeBackend>) -> Arc<dyn TicketApi> {
        Arc::new(Self::new(Arc::clone(backend)))
    }
}

#[async_trait]
impl TicketApi for FakeApi {
    fn user_id(&self) -> Option<String> {
        self.user.lock().clone()
    }

    async fn login(&self) -> Result<(), ApiError> {
        let failing = self
            .backend
            .failed_logins_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::Status {
                endpoint: "/api/v1/users/login".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        self.backend.logins.fetch_add(1, Ordering::SeqCst);
        *self.user.lock() = Some("u-1".to_string());
        Ok(())
    }

    async fn query_trips(
        &self,
        kind: TrainKind,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<TripSearch, ApiError> {
        self.backend
            .call("trips", format!("{}:{}:{}", kind, route, date))
            .await?;
        Ok(TripSearch {
            trip_ids: self.backend.trips.lock().clone(),
            trip_date: Some(date.format("%Y-%m-%d").to_string()),
        })
    }

    async fn query_trips_parallel(
        &self,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<Vec<String>, ApiError> {
        self.backend
            .call("trips_parallel", format!("{}:{}", route, date))
            .await?;
        Ok(self.backend.trips.lock().clone())
    }

    async fn query_advanced(
        &self,
        search: AdvancedSearch,
        route: &PlacePair,
        _date: NaiveDate,
    ) -> Result<Vec<JsonValue>, ApiError> {
        self.backend
            .call("advanced", format!("{:?}:{}", search, route))
            .await?;
        Ok(vec![json!({"tripId": "D1345"})])
    }

    async fn fetch_orders(&self, partition: OrderPartition) -> Result<Vec<OrderRecord>, ApiError> {
        if self.backend.in_flight.load(Ordering::SeqCst) > 0 {
            self.backend.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.backend.fetches.fetch_add(1, Ordering::SeqCst);
        self.backend.calls.lock().push(format!("fetch:{}", partition));

        if self.backend.failing_calls.lock().contains("fetch") {
            return Err(ApiError::UnexpectedResponse {
                endpoint: partition.refresh_path().to_string(),
                message: "injected failure".to_string(),
            });
        }

        Ok(self
            .backend
            .orders
            .lock()
            .get(&partition)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_contacts(&self) -> Result<Vec<String>, ApiError> {
        self.backend.call("contacts", String::new()).await?;
        Ok(self.backend.contacts.lock().clone())
    }

    async fn preserve(&self, kind: TrainKind, reservation: &Reservation) -> Result<(), ApiError> {
        self.backend
            .call(
                "preserve",
                format!("{}:{}:{}", kind, reservation.trip_id, reservation.date),
            )
            .await?;

        let id = self.backend.next_order.fetch_add(1, Ordering::SeqCst);
        let partition = match kind {
            TrainKind::HighSpeed => OrderPartition::HighSpeed,
            TrainKind::Normal => OrderPartition::Other,
        };
        let mut order = FakeBackend::order(&format!("new-{}", id), OrderStatus::NotPaid);
        order.train_number = reservation.trip_id.clone();
        self.backend
            .orders
            .lock()
            .entry(partition)
            .or_default()
            .push(order);
        Ok(())
    }

    async fn pay_order(&self, order_id: &str, trip_id: &str) -> Result<(), ApiError> {
        self.backend
            .call("pay", format!("{}:{}", order_id, trip_id))
            .await?;
        self.backend.set_status(order_id, OrderStatus::Paid);
        Ok(())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ApiError> {
        self.backend.call("cancel", order_id.to_string()).await?;
        self.backend.set_status(order_id, OrderStatus::Cancelled);
        Ok(())
    }

    async fn collect_ticket(&self, order_id: &str) -> Result<(), ApiError> {
        self.backend.call("collect", order_id.to_string()).await?;
        self.backend.set_status(order_id, OrderStatus::Collected);
        Ok(())
    }

    async fn enter_station(&self, order_id: &str) -> Result<(), ApiError> {
        self.backend.call("enter", order_id.to_string()).await?;
        self.backend.set_status(order_id, OrderStatus::Used);
        Ok(())
    }

    async fn put_consign(&self, order: &OrderRecord) -> Result<(), ApiError> {
        self.backend.call("consign", order.order_id.clone()).await?;
        if self
            .backend
            .forbidden_consigns
            .lock()
            .contains(&order.order_id)
        {
            return Err(ApiError::Status {
                endpoint: "/api/v1/consignservice/consigns".to_string(),
                status: 403,
                body: "Forbidden".to_string(),
            });
        }
        Ok(())
    }

    async fn rebook(&self, request: &RebookRequest) -> Result<(), ApiError> {
        self.backend
            .call(
                "rebook",
                format!("{}:{}:{}", request.order_id, request.trip_id, request.date),
            )
            .await
    }
}
