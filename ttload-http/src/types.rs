//! Request and response bodies of the TrainTicket services

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;
use ttload_core::{OrderRecord, PlacePair, SeatType, TripSearch, DATE_FORMAT, DATE_TIME_FORMAT};

/// Envelope every TrainTicket service wraps its payload in.
///
/// `status` is 1 on success; `msg` carries the reason otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }

    pub fn message(&self) -> String {
        self.msg
            .clone()
            .unwrap_or_else(|| format!("status {}", self.status))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginData {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

/// Body of the trip searches
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TripQuery<'a> {
    pub departure_time: String,
    pub start_place: &'a str,
    pub end_place: &'a str,
}

impl<'a> TripQuery<'a> {
    pub fn new(route: &'a PlacePair, date: NaiveDate) -> Self {
        Self {
            departure_time: date.format(DATE_FORMAT).to_string(),
            start_place: &route.from,
            end_place: &route.to,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TripId {
    #[serde(rename = "type")]
    pub train_type: String,
    pub number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TripItem {
    pub trip_id: TripId,
    #[serde(default)]
    pub start_time: Option<JsonValue>,
}

impl TripItem {
    pub fn id(&self) -> String {
        format!("{}{}", self.trip_id.train_type, self.trip_id.number)
    }

    /// `YYYY-MM-DD` part of the start time
    pub fn date(&self) -> Option<String> {
        match &self.start_time {
            Some(JsonValue::String(start)) => start.get(..10).map(str::to_string),
            _ => None,
        }
    }
}

/// Collect trip ids out of a `trips/left` payload.
///
/// The trip date is taken from the last trip listed.
pub(crate) fn trip_search(trips: Vec<TripItem>) -> TripSearch {
    let trip_date = trips.last().and_then(TripItem::date);
    TripSearch {
        trip_ids: trips.iter().map(TripItem::id).collect(),
        trip_date,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContactItem {
    pub id: String,
}

/// One entry of an order refresh response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub train_number: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
}

impl OrderItem {
    /// Snapshot this order; orders without an id or status are unusable
    pub fn into_record(self, snapshot_time: &str) -> Option<OrderRecord> {
        let (Some(order_id), Some(status)) = (self.id, self.status) else {
            return None;
        };

        Some(OrderRecord {
            order_id,
            account_id: self.account_id.unwrap_or_default(),
            from: self.from.unwrap_or_default(),
            to: self.to.unwrap_or_default(),
            train_number: self.train_number.unwrap_or_default(),
            status: status.into(),
            target_date: snapshot_time.to_string(),
        })
    }
}

/// Turn the `data` array of a refresh response into order records.
///
/// Entries that are not objects, or lack an id or status, are dropped.
pub(crate) fn order_records(items: Vec<JsonValue>, snapshot_time: &str) -> Vec<OrderRecord> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<OrderItem>(item) {
            Ok(order) => order.into_record(snapshot_time),
            Err(e) => {
                debug!("Skipping malformed order entry: {}", e);
                None
            }
        })
        .collect()
}

/// Ticket reservation sent to the preserve services
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub account_id: String,
    pub contacts_id: String,
    pub trip_id: String,
    pub seat_type: String,
    pub date: String,
    pub from: String,
    pub to: String,
    pub assurance: String,
    pub food_type: String,
}

impl Reservation {
    /// A reservation without assurance or food
    pub fn new(
        account_id: impl Into<String>,
        contacts_id: impl Into<String>,
        trip_id: impl Into<String>,
        seat: SeatType,
        date: NaiveDate,
        route: &PlacePair,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            contacts_id: contacts_id.into(),
            trip_id: trip_id.into(),
            seat_type: seat.code().to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            from: route.from.clone(),
            to: route.to.clone(),
            assurance: "0".to_string(),
            food_type: "0".to_string(),
        }
    }
}

/// Consignment attached to an existing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsignRequest {
    pub account_id: String,
    pub handle_date: String,
    pub target_date: String,
    pub from: String,
    pub to: String,
    pub order_id: String,
    pub consignee: String,
    pub phone: String,
    pub weight: String,
    pub id: String,
    pub is_within: bool,
}

impl ConsignRequest {
    pub fn for_order(order: &OrderRecord, now: NaiveDateTime) -> Self {
        Self {
            account_id: order.account_id.clone(),
            handle_date: now.format(DATE_FORMAT).to_string(),
            target_date: now.format(DATE_TIME_FORMAT).to_string(),
            from: order.from.clone(),
            to: order.to.clone(),
            order_id: order.order_id.clone(),
            consignee: "32".to_string(),
            phone: "12345677654".to_string(),
            weight: "32".to_string(),
            id: String::new(),
            is_within: false,
        }
    }
}

/// Move an order to another trip or date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebookRequest {
    pub old_trip_id: String,
    pub order_id: String,
    pub trip_id: String,
    pub date: String,
    pub seat_type: String,
}

impl RebookRequest {
    /// Rebook `order` onto `trip_id` on `date`
    pub fn new(order: &OrderRecord, trip_id: impl Into<String>, date: NaiveDate, seat: SeatType) -> Self {
        Self {
            old_trip_id: order.train_number.clone(),
            order_id: order.order_id.clone(),
            trip_id: trip_id.into(),
            date: date.format(DATE_FORMAT).to_string(),
            seat_type: seat.code().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentRequest<'a> {
    pub order_id: &'a str,
    pub trip_id: &'a str,
}
