//! Orders as seen through the order refresh endpoints

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle states reported by the order services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum OrderStatus {
    NotPaid,
    Paid,
    Collected,
    Changed,
    Cancelled,
    Refunded,
    Used,
    /// A status code this client does not know about
    Other(i64),
}

impl OrderStatus {
    /// Numeric code used on the wire
    pub fn code(&self) -> i64 {
        match self {
            OrderStatus::NotPaid => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Collected => 2,
            OrderStatus::Changed => 3,
            OrderStatus::Cancelled => 4,
            OrderStatus::Refunded => 5,
            OrderStatus::Used => 6,
            OrderStatus::Other(code) => *code,
        }
    }

    /// Orders that can still be paid, cancelled or rebooked
    pub fn open() -> &'static [OrderStatus] {
        &[OrderStatus::NotPaid, OrderStatus::Paid]
    }
}

impl From<i64> for OrderStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => OrderStatus::NotPaid,
            1 => OrderStatus::Paid,
            2 => OrderStatus::Collected,
            3 => OrderStatus::Changed,
            4 => OrderStatus::Cancelled,
            5 => OrderStatus::Refunded,
            6 => OrderStatus::Used,
            other => OrderStatus::Other(other),
        }
    }
}

impl From<OrderStatus> for i64 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::NotPaid => write!(f, "not-paid"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Collected => write!(f, "collected"),
            OrderStatus::Changed => write!(f, "changed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Refunded => write!(f, "refunded"),
            OrderStatus::Used => write!(f, "used"),
            OrderStatus::Other(code) => write!(f, "status-{}", code),
        }
    }
}

/// Which order service an order lives in.
///
/// High-speed trains (G/D) are booked through `ts-order-service`, everything
/// else through `ts-order-other-service`. Each has its own refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPartition {
    HighSpeed,
    Other,
}

impl OrderPartition {
    pub fn all() -> &'static [OrderPartition] {
        &[OrderPartition::HighSpeed, OrderPartition::Other]
    }

    /// Path of the refresh endpoint for this partition
    pub fn refresh_path(&self) -> &'static str {
        match self {
            OrderPartition::HighSpeed => "/api/v1/orderservice/order/refresh",
            OrderPartition::Other => "/api/v1/orderOtherService/orderOther/refresh",
        }
    }

    /// The partition the next refresh cycle should target
    pub fn toggled(&self) -> OrderPartition {
        match self {
            OrderPartition::HighSpeed => OrderPartition::Other,
            OrderPartition::Other => OrderPartition::HighSpeed,
        }
    }
}

impl fmt::Display for OrderPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPartition::HighSpeed => write!(f, "high-speed"),
            OrderPartition::Other => write!(f, "other"),
        }
    }
}

/// Snapshot of one order copied out of a refresh response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: String,
    pub account_id: String,
    pub from: String,
    pub to: String,
    pub train_number: String,
    pub status: OrderStatus,
    /// When this snapshot was taken, `YYYY-MM-DD HH:MM:SS`
    pub target_date: String,
}

impl OrderRecord {
    /// Whether this order is in one of the given states
    pub fn has_status(&self, statuses: &[OrderStatus]) -> bool {
        statuses.contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip_through_serde() {
        let status: OrderStatus = serde_json::from_str("2").unwrap();
        assert_eq!(status, OrderStatus::Collected);
        assert_eq!(serde_json::to_string(&OrderStatus::Paid).unwrap(), "1");

        let unknown: OrderStatus = serde_json::from_str("42").unwrap();
        assert_eq!(unknown, OrderStatus::Other(42));
        assert_eq!(unknown.code(), 42);
    }

    #[test]
    fn test_open_statuses() {
        assert_eq!(OrderStatus::open(), &[OrderStatus::NotPaid, OrderStatus::Paid]);
    }

    #[test]
    fn test_partition_refresh_paths() {
        assert_eq!(
            OrderPartition::HighSpeed.refresh_path(),
            "/api/v1/orderservice/order/refresh"
        );
        assert_eq!(
            OrderPartition::Other.refresh_path(),
            "/api/v1/orderOtherService/orderOther/refresh"
        );
        assert_eq!(OrderPartition::HighSpeed.toggled(), OrderPartition::Other);
        assert_eq!(OrderPartition::Other.toggled(), OrderPartition::HighSpeed);
    }

    #[test]
    fn test_has_status() {
        let order = OrderRecord {
            order_id: "o-1".to_string(),
            account_id: "a-1".to_string(),
            from: "Shang Hai".to_string(),
            to: "Su Zhou".to_string(),
            train_number: "D1345".to_string(),
            status: OrderStatus::Paid,
            target_date: "2024-09-29 10:00:00".to_string(),
        };

        assert!(order.has_status(OrderStatus::open()));
        assert!(!order.has_status(&[OrderStatus::Collected]));
    }
}
