//! Shared snapshot of the user's orders

use parking_lot::RwLock;
use tokio::time::Instant;
use ttload_core::{OrderPartition, OrderRecord, OrderStatus};

/// Orders of one partition as of the last refresh
#[derive(Debug, Clone, Default)]
pub struct OrderSnapshot {
    pub orders: Vec<OrderRecord>,
    pub refreshed_at: Option<Instant>,
}

/// Order snapshots of both order services.
///
/// Readers clone what they need so no lock is held across an await.
#[derive(Debug, Default)]
pub struct OrderCache {
    high_speed: RwLock<OrderSnapshot>,
    other: RwLock<OrderSnapshot>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, partition: OrderPartition) -> &RwLock<OrderSnapshot> {
        match partition {
            OrderPartition::HighSpeed => &self.high_speed,
            OrderPartition::Other => &self.other,
        }
    }

    /// Install a fresh snapshot.
    ///
    /// An empty result keeps the previous orders and returns `false`.
    pub fn replace(&self, partition: OrderPartition, orders: Vec<OrderRecord>) -> bool {
        if orders.is_empty() {
            return false;
        }

        let mut slot = self.slot(partition).write();
        slot.orders = orders;
        slot.refreshed_at = Some(Instant::now());
        true
    }

    pub fn orders(&self, partition: OrderPartition) -> Vec<OrderRecord> {
        self.slot(partition).read().orders.clone()
    }

    /// Orders of `partition` in one of `statuses`
    pub fn with_status(&self, partition: OrderPartition, statuses: &[OrderStatus]) -> Vec<OrderRecord> {
        self.slot(partition)
            .read()
            .orders
            .iter()
            .filter(|order| order.has_status(statuses))
            .cloned()
            .collect()
    }

    pub fn len(&self, partition: OrderPartition) -> usize {
        self.slot(partition).read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        OrderPartition::all()
            .iter()
            .all(|partition| self.len(*partition) == 0)
    }

    pub fn refreshed_at(&self, partition: OrderPartition) -> Option<Instant> {
        self.slot(partition).read().refreshed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, status: OrderStatus) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            account_id: "a-1".to_string(),
            from: "Shang Hai".to_string(),
            to: "Su Zhou".to_string(),
            train_number: "D1345".to_string(),
            status,
            target_date: "2024-09-29 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_partitions_are_independent() {
        let cache = OrderCache::new();
        assert!(cache.is_empty());

        assert!(cache.replace(OrderPartition::HighSpeed, vec![order("o-1", OrderStatus::Paid)]));
        assert_eq!(cache.len(OrderPartition::HighSpeed), 1);
        assert_eq!(cache.len(OrderPartition::Other), 0);
        assert!(cache.refreshed_at(OrderPartition::HighSpeed).is_some());
        assert!(cache.refreshed_at(OrderPartition::Other).is_none());
    }

    #[test]
    fn test_empty_refresh_keeps_snapshot() {
        let cache = OrderCache::new();
        cache.replace(OrderPartition::Other, vec![order("o-1", OrderStatus::NotPaid)]);

        assert!(!cache.replace(OrderPartition::Other, Vec::new()));
        assert_eq!(cache.orders(OrderPartition::Other)[0].order_id, "o-1");
    }

    #[test]
    fn test_with_status_filters() {
        let cache = OrderCache::new();
        cache.replace(
            OrderPartition::HighSpeed,
            vec![
                order("o-1", OrderStatus::NotPaid),
                order("o-2", OrderStatus::Collected),
                order("o-3", OrderStatus::Paid),
            ],
        );

        let open: Vec<_> = cache
            .with_status(OrderPartition::HighSpeed, OrderStatus::open())
            .into_iter()
            .map(|order| order.order_id)
            .collect();
        assert_eq!(open, vec!["o-1", "o-3"]);
        assert!(cache
            .with_status(OrderPartition::HighSpeed, &[OrderStatus::Used])
            .is_empty());
    }
}
