use crate::types::{Fill, Order};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Filled,
    RejectedFunds,
    RejectedShares,
    /// The series ended before the order could reach an open.
    Unfilled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Filled => "filled",
            OrderStatus::RejectedFunds => "rejected_funds",
            OrderStatus::RejectedShares => "rejected_shares",
            OrderStatus::Unfilled => "unfilled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order: Order,
    pub status: OrderStatus,
}

/// Append-only record of every entered order and every fill, in simulated-time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLedger {
    orders: Vec<OrderRecord>,
    fills: Vec<Fill>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|record| {
                matches!(
                    record.status,
                    OrderStatus::RejectedFunds | OrderStatus::RejectedShares
                )
            })
            .count()
    }

    /// Fills dated within `start..=end`.
    pub fn fills_between(&self, start: NaiveDate, end: NaiveDate) -> &[Fill] {
        let lo = self.fills.partition_point(|fill| fill.date < start);
        let hi = self.fills.partition_point(|fill| fill.date <= end);
        if lo >= hi {
            return &[];
        }
        &self.fills[lo..hi]
    }

    pub(crate) fn record_order(&mut self, order: Order, status: OrderStatus) {
        self.orders.push(OrderRecord { order, status });
    }

    pub(crate) fn record_fill(&mut self, fill: Fill) {
        debug_assert!(self.fills.last().map_or(true, |last| last.date <= fill.date));
        self.fills.push(fill);
    }

    pub(crate) fn clear(&mut self) {
        self.orders.clear();
        self.fills.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Order, Side};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 2, day).unwrap()
    }

    fn fill(day: u32) -> Fill {
        Fill {
            date: d(day),
            side: Side::Buy,
            ticker: "AAPL".to_string(),
            shares: 1.0,
            price: 10.0,
        }
    }

    #[test]
    fn fills_between_is_inclusive() {
        let mut ledger = EventLedger::new();
        for day in [1, 3, 5, 7] {
            ledger.record_fill(fill(day));
        }
        assert_eq!(ledger.fills_between(d(3), d(5)).len(), 2);
        assert_eq!(ledger.fills_between(d(8), d(9)).len(), 0);
        assert_eq!(ledger.fills_between(d(5), d(3)).len(), 0);
    }

    #[test]
    fn counts_rejections() {
        let mut ledger = EventLedger::new();
        ledger.record_order(Order::buy("AAPL", 1.0), OrderStatus::Filled);
        ledger.record_order(Order::buy("AAPL", 1.0), OrderStatus::RejectedFunds);
        ledger.record_order(Order::sell("AAPL", 1.0), OrderStatus::RejectedShares);
        ledger.record_order(Order::sell("AAPL", 1.0), OrderStatus::Unfilled);
        assert_eq!(ledger.rejected_count(), 2);
        ledger.clear();
        assert!(ledger.orders().is_empty());
    }
}
