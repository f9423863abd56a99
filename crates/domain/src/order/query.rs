use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use super::{Money, Order, OrderStatus};

/// Filter for querying orders.
///
/// All criteria are optional and combined with AND. Total bounds compare
/// against the derived total of live items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// Filter by creation day (UTC).
    pub created_on: Option<NaiveDate>,

    /// Minimum total (inclusive).
    pub min_total: Option<Money>,

    /// Maximum total (inclusive).
    pub max_total: Option<Money>,
}

impl OrderFilter {
    /// Creates a filter that matches every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters to orders created on the given UTC day.
    pub fn created_on(mut self, day: NaiveDate) -> Self {
        self.created_on = Some(day);
        self
    }

    /// Filters to orders whose total is at least `min`.
    pub fn min_total(mut self, min: Money) -> Self {
        self.min_total = Some(min);
        self
    }

    /// Filters to orders whose total is at most `max`.
    pub fn max_total(mut self, max: Money) -> Self {
        self.max_total = Some(max);
        self
    }

    /// Returns the half-open `[start, end)` UTC range for `created_on`.
    pub fn created_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.created_on.map(|day| {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            (start, start + Duration::days(1))
        })
    }

    /// Returns true if the order satisfies every criterion.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status() != status
        {
            return false;
        }
        if let Some((start, end)) = self.created_range()
            && (order.created_at() < start || order.created_at() >= end)
        {
            return false;
        }
        let total = order.total();
        if let Some(min) = self.min_total
            && total < min
        {
            return false;
        }
        if let Some(max) = self.max_total
            && total > max
        {
            return false;
        }
        true
    }
}
