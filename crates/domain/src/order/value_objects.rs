//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::{OrderItemId, ProductId};
use serde::{Deserialize, Serialize};

/// An amount of money as a whole number of cents.
///
/// Prices and totals never touch floating point; `10.00` is stored as `1000`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line subtotal for `quantity` units at this price, saturating at the `i64` bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Line subtotal, or `None` if it does not fit in `i64` cents.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

/// Formats as a decimal amount, e.g. `12.34`.
impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A priced line inside an order.
///
/// Name and price are snapshots taken when the product was first added; later
/// catalog edits do not reach existing lines. Removal only stamps `deleted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line identifier.
    pub id: OrderItemId,

    /// The product this line was created from.
    pub product_id: ProductId,

    /// Product name at add-time.
    pub product_name: String,

    /// Unit price at add-time.
    pub price: Money,

    /// Quantity ordered.
    pub quantity: u32,

    /// When the line was created.
    pub created_at: DateTime<Utc>,

    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl OrderItem {
    /// Creates a new live order line.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        price: Money,
        quantity: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderItemId::new(),
            product_id,
            product_name: product_name.into(),
            price,
            quantity,
            created_at,
            deleted_at: None,
        }
    }

    /// Returns true unless the line has been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Returns price * quantity for this line.
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// Sums price * quantity over the non-deleted lines, or `None` on overflow.
pub fn checked_order_total<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Option<Money> {
    items
        .into_iter()
        .filter(|item| item.is_active())
        .try_fold(Money::zero(), |total, item| {
            total.checked_add(item.price.checked_multiply(item.quantity)?)
        })
}

/// Sums price * quantity over the non-deleted lines.
pub fn order_total<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Money {
    items
        .into_iter()
        .filter(|item| item.is_active())
        .map(OrderItem::subtotal)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price_cents: i64, quantity: u32) -> OrderItem {
        OrderItem::new(
            ProductId::new(),
            "Widget",
            Money::from_cents(price_cents),
            quantity,
            Utc::now(),
        )
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(100).to_string(), "1.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!(a.multiply(3).cents(), 3000);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1500);
    }

    #[test]
    fn test_money_overflow() {
        let big = Money::from_cents(i64::MAX / 2);

        assert!(big.checked_multiply(3).is_none());
        assert_eq!(big.checked_multiply(2), Some(Money::from_cents(i64::MAX - 1)));
        assert!(big.checked_add(big).is_some());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());

        // Plain arithmetic clamps instead of panicking.
        assert_eq!(big.multiply(3).cents(), i64::MAX);
        assert_eq!((big + big + big).cents(), i64::MAX);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 5].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 355);

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_money_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(999)).unwrap();
        assert_eq!(json, "999");
    }

    #[test]
    fn test_order_item_subtotal() {
        assert_eq!(item(1000, 3).subtotal().cents(), 3000);
    }

    #[test]
    fn test_order_total_skips_deleted_items() {
        let live = item(1000, 2);
        let mut removed = item(700, 4);
        removed.deleted_at = Some(Utc::now());

        assert!(live.is_active());
        assert!(!removed.is_active());
        assert_eq!(order_total([&live, &removed]).cents(), 2000);
    }

    #[test]
    fn test_checked_order_total() {
        let live = item(1000, 2);
        let mut removed = item(i64::MAX, 2);
        removed.deleted_at = Some(Utc::now());
        assert_eq!(checked_order_total([&live, &removed]), Some(Money::from_cents(2000)));

        let huge = item(i64::MAX / 2, 3);
        assert!(checked_order_total([&live, &huge]).is_none());
    }

    #[test]
    fn test_order_total_of_nothing_is_zero() {
        assert!(order_total(std::iter::empty()).is_zero());
    }
}
