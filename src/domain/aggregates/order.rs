//! Order aggregate.
//!
//! Orders and their lines are written once at checkout and never mutated
//! afterwards, except for guarded status transitions. An [`OrderLine`]
//! snapshots the unit price paid; later catalog price changes must not
//! reach back into order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-readable unique reference, distinct from the internal id.
    pub reference: String,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(reference: impl Into<String>, total_amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            reference: reference.into(),
            full_name: String::new(),
            email: String::new(),
            address: String::new(),
            city: String::new(),
            zip_code: String::new(),
            country: String::new(),
            total_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the order to `next`, rejecting transitions the lifecycle does
    /// not allow (e.g. cancelling a delivered order).
    pub fn transition(&mut self, next: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(StorefrontError::invalid(
                "status",
                "order status transition not allowed",
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition(OrderStatus::Cancelled)
    }
}

/// Immutable snapshot of one purchased line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub order_ref: String,
    pub product_id: String,
    pub quantity: u32,
    /// Unit price at the moment of purchase.
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(
        order_ref: impl Into<String>,
        product_id: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_ref: order_ref.into(),
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_lifecycle() {
        let mut order = Order::new("ORD-20260829-000001", Money::usd(Decimal::new(100, 0)));
        order.transition(OrderStatus::Processing).unwrap();
        order.transition(OrderStatus::Shipped).unwrap();
        order.transition(OrderStatus::Delivered).unwrap();
        assert!(order.status.is_terminal());
    }

    #[test]
    fn test_cannot_cancel_delivered() {
        let mut order = Order::new("ORD-20260829-000002", Money::usd(Decimal::new(100, 0)));
        order.transition(OrderStatus::Processing).unwrap();
        order.transition(OrderStatus::Shipped).unwrap();
        order.transition(OrderStatus::Delivered).unwrap();
        assert!(order.cancel().is_err());
    }

    #[test]
    fn test_line_total() {
        let line = OrderLine::new("ORD-1", "P1", 3, Money::usd(Decimal::new(1999, 2)));
        assert_eq!(line.line_total().amount(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_cannot_skip_to_delivered() {
        let mut order = Order::new("ORD-20260829-000003", Money::usd(Decimal::new(100, 0)));
        assert!(order.transition(OrderStatus::Delivered).is_err());
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
