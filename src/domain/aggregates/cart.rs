//! Cart aggregate.
//!
//! An ordered collection of line items keyed by product id: at most one
//! line per product, and no line is ever held at a quantity below 1; a
//! line whose quantity falls to zero is removed outright.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::events::CartEvent;
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

/// One product entry in a cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
            discount_percent: None,
        }
    }

    /// Unit price after any percentage discount.
    pub fn effective_unit_price(&self) -> Money {
        match self.discount_percent {
            Some(percent) => self.unit_price.with_discount(percent),
            None => self.unit_price.clone(),
        }
    }

    pub fn line_total(&self) -> Money {
        self.effective_unit_price().multiply(self.quantity)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<CartEvent>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            items: vec![],
            created_at: now,
            updated_at: now,
            events: vec![],
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines, not total units.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    pub fn find(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Adds `delta` units of a product at the given unit price.
    ///
    /// An existing line merges quantities (never a duplicate line). `delta`
    /// may be negative from quantity-adjustment controls; a line whose
    /// quantity falls below 1 is removed. Adding an absent product with a
    /// non-positive delta does nothing.
    pub fn add(&mut self, product_id: &str, delta: i32, unit_price: Money) {
        match self.items.iter().position(|i| i.product_id == product_id) {
            Some(idx) => {
                let next = i64::from(self.items[idx].quantity) + i64::from(delta);
                if next < 1 {
                    self.items.remove(idx);
                    self.raise(CartEvent::ItemRemoved {
                        product_id: product_id.to_string(),
                    });
                } else {
                    self.items[idx].quantity = next as u32;
                    self.raise(CartEvent::QuantityChanged {
                        product_id: product_id.to_string(),
                        quantity: next as u32,
                    });
                }
            }
            None if delta >= 1 => {
                self.items
                    .push(LineItem::new(product_id, delta as u32, unit_price));
                self.raise(CartEvent::ItemAdded {
                    product_id: product_id.to_string(),
                    quantity: delta as u32,
                });
            }
            None => {}
        }
        self.touch();
    }

    /// Sets a line to an absolute quantity.
    ///
    /// A quantity below 1 is a deliberate no-op: direct-entry quantity
    /// fields must not remove a line by accident (removal goes through
    /// [`Cart::remove`]).
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Ok(());
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| StorefrontError::not_found("cart item", product_id))?;
        item.quantity = quantity;
        self.raise(CartEvent::QuantityChanged {
            product_id: product_id.to_string(),
            quantity,
        });
        self.touch();
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(StorefrontError::not_found("cart item", product_id));
        }
        self.raise(CartEvent::ItemRemoved {
            product_id: product_id.to_string(),
        });
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.raise(CartEvent::Cleared);
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: CartEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
