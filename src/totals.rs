//! Cart totals calculator.
//!
//! Pure derivation from line items and pricing rules; totals are computed
//! on every mutation and never persisted. Accumulation stays at full
//! precision; rounding happens at presentation (`format::format_price`),
//! so per-line rounding error cannot compound across a large cart.

use serde::Serialize;

use crate::config::PricingRules;
use crate::domain::aggregates::cart::LineItem;
use crate::domain::value_objects::Money;
use crate::Result;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    /// Total units across all lines, not the number of distinct lines.
    pub item_count: u64,
}

impl CartTotals {
    pub fn empty(currency: &str) -> Self {
        Self {
            subtotal: Money::zero(currency),
            tax: Money::zero(currency),
            shipping: Money::zero(currency),
            total: Money::zero(currency),
            item_count: 0,
        }
    }
}

pub fn compute_totals(items: &[LineItem], rules: &PricingRules) -> Result<CartTotals> {
    if items.is_empty() {
        return Ok(CartTotals::empty(&rules.currency));
    }

    let mut subtotal = Money::zero(&rules.currency);
    let mut item_count: u64 = 0;
    for item in items {
        subtotal = subtotal.add(&item.line_total())?;
        item_count += u64::from(item.quantity);
    }

    let tax = subtotal.scale(rules.tax_rate);
    let shipping = if subtotal.amount() > rules.free_shipping_threshold {
        Money::zero(&rules.currency)
    } else {
        Money::new(rules.flat_shipping_fee, &rules.currency)
    };
    let total = subtotal.add(&tax)?.add(&shipping)?;

    Ok(CartTotals {
        subtotal,
        tax,
        shipping,
        total,
        item_count,
    })
}
