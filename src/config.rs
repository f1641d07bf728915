//! Pricing configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rules the totals calculator applies on top of line prices.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricingRules {
    /// Fraction of the subtotal charged as tax, e.g. `0.07`.
    pub tax_rate: Decimal,
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold: Decimal,
    /// Flat fee charged below the free-shipping threshold.
    pub flat_shipping_fee: Decimal,
    pub currency: String,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(7, 2),
            free_shipping_threshold: Decimal::new(100, 0),
            flat_shipping_fee: Decimal::new(10, 0),
            currency: "USD".to_string(),
        }
    }
}

impl PricingRules {
    /// Reads rules from the environment, falling back to defaults for any
    /// variable that is unset or unparsable.
    ///
    /// Recognized variables: `SHOPFRONT_TAX_RATE`,
    /// `SHOPFRONT_FREE_SHIPPING_THRESHOLD`, `SHOPFRONT_FLAT_SHIPPING`,
    /// `SHOPFRONT_CURRENCY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tax_rate: env_decimal("SHOPFRONT_TAX_RATE", defaults.tax_rate),
            free_shipping_threshold: env_decimal(
                "SHOPFRONT_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            ),
            flat_shipping_fee: env_decimal("SHOPFRONT_FLAT_SHIPPING", defaults.flat_shipping_fee),
            currency: std::env::var("SHOPFRONT_CURRENCY").unwrap_or(defaults.currency),
        }
    }
}

fn env_decimal(name: &str, default: Decimal) -> Decimal {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "unparsable decimal in environment, using default");
            default
        }),
        Err(_) => default,
    }
}
