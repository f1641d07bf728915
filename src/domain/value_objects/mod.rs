//! Value objects shared across the storefront domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Money value object.
///
/// Amounts are kept at full precision; rounding to two decimal places
/// happens only when an amount is presented (see [`Money::rounded`] and
/// [`crate::format::format_price`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }

    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, "USD")
    }

    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }

    /// Scales the amount by an arbitrary factor, e.g. a tax rate.
    pub fn scale(&self, factor: Decimal) -> Money {
        Money::new(self.amount * factor, &self.currency)
    }

    /// Applies a percentage discount (0–100). Values outside that range are
    /// clamped rather than rejected; callers validate on ingress.
    pub fn with_discount(&self, percent: Decimal) -> Money {
        let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let factor = Decimal::ONE - percent / Decimal::ONE_HUNDRED;
        self.scale(factor)
    }

    /// Amount rounded to two decimal places, for presentation only.
    pub fn rounded(&self) -> Decimal {
        self.amount.round_dp(2)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero("USD")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rounded(), self.currency)
    }
}

#[derive(Debug, Clone)]
pub enum MoneyError {
    CurrencyMismatch,
}

impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency mismatch")
    }
}

impl From<MoneyError> for crate::StorefrontError {
    fn from(_: MoneyError) -> Self {
        crate::StorefrontError::invalid("currency", "currency mismatch between line items")
    }
}
