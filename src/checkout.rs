//! Checkout flow.
//!
//! A small state machine (`Reviewing → ShippingInfo → PaymentInfo →
//! Confirmed`) over validated form data. A rejected form drops the flow
//! back to `Reviewing`: the rejected input is discarded, previously
//! accepted data is kept, and nothing else (cart included) is touched.
//!
//! Payment data exists only long enough to validate. It is never stored on
//! the flow, persisted, or sent anywhere. The actual payment gateway is an
//! external collaborator outside this crate.

use chrono::Utc;
use rand::Rng;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::order::Order;
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutStage {
    Reviewing,
    ShippingInfo,
    PaymentInfo,
    Confirmed,
}

#[derive(Clone, Debug, Validate)]
pub struct ShippingDetails {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(
        email(message = "Please enter a valid email address"),
        custom = "email_has_tld"
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "ZIP/Postal code is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
}

#[derive(Clone, Debug, Validate)]
pub struct PaymentDetails {
    #[validate(custom = "validate_card_number")]
    pub card_number: String,
    #[validate(custom = "validate_expiry")]
    pub expiry: String,
    #[validate(custom = "validate_cvv")]
    pub cvv: String,
}

#[derive(Debug)]
pub struct Checkout {
    stage: CheckoutStage,
    shipping: Option<ShippingDetails>,
    payment_verified: bool,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkout {
    pub fn new() -> Self {
        Self {
            stage: CheckoutStage::Reviewing,
            shipping: None,
            payment_verified: false,
        }
    }

    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    pub fn shipping(&self) -> Option<&ShippingDetails> {
        self.shipping.as_ref()
    }

    /// Leaves cart review and starts entering shipping details.
    pub fn begin(&mut self) -> Result<()> {
        self.expect_stage(CheckoutStage::Reviewing)?;
        self.stage = CheckoutStage::ShippingInfo;
        Ok(())
    }

    pub fn submit_shipping(&mut self, details: ShippingDetails) -> Result<()> {
        self.expect_stage(CheckoutStage::ShippingInfo)?;
        if let Err(errors) = details.validate() {
            self.stage = CheckoutStage::Reviewing;
            return Err(errors.into());
        }
        self.shipping = Some(details);
        self.stage = CheckoutStage::PaymentInfo;
        Ok(())
    }

    /// Validates payment input and drops it. On success the flow is ready
    /// for order placement; the details themselves are not retained.
    pub fn submit_payment(&mut self, details: PaymentDetails) -> Result<()> {
        self.expect_stage(CheckoutStage::PaymentInfo)?;
        if let Err(errors) = details.validate() {
            self.stage = CheckoutStage::Reviewing;
            self.payment_verified = false;
            return Err(errors.into());
        }
        self.payment_verified = true;
        Ok(())
    }

    pub fn ready_to_place(&self) -> bool {
        self.stage == CheckoutStage::PaymentInfo && self.payment_verified && self.shipping.is_some()
    }

    /// Marks the flow confirmed once the order exists. Internal: only order
    /// placement may call this.
    pub(crate) fn mark_confirmed(&mut self) {
        self.stage = CheckoutStage::Confirmed;
    }

    fn expect_stage(&self, expected: CheckoutStage) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(StorefrontError::invalid(
                "checkout",
                "operation not valid in the current checkout step",
            ))
        }
    }
}

/// Builds the order record from validated shipping details and the grand
/// total computed at assembly time.
pub(crate) fn build_order(reference: &str, shipping: &ShippingDetails, total: Money) -> Order {
    let mut order = Order::new(reference, total);
    order.full_name = shipping.full_name.clone();
    order.email = shipping.email.clone();
    order.address = shipping.address.clone();
    order.city = shipping.city.clone();
    order.zip_code = shipping.zip_code.clone();
    order.country = shipping.country.clone();
    order
}

/// Human-readable order reference: date plus a random suffix, practically
/// collision-free at storefront volumes.
pub fn generate_order_reference() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD-{date}-{suffix:06}")
}

// =============================================================================
// Field validators
// =============================================================================

fn email_has_tld(email: &str) -> std::result::Result<(), ValidationError> {
    let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or("");
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => {
            let mut err = ValidationError::new("email");
            err.message = Some("Please enter a valid email address".into());
            Err(err)
        }
    }
}

fn validate_card_number(card_number: &str) -> std::result::Result<(), ValidationError> {
    let digits: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() == 16 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("card_number");
        err.message = Some("Please enter a valid card number".into());
        Err(err)
    }
}

fn validate_expiry(expiry: &str) -> std::result::Result<(), ValidationError> {
    let invalid = || {
        let mut err = ValidationError::new("expiry");
        err.message = Some("Please use format MM/YY".into());
        err
    };
    let (month, year) = expiry.split_once('/').ok_or_else(invalid)?;
    if month.len() != 2 || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    match month.parse::<u8>() {
        Ok(m) if (1..=12).contains(&m) => Ok(()),
        _ => Err(invalid()),
    }
}

fn validate_cvv(cvv: &str) -> std::result::Result<(), ValidationError> {
    if (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("cvv");
        err.message = Some("Please enter a valid security code".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            address: "1 Analytical Way".into(),
            city: "London".into(),
            zip_code: "N1 9GU".into(),
            country: "GB".into(),
        }
    }

    fn payment() -> PaymentDetails {
        PaymentDetails {
            card_number: "4242 4242 4242 4242".into(),
            expiry: "12/27".into(),
            cvv: "123".into(),
        }
    }

    #[test]
    fn test_happy_path_reaches_ready() {
        let mut flow = Checkout::new();
        flow.begin().unwrap();
        flow.submit_shipping(shipping()).unwrap();
        assert_eq!(flow.stage(), CheckoutStage::PaymentInfo);
        flow.submit_payment(payment()).unwrap();
        assert!(flow.ready_to_place());
    }

    #[test]
    fn test_fifteen_digit_card_is_rejected() {
        let mut flow = Checkout::new();
        flow.begin().unwrap();
        flow.submit_shipping(shipping()).unwrap();
        let mut bad = payment();
        bad.card_number = "1234 5678 9012 345".into();
        assert!(flow.submit_payment(bad).is_err());
        assert!(!flow.ready_to_place());
        // Validation failure exits back to Reviewing...
        assert_eq!(flow.stage(), CheckoutStage::Reviewing);
        // ...but accepted shipping data is kept for the retry.
        assert!(flow.shipping().is_some());
    }

    #[test]
    fn test_expiry_rules() {
        assert!(validate_expiry("01/26").is_ok());
        assert!(validate_expiry("12/99").is_ok());
        assert!(validate_expiry("13/26").is_err());
        assert!(validate_expiry("00/26").is_err());
        assert!(validate_expiry("1/26").is_err());
        assert!(validate_expiry("0126").is_err());
        assert!(validate_expiry("12/2x").is_err());
    }

    #[test]
    fn test_cvv_rules() {
        assert!(validate_cvv("123").is_ok());
        assert!(validate_cvv("1234").is_ok());
        assert!(validate_cvv("12").is_err());
        assert!(validate_cvv("12a").is_err());
    }

    #[test]
    fn test_email_requires_tld() {
        let mut flow = Checkout::new();
        flow.begin().unwrap();
        let mut details = shipping();
        details.email = "ada@localhost".into();
        assert!(flow.submit_shipping(details).is_err());
        assert_eq!(flow.stage(), CheckoutStage::Reviewing);
    }

    #[test]
    fn test_empty_shipping_fields_rejected() {
        let mut flow = Checkout::new();
        flow.begin().unwrap();
        let mut details = shipping();
        details.city = "".into();
        assert!(flow.submit_shipping(details).is_err());
    }

    #[test]
    fn test_out_of_order_calls_are_rejected() {
        let mut flow = Checkout::new();
        assert!(flow.submit_payment(payment()).is_err());
        assert_eq!(flow.stage(), CheckoutStage::Reviewing);
    }

    #[test]
    fn test_order_reference_shape() {
        let reference = generate_order_reference();
        assert!(reference.starts_with("ORD-"));
        assert_eq!(reference.len(), "ORD-YYYYMMDD-".len() + 6);
        let distinct: std::collections::HashSet<_> =
            (0..32).map(|_| generate_order_reference()).collect();
        assert!(distinct.len() > 1);
    }
}
