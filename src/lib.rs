//! Shopfront
//!
//! Storefront cart and checkout engine: guest carts persisted in durable
//! key-value storage, reconciliation into an authenticated remote cart at
//! login, cart totals, and checkout/order assembly.
//!
//! ## Features
//! - Guest cart with durable persistence and change notifications
//! - Guest-to-account cart reconciliation with per-item failure reporting
//! - Subtotal/tax/shipping totals from configurable pricing rules
//! - Checkout state machine with shipping and payment validation
//! - Order assembly with immutable price snapshots per line

use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

pub mod cart_store;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod format;
pub mod gateway;
pub mod memory;
pub mod reconcile;
pub mod storage;
pub mod storefront;
pub mod totals;

pub use cart_store::CartStore;
pub use checkout::{Checkout, CheckoutStage, PaymentDetails, ShippingDetails};
pub use config::PricingRules;
pub use domain::aggregates::cart::{Cart, LineItem};
pub use domain::aggregates::order::{Order, OrderLine, OrderStatus};
pub use domain::value_objects::Money;
pub use gateway::{OrderStore, Product, ProductCatalog, RemoteCartGateway};
pub use reconcile::{reconcile_guest_cart, ReconcileReport};
pub use storage::KeyValueStorage;
pub use storefront::Storefront;
pub use totals::{compute_totals, CartTotals};

// =============================================================================
// Error Types
// =============================================================================

/// One cart line that could not be merged into the remote cart.
#[derive(Clone, Debug)]
pub struct ReconcileFailure {
    pub product_id: String,
    pub reason: String,
}

/// One order line that could not be recorded after the order was created.
#[derive(Clone, Debug)]
pub struct LineFailure {
    pub product_id: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("not signed in")]
    Unauthenticated,

    #[error("remote {operation} failed: {reason}")]
    Remote {
        operation: &'static str,
        reason: String,
    },

    #[error("cart merge completed with {} failed item(s)", .failures.len())]
    PartialReconciliation { failures: Vec<ReconcileFailure> },

    #[error("order {reference} recorded with {} missing line(s)", .failures.len())]
    PartialOrder {
        reference: String,
        failures: Vec<LineFailure>,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl StorefrontError {
    /// Single-field validation error without going through a derive.
    pub(crate) fn invalid(field: &'static str, message: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("invalid");
        error.message = Some(message.into());
        errors.add(field, error);
        Self::Validation(errors)
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
