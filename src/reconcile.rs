//! Guest cart reconciliation.
//!
//! Runs once per login transition: merges the locally persisted guest cart
//! into the signed-in user's remote cart, then drops the local copy. Items
//! are processed independently: one failing item never blocks the rest,
//! and the caller gets the full failure list, not a boolean.

use tracing::{info, warn};

use crate::cart_store::CartStore;
use crate::gateway::{ProductCatalog, RemoteCartGateway};
use crate::storage::KeyValueStorage;
use crate::{ReconcileFailure, Result, StorefrontError};

/// Outcome of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Products whose quantities now live in the remote cart.
    pub merged: Vec<String>,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts a partially failed run into
    /// [`StorefrontError::PartialReconciliation`] for callers that want
    /// `?`-style propagation.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(StorefrontError::PartialReconciliation {
                failures: self.failures,
            })
        }
    }
}

/// Merges the guest cart into the remote cart.
///
/// For each guest line: a product already in the remote cart gets a
/// quantity update of `remote + local`; an absent product is created with
/// the catalog's current price, never the possibly stale price cached in
/// the guest cart. The guest store is cleared once processing finishes,
/// whether or not individual items failed (failed items are reported, not
/// silently retried), which also makes a back-to-back second call a no-op.
///
/// Only a failure to fetch the remote cart aborts the run as a whole; the
/// guest cart is left untouched in that case.
pub async fn reconcile_guest_cart<S: KeyValueStorage>(
    store: &CartStore<S>,
    gateway: &dyn RemoteCartGateway,
    catalog: &dyn ProductCatalog,
) -> Result<ReconcileReport> {
    let guest = store.get();
    if guest.is_empty() {
        return Ok(ReconcileReport::default());
    }

    let remote = gateway.fetch_items().await?;
    let mut report = ReconcileReport::default();

    for item in guest.items() {
        let outcome = match remote.iter().find(|r| r.product_id == item.product_id) {
            Some(existing) => gateway
                .update_quantity(&item.product_id, existing.quantity + item.quantity)
                .await
                .map(|_| ()),
            None => merge_new_item(gateway, catalog, item).await,
        };
        match outcome {
            Ok(()) => report.merged.push(item.product_id.clone()),
            Err(err) => {
                warn!(product_id = %item.product_id, error = %err, "cart item failed to merge");
                report.failures.push(ReconcileFailure {
                    product_id: item.product_id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    store.clear()?;
    info!(
        merged = report.merged.len(),
        failed = report.failures.len(),
        "guest cart reconciled"
    );
    Ok(report)
}

async fn merge_new_item(
    gateway: &dyn RemoteCartGateway,
    catalog: &dyn ProductCatalog,
    item: &crate::domain::aggregates::cart::LineItem,
) -> Result<()> {
    let product = catalog
        .get_by_id(&item.product_id)
        .await?
        .ok_or_else(|| StorefrontError::not_found("product", &item.product_id))?;
    let mut line = item.clone();
    line.unit_price = product.price;
    gateway.create(line).await.map(|_| ())
}
