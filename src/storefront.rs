//! Storefront composition root.
//!
//! Owns the guest cart store, the collaborator handles, and the pricing
//! rules, and exposes the operations the UI layer consumes. All of the
//! cross-component flows live here: resolving authoritative prices at
//! cart-add time, switching between guest and remote carts on login, and
//! assembling orders at checkout.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::cart_store::CartStore;
use crate::checkout::{build_order, generate_order_reference, Checkout};
use crate::config::PricingRules;
use crate::domain::aggregates::cart::{Cart, LineItem};
use crate::domain::aggregates::order::{Order, OrderLine};
use crate::domain::events::CartEvent;
use crate::gateway::{OrderStore, ProductCatalog, RemoteCartGateway};
use crate::reconcile::{reconcile_guest_cart, ReconcileReport};
use crate::storage::KeyValueStorage;
use crate::totals::{compute_totals, CartTotals};
use crate::{LineFailure, Result, StorefrontError};

pub struct Storefront<S> {
    guest_cart: CartStore<S>,
    catalog: Arc<dyn ProductCatalog>,
    orders: Arc<dyn OrderStore>,
    remote_cart: Option<Arc<dyn RemoteCartGateway>>,
    rules: PricingRules,
}

impl<S: KeyValueStorage> Storefront<S> {
    pub fn new(
        storage: S,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrderStore>,
        rules: PricingRules,
    ) -> Self {
        Self {
            guest_cart: CartStore::new(storage),
            catalog,
            orders,
            remote_cart: None,
            rules,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.remote_cart.is_some()
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// Subscribes to guest cart change notifications (navbar badges etc.).
    pub fn subscribe_cart(&self) -> tokio::sync::broadcast::Receiver<CartEvent> {
        self.guest_cart.subscribe()
    }

    /// Adds a product to the active cart at its current catalog price.
    ///
    /// The catalog is the price authority at add time; the UI's displayed
    /// price is never trusted.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: &str, quantity: i32) -> Result<()> {
        let product = self
            .catalog
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("product", product_id))?;

        match &self.remote_cart {
            Some(gateway) => {
                let remote = gateway.fetch_items().await?;
                match remote.iter().find(|i| i.product_id == product_id) {
                    Some(existing) => {
                        let next = i64::from(existing.quantity) + i64::from(quantity);
                        if next < 1 {
                            gateway.delete(product_id).await?;
                        } else {
                            gateway.update_quantity(product_id, next as u32).await?;
                        }
                    }
                    None if quantity >= 1 => {
                        gateway
                            .create(LineItem::new(product_id, quantity as u32, product.price))
                            .await?;
                    }
                    None => {}
                }
            }
            None => {
                self.guest_cart.add(product_id, quantity, product.price)?;
            }
        }
        Ok(())
    }

    pub async fn set_quantity(&self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Ok(());
        }
        match &self.remote_cart {
            Some(gateway) => {
                gateway.update_quantity(product_id, quantity).await?;
            }
            None => {
                self.guest_cart.set_quantity(product_id, quantity)?;
            }
        }
        Ok(())
    }

    pub async fn remove_from_cart(&self, product_id: &str) -> Result<()> {
        match &self.remote_cart {
            Some(gateway) => gateway.delete(product_id).await,
            None => self.guest_cart.remove(product_id).map(|_| ()),
        }
    }

    /// Items in the active cart: remote when signed in, guest otherwise.
    pub async fn cart_items(&self) -> Result<Vec<LineItem>> {
        match &self.remote_cart {
            Some(gateway) => gateway.fetch_items().await,
            None => Ok(self.guest_cart.get().items().to_vec()),
        }
    }

    pub fn guest_cart(&self) -> Cart {
        self.guest_cart.get()
    }

    pub async fn totals(&self) -> Result<CartTotals> {
        let items = self.cart_items().await?;
        compute_totals(&items, &self.rules)
    }

    /// Installs the signed-in user's cart gateway and merges the guest cart
    /// into it. Partial merge failures are carried in the report, not
    /// raised.
    #[instrument(skip_all)]
    pub async fn login(&mut self, gateway: Arc<dyn RemoteCartGateway>) -> Result<ReconcileReport> {
        let report =
            reconcile_guest_cart(&self.guest_cart, gateway.as_ref(), self.catalog.as_ref()).await?;
        self.remote_cart = Some(gateway);
        Ok(report)
    }

    pub fn logout(&mut self) {
        self.remote_cart = None;
    }

    pub fn begin_checkout(&self) -> Checkout {
        Checkout::new()
    }

    /// Converts the active cart into an order plus one line per cart item.
    ///
    /// Prices are re-resolved from the catalog at assembly time, so a stale
    /// cart price can neither under- nor over-charge. Any product missing
    /// from the catalog aborts before anything is written. If line creation
    /// fails after the order record exists, the order and the lines already
    /// written stay in place and the failure list is surfaced as
    /// [`StorefrontError::PartialOrder`], a recoverable inconsistency the
    /// caller must deal with, not silently retried. The cart is cleared
    /// only on full success.
    #[instrument(skip_all)]
    pub async fn place_order(&self, checkout: &mut Checkout) -> Result<Order> {
        if !checkout.ready_to_place() {
            return Err(StorefrontError::invalid(
                "checkout",
                "shipping and payment must be validated before placing an order",
            ));
        }
        let shipping = checkout
            .shipping()
            .cloned()
            .ok_or_else(|| StorefrontError::invalid("checkout", "missing shipping details"))?;

        let mut items = self.cart_items().await?;
        if items.is_empty() {
            return Err(StorefrontError::invalid(
                "cart",
                "cannot place an order from an empty cart",
            ));
        }

        // Re-resolve every price before anything is created.
        for item in &mut items {
            let product = self
                .catalog
                .get_by_id(&item.product_id)
                .await?
                .ok_or_else(|| StorefrontError::not_found("product", &item.product_id))?;
            item.unit_price = product.price;
        }

        let totals = compute_totals(&items, &self.rules)?;
        let reference = generate_order_reference();
        let order = self
            .orders
            .create(build_order(&reference, &shipping, totals.total.clone()))
            .await?;

        let mut failures = Vec::new();
        for item in &items {
            let line = OrderLine::new(
                &reference,
                &item.product_id,
                item.quantity,
                item.effective_unit_price(),
            );
            if let Err(err) = self.orders.create_line(line).await {
                failures.push(LineFailure {
                    product_id: item.product_id.clone(),
                    reason: err.to_string(),
                });
            }
        }
        if !failures.is_empty() {
            return Err(StorefrontError::PartialOrder {
                reference,
                failures,
            });
        }

        // Full success: confirm and drop both carts.
        checkout.mark_confirmed();
        self.guest_cart.clear()?;
        if let Some(gateway) = &self.remote_cart {
            gateway.clear().await?;
        }
        info!(reference = %order.reference, total = %order.total_amount, "order placed");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{PaymentDetails, ShippingDetails};
    use crate::domain::value_objects::Money;
    use crate::gateway::Product;
    use crate::memory::{MemoryCartGateway, MemoryCatalog, MemoryOrderStore, MemoryStorage};
    use rust_decimal::Decimal;

    fn usd(units: i64) -> Money {
        Money::usd(Decimal::new(units, 0))
    }

    fn seeded_catalog() -> Arc<MemoryCatalog> {
        let catalog = MemoryCatalog::new();
        catalog.insert(Product {
            id: "P1".into(),
            name: "Mechanical Keyboard".into(),
            price: usd(120),
            image_url: None,
        });
        catalog.insert(Product {
            id: "P2".into(),
            name: "Desk Mat".into(),
            price: usd(25),
            image_url: None,
        });
        Arc::new(catalog)
    }

    fn storefront(
        catalog: Arc<MemoryCatalog>,
        orders: Arc<MemoryOrderStore>,
    ) -> Storefront<MemoryStorage> {
        Storefront::new(
            MemoryStorage::new(),
            catalog,
            orders,
            PricingRules::default(),
        )
    }

    fn valid_shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            address: "1 Harbor St".into(),
            city: "Arlington".into(),
            zip_code: "22201".into(),
            country: "US".into(),
        }
    }

    fn valid_payment() -> PaymentDetails {
        PaymentDetails {
            card_number: "4242424242424242".into(),
            expiry: "11/28".into(),
            cvv: "4242".into(),
        }
    }

    async fn checkout_ready(storefront: &Storefront<MemoryStorage>) -> Checkout {
        let mut flow = storefront.begin_checkout();
        flow.begin().unwrap();
        flow.submit_shipping(valid_shipping()).unwrap();
        flow.submit_payment(valid_payment()).unwrap();
        flow
    }

    #[tokio::test]
    async fn test_add_to_cart_uses_catalog_price() {
        let catalog = seeded_catalog();
        let sf = storefront(catalog, Arc::new(MemoryOrderStore::new()));
        sf.add_to_cart("P1", 1).await.unwrap();
        assert_eq!(sf.guest_cart().find("P1").unwrap().unit_price, usd(120));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let sf = storefront(seeded_catalog(), Arc::new(MemoryOrderStore::new()));
        assert!(matches!(
            sf.add_to_cart("nope", 1).await,
            Err(StorefrontError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_place_order_creates_order_and_lines_and_clears_cart() {
        let orders = Arc::new(MemoryOrderStore::new());
        let sf = storefront(seeded_catalog(), Arc::clone(&orders));
        sf.add_to_cart("P1", 1).await.unwrap();
        sf.add_to_cart("P2", 2).await.unwrap();

        let mut flow = checkout_ready(&sf).await;
        let order = sf.place_order(&mut flow).await.unwrap();

        assert_eq!(flow.stage(), crate::checkout::CheckoutStage::Confirmed);
        // subtotal 170, tax 11.90, free shipping
        assert_eq!(order.total_amount.amount(), Decimal::new(18190, 2));
        assert_eq!(orders.lines_for(&order.reference).len(), 2);
        assert!(sf.guest_cart().is_empty());
    }

    #[tokio::test]
    async fn test_order_lines_snapshot_price_at_purchase() {
        let catalog = seeded_catalog();
        let orders = Arc::new(MemoryOrderStore::new());
        let sf = storefront(Arc::clone(&catalog), Arc::clone(&orders));
        sf.add_to_cart("P1", 1).await.unwrap();
        // Repriced between add and checkout: assembly must use 150...
        catalog.set_price("P1", usd(150));

        let mut flow = checkout_ready(&sf).await;
        let order = sf.place_order(&mut flow).await.unwrap();
        let lines = orders.lines_for(&order.reference);
        assert_eq!(lines[0].unit_price, usd(150));

        // ...and a later repricing must not reach back into the order line.
        catalog.set_price("P1", usd(999));
        assert_eq!(orders.lines_for(&order.reference)[0].unit_price, usd(150));
    }

    #[tokio::test]
    async fn test_unvalidated_checkout_cannot_place_order() {
        let sf = storefront(seeded_catalog(), Arc::new(MemoryOrderStore::new()));
        sf.add_to_cart("P1", 1).await.unwrap();
        let mut flow = sf.begin_checkout();
        assert!(sf.place_order(&mut flow).await.is_err());
        // Nothing happened to the cart.
        assert_eq!(sf.guest_cart().line_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_card_never_creates_an_order() {
        let orders = Arc::new(MemoryOrderStore::new());
        let sf = storefront(seeded_catalog(), Arc::clone(&orders));
        sf.add_to_cart("P1", 1).await.unwrap();

        let mut flow = sf.begin_checkout();
        flow.begin().unwrap();
        flow.submit_shipping(valid_shipping()).unwrap();
        let bad = PaymentDetails {
            card_number: "1234 5678 9012 345".into(),
            expiry: "11/28".into(),
            cvv: "123".into(),
        };
        assert!(flow.submit_payment(bad).is_err());
        assert!(sf.place_order(&mut flow).await.is_err());
        assert!(orders.orders().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_checkout() {
        let sf = storefront(seeded_catalog(), Arc::new(MemoryOrderStore::new()));
        let mut flow = checkout_ready(&sf).await;
        assert!(matches!(
            sf.place_order(&mut flow).await,
            Err(StorefrontError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_line_failure_surfaces_and_keeps_cart() {
        let orders = Arc::new(MemoryOrderStore::new());
        orders.fail_line_for("P2");
        let sf = storefront(seeded_catalog(), Arc::clone(&orders));
        sf.add_to_cart("P1", 1).await.unwrap();
        sf.add_to_cart("P2", 1).await.unwrap();

        let mut flow = checkout_ready(&sf).await;
        let (reference, failures) = match sf.place_order(&mut flow).await.unwrap_err() {
            StorefrontError::PartialOrder { reference, failures } => (reference, failures),
            other => panic!("expected PartialOrder, got {other}"),
        };
        assert_eq!(failures.len(), 1);
        // Order and the successful line remain; no rollback.
        assert_eq!(orders.orders().len(), 1);
        assert_eq!(orders.lines_for(&reference).len(), 1);
        // Cart untouched and flow not confirmed.
        assert_eq!(sf.guest_cart().line_count(), 2);
        assert_ne!(flow.stage(), crate::checkout::CheckoutStage::Confirmed);
    }

    #[tokio::test]
    async fn test_login_reconciles_then_uses_remote_cart() {
        let orders = Arc::new(MemoryOrderStore::new());
        let mut sf = storefront(seeded_catalog(), orders);
        sf.add_to_cart("P1", 2).await.unwrap();

        let gateway = Arc::new(MemoryCartGateway::with_items(vec![LineItem::new(
            "P1",
            3,
            usd(120),
        )]));
        let report = sf.login(Arc::clone(&gateway) as Arc<dyn crate::gateway::RemoteCartGateway>).await.unwrap();
        assert!(report.is_clean());
        assert!(sf.is_authenticated());

        let items = sf.cart_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert!(sf.guest_cart().is_empty());
    }

    #[tokio::test]
    async fn test_signed_in_checkout_clears_remote_cart() {
        let orders = Arc::new(MemoryOrderStore::new());
        let mut sf = storefront(seeded_catalog(), Arc::clone(&orders));
        let gateway = Arc::new(MemoryCartGateway::new());
        sf.login(Arc::clone(&gateway) as Arc<dyn crate::gateway::RemoteCartGateway>)
            .await
            .unwrap();
        sf.add_to_cart("P2", 3).await.unwrap();

        let mut flow = checkout_ready(&sf).await;
        sf.place_order(&mut flow).await.unwrap();
        assert!(gateway.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_guest_quantity_edits_and_removal() {
        let sf = storefront(seeded_catalog(), Arc::new(MemoryOrderStore::new()));
        sf.add_to_cart("P1", 1).await.unwrap();
        sf.set_quantity("P1", 4).await.unwrap();
        assert_eq!(sf.guest_cart().find("P1").unwrap().quantity, 4);
        // Below-one quantities are ignored rather than removing the line.
        sf.set_quantity("P1", 0).await.unwrap();
        assert_eq!(sf.guest_cart().find("P1").unwrap().quantity, 4);
        sf.remove_from_cart("P1").await.unwrap();
        assert!(sf.guest_cart().is_empty());
    }

    #[tokio::test]
    async fn test_logout_returns_to_guest_cart() {
        let mut sf = storefront(seeded_catalog(), Arc::new(MemoryOrderStore::new()));
        let gateway = Arc::new(MemoryCartGateway::new());
        sf.login(Arc::clone(&gateway) as Arc<dyn crate::gateway::RemoteCartGateway>).await.unwrap();
        sf.add_to_cart("P1", 1).await.unwrap();
        sf.logout();
        assert!(!sf.is_authenticated());
        assert!(sf.cart_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_add_merges_quantities() {
        let mut sf = storefront(seeded_catalog(), Arc::new(MemoryOrderStore::new()));
        let gateway = Arc::new(MemoryCartGateway::new());
        sf.login(Arc::clone(&gateway) as Arc<dyn crate::gateway::RemoteCartGateway>)
            .await
            .unwrap();
        sf.add_to_cart("P1", 1).await.unwrap();
        sf.add_to_cart("P1", 2).await.unwrap();
        let items = gateway.snapshot();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }
}
