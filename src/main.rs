//! Shopfront demo: wires the in-memory collaborators into a storefront and
//! walks a guest-browse → login → checkout session end to end.

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopfront::checkout::{PaymentDetails, ShippingDetails};
use shopfront::domain::aggregates::cart::LineItem;
use shopfront::format::format_price;
use shopfront::gateway::Product;
use shopfront::memory::{MemoryCartGateway, MemoryCatalog, MemoryOrderStore, MemoryStorage};
use shopfront::{Money, PricingRules, Storefront};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = Arc::new(MemoryCatalog::new());
    catalog.insert(Product {
        id: "kbd-01".into(),
        name: "Mechanical Keyboard".into(),
        price: Money::usd(Decimal::new(12900, 2)),
        image_url: None,
    });
    catalog.insert(Product {
        id: "mat-01".into(),
        name: "Desk Mat".into(),
        price: Money::usd(Decimal::new(2450, 2)),
        image_url: None,
    });

    let orders = Arc::new(MemoryOrderStore::new());
    let mut storefront = Storefront::new(
        MemoryStorage::new(),
        Arc::clone(&catalog) as Arc<dyn shopfront::gateway::ProductCatalog>,
        Arc::clone(&orders) as Arc<dyn shopfront::gateway::OrderStore>,
        PricingRules::from_env(),
    );

    // Browse as a guest.
    let mut cart_changes = storefront.subscribe_cart();
    storefront.add_to_cart("kbd-01", 1).await?;
    storefront.add_to_cart("mat-01", 2).await?;
    while let Ok(event) = cart_changes.try_recv() {
        tracing::info!(?event, "cart changed");
    }
    let totals = storefront.totals().await?;
    tracing::info!(
        subtotal = %format_price(&totals.subtotal),
        shipping = %format_price(&totals.shipping),
        total = %format_price(&totals.total),
        "guest cart totals"
    );

    // Sign in: the server already holds one keyboard in this user's cart.
    let gateway = Arc::new(MemoryCartGateway::with_items(vec![LineItem::new(
        "kbd-01",
        1,
        Money::usd(Decimal::new(12900, 2)),
    )]));
    let report = storefront
        .login(Arc::clone(&gateway) as Arc<dyn shopfront::gateway::RemoteCartGateway>)
        .await?;
    tracing::info!(
        merged = report.merged.len(),
        failed = report.failures.len(),
        "guest cart merged into account"
    );

    // Check out.
    let mut flow = storefront.begin_checkout();
    flow.begin()?;
    flow.submit_shipping(ShippingDetails {
        full_name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        address: "1 Harbor St".into(),
        city: "Arlington".into(),
        zip_code: "22201".into(),
        country: "US".into(),
    })?;
    flow.submit_payment(PaymentDetails {
        card_number: "4242 4242 4242 4242".into(),
        expiry: "11/28".into(),
        cvv: "123".into(),
    })?;
    let order = storefront.place_order(&mut flow).await?;

    tracing::info!(
        reference = %order.reference,
        total = %format_price(&order.total_amount),
        lines = orders.lines_for(&order.reference).len(),
        "order placed"
    );
    Ok(())
}
