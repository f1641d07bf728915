//! External collaborator boundaries.
//!
//! Remote records arrive as arbitrary field bags from the backing service;
//! implementations of these traits normalize them into the typed shapes
//! below once, on ingress, so nothing downstream handles untyped data.
//! Every call requires an authenticated session where noted; calling
//! without one is a programming error and fails fast with
//! [`StorefrontError::Unauthenticated`](crate::StorefrontError::Unauthenticated).

use async_trait::async_trait;

use crate::domain::aggregates::cart::LineItem;
use crate::domain::aggregates::order::{Order, OrderLine, OrderStatus};
use crate::domain::value_objects::Money;
use crate::Result;

/// Catalog entry, normalized at the boundary.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
}

/// Server-held cart of the signed-in user, keyed by product id.
///
/// No retry or timeout wrapping here: a rejection is terminal for that
/// attempt and retrying is the caller's (the user's) decision.
#[async_trait]
pub trait RemoteCartGateway: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<LineItem>>;
    async fn create(&self, item: LineItem) -> Result<LineItem>;
    async fn update_quantity(&self, product_id: &str, quantity: u32) -> Result<LineItem>;
    async fn delete(&self, product_id: &str) -> Result<()>;

    /// Removes every item. Default implementation fetches and deletes one
    /// by one, which is all the record-level backend offers.
    async fn clear(&self) -> Result<()> {
        for item in self.fetch_items().await? {
            self.delete(&item.product_id).await?;
        }
        Ok(())
    }
}

/// Read-side product lookup, the authority for current prices.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_by_id(&self, product_id: &str) -> Result<Option<Product>>;
}

/// Order and order-line records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: Order) -> Result<Order>;
    async fn create_line(&self, line: OrderLine) -> Result<OrderLine>;
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order>;
}
