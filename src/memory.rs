//! In-memory collaborator implementations.
//!
//! Back the demo binary and the test suite. `MemoryCartGateway` and
//! `MemoryOrderStore` support injected per-record failures so partial
//! outcomes can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::aggregates::cart::LineItem;
use crate::domain::aggregates::order::{Order, OrderLine, OrderStatus};
use crate::gateway::{OrderStore, Product, ProductCatalog, RemoteCartGateway};
use crate::storage::KeyValueStorage;
use crate::{Result, StorefrontError};

// =============================================================================
// Key-value storage
// =============================================================================

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds a raw blob, bypassing any schema. Lets tests stage
    /// malformed persisted state.
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// Remote cart
// =============================================================================

pub struct MemoryCartGateway {
    authenticated: bool,
    items: Mutex<Vec<LineItem>>,
    failing_products: Mutex<HashSet<String>>,
}

impl MemoryCartGateway {
    pub fn new() -> Self {
        Self {
            authenticated: true,
            items: Mutex::new(vec![]),
            failing_products: Mutex::new(HashSet::new()),
        }
    }

    /// Gateway with no session behind it; every call fails fast.
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    pub fn with_items(items: Vec<LineItem>) -> Self {
        let gateway = Self::new();
        *gateway.items.lock().unwrap() = items;
        gateway
    }

    /// Makes writes touching `product_id` fail with a remote error.
    pub fn fail_product(&self, product_id: &str) {
        self.failing_products
            .lock()
            .unwrap()
            .insert(product_id.to_string());
    }

    pub fn snapshot(&self) -> Vec<LineItem> {
        self.items.lock().unwrap().clone()
    }

    fn guard(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(StorefrontError::Unauthenticated)
        }
    }

    fn check_injected_failure(&self, operation: &'static str, product_id: &str) -> Result<()> {
        if self.failing_products.lock().unwrap().contains(product_id) {
            return Err(StorefrontError::Remote {
                operation,
                reason: format!("injected failure for {product_id}"),
            });
        }
        Ok(())
    }
}

impl Default for MemoryCartGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCartGateway for MemoryCartGateway {
    async fn fetch_items(&self) -> Result<Vec<LineItem>> {
        self.guard()?;
        Ok(self.snapshot())
    }

    async fn create(&self, item: LineItem) -> Result<LineItem> {
        self.guard()?;
        self.check_injected_failure("cart create", &item.product_id)?;
        let mut items = self.items.lock().unwrap();
        if items.iter().any(|i| i.product_id == item.product_id) {
            return Err(StorefrontError::Remote {
                operation: "cart create",
                reason: format!("duplicate product {}", item.product_id),
            });
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn update_quantity(&self, product_id: &str, quantity: u32) -> Result<LineItem> {
        self.guard()?;
        self.check_injected_failure("cart update", product_id)?;
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| StorefrontError::not_found("cart item", product_id))?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn delete(&self, product_id: &str) -> Result<()> {
        self.guard()?;
        self.check_injected_failure("cart delete", product_id)?;
        self.items
            .lock()
            .unwrap()
            .retain(|i| i.product_id != product_id);
        Ok(())
    }
}

// =============================================================================
// Product catalog
// =============================================================================

#[derive(Default)]
pub struct MemoryCatalog {
    products: Mutex<HashMap<String, Product>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products
            .lock()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    /// Repoints a product at a new price, for stale-price tests.
    pub fn set_price(&self, product_id: &str, price: crate::domain::value_objects::Money) {
        if let Some(p) = self.products.lock().unwrap().get_mut(product_id) {
            p.price = price;
        }
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn get_by_id(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.products.lock().unwrap().get(product_id).cloned())
    }
}

// =============================================================================
// Order store
// =============================================================================

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
    lines: Mutex<Vec<OrderLine>>,
    failing_line_products: Mutex<HashSet<String>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_line` fail for the given product.
    pub fn fail_line_for(&self, product_id: &str) {
        self.failing_line_products
            .lock()
            .unwrap()
            .insert(product_id.to_string());
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<OrderLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn lines_for(&self, order_ref: &str) -> Vec<OrderLine> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.order_ref == order_ref)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: Order) -> Result<Order> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn create_line(&self, line: OrderLine) -> Result<OrderLine> {
        if self
            .failing_line_products
            .lock()
            .unwrap()
            .contains(&line.product_id)
        {
            return Err(StorefrontError::Remote {
                operation: "order line create",
                reason: format!("injected failure for {}", line.product_id),
            });
        }
        self.lines.lock().unwrap().push(line.clone());
        Ok(line)
    }

    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| StorefrontError::not_found("order", order_id))?;
        order.transition(status)?;
        Ok(order.clone())
    }
}
