//! Persistent guest cart store.
//!
//! Wraps a [`KeyValueStorage`] with the cart schema: serialize on every
//! mutation, validate and default on every read. Reads fail soft: a
//! missing or malformed blob logs a warning and yields an empty cart, it
//! never surfaces an error to the caller.
//!
//! Mutations broadcast [`CartEvent`]s so every subscribed surface stays in
//! sync without reloading.

use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::aggregates::cart::Cart;
use crate::domain::events::CartEvent;
use crate::domain::value_objects::Money;
use crate::storage::KeyValueStorage;
use crate::{Result, StorefrontError};

pub const CART_STORAGE_KEY: &str = "cart";

const EVENT_CHANNEL_CAPACITY: usize = 32;

pub struct CartStore<S> {
    storage: S,
    key: String,
    events: broadcast::Sender<CartEvent>,
}

impl<S: KeyValueStorage> CartStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, CART_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            key: key.to_string(),
            events,
        }
    }

    /// Subscribes to cart change notifications. Receivers created after an
    /// event was sent do not see it; subscribe before mutating.
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    /// Current cart. Missing or malformed persisted state yields an empty
    /// cart.
    pub fn get(&self) -> Cart {
        let raw = match self.storage.get(&self.key) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "guest cart read failed, treating as empty");
                return Cart::new();
            }
        };
        match raw {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
                warn!(error = %err, "guest cart blob malformed, treating as empty");
                Cart::new()
            }),
            None => Cart::new(),
        }
    }

    /// Adds `delta` units of a product; see
    /// [`Cart::add`](crate::domain::aggregates::cart::Cart::add) for the
    /// merge and clamp rules.
    pub fn add(&self, product_id: &str, delta: i32, unit_price: Money) -> Result<Cart> {
        let mut cart = self.get();
        cart.add(product_id, delta, unit_price);
        self.commit(cart)
    }

    pub fn set_quantity(&self, product_id: &str, quantity: u32) -> Result<Cart> {
        let mut cart = self.get();
        cart.set_quantity(product_id, quantity)?;
        self.commit(cart)
    }

    pub fn remove(&self, product_id: &str) -> Result<Cart> {
        let mut cart = self.get();
        cart.remove(product_id)?;
        self.commit(cart)
    }

    /// Drops the persisted blob entirely rather than writing an empty cart.
    pub fn clear(&self) -> Result<Cart> {
        self.storage.remove(&self.key)?;
        let _ = self.events.send(CartEvent::Cleared);
        Ok(Cart::new())
    }

    /// Persists synchronously, then notifies subscribers.
    fn commit(&self, mut cart: Cart) -> Result<Cart> {
        let json = serde_json::to_string(&cart)
            .map_err(|e| StorefrontError::Storage(format!("cart serialize: {e}")))?;
        self.storage.set(&self.key, &json)?;
        for event in cart.take_events() {
            // Send only fails when nobody is listening, which is fine.
            let _ = self.events.send(event);
        }
        Ok(cart)
    }
}
