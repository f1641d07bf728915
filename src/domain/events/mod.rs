//! Cart change events.
//!
//! Raised by the [`Cart`](crate::domain::aggregates::cart::Cart) aggregate
//! on every mutation and broadcast by the cart store so that any number of
//! UI surfaces (a navbar badge, an open cart page) stay in sync without
//! polling.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { product_id: String, quantity: u32 },
    QuantityChanged { product_id: String, quantity: u32 },
    ItemRemoved { product_id: String },
    Cleared,
}

impl CartEvent {
    /// Product the event concerns, if any.
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::ItemAdded { product_id, .. }
            | Self::QuantityChanged { product_id, .. }
            | Self::ItemRemoved { product_id } => Some(product_id),
            Self::Cleared => None,
        }
    }
}
