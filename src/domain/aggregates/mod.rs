//! Domain aggregates.

pub mod cart;
pub mod order;
