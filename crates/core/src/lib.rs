//! `stockforge-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod collection;
pub mod entity;
pub mod error;
pub mod id;

pub use collection::Collection;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompositionId, InventoryCountId, MovementId, ProductId, ProductionOrderId};
