//! Infrastructure layer: document persistence and the shared warehouse state.

pub mod store;
pub mod warehouse;


pub use store::{DocumentKind, DocumentStore, InMemoryDocumentStore, JsonFileStore, StoreError};
pub use warehouse::{Warehouse, WarehouseError, WarehouseState};
