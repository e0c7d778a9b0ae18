//! Document persistence boundary.
//!
//! Each entity collection is stored as one JSON document and always read or
//! written whole. Adapters decide where documents live.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use json_file::JsonFileStore;
pub use r#trait::{DocumentKind, DocumentStore, StoreError};
