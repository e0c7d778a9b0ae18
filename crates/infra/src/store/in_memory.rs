use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::r#trait::{DocumentKind, DocumentStore, StoreError};

/// In-memory document store.
///
/// Intended for tests/dev. Documents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentKind, JsonValue>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn read(&self, kind: DocumentKind) -> Result<Option<JsonValue>, StoreError> {
        let documents = self.documents.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(documents.get(&kind).cloned())
    }

    fn write(&self, kind: DocumentKind, document: &JsonValue) -> Result<(), StoreError> {
        let mut documents = self.documents.write().map_err(|_| StoreError::LockPoisoned)?;
        documents.insert(kind, document.clone());
        Ok(())
    }
}
