use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

/// The persisted collections, one document each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Products,
    Movements,
    Compositions,
    ProductionOrders,
    InventoryCounts,
}

impl DocumentKind {
    /// Collection name, also used as the file stem by `JsonFileStore`.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Products => "products",
            DocumentKind::Movements => "movements",
            DocumentKind::Compositions => "compositions",
            DocumentKind::ProductionOrders => "production_orders",
            DocumentKind::InventoryCounts => "inventory_counts",
        }
    }
}

impl core::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {collection}: {source}")]
    Io {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {collection} document: {source}")]
    Serde {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub(crate) fn io(kind: DocumentKind, source: std::io::Error) -> Self {
        Self::Io {
            collection: kind.as_str(),
            source,
        }
    }

    pub(crate) fn serde(kind: DocumentKind, source: serde_json::Error) -> Self {
        Self::Serde {
            collection: kind.as_str(),
            source,
        }
    }
}

/// Whole-document storage of entity collections.
///
/// `read` returns `None` for a collection that was never written. `write`
/// replaces the stored document; a failed write must leave the previous
/// document intact.
pub trait DocumentStore: Send + Sync {
    fn read(&self, kind: DocumentKind) -> Result<Option<JsonValue>, StoreError>;

    fn write(&self, kind: DocumentKind, document: &JsonValue) -> Result<(), StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn read(&self, kind: DocumentKind) -> Result<Option<JsonValue>, StoreError> {
        (**self).read(kind)
    }

    fn write(&self, kind: DocumentKind, document: &JsonValue) -> Result<(), StoreError> {
        (**self).write(kind, document)
    }
}
