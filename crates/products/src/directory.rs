//! Product directory: the one place `current_stock` is stored.

use chrono::Utc;

use stockforge_core::{Collection, DomainError, DomainResult, ProductId};

use crate::product::{NewProduct, Product, ProductPatch};

/// Directory operations every engine relies on.
///
/// Implementations must clamp `current_stock` at zero on every write.
pub trait ProductDirectory {
    fn get(&self, id: &ProductId) -> Option<&Product>;

    fn list(&self) -> Vec<&Product>;

    /// Store a new stock quantity, clamped at zero. Returns the stored value.
    fn set_stock(&mut self, id: &ProductId, qty: i64) -> DomainResult<i64>;

    fn update(&mut self, id: &ProductId, patch: ProductPatch) -> DomainResult<&Product>;

    fn require(&self, id: &ProductId) -> DomainResult<&Product> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    /// Add a signed delta to the current stock (clamped). Returns the stored value.
    fn apply_delta(&mut self, id: &ProductId, delta: i64) -> DomainResult<i64> {
        let current = self.require(id)?.current_stock;
        let target = current
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("stock quantity overflow"))?;
        self.set_stock(id, target)
    }
}

/// In-memory product directory backed by an arena collection.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Collection<Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Product>) -> DomainResult<Self> {
        Ok(Self {
            products: Collection::from_records(records)?,
        })
    }

    pub fn records(&self) -> &[Product] {
        self.products.as_slice()
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.has_code(code))
    }

    /// Register a product. Codes are unique ignoring case.
    pub fn create(&mut self, draft: NewProduct) -> DomainResult<&Product> {
        draft.validate()?;
        if self.find_by_code(&draft.code).is_some() {
            return Err(DomainError::conflict(format!(
                "product code {} already exists",
                draft.code.trim()
            )));
        }
        let product = draft.into_product(Utc::now());
        tracing::info!(product_id = %product.id, code = %product.code, "product registered");
        self.products.insert(product)
    }

    pub fn remove(&mut self, id: &ProductId) -> DomainResult<Product> {
        let removed = self
            .products
            .remove(id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;
        tracing::info!(product_id = %id, code = %removed.code, "product removed");
        Ok(removed)
    }
}

impl ProductDirectory for ProductCatalog {
    fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    fn list(&self) -> Vec<&Product> {
        self.products.iter().collect()
    }

    fn set_stock(&mut self, id: &ProductId, qty: i64) -> DomainResult<i64> {
        let product = self.products.require_mut(id)?;
        let stored = if qty < 0 {
            tracing::warn!(
                product_id = %id,
                code = %product.code,
                requested = qty,
                "stock would go negative; clamped to zero"
            );
            0
        } else {
            qty
        };
        product.current_stock = stored;
        product.updated_at = Utc::now();
        Ok(stored)
    }

    fn update(&mut self, id: &ProductId, patch: ProductPatch) -> DomainResult<&Product> {
        patch.validate()?;
        if let Some(code) = patch.code.as_deref() {
            if self
                .products
                .iter()
                .any(|p| p.id != *id && p.has_code(code))
            {
                return Err(DomainError::conflict(format!(
                    "product code {} already exists",
                    code.trim()
                )));
            }
        }
        let product = self.products.require_mut(id)?;
        patch.apply_to(product, Utc::now());
        Ok(product)
    }
}
