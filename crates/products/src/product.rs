use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{DomainError, DomainResult, Entity, ProductId};

/// ABC classification by consumption share, maintained outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbcCurve {
    A,
    B,
    C,
}

/// A stocked product.
///
/// `current_stock` is never negative; the directory clamps every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub description: String,
    pub category: String,
    pub unit: String,
    pub min_stock: i64,
    pub current_stock: i64,
    /// Quantity reported by the external ERP; only used for divergence alerts.
    pub stock_omie: i64,
    /// Warehouse address, e.g. `A-01-03`. The leading segment is the sector.
    pub address: String,
    #[serde(default)]
    pub abc_curve: Option<AbcCurve>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Product {
    /// Case-insensitive code comparison (codes are unique ignoring case).
    pub fn has_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    /// Leading address segment (`A` for `A-01-03`).
    pub fn sector(&self) -> &str {
        self.address
            .split(['-', '.', '/', ' '])
            .next()
            .unwrap_or_default()
    }

    /// Whether the address starts with `prefix`, ignoring case.
    pub fn in_sector(&self, prefix: &str) -> bool {
        let prefix = prefix.trim();
        !prefix.is_empty()
            && self
                .address
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.current_stock == 0
    }

    pub fn is_below_minimum(&self) -> bool {
        self.current_stock < self.min_stock
    }
}

/// Input for registering a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub stock_omie: i64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub abc_curve: Option<AbcCurve>,
}

fn default_unit() -> String {
    "UN".to_string()
}

impl NewProduct {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            category: String::new(),
            unit: default_unit(),
            min_stock: 0,
            current_stock: 0,
            stock_omie: 0,
            address: String::new(),
            abc_curve: None,
        }
    }

    pub fn with_stock(mut self, current_stock: i64) -> Self {
        self.current_stock = current_stock;
        self
    }

    pub fn with_min_stock(mut self, min_stock: i64) -> Self {
        self.min_stock = min_stock;
        self
    }

    pub fn with_stock_omie(mut self, stock_omie: i64) -> Self {
        self.stock_omie = stock_omie;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_curve(mut self, curve: AbcCurve) -> Self {
        self.abc_curve = Some(curve);
        self
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("product description cannot be empty"));
        }
        check_non_negative("min_stock", self.min_stock)?;
        check_non_negative("current_stock", self.current_stock)?;
        check_non_negative("stock_omie", self.stock_omie)
    }

    pub(crate) fn into_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::new(),
            code: self.code.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            unit: self.unit,
            min_stock: self.min_stock,
            current_stock: self.current_stock,
            stock_omie: self.stock_omie,
            address: self.address.trim().to_string(),
            abc_curve: self.abc_curve,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of descriptive fields and reference quantities.
///
/// `current_stock` is deliberately absent: it only changes through
/// `ProductDirectory::set_stock`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub code: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<i64>,
    pub stock_omie: Option<i64>,
    pub address: Option<String>,
    pub abc_curve: Option<AbcCurve>,
}

impl ProductPatch {
    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.code.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(DomainError::validation("product description cannot be empty"));
        }
        if let Some(v) = self.min_stock {
            check_non_negative("min_stock", v)?;
        }
        if let Some(v) = self.stock_omie {
            check_non_negative("stock_omie", v)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(code) = self.code {
            product.code = code.trim().to_string();
        }
        if let Some(description) = self.description {
            product.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(min_stock) = self.min_stock {
            product.min_stock = min_stock;
        }
        if let Some(stock_omie) = self.stock_omie {
            product.stock_omie = stock_omie;
        }
        if let Some(address) = self.address {
            product.address = address.trim().to_string();
        }
        if self.abc_curve.is_some() {
            product.abc_curve = self.abc_curve;
        }
        product.updated_at = now;
    }
}

fn check_non_negative(field: &str, value: i64) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}
