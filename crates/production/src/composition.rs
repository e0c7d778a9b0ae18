//! Composition (bill of materials) registry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{Collection, CompositionId, DomainError, DomainResult, Entity, ProductId};
use stockforge_products::ProductDirectory;

use crate::engine::ProductionOrderEngine;

/// One component line: quantity needed to build one finished unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionItem {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub id: CompositionId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub active: bool,
    /// Starts at 1 and increases on every edit. Orders keep the version they used.
    pub version: u32,
    pub items: Vec<CompositionItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Composition {
    type Id = CompositionId;
    const KIND: &'static str = "composition";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Composition {
    pub fn has_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

/// Input for creating, editing or importing a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComposition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub items: Vec<CompositionItem>,
}

fn default_active() -> bool {
    true
}

impl NewComposition {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: String::new(),
            active: true,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, product_id: ProductId, quantity: i64, unit: impl Into<String>) -> Self {
        self.items.push(CompositionItem {
            product_id,
            quantity,
            unit: unit.into(),
        });
        self
    }

    fn validate<D>(&self, products: &D) -> DomainResult<()>
    where
        D: ProductDirectory + ?Sized,
    {
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("composition code cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("composition name cannot be empty"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("composition must list at least one item"));
        }
        let mut seen = HashSet::new();
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(DomainError::validation("composition item quantity must be positive"));
            }
            if !seen.insert(item.product_id) {
                return Err(DomainError::validation(format!(
                    "component {} is listed more than once",
                    item.product_id
                )));
            }
            products.require(&item.product_id)?;
        }
        Ok(())
    }
}

/// Outcome of `CompositionRegistry::import`, by composition code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    /// Code and reason for drafts that failed validation.
    pub rejected: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct CompositionRegistry {
    compositions: Collection<Composition>,
}

impl CompositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Composition>) -> DomainResult<Self> {
        Ok(Self {
            compositions: Collection::from_records(records)?,
        })
    }

    pub fn records(&self) -> &[Composition] {
        self.compositions.as_slice()
    }

    pub fn get(&self, id: &CompositionId) -> Option<&Composition> {
        self.compositions.get(id)
    }

    pub fn require(&self, id: &CompositionId) -> DomainResult<&Composition> {
        self.compositions.require(id)
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Composition> {
        self.compositions.iter().find(|c| c.has_code(code))
    }

    pub fn list(&self) -> Vec<&Composition> {
        self.compositions.iter().collect()
    }

    pub fn create<D>(&mut self, products: &D, draft: NewComposition) -> DomainResult<&Composition>
    where
        D: ProductDirectory + ?Sized,
    {
        draft.validate(products)?;
        if self.find_by_code(&draft.code).is_some() {
            return Err(DomainError::conflict(format!(
                "composition code {} already exists",
                draft.code.trim()
            )));
        }
        let now = Utc::now();
        let composition = Composition {
            id: CompositionId::new(),
            code: draft.code.trim().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            active: draft.active,
            version: 1,
            items: draft.items,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(composition_id = %composition.id, code = %composition.code, "composition created");
        self.compositions.insert(composition)
    }

    /// Replace a composition's content and bump its version.
    pub fn update<D>(
        &mut self,
        products: &D,
        id: &CompositionId,
        draft: NewComposition,
    ) -> DomainResult<&Composition>
    where
        D: ProductDirectory + ?Sized,
    {
        draft.validate(products)?;
        if self
            .compositions
            .iter()
            .any(|c| c.id != *id && c.has_code(&draft.code))
        {
            return Err(DomainError::conflict(format!(
                "composition code {} already exists",
                draft.code.trim()
            )));
        }
        let composition = self.compositions.require_mut(id)?;
        composition.code = draft.code.trim().to_string();
        composition.name = draft.name.trim().to_string();
        composition.description = draft.description;
        composition.active = draft.active;
        composition.items = draft.items;
        composition.version += 1;
        composition.updated_at = Utc::now();
        tracing::info!(composition_id = %id, version = composition.version, "composition updated");
        Ok(composition)
    }

    /// Delete a composition no live production order refers to.
    pub fn delete(
        &mut self,
        id: &CompositionId,
        orders: &ProductionOrderEngine,
    ) -> DomainResult<Composition> {
        self.compositions.require(id)?;
        if orders.has_live_orders_for(id) {
            return Err(DomainError::conflict(format!(
                "composition {id} is used by production orders that are not cancelled"
            )));
        }
        let removed = self
            .compositions
            .remove(id)
            .ok_or_else(|| DomainError::not_found(format!("composition {id}")))?;
        tracing::info!(composition_id = %id, code = %removed.code, "composition deleted");
        Ok(removed)
    }

    /// Merge drafts by code: new codes are inserted, existing ones are left
    /// alone unless `update_existing` is set. Invalid drafts are reported, not fatal.
    pub fn import<D>(
        &mut self,
        products: &D,
        drafts: Vec<NewComposition>,
        update_existing: bool,
    ) -> ImportReport
    where
        D: ProductDirectory + ?Sized,
    {
        let mut report = ImportReport::default();
        for draft in drafts {
            let code = draft.code.trim().to_string();
            let existing = self.find_by_code(&code).map(|c| c.id);
            let outcome = match existing {
                Some(_) if !update_existing => {
                    report.skipped.push(code);
                    continue;
                }
                Some(id) => self.update(products, &id, draft).map(|_| true),
                None => self.create(products, draft).map(|_| false),
            };
            match outcome {
                Ok(true) => report.updated.push(code),
                Ok(false) => report.inserted.push(code),
                Err(err) => report.rejected.push((code, err.to_string())),
            }
        }
        tracing::info!(
            inserted = report.inserted.len(),
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "composition import merged"
        );
        report
    }
}
