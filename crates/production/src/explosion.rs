//! Bill-of-materials explosion.

use chrono::{DateTime, Utc};

use stockforge_core::{DomainError, DomainResult};
use stockforge_products::ProductDirectory;

use crate::composition::Composition;
use crate::order::{ExitType, ProductionOrderDraft, ProductionOrderItem};

/// Expand `composition` for `multiplier` finished units.
///
/// One item per component, in composition order, with
/// `required_qty = quantity × multiplier`, fully delivered and selected.
pub fn explode<D>(
    products: &D,
    composition: &Composition,
    multiplier: i64,
) -> DomainResult<Vec<ProductionOrderItem>>
where
    D: ProductDirectory + ?Sized,
{
    if multiplier <= 0 {
        return Err(DomainError::validation("multiplier must be positive"));
    }
    composition
        .items
        .iter()
        .map(|component| {
            let product = products.require(&component.product_id)?;
            let required_qty = component.quantity.checked_mul(multiplier).ok_or_else(|| {
                DomainError::validation(format!(
                    "required quantity of {} overflows for multiplier {multiplier}",
                    product.code
                ))
            })?;
            Ok(ProductionOrderItem {
                product_id: component.product_id,
                product_code: product.code.clone(),
                required_qty,
                delivered_qty: required_qty,
                unit: if component.unit.is_empty() {
                    product.unit.clone()
                } else {
                    component.unit.clone()
                },
                selected: true,
                movement_id: None,
            })
        })
        .collect()
}

impl ProductionOrderDraft {
    /// Draft with the exploded items of `composition`, ready to be adjusted.
    pub fn for_composition<D>(
        products: &D,
        composition: &Composition,
        multiplier: i64,
        exit_type: ExitType,
        project_code: impl Into<String>,
        collaborator: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self>
    where
        D: ProductDirectory + ?Sized,
    {
        Ok(Self {
            composition_id: composition.id,
            project_code: project_code.into(),
            multiplier,
            exit_type,
            items: explode(products, composition, multiplier)?,
            collaborator: collaborator.into(),
            occurred_at,
        })
    }
}
