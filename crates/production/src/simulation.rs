//! What-if demand simulation over compositions. Never writes.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockforge_core::{CompositionId, DomainError, DomainResult, ProductId};
use stockforge_products::ProductDirectory;

use crate::composition::CompositionRegistry;
use crate::explosion::explode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRequest {
    pub composition_id: CompositionId,
    pub multiplier: i64,
}

/// Projected position of one component after all requested production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandLine {
    pub product_id: ProductId,
    pub product_code: String,
    pub description: String,
    pub unit: String,
    pub current_stock: i64,
    pub min_stock: i64,
    pub total_required: i64,
    pub after_projection: i64,
    pub shortage: i64,
    pub below_minimum: bool,
    pub purchase_suggestion: i64,
}

impl DemandLine {
    fn rank(&self, other: &Self) -> Ordering {
        (other.shortage > 0)
            .cmp(&(self.shortage > 0))
            .then_with(|| other.below_minimum.cmp(&self.below_minimum))
            .then_with(|| other.total_required.cmp(&self.total_required))
            .then_with(|| self.product_code.cmp(&other.product_code))
    }
}

/// Aggregate component demand for `requests` and project it against current stock.
///
/// Lines are ordered shortages first, then below-minimum, then by descending
/// total requirement, ties broken by product code.
pub fn simulate<D>(
    products: &D,
    registry: &CompositionRegistry,
    requests: &[DemandRequest],
) -> DomainResult<Vec<DemandLine>>
where
    D: ProductDirectory + ?Sized,
{
    if requests.is_empty() {
        return Err(DomainError::validation("simulation needs at least one request"));
    }

    let mut order: Vec<ProductId> = Vec::new();
    let mut required: HashMap<ProductId, i64> = HashMap::new();
    for request in requests {
        let composition = registry.require(&request.composition_id)?;
        for item in explode(products, composition, request.multiplier)? {
            let total = required.entry(item.product_id).or_insert_with(|| {
                order.push(item.product_id);
                0
            });
            *total = total
                .checked_add(item.required_qty)
                .ok_or_else(|| DomainError::validation("simulated demand overflows"))?;
        }
    }

    let overflow = || DomainError::validation("simulated demand overflows");
    let mut lines = Vec::with_capacity(order.len());
    for product_id in order {
        let product = products.require(&product_id)?;
        let total_required = required.get(&product_id).copied().unwrap_or_default();
        let after_projection = product
            .current_stock
            .checked_sub(total_required)
            .ok_or_else(overflow)?;
        let shortage = after_projection.checked_neg().ok_or_else(overflow)?.max(0);
        let below_minimum = after_projection < product.min_stock;
        let purchase_suggestion = if below_minimum {
            product
                .min_stock
                .checked_sub(after_projection)
                .ok_or_else(overflow)?
                .max(0)
        } else {
            0
        };
        lines.push(DemandLine {
            product_id,
            product_code: product.code.clone(),
            description: product.description.clone(),
            unit: product.unit.clone(),
            current_stock: product.current_stock,
            min_stock: product.min_stock,
            total_required,
            after_projection,
            shortage,
            below_minimum,
            purchase_suggestion,
        });
    }
    lines.sort_by(DemandLine::rank);

    tracing::debug!(
        requests = requests.len(),
        components = lines.len(),
        shortages = lines.iter().filter(|l| l.shortage > 0).count(),
        "demand simulated"
    );
    Ok(lines)
}
