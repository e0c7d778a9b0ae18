use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{DomainError, DomainResult, Entity, InventoryCountId, MovementId, ProductId};
use stockforge_products::AbcCurve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountStatus {
    Planejado,
    EmAndamento,
    ContagemFinalizada,
    Ajustado,
    Cancelado,
}

impl CountStatus {
    /// Planned or in progress.
    pub fn is_active(self) -> bool {
        matches!(self, CountStatus::Planejado | CountStatus::EmAndamento)
    }

    /// Counting is over and divergences are known.
    pub fn is_finalized(self) -> bool {
        matches!(self, CountStatus::ContagemFinalizada | CountStatus::Ajustado)
    }

    /// Adjusted or cancelled; nothing can happen to the count any more.
    pub fn is_terminal(self) -> bool {
        matches!(self, CountStatus::Ajustado | CountStatus::Cancelado)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountMethod {
    Simple,
    /// Counters do not see the expected quantity while counting.
    Blind,
    /// Two independent counts per item must agree.
    DoubleCount,
    /// Every count records who counted.
    FullTraceability,
}

/// Which products a count covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountScope {
    Products(Vec<ProductId>),
    /// Address prefix, matched case-insensitively.
    Sector(String),
    Curve(AbcCurve),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pendente,
    Contado,
    Recontagem,
    Divergente,
    Ajustado,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCountItem {
    pub product_id: ProductId,
    pub product_code: String,
    pub address: String,
    /// `current_stock` when the count was created.
    pub expected_qty: i64,
    /// `stock_omie` when the count was created.
    pub expected_qty_omie: i64,
    pub counted_qty: Option<i64>,
    pub second_count_qty: Option<i64>,
    pub counted_by: Option<String>,
    pub counted_at: Option<DateTime<Utc>>,
    pub status: ItemStatus,
    pub divergence: Option<i64>,
    pub divergence_percent: Option<f64>,
    pub divergence_omie: Option<i64>,
    #[serde(default)]
    pub cause_analysis: Option<String>,
}

impl InventoryCountItem {
    pub(crate) fn snapshot(product: &stockforge_products::Product) -> Self {
        Self {
            product_id: product.id,
            product_code: product.code.clone(),
            address: product.address.clone(),
            expected_qty: product.current_stock,
            expected_qty_omie: product.stock_omie,
            counted_qty: None,
            second_count_qty: None,
            counted_by: None,
            counted_at: None,
            status: ItemStatus::Pendente,
            divergence: None,
            divergence_percent: None,
            divergence_omie: None,
            cause_analysis: None,
        }
    }

    pub fn is_counted(&self) -> bool {
        self.counted_qty.is_some()
    }

    /// Derive divergence fields from the effective count. Uncounted items are left alone.
    pub(crate) fn settle(&mut self) {
        let Some(counted) = self.counted_qty else {
            return;
        };
        let divergence = counted - self.expected_qty;
        self.divergence = Some(divergence);
        self.divergence_percent = divergence_percent(divergence, self.expected_qty);
        self.divergence_omie = Some(counted - self.expected_qty_omie);
        self.status = if divergence == 0 {
            ItemStatus::Contado
        } else {
            ItemStatus::Divergente
        };
    }
}

/// Percentage of `expected`, rounded to two decimals. Undefined for a
/// non-zero divergence against an expected quantity of zero.
pub fn divergence_percent(divergence: i64, expected: i64) -> Option<f64> {
    if expected == 0 {
        return (divergence == 0).then_some(0.0);
    }
    let pct = divergence as f64 / expected as f64 * 100.0;
    Some((pct * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCount {
    pub id: InventoryCountId,
    /// `INV-YYYYMMDD-NNN`, sequential per day.
    pub code: String,
    pub name: String,
    pub method: CountMethod,
    pub scope: CountScope,
    pub items: Vec<InventoryCountItem>,
    pub status: CountStatus,
    pub collaborator: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub adjusted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub adjustment_movement_ids: Vec<MovementId>,
}

impl Entity for InventoryCount {
    type Id = InventoryCountId;
    const KIND: &'static str = "inventory count";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl InventoryCount {
    pub fn item(&self, product_id: &ProductId) -> Option<&InventoryCountItem> {
        self.items.iter().find(|i| i.product_id == *product_id)
    }

    pub(crate) fn item_mut(&mut self, product_id: &ProductId) -> DomainResult<&mut InventoryCountItem> {
        let code = self.code.clone();
        self.items
            .iter_mut()
            .find(|i| i.product_id == *product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id} in count {code}")))
    }

    /// Blind counts keep expected quantities away from counters until counting ends.
    pub fn hides_expected(&self) -> bool {
        self.method == CountMethod::Blind && self.status.is_active()
    }

    pub fn counted_items(&self) -> usize {
        self.items.iter().filter(|i| i.is_counted()).count()
    }

    pub fn divergent_items(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Divergente | ItemStatus::Ajustado))
            .count()
    }
}

/// Input for `InventoryCountEngine::create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryCount {
    pub name: String,
    pub method: CountMethod,
    pub scope: CountScope,
    pub collaborator: String,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// One counter's entry for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub counted_qty: i64,
    #[serde(default)]
    pub second_count_qty: Option<i64>,
    #[serde(default)]
    pub counted_by: Option<String>,
    pub counted_at: DateTime<Utc>,
}

impl CountEntry {
    pub fn new(counted_qty: i64, counted_at: DateTime<Utc>) -> Self {
        Self {
            counted_qty,
            second_count_qty: None,
            counted_by: None,
            counted_at,
        }
    }

    pub fn with_second_count(mut self, qty: i64) -> Self {
        self.second_count_qty = Some(qty);
        self
    }

    pub fn counted_by(mut self, who: impl Into<String>) -> Self {
        self.counted_by = Some(who.into());
        self
    }

    pub(crate) fn validate(&self, method: CountMethod) -> DomainResult<()> {
        if self.counted_qty < 0 || self.second_count_qty.is_some_and(|q| q < 0) {
            return Err(DomainError::validation("counted quantity cannot be negative"));
        }
        match method {
            CountMethod::FullTraceability
                if self.counted_by.as_deref().is_none_or(|c| c.trim().is_empty()) =>
            {
                Err(DomainError::validation(
                    "full traceability counts must record who counted",
                ))
            }
            CountMethod::DoubleCount if self.second_count_qty.is_none() => Err(
                DomainError::validation("double counts need both count quantities"),
            ),
            _ => Ok(()),
        }
    }
}
