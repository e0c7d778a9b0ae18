use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use stockforge_core::{CompositionId, ProductId};
use stockforge_counting::{
    CountEntry, CountMethod, CountScope, CountStatus, InventoryCount, InventoryCountItem,
    NewInventoryCount,
};
use stockforge_ledger::{MovementType, NewMovement};
use stockforge_production::{DemandRequest, ExitType, NewComposition, OrderStatus, ProductionOrderDraft};

// ---- Movements ----

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub project_code: Option<String>,
    pub collaborator: String,
    #[serde(default)]
    pub observation: Option<String>,
    /// Defaults to the time the request is handled.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl RecordMovementRequest {
    pub fn into_movement(self, now: DateTime<Utc>) -> NewMovement {
        NewMovement {
            product_id: self.product_id,
            movement_type: self.movement_type,
            quantity: self.quantity,
            origin: self.origin,
            destination: self.destination,
            purpose: self.purpose,
            project_code: self.project_code,
            collaborator: self.collaborator,
            observation: self.observation,
            occurred_at: self.occurred_at.unwrap_or(now),
        }
    }
}

// ---- Compositions ----

#[derive(Debug, Deserialize)]
pub struct ImportCompositionsRequest {
    pub compositions: Vec<NewComposition>,
    #[serde(default)]
    pub update_existing: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExplodeQuery {
    #[serde(default = "one")]
    pub multiplier: i64,
}

fn one() -> i64 {
    1
}

// ---- Production orders ----

/// Per-component choices on top of the exploded composition.
#[derive(Debug, Deserialize)]
pub struct ItemSelection {
    pub product_id: ProductId,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub delivered_qty: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub composition_id: CompositionId,
    pub project_code: String,
    pub multiplier: i64,
    pub exit_type: ExitType,
    pub collaborator: String,
    #[serde(default)]
    pub items: Vec<ItemSelection>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl SubmitOrderRequest {
    /// Apply the selections to a draft exploded from the composition.
    pub fn apply(self, mut draft: ProductionOrderDraft) -> ProductionOrderDraft {
        for choice in self.items {
            if let Some(selected) = choice.selected {
                draft = draft.select(choice.product_id, selected);
            }
            if let Some(qty) = choice.delivered_qty {
                draft = draft.deliver(choice.product_id, qty);
            }
        }
        draft
    }
}

#[derive(Debug, Deserialize)]
pub struct AdvanceOrderRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub collaborator: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub demands: Vec<DemandRequest>,
}

// ---- Inventory counts ----

#[derive(Debug, Deserialize)]
pub struct CreateCountRequest {
    pub name: String,
    pub method: CountMethod,
    pub scope: CountScope,
    pub collaborator: String,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl CreateCountRequest {
    pub fn into_draft(self, now: DateTime<Utc>) -> NewInventoryCount {
        NewInventoryCount {
            name: self.name,
            method: self.method,
            scope: self.scope,
            collaborator: self.collaborator,
            scheduled_at: self.scheduled_at,
            occurred_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordCountRequest {
    pub product_id: ProductId,
    pub counted_qty: i64,
    #[serde(default)]
    pub second_count_qty: Option<i64>,
    #[serde(default)]
    pub counted_by: Option<String>,
    #[serde(default)]
    pub counted_at: Option<DateTime<Utc>>,
}

impl RecordCountRequest {
    pub fn into_entry(self, now: DateTime<Utc>) -> CountEntry {
        CountEntry {
            counted_qty: self.counted_qty,
            second_count_qty: self.second_count_qty,
            counted_by: self.counted_by,
            counted_at: self.counted_at.unwrap_or(now),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub product_id: ProductId,
    pub cause: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountListQuery {
    pub status: Option<CountStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

const HIDDEN_IN_BLIND: [&str; 5] = [
    "expected_qty",
    "expected_qty_omie",
    "divergence",
    "divergence_percent",
    "divergence_omie",
];

/// Count as shown to clients. Blind counts in progress carry no expected quantities,
/// nor divergences that would give them away.
pub fn count_view(count: &InventoryCount) -> Result<JsonValue, serde_json::Error> {
    let mut value = serde_json::to_value(count)?;
    if let Some(obj) = value.as_object_mut() {
        if count.hides_expected() {
            if let Some(items) = obj.get_mut("items").and_then(JsonValue::as_array_mut) {
                items.iter_mut().for_each(blind);
            }
        }
        obj.insert("counted_items".into(), count.counted_items().into());
        obj.insert("divergent_items".into(), count.divergent_items().into());
    }
    Ok(value)
}

pub fn item_view(item: &InventoryCountItem, hide_expected: bool) -> Result<JsonValue, serde_json::Error> {
    let mut value = serde_json::to_value(item)?;
    if hide_expected {
        blind(&mut value);
    }
    Ok(value)
}

fn blind(item: &mut JsonValue) {
    if let Some(obj) = item.as_object_mut() {
        for key in HIDDEN_IN_BLIND {
            obj.insert(key.into(), JsonValue::Null);
        }
    }
}
