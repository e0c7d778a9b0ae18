use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{
    CompositionId, DomainError, DomainResult, Entity, MovementId, ProductId, ProductionOrderId,
};

/// How much of the required components a production order withdraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitType {
    /// Every component at its full required quantity.
    Integral,
    /// Only the selected components, each at its required quantity.
    Parcial,
    /// Every component, each at a delivered quantity up to the required one.
    Fracionada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Aberta,
    Parcial,
    Concluida,
    Estocada,
    Cancelada,
}

impl OrderStatus {
    /// Forward moves allowed by `advance`. Cancellation is handled separately.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Aberta, OrderStatus::Parcial)
                | (OrderStatus::Aberta, OrderStatus::Concluida)
                | (OrderStatus::Parcial, OrderStatus::Concluida)
                | (OrderStatus::Concluida, OrderStatus::Estocada)
        )
    }

    /// Whether the consumed components can still go back to stock.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Aberta | OrderStatus::Parcial | OrderStatus::Concluida
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrderItem {
    pub product_id: ProductId,
    pub product_code: String,
    pub required_qty: i64,
    pub delivered_qty: i64,
    #[serde(default)]
    pub unit: String,
    pub selected: bool,
    /// SAIDA movement that consumed this item, if any was emitted.
    #[serde(default)]
    pub movement_id: Option<MovementId>,
}

impl ProductionOrderItem {
    /// Quantity withdrawn from stock for this item under `exit`.
    pub fn consumption(&self, exit: ExitType) -> i64 {
        match exit {
            ExitType::Integral => self.required_qty,
            ExitType::Parcial if self.selected => self.required_qty,
            ExitType::Parcial => 0,
            ExitType::Fracionada => self.delivered_qty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: ProductionOrderId,
    pub composition_id: CompositionId,
    pub composition_code: String,
    pub composition_name: String,
    pub composition_version: u32,
    pub project_code: String,
    pub multiplier: i64,
    pub exit_type: ExitType,
    pub items: Vec<ProductionOrderItem>,
    pub status: OrderStatus,
    pub collaborator: String,
    pub movement_ids: Vec<MovementId>,
    #[serde(default)]
    pub reversal_movement_ids: Vec<MovementId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Entity for ProductionOrder {
    type Id = ProductionOrderId;
    const KIND: &'static str = "production order";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ProductionOrder {
    /// Items that withdrew stock, with their delivered quantity.
    pub fn processed_items(&self) -> impl Iterator<Item = &ProductionOrderItem> {
        self.items.iter().filter(|item| item.delivered_qty > 0)
    }
}

/// Order submission. Items normally come from `explode` and are then adjusted
/// with `select` / `deliver` before `submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrderDraft {
    pub composition_id: CompositionId,
    pub project_code: String,
    pub multiplier: i64,
    pub exit_type: ExitType,
    pub items: Vec<ProductionOrderItem>,
    pub collaborator: String,
    pub occurred_at: DateTime<Utc>,
}

impl ProductionOrderDraft {
    pub fn select(mut self, product_id: ProductId, selected: bool) -> Self {
        for item in self.items.iter_mut().filter(|i| i.product_id == product_id) {
            item.selected = selected;
        }
        self
    }

    pub fn deliver(mut self, product_id: ProductId, delivered_qty: i64) -> Self {
        for item in self.items.iter_mut().filter(|i| i.product_id == product_id) {
            item.delivered_qty = delivered_qty;
        }
        self
    }

    /// Exit-type rules, checked before the draft is compared with its composition.
    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.project_code.trim().is_empty() {
            return Err(DomainError::validation("project code cannot be empty"));
        }
        if self.collaborator.trim().is_empty() {
            return Err(DomainError::validation("collaborator cannot be empty"));
        }
        if self.multiplier <= 0 {
            return Err(DomainError::validation("multiplier must be positive"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("production order has no items"));
        }

        match self.exit_type {
            ExitType::Integral => {
                if self
                    .items
                    .iter()
                    .any(|i| !i.selected || i.delivered_qty != i.required_qty)
                {
                    return Err(DomainError::validation(
                        "integral exit must deliver every item at its required quantity",
                    ));
                }
            }
            ExitType::Parcial => {
                if !self.items.iter().any(|i| i.selected) {
                    return Err(DomainError::validation(
                        "partial exit needs at least one selected item",
                    ));
                }
            }
            ExitType::Fracionada => {
                if self.items.iter().any(|i| !i.selected) {
                    return Err(DomainError::validation(
                        "fractional exit keeps every item selected",
                    ));
                }
                if self
                    .items
                    .iter()
                    .any(|i| i.delivered_qty < 0 || i.delivered_qty > i.required_qty)
                {
                    return Err(DomainError::validation(
                        "delivered quantity must be between 0 and the required quantity",
                    ));
                }
                if !self.items.iter().any(|i| i.delivered_qty > 0) {
                    return Err(DomainError::validation(
                        "fractional exit needs at least one delivered item",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Filter for `ProductionOrderEngine::list`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub project_code: Option<String>,
    /// Case-insensitive.
    pub composition_code: Option<String>,
    /// Orders created at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Orders created strictly before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &ProductionOrder) -> bool {
        if self.status.is_some_and(|s| order.status != s) {
            return false;
        }
        if let Some(project) = self.project_code.as_deref() {
            if order.project_code != project.trim() {
                return false;
            }
        }
        if let Some(code) = self.composition_code.as_deref() {
            if !order.composition_code.eq_ignore_ascii_case(code.trim()) {
                return false;
            }
        }
        if self.from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| order.created_at >= to) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(required: i64) -> ProductionOrderItem {
        ProductionOrderItem {
            product_id: ProductId::new(),
            product_code: "P".into(),
            required_qty: required,
            delivered_qty: required,
            unit: "UN".into(),
            selected: true,
            movement_id: None,
        }
    }

    fn draft(exit_type: ExitType, items: Vec<ProductionOrderItem>) -> ProductionOrderDraft {
        ProductionOrderDraft {
            composition_id: CompositionId::new(),
            project_code: "OBRA-7".into(),
            multiplier: 1,
            exit_type,
            items,
            collaborator: "joana".into(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn status_machine_moves_forward_only() {
        use OrderStatus::*;
        assert!(Aberta.can_advance_to(Parcial));
        assert!(Aberta.can_advance_to(Concluida));
        assert!(Parcial.can_advance_to(Concluida));
        assert!(Concluida.can_advance_to(Estocada));

        assert!(!Parcial.can_advance_to(Aberta));
        assert!(!Aberta.can_advance_to(Estocada));
        assert!(!Estocada.can_advance_to(Concluida));
        assert!(!Cancelada.can_advance_to(Aberta));
        assert!(!Aberta.can_advance_to(Cancelada));

        assert!(!Estocada.is_cancellable());
        assert!(!Cancelada.is_cancellable());
    }

    #[test]
    fn integral_rejects_short_delivery() {
        let mut short = item(10);
        short.delivered_qty = 9;
        let d = draft(ExitType::Integral, vec![item(4), short]);
        assert!(matches!(d.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn partial_needs_a_selection() {
        let mut a = item(3);
        a.selected = false;
        let d = draft(ExitType::Parcial, vec![a.clone()]);
        assert!(matches!(d.validate(), Err(DomainError::Validation(_))));

        let d = draft(ExitType::Parcial, vec![a, item(2)]);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn fractional_bounds_delivery() {
        let mut over = item(5);
        over.delivered_qty = 6;
        assert!(draft(ExitType::Fracionada, vec![over]).validate().is_err());

        let mut none = item(5);
        none.delivered_qty = 0;
        assert!(draft(ExitType::Fracionada, vec![none.clone()]).validate().is_err());

        let mut some = item(5);
        some.delivered_qty = 2;
        assert!(draft(ExitType::Fracionada, vec![none, some]).validate().is_ok());
    }

    #[test]
    fn consumption_follows_exit_type() {
        let mut it = item(8);
        it.delivered_qty = 3;
        it.selected = false;
        assert_eq!(it.consumption(ExitType::Integral), 8);
        assert_eq!(it.consumption(ExitType::Parcial), 0);
        assert_eq!(it.consumption(ExitType::Fracionada), 3);
    }

    #[test]
    fn enums_serialize_as_domain_codes() {
        assert_eq!(
            serde_json::to_string(&ExitType::Fracionada).unwrap(),
            "\"FRACIONADA\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Concluida).unwrap(),
            "\"CONCLUIDA\""
        );
    }
}
