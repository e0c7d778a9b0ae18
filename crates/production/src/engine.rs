//! Production order engine.
//!
//! Submitting an order consumes its components through the stock ledger in one
//! all-or-nothing step; cancelling it returns exactly what was delivered.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use stockforge_core::{
    Collection, CompositionId, DomainError, DomainResult, MovementId, ProductId, ProductionOrderId,
};
use stockforge_ledger::{labels, MovementType, NewMovement, StockLedger};
use stockforge_products::ProductDirectory;

use crate::composition::CompositionRegistry;
use crate::order::{OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDraft};

#[derive(Debug, Clone, Default)]
pub struct ProductionOrderEngine {
    orders: Collection<ProductionOrder>,
}

impl ProductionOrderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ProductionOrder>) -> DomainResult<Self> {
        Ok(Self {
            orders: Collection::from_records(records)?,
        })
    }

    pub fn records(&self) -> &[ProductionOrder] {
        self.orders.as_slice()
    }

    pub fn get(&self, id: &ProductionOrderId) -> Option<&ProductionOrder> {
        self.orders.get(id)
    }

    pub fn require(&self, id: &ProductionOrderId) -> DomainResult<&ProductionOrder> {
        self.orders.require(id)
    }

    pub fn list(&self, filter: &OrderFilter) -> Vec<&ProductionOrder> {
        let orders: Vec<_> = self.orders.iter().filter(|o| filter.matches(o)).collect();
        tracing::debug!(matched = orders.len(), "production orders listed");
        orders
    }

    /// Whether any order other than a cancelled one was built from `composition_id`.
    pub fn has_live_orders_for(&self, composition_id: &CompositionId) -> bool {
        self.orders
            .iter()
            .any(|o| o.composition_id == *composition_id && o.status != OrderStatus::Cancelada)
    }

    pub fn submit<D>(
        &mut self,
        products: &mut D,
        ledger: &mut StockLedger,
        registry: &CompositionRegistry,
        draft: ProductionOrderDraft,
    ) -> DomainResult<&ProductionOrder>
    where
        D: ProductDirectory + ?Sized,
    {
        draft.validate()?;
        let composition = registry.require(&draft.composition_id)?;
        if !composition.active {
            return Err(DomainError::validation(format!(
                "composition {} is inactive",
                composition.code
            )));
        }

        // Order items follow the composition; the draft only supplies selection and delivery.
        let mut items = crate::explosion::explode(&*products, composition, draft.multiplier)?;
        if draft.items.len() != items.len() {
            return Err(DomainError::validation(
                "order items do not match the composition",
            ));
        }
        for item in &mut items {
            let submitted = draft
                .items
                .iter()
                .find(|d| d.product_id == item.product_id && d.required_qty == item.required_qty)
                .ok_or_else(|| {
                    DomainError::validation(format!(
                        "order items do not match the composition at {}",
                        item.product_code
                    ))
                })?;
            item.selected = submitted.selected;
            item.delivered_qty = submitted.delivered_qty;
            item.delivered_qty = item.consumption(draft.exit_type);
        }

        let mut demand: HashMap<ProductId, i64> = HashMap::new();
        for item in &items {
            *demand.entry(item.product_id).or_default() += item.delivered_qty;
        }
        for item in &items {
            let product = products.require(&item.product_id)?;
            let requested = demand[&item.product_id];
            if requested > product.current_stock {
                return Err(DomainError::insufficient_stock(
                    product.code.clone(),
                    requested,
                    product.current_stock,
                ));
            }
        }

        let order_id = ProductionOrderId::new();
        let project_code = draft.project_code.trim().to_string();
        let collaborator = draft.collaborator.trim().to_string();
        let mut movement_ids = Vec::new();
        for item in items.iter_mut().filter(|i| i.delivered_qty > 0) {
            let origin = products.require(&item.product_id)?.address.clone();
            let movement = NewMovement::new(
                item.product_id,
                MovementType::Saida,
                item.delivered_qty,
                collaborator.clone(),
                draft.occurred_at,
            )
            .with_route(origin, labels::PRODUCTION)
            .with_purpose(labels::PRODUCTION)
            .with_project(composition.code.clone())
            .with_observation(format!(
                "production order {order_id} for project {project_code}"
            ));
            let recorded = ledger.record(products, movement)?.id;
            item.movement_id = Some(recorded);
            movement_ids.push(recorded);
        }

        let order = ProductionOrder {
            id: order_id,
            composition_id: composition.id,
            composition_code: composition.code.clone(),
            composition_name: composition.name.clone(),
            composition_version: composition.version,
            project_code,
            multiplier: draft.multiplier,
            exit_type: draft.exit_type,
            items,
            status: OrderStatus::Aberta,
            collaborator,
            movement_ids,
            reversal_movement_ids: Vec::new(),
            created_at: draft.occurred_at,
            updated_at: None,
            cancelled_at: None,
        };
        tracing::info!(
            order_id = %order.id,
            composition = %order.composition_code,
            exit_type = ?order.exit_type,
            movements = order.movement_ids.len(),
            "production order submitted"
        );
        self.orders.insert(order)
    }

    pub fn advance(
        &mut self,
        id: &ProductionOrderId,
        target: OrderStatus,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<&ProductionOrder> {
        let order = self.orders.require_mut(id)?;
        if !order.status.can_advance_to(target) {
            return Err(DomainError::invalid_transition(
                "production order",
                order.status,
                target,
            ));
        }
        tracing::info!(order_id = %id, from = ?order.status, to = ?target, "production order advanced");
        order.status = target;
        order.updated_at = Some(occurred_at);
        Ok(order)
    }

    /// Return every delivered component to stock and mark the order cancelled.
    /// Cancelling a cancelled order changes nothing.
    pub fn cancel<D>(
        &mut self,
        products: &mut D,
        ledger: &mut StockLedger,
        id: &ProductionOrderId,
        collaborator: &str,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<&ProductionOrder>
    where
        D: ProductDirectory + ?Sized,
    {
        let order = self.orders.require(id)?;
        if order.status == OrderStatus::Cancelada {
            tracing::debug!(order_id = %id, "production order already cancelled");
            return self.orders.require(id);
        }
        if !order.status.is_cancellable() {
            return Err(DomainError::invalid_transition(
                "production order",
                order.status,
                OrderStatus::Cancelada,
            ));
        }
        if collaborator.trim().is_empty() {
            return Err(DomainError::validation("collaborator cannot be empty"));
        }

        let mut returns = Vec::new();
        for item in order.processed_items() {
            let product = products.require(&item.product_id)?;
            let destination = item
                .movement_id
                .and_then(|mid| ledger.get(&mid))
                .map(|m| m.origin.clone())
                .unwrap_or_else(|| product.address.clone());
            returns.push((item.product_id, item.delivered_qty, destination));
        }

        let mut reversal_ids: Vec<MovementId> = Vec::with_capacity(returns.len());
        for (product_id, quantity, destination) in returns {
            let movement = NewMovement::new(
                product_id,
                MovementType::Devolucao,
                quantity,
                collaborator,
                occurred_at,
            )
            .with_route(labels::PRODUCTION, destination)
            .with_purpose(labels::PRODUCTION)
            .with_project(order.composition_code.clone())
            .with_observation(format!("cancellation of production order {id}"));
            reversal_ids.push(ledger.record(products, movement)?.id);
        }

        let order = self.orders.require_mut(id)?;
        order.status = OrderStatus::Cancelada;
        order.reversal_movement_ids = reversal_ids;
        order.cancelled_at = Some(occurred_at);
        order.updated_at = Some(occurred_at);
        tracing::info!(
            order_id = %id,
            reversals = order.reversal_movement_ids.len(),
            "production order cancelled"
        );
        Ok(order)
    }
}
