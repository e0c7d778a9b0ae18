use chrono::Utc;

use stockforge_core::{Collection, DomainError, DomainResult, MovementId, ProductId};
use stockforge_products::ProductDirectory;

use crate::filter::MovementFilter;
use crate::movement::{validate_quantity, Movement, MovementUpdate, NewMovement};

/// Append-and-correct log of stock movements.
///
/// Every method that changes a movement also writes the resulting stock to the
/// product directory, so the two never diverge within one call. Callers that
/// share the ledger across threads must serialize the `&mut self` methods.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    movements: Collection<Movement>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Movement>) -> DomainResult<Self> {
        Ok(Self {
            movements: Collection::from_records(records)?,
        })
    }

    pub fn records(&self) -> &[Movement] {
        self.movements.as_slice()
    }

    pub fn get(&self, id: &MovementId) -> Option<&Movement> {
        self.movements.get(id)
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Append a movement and apply its delta to the product (clamped at zero).
    pub fn record<D>(&mut self, products: &mut D, new: NewMovement) -> DomainResult<&Movement>
    where
        D: ProductDirectory + ?Sized,
    {
        new.validate()?;
        products.require(&new.product_id)?;

        let movement = new.into_movement();
        let stock = products.apply_delta(&movement.product_id, movement.delta())?;

        tracing::info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            stock,
            "movement recorded"
        );

        self.movements.insert(movement)
    }

    /// Correct quantity/type of a movement.
    ///
    /// The product ends at `stock - old_delta + new_delta`, written once and
    /// clamped at zero.
    pub fn amend<D>(
        &mut self,
        products: &mut D,
        id: &MovementId,
        update: MovementUpdate,
    ) -> DomainResult<&Movement>
    where
        D: ProductDirectory + ?Sized,
    {
        let original = self.movements.require(id)?;
        let old_delta = original.delta();
        let product_id = original.product_id;

        let movement_type = update.movement_type.unwrap_or(original.movement_type);
        let quantity = update.quantity.unwrap_or(original.quantity);
        validate_quantity(quantity)?;
        let new_delta = movement_type.delta(quantity);

        if new_delta != old_delta {
            let current = products.require(&product_id)?.current_stock;
            let target = current
                .checked_sub(old_delta)
                .and_then(|v| v.checked_add(new_delta))
                .ok_or_else(|| DomainError::validation("stock quantity overflow"))?;
            let stock = products.set_stock(&product_id, target)?;
            tracing::info!(
                movement_id = %id,
                product_id = %product_id,
                old_delta,
                new_delta,
                stock,
                "movement amended"
            );
        }

        let movement = self.movements.require_mut(id)?;
        movement.movement_type = movement_type;
        movement.quantity = quantity;
        if update.observation.is_some() {
            movement.observation = update.observation;
        }
        movement.updated_at = Some(Utc::now());
        Ok(movement)
    }

    /// Remove a movement, reversing its effect on stock.
    pub fn retract<D>(&mut self, products: &mut D, id: &MovementId) -> DomainResult<Movement>
    where
        D: ProductDirectory + ?Sized,
    {
        let movement = self.movements.require(id)?;
        let stock = products.apply_delta(&movement.product_id, -movement.delta())?;
        tracing::info!(
            movement_id = %id,
            product_id = %movement.product_id,
            reversed_delta = movement.delta(),
            stock,
            "movement retracted"
        );
        self.movements
            .remove(id)
            .ok_or_else(|| DomainError::not_found(format!("movement {id}")))
    }

    /// Movements matching `filter`, in recording order.
    pub fn query(&self, filter: &MovementFilter) -> Vec<&Movement> {
        let found: Vec<&Movement> = self.movements.iter().filter(|m| filter.matches(m)).collect();
        tracing::debug!(matched = found.len(), total = self.movements.len(), "ledger query");
        found
    }

    pub fn movements_for(&self, product_id: &ProductId) -> Vec<&Movement> {
        self.query(&MovementFilter::for_product(*product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementType;
    use chrono::{DateTime, Duration};
    use proptest::prelude::*;
    use stockforge_products::{NewProduct, ProductCatalog};

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn setup(stock: i64) -> (ProductCatalog, StockLedger, ProductId) {
        let mut catalog = ProductCatalog::new();
        let id = catalog
            .create(
                NewProduct::new("PAR-M6", "Parafuso M6")
                    .with_stock(stock)
                    .with_address("A-01-01"),
            )
            .unwrap()
            .id;
        (catalog, StockLedger::new(), id)
    }

    fn movement(product_id: ProductId, kind: MovementType, quantity: i64) -> NewMovement {
        NewMovement::new(product_id, kind, quantity, "joana", test_time())
    }

    fn stock(catalog: &ProductCatalog, id: &ProductId) -> i64 {
        catalog.get(id).unwrap().current_stock
    }

    #[test]
    fn record_applies_signed_delta() {
        let (mut catalog, mut ledger, id) = setup(10);
        ledger
            .record(&mut catalog, movement(id, MovementType::Saida, 3))
            .unwrap();
        assert_eq!(stock(&catalog, &id), 7);

        ledger
            .record(&mut catalog, movement(id, MovementType::Devolucao, 2))
            .unwrap();
        assert_eq!(stock(&catalog, &id), 9);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn amend_reverses_previous_effect_before_applying_new() {
        let (mut catalog, mut ledger, id) = setup(10);
        let mid = ledger
            .record(&mut catalog, movement(id, MovementType::Saida, 3))
            .unwrap()
            .id;
        assert_eq!(stock(&catalog, &id), 7);

        ledger
            .amend(
                &mut catalog,
                &mid,
                MovementUpdate {
                    quantity: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(stock(&catalog, &id), 5);
    }

    #[test]
    fn amend_type_flip_moves_stock_twice_the_quantity() {
        let (mut catalog, mut ledger, id) = setup(10);
        let mid = ledger
            .record(&mut catalog, movement(id, MovementType::Saida, 3))
            .unwrap()
            .id;

        let amended = ledger
            .amend(
                &mut catalog,
                &mid,
                MovementUpdate {
                    movement_type: Some(MovementType::Entrada),
                    observation: Some("lançado com tipo errado".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(amended.movement_type, MovementType::Entrada);
        assert!(amended.updated_at.is_some());
        assert_eq!(stock(&catalog, &id), 13);
    }

    #[test]
    fn amend_rejects_non_positive_quantity_without_touching_stock() {
        let (mut catalog, mut ledger, id) = setup(10);
        let mid = ledger
            .record(&mut catalog, movement(id, MovementType::Saida, 3))
            .unwrap()
            .id;

        let err = ledger
            .amend(
                &mut catalog,
                &mid,
                MovementUpdate {
                    quantity: Some(0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(stock(&catalog, &id), 7);
        assert_eq!(ledger.get(&mid).unwrap().quantity, 3);
    }

    #[test]
    fn retract_restores_stock_and_removes_movement() {
        let (mut catalog, mut ledger, id) = setup(10);
        let mid = ledger
            .record(&mut catalog, movement(id, MovementType::Perda, 4))
            .unwrap()
            .id;
        assert_eq!(stock(&catalog, &id), 6);

        let removed = ledger.retract(&mut catalog, &mid).unwrap();
        assert_eq!(removed.id, mid);
        assert_eq!(stock(&catalog, &id), 10);
        assert!(ledger.get(&mid).is_none());
    }

    #[test]
    fn stock_is_clamped_at_zero() {
        let (mut catalog, mut ledger, id) = setup(2);
        ledger
            .record(&mut catalog, movement(id, MovementType::Saida, 5))
            .unwrap();
        assert_eq!(stock(&catalog, &id), 0);
    }

    #[test]
    fn troca_is_recorded_without_stock_effect() {
        let (mut catalog, mut ledger, id) = setup(8);
        ledger
            .record(&mut catalog, movement(id, MovementType::Troca, 3))
            .unwrap();
        assert_eq!(stock(&catalog, &id), 8);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn missing_movement_ids_are_not_found() {
        let (mut catalog, mut ledger, _) = setup(1);
        let ghost = MovementId::new();
        assert!(matches!(
            ledger.retract(&mut catalog, &ghost),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            ledger.amend(&mut catalog, &ghost, MovementUpdate::default()),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn record_for_unknown_product_writes_nothing() {
        let (mut catalog, mut ledger, _) = setup(1);
        let err = ledger
            .record(&mut catalog, movement(ProductId::new(), MovementType::Entrada, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn query_filters_by_type_collaborator_and_window() {
        let (mut catalog, mut ledger, id) = setup(100);
        let start = test_time();
        ledger
            .record(
                &mut catalog,
                NewMovement::new(id, MovementType::Saida, 1, "Joana", start),
            )
            .unwrap();
        ledger
            .record(
                &mut catalog,
                NewMovement::new(id, MovementType::Entrada, 1, "Rui", start + Duration::hours(1)),
            )
            .unwrap();
        ledger
            .record(
                &mut catalog,
                NewMovement::new(id, MovementType::Saida, 1, "rui", start + Duration::hours(2)),
            )
            .unwrap();

        let by_rui = ledger.query(&MovementFilter {
            collaborator: Some("RUI".into()),
            ..Default::default()
        });
        assert_eq!(by_rui.len(), 2);

        let saidas_in_window = ledger.query(&MovementFilter {
            movement_type: Some(MovementType::Saida),
            from: Some(start + Duration::minutes(30)),
            to: Some(start + Duration::hours(3)),
            ..Default::default()
        });
        assert_eq!(saidas_in_window.len(), 1);
        assert_eq!(saidas_in_window[0].collaborator, "rui");
    }

    fn movement_kind() -> impl Strategy<Value = MovementType> {
        prop::sample::select(MovementType::ALL.to_vec())
    }

    #[test]
    fn amend_past_i64_range_is_rejected_untouched() {
        let (mut catalog, mut ledger, id) = setup(0);
        let mid = ledger
            .record(&mut catalog, movement(id, MovementType::Saida, i64::MAX))
            .unwrap()
            .id;
        assert_eq!(stock(&catalog, &id), 0);

        let err = ledger
            .amend(
                &mut catalog,
                &mid,
                MovementUpdate {
                    quantity: Some(i64::MAX),
                    movement_type: Some(MovementType::Entrada),
                    observation: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(stock(&catalog, &id), 0);
        let kept = ledger.get(&mid).unwrap();
        assert_eq!(kept.movement_type, MovementType::Saida);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: without clamping, amend leaves `stock - delta(m) + delta(m')`.
        #[test]
        fn amend_conserves_stock(
            kind in movement_kind(),
            qty in 1i64..500,
            new_kind in movement_kind(),
            new_qty in 1i64..500,
        ) {
            let (mut catalog, mut ledger, id) = setup(10_000);
            let before = stock(&catalog, &id);

            let mid = ledger.record(&mut catalog, movement(id, kind, qty)).unwrap().id;
            ledger.amend(&mut catalog, &mid, MovementUpdate {
                quantity: Some(new_qty),
                movement_type: Some(new_kind),
                observation: None,
            }).unwrap();

            prop_assert_eq!(stock(&catalog, &id), before + new_kind.delta(new_qty));
        }

        /// Property: retract(record(m)) restores the pre-record stock exactly.
        #[test]
        fn retract_inverts_record(kind in movement_kind(), qty in 1i64..500) {
            let (mut catalog, mut ledger, id) = setup(1_000);
            let before = stock(&catalog, &id);

            let mid = ledger.record(&mut catalog, movement(id, kind, qty)).unwrap().id;
            ledger.retract(&mut catalog, &mid).unwrap();

            prop_assert_eq!(stock(&catalog, &id), before);
            prop_assert!(ledger.is_empty());
        }

        /// Property: no sequence of records drives stock below zero.
        #[test]
        fn stock_never_negative(
            ops in prop::collection::vec((movement_kind(), 1i64..50), 1..40)
        ) {
            let (mut catalog, mut ledger, id) = setup(5);
            for (kind, qty) in ops {
                ledger.record(&mut catalog, movement(id, kind, qty)).unwrap();
                prop_assert!(stock(&catalog, &id) >= 0);
            }
        }
    }
}
