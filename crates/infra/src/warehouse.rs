//! Process-wide warehouse state behind a single reader/writer lock.
//!
//! Every mutation holds the write lock for its whole read-modify-write and then
//! writes the collections it touched. Queries take the read lock, so they never
//! see a multi-record write half applied.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

use stockforge_core::{
    CompositionId, DomainError, DomainResult, InventoryCountId, MovementId, ProductId,
    ProductionOrderId,
};
use stockforge_counting::{
    CountEntry, CountPolicy, CountStatus, CountSuggestion, InventoryCount, InventoryCountEngine,
    InventoryCountItem, NewInventoryCount,
};
use stockforge_ledger::{Movement, MovementFilter, MovementUpdate, NewMovement, StockLedger};
use stockforge_production::{
    explode, simulate, Composition, CompositionRegistry, DemandLine, DemandRequest, ImportReport,
    NewComposition, OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDraft,
    ProductionOrderEngine, ProductionOrderItem,
};
use stockforge_products::{NewProduct, Product, ProductCatalog, ProductDirectory, ProductPatch};

use crate::store::DocumentKind::{
    Compositions, InventoryCounts, Movements, ProductionOrders, Products,
};
use crate::store::{DocumentKind, DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// All engines and collections of one warehouse.
#[derive(Debug, Clone)]
pub struct WarehouseState {
    pub products: ProductCatalog,
    pub ledger: StockLedger,
    pub compositions: CompositionRegistry,
    pub orders: ProductionOrderEngine,
    pub counts: InventoryCountEngine,
}

impl WarehouseState {
    fn load(store: &dyn DocumentStore, policy: CountPolicy) -> Result<Self, WarehouseError> {
        Ok(Self {
            products: ProductCatalog::from_records(load_records(store, DocumentKind::Products)?)?,
            ledger: StockLedger::from_records(load_records(store, DocumentKind::Movements)?)?,
            compositions: CompositionRegistry::from_records(load_records(store, DocumentKind::Compositions)?)?,
            orders: ProductionOrderEngine::from_records(load_records(store, DocumentKind::ProductionOrders)?)?,
            counts: InventoryCountEngine::from_records(
                load_records(store, DocumentKind::InventoryCounts)?,
                policy,
            )?,
        })
    }

    fn document(&self, kind: DocumentKind) -> Result<JsonValue, StoreError> {
        let value = match kind {
            DocumentKind::Products => serde_json::to_value(self.products.records()),
            DocumentKind::Movements => serde_json::to_value(self.ledger.records()),
            DocumentKind::Compositions => serde_json::to_value(self.compositions.records()),
            DocumentKind::ProductionOrders => serde_json::to_value(self.orders.records()),
            DocumentKind::InventoryCounts => serde_json::to_value(self.counts.records()),
        };
        value.map_err(|err| StoreError::serde(kind, err))
    }
}

fn load_records<T: DeserializeOwned>(store: &dyn DocumentStore, kind: DocumentKind) -> Result<Vec<T>, StoreError> {
    match store.read(kind)? {
        Some(document) => serde_json::from_value(document).map_err(|err| StoreError::serde(kind, err)),
        None => Ok(Vec::new()),
    }
}

pub struct Warehouse {
    store: Arc<dyn DocumentStore>,
    state: RwLock<WarehouseState>,
}

impl core::fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Warehouse").finish_non_exhaustive()
    }
}

impl Warehouse {
    /// Load every collection from `store`.
    pub fn open(store: Arc<dyn DocumentStore>, policy: CountPolicy) -> Result<Self, WarehouseError> {
        let state = WarehouseState::load(store.as_ref(), policy)?;
        tracing::info!(
            products = state.products.records().len(),
            movements = state.ledger.len(),
            compositions = state.compositions.records().len(),
            orders = state.orders.records().len(),
            counts = state.counts.records().len(),
            "warehouse loaded"
        );
        Ok(Self {
            store,
            state: RwLock::new(state),
        })
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, WarehouseState>, WarehouseError> {
        self.state.read().map_err(|_| StoreError::LockPoisoned.into())
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, WarehouseState>, WarehouseError> {
        self.state.write().map_err(|_| StoreError::LockPoisoned.into())
    }

    /// Run `f` against a consistent view of the state.
    pub fn read<R>(&self, f: impl FnOnce(&WarehouseState) -> R) -> Result<R, WarehouseError> {
        let state = self.read_state()?;
        Ok(f(&state))
    }

    /// Run `f` on a copy of the state under the write lock, persist `touched`,
    /// and only then publish the copy. A rejected or unpersisted mutation leaves
    /// the live state as it was.
    fn mutate<R>(
        &self,
        touched: &[DocumentKind],
        f: impl FnOnce(&mut WarehouseState) -> DomainResult<R>,
    ) -> Result<R, WarehouseError> {
        let mut state = self.write_state()?;
        let mut staged = state.clone();
        let out = f(&mut staged)?;
        for (written, kind) in touched.iter().enumerate() {
            let document = staged.document(*kind)?;
            if let Err(err) = self.store.write(*kind, &document) {
                tracing::error!(collection = %kind, error = %err, "collection write failed");
                self.restore(&state, &touched[..written]);
                return Err(err.into());
            }
        }
        *state = staged;
        Ok(out)
    }

    /// Put back the live documents of collections already overwritten by a
    /// mutation that failed to persist.
    fn restore(&self, state: &WarehouseState, kinds: &[DocumentKind]) {
        for kind in kinds {
            let restored = state
                .document(*kind)
                .map_err(WarehouseError::from)
                .and_then(|doc| self.store.write(*kind, &doc).map_err(WarehouseError::from));
            if let Err(err) = restored {
                tracing::error!(collection = %kind, error = %err, "collection restore failed");
            }
        }
    }

    // Products

    #[tracing::instrument(skip(self, draft), fields(code = %draft.code))]
    pub fn create_product(&self, draft: NewProduct) -> Result<Product, WarehouseError> {
        self.mutate(&[Products], |s| s.products.create(draft).cloned())
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product, WarehouseError> {
        self.mutate(&[Products], |s| s.products.update(&id, patch).cloned())
    }

    /// Remove a product nothing refers to.
    #[tracing::instrument(skip(self))]
    pub fn remove_product(&self, id: ProductId) -> Result<Product, WarehouseError> {
        self.mutate(&[Products], |s| {
            s.products.require(&id)?;
            if !s.ledger.movements_for(&id).is_empty() {
                return Err(DomainError::conflict(format!("product {id} has movements")));
            }
            if s
                .compositions
                .records()
                .iter()
                .any(|c| c.items.iter().any(|i| i.product_id == id))
            {
                return Err(DomainError::conflict(format!(
                    "product {id} is a component of a composition"
                )));
            }
            if let Some(count) = s.counts.records().iter().find(|c| {
                !c.status.is_terminal() && c.items.iter().any(|i| i.product_id == id)
            }) {
                return Err(DomainError::conflict(format!(
                    "product {id} is in open inventory count {}",
                    count.code
                )));
            }
            s.products.remove(&id)
        })
    }

    pub fn product(&self, id: ProductId) -> Result<Product, WarehouseError> {
        Ok(self.read(|s| s.products.require(&id).cloned())??)
    }

    pub fn products(&self) -> Result<Vec<Product>, WarehouseError> {
        self.read(|s| s.products.records().to_vec())
    }

    // Ledger

    #[tracing::instrument(skip(self, new), fields(product_id = %new.product_id, kind = %new.movement_type))]
    pub fn record_movement(&self, new: NewMovement) -> Result<Movement, WarehouseError> {
        self.mutate(&[Products, Movements], |s| {
            s.ledger.record(&mut s.products, new).cloned()
        })
    }

    #[tracing::instrument(skip(self, update))]
    pub fn amend_movement(&self, id: MovementId, update: MovementUpdate) -> Result<Movement, WarehouseError> {
        self.mutate(&[Products, Movements], |s| {
            s.ledger.amend(&mut s.products, &id, update).cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn retract_movement(&self, id: MovementId) -> Result<Movement, WarehouseError> {
        self.mutate(&[Products, Movements], |s| s.ledger.retract(&mut s.products, &id))
    }

    pub fn movement(&self, id: MovementId) -> Result<Movement, WarehouseError> {
        Ok(self.read(|s| {
            s.ledger
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("movement {id}")))
        })??)
    }

    pub fn movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, WarehouseError> {
        self.read(|s| s.ledger.query(filter).into_iter().cloned().collect())
    }

    // Compositions

    #[tracing::instrument(skip(self, draft), fields(code = %draft.code))]
    pub fn create_composition(&self, draft: NewComposition) -> Result<Composition, WarehouseError> {
        self.mutate(&[Compositions], |s| {
            s.compositions.create(&s.products, draft).cloned()
        })
    }

    #[tracing::instrument(skip(self, draft))]
    pub fn update_composition(
        &self,
        id: CompositionId,
        draft: NewComposition,
    ) -> Result<Composition, WarehouseError> {
        self.mutate(&[Compositions], |s| {
            s.compositions.update(&s.products, &id, draft).cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_composition(&self, id: CompositionId) -> Result<Composition, WarehouseError> {
        self.mutate(&[Compositions], |s| s.compositions.delete(&id, &s.orders))
    }

    #[tracing::instrument(skip(self, drafts), fields(drafts = drafts.len()))]
    pub fn import_compositions(
        &self,
        drafts: Vec<NewComposition>,
        update_existing: bool,
    ) -> Result<ImportReport, WarehouseError> {
        self.mutate(&[Compositions], |s| {
            Ok(s.compositions.import(&s.products, drafts, update_existing))
        })
    }

    pub fn composition(&self, id: CompositionId) -> Result<Composition, WarehouseError> {
        Ok(self.read(|s| s.compositions.require(&id).cloned())??)
    }

    pub fn compositions(&self) -> Result<Vec<Composition>, WarehouseError> {
        self.read(|s| s.compositions.records().to_vec())
    }

    // Production

    pub fn explode(&self, id: CompositionId, multiplier: i64) -> Result<Vec<ProductionOrderItem>, WarehouseError> {
        Ok(self.read(|s| {
            let composition = s.compositions.require(&id)?;
            explode(&s.products, composition, multiplier)
        })??)
    }

    #[tracing::instrument(skip(self, draft), fields(composition_id = %draft.composition_id))]
    pub fn submit_order(&self, draft: ProductionOrderDraft) -> Result<ProductionOrder, WarehouseError> {
        self.mutate(&[Products, Movements, ProductionOrders], |s| {
            s.orders
                .submit(&mut s.products, &mut s.ledger, &s.compositions, draft)
                .cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn advance_order(
        &self,
        id: ProductionOrderId,
        target: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<ProductionOrder, WarehouseError> {
        self.mutate(&[ProductionOrders], |s| s.orders.advance(&id, target, at).cloned())
    }

    #[tracing::instrument(skip(self))]
    pub fn cancel_order(
        &self,
        id: ProductionOrderId,
        collaborator: &str,
        at: DateTime<Utc>,
    ) -> Result<ProductionOrder, WarehouseError> {
        self.mutate(&[Products, Movements, ProductionOrders], |s| {
            s.orders
                .cancel(&mut s.products, &mut s.ledger, &id, collaborator, at)
                .cloned()
        })
    }

    pub fn order(&self, id: ProductionOrderId) -> Result<ProductionOrder, WarehouseError> {
        Ok(self.read(|s| s.orders.require(&id).cloned())??)
    }

    pub fn orders(&self, filter: &OrderFilter) -> Result<Vec<ProductionOrder>, WarehouseError> {
        self.read(|s| s.orders.list(filter).into_iter().cloned().collect())
    }

    #[tracing::instrument(skip(self, requests), fields(requests = requests.len()))]
    pub fn simulate(&self, requests: &[DemandRequest]) -> Result<Vec<DemandLine>, WarehouseError> {
        Ok(self.read(|s| simulate(&s.products, &s.compositions, requests))??)
    }

    // Inventory counts

    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn create_count(&self, draft: NewInventoryCount) -> Result<InventoryCount, WarehouseError> {
        self.mutate(&[InventoryCounts], |s| {
            s.counts.create(&s.products, draft).cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn start_count(&self, id: InventoryCountId, at: DateTime<Utc>) -> Result<InventoryCount, WarehouseError> {
        self.mutate(&[InventoryCounts], |s| s.counts.start(&id, at).cloned())
    }

    #[tracing::instrument(skip(self, entry))]
    pub fn record_count(
        &self,
        id: InventoryCountId,
        product_id: ProductId,
        entry: CountEntry,
    ) -> Result<InventoryCountItem, WarehouseError> {
        self.mutate(&[InventoryCounts], |s| {
            s.counts.record(&id, &product_id, entry).cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn finalize_count(&self, id: InventoryCountId, at: DateTime<Utc>) -> Result<InventoryCount, WarehouseError> {
        self.mutate(&[InventoryCounts], |s| s.counts.finalize(&id, at).cloned())
    }

    #[tracing::instrument(skip(self, cause))]
    pub fn annotate_count(
        &self,
        id: InventoryCountId,
        product_id: ProductId,
        cause: String,
    ) -> Result<InventoryCountItem, WarehouseError> {
        self.mutate(&[InventoryCounts], |s| {
            s.counts.annotate(&id, &product_id, cause).cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn apply_adjustments(
        &self,
        id: InventoryCountId,
        at: DateTime<Utc>,
    ) -> Result<InventoryCount, WarehouseError> {
        self.mutate(&[Products, Movements, InventoryCounts], |s| {
            s.counts
                .apply_adjustments(&mut s.products, &mut s.ledger, &id, at)
                .cloned()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn cancel_count(&self, id: InventoryCountId, at: DateTime<Utc>) -> Result<InventoryCount, WarehouseError> {
        self.mutate(&[InventoryCounts], |s| s.counts.cancel(&id, at).cloned())
    }

    pub fn count(&self, id: InventoryCountId) -> Result<InventoryCount, WarehouseError> {
        Ok(self.read(|s| s.counts.require(&id).cloned())??)
    }

    pub fn counts(&self, status: Option<CountStatus>) -> Result<Vec<InventoryCount>, WarehouseError> {
        self.read(|s| s.counts.list(status).into_iter().cloned().collect())
    }

    pub fn suggest_counts(&self, limit: usize, as_of: DateTime<Utc>) -> Result<Vec<CountSuggestion>, WarehouseError> {
        self.read(|s| s.counts.suggest(&s.products, limit, as_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDocumentStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use stockforge_counting::{CountMethod, CountScope};
    use stockforge_ledger::MovementType;
    use stockforge_production::ExitType;

    fn warehouse() -> (Arc<InMemoryDocumentStore>, Warehouse) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let warehouse = Warehouse::open(store.clone(), CountPolicy::default()).unwrap();
        (store, warehouse)
    }

    fn movement(product_id: ProductId, kind: MovementType, qty: i64) -> NewMovement {
        NewMovement::new(product_id, kind, qty, "ana", Utc::now())
    }

    /// Store whose writes to one collection fail while `failing` is set.
    struct FlakyStore {
        inner: InMemoryDocumentStore,
        kind: DocumentKind,
        failing: AtomicBool,
    }

    impl DocumentStore for FlakyStore {
        fn read(&self, kind: DocumentKind) -> Result<Option<JsonValue>, StoreError> {
            self.inner.read(kind)
        }

        fn write(&self, kind: DocumentKind, document: &JsonValue) -> Result<(), StoreError> {
            if kind == self.kind && self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::io(kind, std::io::Error::other("disk full")));
            }
            self.inner.write(kind, document)
        }
    }

    fn counting(wh: &Warehouse, products: Vec<ProductId>) -> InventoryCount {
        wh.create_count(NewInventoryCount {
            name: "Ciclico".into(),
            method: CountMethod::Simple,
            scope: CountScope::Products(products),
            collaborator: "rui".into(),
            scheduled_at: None,
            occurred_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn mutations_persist_touched_collections() {
        let (store, wh) = warehouse();
        let product = wh
            .create_product(NewProduct::new("PAR-M6", "Parafuso M6").with_stock(10))
            .unwrap();
        assert!(store.read(DocumentKind::Movements).unwrap().is_none());

        wh.record_movement(movement(product.id, MovementType::Saida, 3))
            .unwrap();

        let movements = store.read(DocumentKind::Movements).unwrap().unwrap();
        assert_eq!(movements.as_array().unwrap().len(), 1);
        let products = store.read(DocumentKind::Products).unwrap().unwrap();
        assert_eq!(products[0]["current_stock"], 7);
    }

    #[test]
    fn reopening_restores_state() {
        let (store, wh) = warehouse();
        let product = wh
            .create_product(NewProduct::new("PAR-M6", "Parafuso M6").with_stock(10))
            .unwrap();
        wh.record_movement(movement(product.id, MovementType::Entrada, 5))
            .unwrap();
        drop(wh);

        let reopened = Warehouse::open(store, CountPolicy::default()).unwrap();
        assert_eq!(reopened.product(product.id).unwrap().current_stock, 15);
        assert_eq!(reopened.movements(&MovementFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn rejected_mutation_writes_nothing() {
        let (store, wh) = warehouse();
        let err = wh
            .record_movement(movement(ProductId::new(), MovementType::Entrada, 1))
            .unwrap_err();
        assert!(matches!(err, WarehouseError::Domain(DomainError::NotFound(_))));
        assert!(store.read(DocumentKind::Movements).unwrap().is_none());
    }

    #[test]
    fn referenced_products_cannot_be_removed() {
        let (_, wh) = warehouse();
        let used = wh.create_product(NewProduct::new("PAR-M6", "Parafuso")).unwrap();
        let free = wh.create_product(NewProduct::new("CHP-3", "Chapa")).unwrap();
        wh.record_movement(movement(used.id, MovementType::Entrada, 1))
            .unwrap();

        assert!(matches!(
            wh.remove_product(used.id),
            Err(WarehouseError::Domain(DomainError::Conflict(_)))
        ));
        wh.remove_product(free.id).unwrap();
        assert_eq!(wh.products().unwrap().len(), 1);
    }

    #[test]
    fn products_in_open_counts_cannot_be_removed() {
        let (_, wh) = warehouse();
        let plate = wh
            .create_product(NewProduct::new("CHP-3", "Chapa").with_stock(5))
            .unwrap();
        let count = counting(&wh, vec![plate.id]);
        wh.start_count(count.id, Utc::now()).unwrap();
        wh.record_count(count.id, plate.id, CountEntry::new(4, Utc::now()))
            .unwrap();
        wh.finalize_count(count.id, Utc::now()).unwrap();

        assert!(matches!(
            wh.remove_product(plate.id),
            Err(WarehouseError::Domain(DomainError::Conflict(_)))
        ));
        let adjusted = wh.apply_adjustments(count.id, Utc::now()).unwrap();
        assert_eq!(adjusted.status, CountStatus::Ajustado);
        assert_eq!(wh.product(plate.id).unwrap().current_stock, 4);
    }

    #[test]
    fn products_in_cancelled_counts_can_be_removed() {
        let (_, wh) = warehouse();
        let plate = wh.create_product(NewProduct::new("CHP-3", "Chapa")).unwrap();
        let count = counting(&wh, vec![plate.id]);
        assert!(wh.remove_product(plate.id).is_err());

        wh.cancel_count(count.id, Utc::now()).unwrap();
        wh.remove_product(plate.id).unwrap();
    }

    #[test]
    fn unpersisted_mutation_is_not_published() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryDocumentStore::new(),
            kind: DocumentKind::Movements,
            failing: AtomicBool::new(false),
        });
        let wh = Warehouse::open(store.clone(), CountPolicy::default()).unwrap();
        let product = wh
            .create_product(NewProduct::new("PAR-M6", "Parafuso").with_stock(10))
            .unwrap();

        store.failing.store(true, Ordering::SeqCst);
        let err = wh
            .record_movement(movement(product.id, MovementType::Saida, 3))
            .unwrap_err();
        assert!(matches!(err, WarehouseError::Store(StoreError::Io { .. })));
        assert_eq!(wh.product(product.id).unwrap().current_stock, 10);
        assert!(wh.movements(&MovementFilter::default()).unwrap().is_empty());
        let persisted = store.read(DocumentKind::Products).unwrap().unwrap();
        assert_eq!(persisted[0]["current_stock"], 10);

        store.failing.store(false, Ordering::SeqCst);
        wh.record_movement(movement(product.id, MovementType::Saida, 3))
            .unwrap();
        assert_eq!(wh.product(product.id).unwrap().current_stock, 7);
        assert_eq!(wh.movements(&MovementFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn production_and_count_flow() {
        let (_, wh) = warehouse();
        let screw = wh
            .create_product(NewProduct::new("PAR-M6", "Parafuso").with_stock(100).with_address("A-01"))
            .unwrap();
        let composition = wh
            .create_composition(NewComposition::new("SUP-01", "Suporte").with_item(screw.id, 12, "UN"))
            .unwrap();

        let draft = wh
            .read(|s| {
                ProductionOrderDraft::for_composition(
                    &s.products,
                    s.compositions.require(&composition.id)?,
                    2,
                    ExitType::Integral,
                    "OBRA-1",
                    "ana",
                    Utc::now(),
                )
            })
            .unwrap()
            .unwrap();
        let order = wh.submit_order(draft).unwrap();
        assert_eq!(wh.product(screw.id).unwrap().current_stock, 76);

        let count = wh
            .create_count(NewInventoryCount {
                name: "Setor A".into(),
                method: CountMethod::Simple,
                scope: CountScope::Sector("A".into()),
                collaborator: "rui".into(),
                scheduled_at: None,
                occurred_at: Utc::now(),
            })
            .unwrap();
        wh.start_count(count.id, Utc::now()).unwrap();
        wh.record_count(count.id, screw.id, CountEntry::new(70, Utc::now()))
            .unwrap();
        wh.finalize_count(count.id, Utc::now()).unwrap();
        wh.apply_adjustments(count.id, Utc::now()).unwrap();
        assert_eq!(wh.product(screw.id).unwrap().current_stock, 70);

        let cancelled = wh.cancel_order(order.id, "ana", Utc::now()).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelada);
        assert_eq!(wh.product(screw.id).unwrap().current_stock, 94);
    }

    #[test]
    fn concurrent_writers_conserve_stock() {
        let (_, wh) = warehouse();
        let product = wh.create_product(NewProduct::new("PAR-M6", "Parafuso")).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        wh.record_movement(movement(product.id, MovementType::Entrada, 2))
                            .unwrap();
                        wh.read(|s| s.products.require(&product.id).map(|p| p.current_stock))
                            .unwrap()
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(wh.product(product.id).unwrap().current_stock, 400);
        assert_eq!(wh.movements(&MovementFilter::for_product(product.id)).unwrap().len(), 200);
    }
}
