//! Inventory count engine.
//!
//! A count snapshots expected quantities at creation, collects counted
//! quantities while running, derives divergences on finalize and, on request,
//! brings stock in line through synthetic ledger adjustments.
//!
//! ```text
//! PLANEJADO -> EM_ANDAMENTO -> CONTAGEM_FINALIZADA -> AJUSTADO
//!     \______________\______> CANCELADO
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{Collection, DomainError, DomainResult, InventoryCountId, ProductId};
use stockforge_ledger::{labels, MovementType, NewMovement, StockLedger};
use stockforge_products::ProductDirectory;

use crate::count::{
    CountEntry, CountMethod, CountScope, CountStatus, InventoryCount, InventoryCountItem,
    ItemStatus, NewInventoryCount,
};
use crate::suggest::{rank, CountSuggestion, SuggestionWeights};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountPolicy {
    /// Largest disagreement between the two counts of a double count that is still accepted.
    pub double_count_tolerance: i64,
    pub weights: SuggestionWeights,
}

impl Default for CountPolicy {
    fn default() -> Self {
        Self {
            double_count_tolerance: 0,
            weights: SuggestionWeights::default(),
        }
    }
}

const ENTITY: &str = "inventory count";

#[derive(Debug, Clone, Default)]
pub struct InventoryCountEngine {
    counts: Collection<InventoryCount>,
    policy: CountPolicy,
}

impl InventoryCountEngine {
    pub fn new(policy: CountPolicy) -> Self {
        Self {
            counts: Collection::new(),
            policy,
        }
    }

    pub fn from_records(records: Vec<InventoryCount>, policy: CountPolicy) -> DomainResult<Self> {
        Ok(Self {
            counts: Collection::from_records(records)?,
            policy,
        })
    }

    pub fn policy(&self) -> &CountPolicy {
        &self.policy
    }

    pub fn records(&self) -> &[InventoryCount] {
        self.counts.as_slice()
    }

    pub fn get(&self, id: &InventoryCountId) -> Option<&InventoryCount> {
        self.counts.get(id)
    }

    pub fn require(&self, id: &InventoryCountId) -> DomainResult<&InventoryCount> {
        self.counts.require(id)
    }

    pub fn list(&self, status: Option<CountStatus>) -> Vec<&InventoryCount> {
        self.counts
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .collect()
    }

    fn next_code(&self, at: DateTime<Utc>) -> String {
        let prefix = format!("INV-{}-", at.format("%Y%m%d"));
        let last = self
            .counts
            .iter()
            .filter_map(|c| c.code.strip_prefix(&prefix)?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{prefix}{:03}", last + 1)
    }

    pub fn create<D>(&mut self, products: &D, draft: NewInventoryCount) -> DomainResult<&InventoryCount>
    where
        D: ProductDirectory + ?Sized,
    {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("count name cannot be empty"));
        }
        if draft.collaborator.trim().is_empty() {
            return Err(DomainError::validation("collaborator cannot be empty"));
        }

        let items: Vec<InventoryCountItem> = match &draft.scope {
            CountScope::Products(ids) => {
                if ids.is_empty() {
                    return Err(DomainError::validation("product list cannot be empty"));
                }
                let mut items: Vec<InventoryCountItem> = Vec::with_capacity(ids.len());
                for id in ids {
                    if items.iter().any(|i| i.product_id == *id) {
                        continue;
                    }
                    items.push(InventoryCountItem::snapshot(products.require(id)?));
                }
                items
            }
            CountScope::Sector(prefix) => {
                if prefix.trim().is_empty() {
                    return Err(DomainError::validation("sector cannot be empty"));
                }
                products
                    .list()
                    .into_iter()
                    .filter(|p| p.in_sector(prefix))
                    .map(InventoryCountItem::snapshot)
                    .collect()
            }
            CountScope::Curve(curve) => products
                .list()
                .into_iter()
                .filter(|p| p.abc_curve == Some(*curve))
                .map(InventoryCountItem::snapshot)
                .collect(),
            CountScope::All => products
                .list()
                .into_iter()
                .map(InventoryCountItem::snapshot)
                .collect(),
        };
        if items.is_empty() {
            return Err(DomainError::validation("count scope selects no products"));
        }

        let count = InventoryCount {
            id: InventoryCountId::new(),
            code: self.next_code(draft.occurred_at),
            name: draft.name.trim().to_string(),
            method: draft.method,
            scope: draft.scope,
            items,
            status: CountStatus::Planejado,
            collaborator: draft.collaborator.trim().to_string(),
            created_at: draft.occurred_at,
            scheduled_at: draft.scheduled_at,
            started_at: None,
            completed_at: None,
            adjusted_at: None,
            cancelled_at: None,
            adjustment_movement_ids: Vec::new(),
        };
        tracing::info!(
            count_id = %count.id,
            code = %count.code,
            method = ?count.method,
            items = count.items.len(),
            "inventory count created"
        );
        self.counts.insert(count)
    }

    pub fn start(&mut self, id: &InventoryCountId, at: DateTime<Utc>) -> DomainResult<&InventoryCount> {
        let count = self.counts.require_mut(id)?;
        if count.status != CountStatus::Planejado {
            return Err(DomainError::invalid_transition(
                ENTITY,
                count.status,
                CountStatus::EmAndamento,
            ));
        }
        count.status = CountStatus::EmAndamento;
        count.started_at = Some(at);
        tracing::info!(count_id = %id, code = %count.code, "inventory count started");
        Ok(count)
    }

    /// Record (or re-record) one item's count.
    pub fn record(
        &mut self,
        id: &InventoryCountId,
        product_id: &ProductId,
        entry: CountEntry,
    ) -> DomainResult<&InventoryCountItem> {
        let tolerance = self.policy.double_count_tolerance;
        let count = self.counts.require_mut(id)?;
        if count.status != CountStatus::EmAndamento {
            return Err(DomainError::invalid_transition(
                ENTITY,
                count.status,
                CountStatus::EmAndamento,
            ));
        }
        entry.validate(count.method)?;
        let method = count.method;
        let code = count.code.clone();

        let item = count.item_mut(product_id)?;
        item.counted_qty = Some(entry.counted_qty);
        item.second_count_qty = match method {
            CountMethod::DoubleCount => entry.second_count_qty,
            _ => None,
        };
        item.counted_by = entry.counted_by.map(|c| c.trim().to_string());
        item.counted_at = Some(entry.counted_at);
        item.status = ItemStatus::Contado;

        if let (CountMethod::DoubleCount, Some(second)) = (method, item.second_count_qty) {
            let gap = (entry.counted_qty - second).abs();
            if gap > tolerance {
                item.status = ItemStatus::Recontagem;
                tracing::warn!(
                    count = %code,
                    product = %item.product_code,
                    first = entry.counted_qty,
                    second,
                    tolerance,
                    "double count disagrees, recount required"
                );
            }
        }
        tracing::debug!(count = %code, product = %item.product_code, status = ?item.status, "item counted");
        Ok(item)
    }

    /// Close counting and compute divergences. Stock is not touched.
    pub fn finalize(&mut self, id: &InventoryCountId, at: DateTime<Utc>) -> DomainResult<&InventoryCount> {
        let count = self.counts.require_mut(id)?;
        if count.status != CountStatus::EmAndamento {
            return Err(DomainError::invalid_transition(
                ENTITY,
                count.status,
                CountStatus::ContagemFinalizada,
            ));
        }
        if let Some(item) = count.items.iter().find(|i| i.status == ItemStatus::Recontagem) {
            return Err(DomainError::validation(format!(
                "{} still needs a recount",
                item.product_code
            )));
        }
        for item in &mut count.items {
            item.settle();
        }
        count.status = CountStatus::ContagemFinalizada;
        count.completed_at = Some(at);
        tracing::info!(
            count_id = %id,
            code = %count.code,
            counted = count.counted_items(),
            divergent = count.divergent_items(),
            "inventory count finalized"
        );
        Ok(count)
    }

    /// Attach a cause analysis to a divergent item of a finalized count.
    pub fn annotate(
        &mut self,
        id: &InventoryCountId,
        product_id: &ProductId,
        cause: impl Into<String>,
    ) -> DomainResult<&InventoryCountItem> {
        let cause = cause.into();
        if cause.trim().is_empty() {
            return Err(DomainError::validation("cause analysis cannot be empty"));
        }
        let count = self.counts.require_mut(id)?;
        if count.status != CountStatus::ContagemFinalizada {
            return Err(DomainError::invalid_transition(
                ENTITY,
                count.status,
                CountStatus::ContagemFinalizada,
            ));
        }
        let item = count.item_mut(product_id)?;
        if item.status != ItemStatus::Divergente {
            return Err(DomainError::validation(format!(
                "{} has no divergence to explain",
                item.product_code
            )));
        }
        item.cause_analysis = Some(cause.trim().to_string());
        Ok(item)
    }

    /// Bring every divergent product to its counted quantity through the ledger.
    pub fn apply_adjustments<D>(
        &mut self,
        products: &mut D,
        ledger: &mut StockLedger,
        id: &InventoryCountId,
        at: DateTime<Utc>,
    ) -> DomainResult<&InventoryCount>
    where
        D: ProductDirectory + ?Sized,
    {
        let count = self.counts.require(id)?;
        if count.status != CountStatus::ContagemFinalizada {
            return Err(DomainError::invalid_transition(
                ENTITY,
                count.status,
                CountStatus::Ajustado,
            ));
        }

        let mut targets = Vec::new();
        for item in count.items.iter().filter(|i| i.status == ItemStatus::Divergente) {
            let counted = item.counted_qty.ok_or_else(|| {
                DomainError::invariant(format!("divergent item {} has no count", item.product_code))
            })?;
            let product = products.require(&item.product_id)?;
            targets.push((product.id, product.address.clone(), counted - product.current_stock));
        }

        let observation = format!("inventory count {}", count.code);
        let collaborator = count.collaborator.clone();
        let mut movement_ids = Vec::new();
        for (product_id, address, delta) in &targets {
            if *delta == 0 {
                continue;
            }
            let kind = if *delta > 0 {
                MovementType::AjusteEntrada
            } else {
                MovementType::AjusteSaida
            };
            let movement = NewMovement::new(*product_id, kind, delta.abs(), collaborator.clone(), at)
                .with_route(address.clone(), address.clone())
                .with_purpose(labels::INVENTORY_ADJUSTMENT)
                .with_observation(observation.clone());
            movement_ids.push(ledger.record(products, movement)?.id);
        }

        let count = self.counts.require_mut(id)?;
        for item in count
            .items
            .iter_mut()
            .filter(|i| i.status == ItemStatus::Divergente)
        {
            item.status = ItemStatus::Ajustado;
        }
        count.adjustment_movement_ids = movement_ids;
        count.status = CountStatus::Ajustado;
        count.adjusted_at = Some(at);
        tracing::info!(
            count_id = %id,
            code = %count.code,
            adjusted = targets.len(),
            movements = count.adjustment_movement_ids.len(),
            "inventory adjustments applied"
        );
        Ok(count)
    }

    pub fn cancel(&mut self, id: &InventoryCountId, at: DateTime<Utc>) -> DomainResult<&InventoryCount> {
        let count = self.counts.require_mut(id)?;
        if !count.status.is_active() {
            return Err(DomainError::invalid_transition(
                ENTITY,
                count.status,
                CountStatus::Cancelado,
            ));
        }
        count.status = CountStatus::Cancelado;
        count.cancelled_at = Some(at);
        tracing::info!(count_id = %id, code = %count.code, "inventory count cancelled");
        Ok(count)
    }

    /// Products most worth counting next, best first.
    pub fn suggest<D>(&self, products: &D, limit: usize, as_of: DateTime<Utc>) -> Vec<CountSuggestion>
    where
        D: ProductDirectory + ?Sized,
    {
        let suggestions = rank(
            products.list(),
            self.counts.as_slice(),
            &self.policy.weights,
            limit,
            as_of,
        );
        tracing::debug!(suggested = suggestions.len(), limit, "count suggestions ranked");
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use stockforge_products::{AbcCurve, NewProduct, ProductCatalog};

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    struct Floor {
        catalog: ProductCatalog,
        ledger: StockLedger,
        engine: InventoryCountEngine,
        screw: ProductId,
        plate: ProductId,
        hinge: ProductId,
    }

    fn floor(policy: CountPolicy) -> Floor {
        let mut catalog = ProductCatalog::new();
        let screw = catalog
            .create(
                NewProduct::new("PAR-M6", "Parafuso M6")
                    .with_stock(50)
                    .with_stock_omie(48)
                    .with_address("A-01-01")
                    .with_curve(AbcCurve::A),
            )
            .unwrap()
            .id;
        let plate = catalog
            .create(
                NewProduct::new("CHP-3", "Chapa 3mm")
                    .with_stock(10)
                    .with_address("a-02-01")
                    .with_curve(AbcCurve::C),
            )
            .unwrap()
            .id;
        let hinge = catalog
            .create(NewProduct::new("DOB-1", "Dobradiça").with_address("B-01-01"))
            .unwrap()
            .id;
        Floor {
            catalog,
            ledger: StockLedger::new(),
            engine: InventoryCountEngine::new(policy),
            screw,
            plate,
            hinge,
        }
    }

    fn draft(method: CountMethod, scope: CountScope) -> NewInventoryCount {
        NewInventoryCount {
            name: "Contagem semanal".into(),
            method,
            scope,
            collaborator: "rui".into(),
            scheduled_at: None,
            occurred_at: test_time(),
        }
    }

    fn running(f: &mut Floor, method: CountMethod, scope: CountScope) -> InventoryCountId {
        let id = f.engine.create(&f.catalog, draft(method, scope)).unwrap().id;
        f.engine.start(&id, test_time()).unwrap();
        id
    }

    fn stock(f: &Floor, id: &ProductId) -> i64 {
        f.catalog.require(id).unwrap().current_stock
    }

    #[test]
    fn scope_resolution() {
        let mut f = floor(CountPolicy::default());
        let sector = f
            .engine
            .create(&f.catalog, draft(CountMethod::Simple, CountScope::Sector("A".into())))
            .unwrap()
            .clone();
        assert_eq!(sector.items.len(), 2);
        assert_eq!(sector.status, CountStatus::Planejado);
        assert_eq!(sector.code, "INV-20250602-001");
        let screw = sector.item(&f.screw).unwrap();
        assert_eq!(screw.expected_qty, 50);
        assert_eq!(screw.expected_qty_omie, 48);

        let curve = f
            .engine
            .create(&f.catalog, draft(CountMethod::Simple, CountScope::Curve(AbcCurve::A)))
            .unwrap();
        assert_eq!(curve.items.len(), 1);
        assert_eq!(curve.code, "INV-20250602-002");

        let all = f
            .engine
            .create(&f.catalog, draft(CountMethod::Simple, CountScope::All))
            .unwrap();
        assert_eq!(all.items.len(), 3);
    }

    #[test]
    fn create_rejects_empty_or_unknown_scopes() {
        let mut f = floor(CountPolicy::default());
        let cases = [
            CountScope::Products(vec![]),
            CountScope::Sector("  ".into()),
            CountScope::Sector("Z".into()),
            CountScope::Curve(AbcCurve::B),
        ];
        for scope in cases {
            assert!(matches!(
                f.engine.create(&f.catalog, draft(CountMethod::Simple, scope)),
                Err(DomainError::Validation(_))
            ));
        }
        assert!(matches!(
            f.engine.create(
                &f.catalog,
                draft(CountMethod::Simple, CountScope::Products(vec![ProductId::new()]))
            ),
            Err(DomainError::NotFound(_))
        ));
        assert!(f.engine.records().is_empty());
    }

    #[test]
    fn divergence_after_finalize() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::Simple, CountScope::Sector("A".into()));
        f.engine.record(&id, &f.screw, CountEntry::new(42, test_time())).unwrap();
        f.engine.record(&id, &f.plate, CountEntry::new(10, test_time())).unwrap();

        let count = f.engine.finalize(&id, test_time()).unwrap();
        assert_eq!(count.status, CountStatus::ContagemFinalizada);

        let screw = count.item(&f.screw).unwrap();
        assert_eq!(screw.divergence, Some(-8));
        assert_eq!(screw.divergence_percent, Some(-16.0));
        assert_eq!(screw.divergence_omie, Some(-6));
        assert_eq!(screw.status, ItemStatus::Divergente);

        let plate = count.item(&f.plate).unwrap();
        assert_eq!(plate.divergence, Some(0));
        assert_eq!(plate.status, ItemStatus::Contado);
        assert_eq!(stock(&f, &f.screw), 50);
    }

    #[test]
    fn uncounted_items_stay_pending() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::Simple, CountScope::All);
        f.engine.record(&id, &f.screw, CountEntry::new(50, test_time())).unwrap();
        let count = f.engine.finalize(&id, test_time()).unwrap();

        let hinge = count.item(&f.hinge).unwrap();
        assert_eq!(hinge.status, ItemStatus::Pendente);
        assert_eq!(hinge.divergence, None);
    }

    #[test]
    fn recording_requires_a_running_count() {
        let mut f = floor(CountPolicy::default());
        let id = f
            .engine
            .create(&f.catalog, draft(CountMethod::Simple, CountScope::All))
            .unwrap()
            .id;
        assert!(matches!(
            f.engine.record(&id, &f.screw, CountEntry::new(1, test_time())),
            Err(DomainError::InvalidTransition { .. })
        ));
        f.engine.start(&id, test_time()).unwrap();
        assert!(matches!(
            f.engine.record(&id, &ProductId::new(), CountEntry::new(1, test_time())),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn double_count_within_tolerance_takes_first_count() {
        let mut f = floor(CountPolicy {
            double_count_tolerance: 1,
            ..CountPolicy::default()
        });
        let screw = f.screw;
        let id = running(&mut f, CountMethod::DoubleCount, CountScope::Products(vec![screw]));
        let item = f
            .engine
            .record(&id, &f.screw, CountEntry::new(49, test_time()).with_second_count(50))
            .unwrap();
        assert_eq!(item.status, ItemStatus::Contado);

        let count = f.engine.finalize(&id, test_time()).unwrap();
        assert_eq!(count.item(&f.screw).unwrap().divergence, Some(-1));
    }

    #[test]
    fn double_count_disagreement_blocks_finalize_until_recounted() {
        let mut f = floor(CountPolicy::default());
        let screw = f.screw;
        let id = running(&mut f, CountMethod::DoubleCount, CountScope::Products(vec![screw]));
        assert!(matches!(
            f.engine.record(&id, &f.screw, CountEntry::new(50, test_time())),
            Err(DomainError::Validation(_))
        ));

        let item = f
            .engine
            .record(&id, &f.screw, CountEntry::new(47, test_time()).with_second_count(50))
            .unwrap();
        assert_eq!(item.status, ItemStatus::Recontagem);
        assert!(matches!(
            f.engine.finalize(&id, test_time()),
            Err(DomainError::Validation(_))
        ));

        f.engine
            .record(&id, &f.screw, CountEntry::new(50, test_time()).with_second_count(50))
            .unwrap();
        assert!(f.engine.finalize(&id, test_time()).is_ok());
    }

    #[test]
    fn full_traceability_records_counter() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::FullTraceability, CountScope::All);
        assert!(f
            .engine
            .record(&id, &f.screw, CountEntry::new(50, test_time()))
            .is_err());
        let item = f
            .engine
            .record(&id, &f.screw, CountEntry::new(50, test_time()).counted_by(" ana "))
            .unwrap();
        assert_eq!(item.counted_by.as_deref(), Some("ana"));
    }

    #[test]
    fn blind_counts_hide_expected_until_finalized() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::Blind, CountScope::All);
        assert!(f.engine.require(&id).unwrap().hides_expected());
        f.engine.finalize(&id, test_time()).unwrap();
        assert!(!f.engine.require(&id).unwrap().hides_expected());
    }

    #[test]
    fn adjustments_go_through_the_ledger_once() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::Simple, CountScope::Sector("A".into()));
        f.engine.record(&id, &f.screw, CountEntry::new(42, test_time())).unwrap();
        f.engine.record(&id, &f.plate, CountEntry::new(13, test_time())).unwrap();
        f.engine.finalize(&id, test_time()).unwrap();

        // Stock moves between finalize and apply: the adjustment targets the count.
        f.catalog.set_stock(&f.screw, 45).unwrap();

        let count = f
            .engine
            .apply_adjustments(&mut f.catalog, &mut f.ledger, &id, test_time())
            .unwrap()
            .clone();
        assert_eq!(count.status, CountStatus::Ajustado);
        assert_eq!(count.adjustment_movement_ids.len(), 2);
        assert!(count.items.iter().all(|i| i.status == ItemStatus::Ajustado));
        assert_eq!(stock(&f, &f.screw), 42);
        assert_eq!(stock(&f, &f.plate), 13);

        let out = f.ledger.get(&count.adjustment_movement_ids[0]).unwrap();
        assert_eq!(out.movement_type, MovementType::AjusteSaida);
        assert_eq!(out.quantity, 3);
        assert_eq!(out.purpose, labels::INVENTORY_ADJUSTMENT);

        let movements = f.ledger.len();
        let err = f
            .engine
            .apply_adjustments(&mut f.catalog, &mut f.ledger, &id, test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(f.ledger.len(), movements);
        assert_eq!(stock(&f, &f.screw), 42);
    }

    #[test]
    fn annotate_only_divergent_items_after_finalize() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::Simple, CountScope::Sector("A".into()));
        f.engine.record(&id, &f.screw, CountEntry::new(40, test_time())).unwrap();
        f.engine.record(&id, &f.plate, CountEntry::new(10, test_time())).unwrap();
        assert!(matches!(
            f.engine.annotate(&id, &f.screw, "furto"),
            Err(DomainError::InvalidTransition { .. })
        ));

        f.engine.finalize(&id, test_time()).unwrap();
        let item = f.engine.annotate(&id, &f.screw, "erro de lançamento").unwrap();
        assert_eq!(item.cause_analysis.as_deref(), Some("erro de lançamento"));
        assert!(matches!(
            f.engine.annotate(&id, &f.plate, "nada"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn closed_counts_reject_recording_and_annotation() {
        let mut f = floor(CountPolicy::default());
        let id = running(&mut f, CountMethod::Simple, CountScope::Sector("A".into()));
        f.engine.record(&id, &f.screw, CountEntry::new(40, test_time())).unwrap();
        f.engine.finalize(&id, test_time()).unwrap();
        f.engine
            .apply_adjustments(&mut f.catalog, &mut f.ledger, &id, test_time())
            .unwrap();

        assert!(matches!(
            f.engine.record(&id, &f.screw, CountEntry::new(41, test_time())),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            f.engine.annotate(&id, &f.screw, "furto"),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(stock(&f, &f.screw), 40);
    }

    #[test]
    fn cancel_only_before_finalize() {
        let mut f = floor(CountPolicy::default());
        let planned = f
            .engine
            .create(&f.catalog, draft(CountMethod::Simple, CountScope::All))
            .unwrap()
            .id;
        assert_eq!(
            f.engine.cancel(&planned, test_time()).unwrap().status,
            CountStatus::Cancelado
        );
        assert!(matches!(
            f.engine.start(&planned, test_time()),
            Err(DomainError::InvalidTransition { .. })
        ));

        let id = running(&mut f, CountMethod::Simple, CountScope::All);
        f.engine.finalize(&id, test_time()).unwrap();
        assert!(matches!(
            f.engine.cancel(&id, test_time()),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(f.engine.list(Some(CountStatus::Cancelado)).len(), 1);
    }

    #[test]
    fn suggestions_rank_risky_products_first() {
        let mut f = floor(CountPolicy {
            weights: SuggestionWeights {
                critical_sectors: vec!["B".into()],
                ..SuggestionWeights::default()
            },
            ..CountPolicy::default()
        });
        // Plate was counted 30 days ago and diverged.
        let id = f
            .engine
            .create(&f.catalog, draft(CountMethod::Simple, CountScope::Products(vec![f.plate])))
            .unwrap()
            .id;
        f.engine.start(&id, test_time()).unwrap();
        f.engine.record(&id, &f.plate, CountEntry::new(9, test_time())).unwrap();
        f.engine.finalize(&id, test_time()).unwrap();

        let as_of = test_time() + Duration::days(30);
        let suggestions = f.engine.suggest(&f.catalog, 10, as_of);
        let codes: Vec<_> = suggestions.iter().map(|s| s.product_code.as_str()).collect();
        // hinge: out of stock 40 + never counted 20 + critical 10
        // screw: curve A 30 + never counted 20
        // plate: 30/90 of 20 + full divergence rate 25
        assert_eq!(codes, vec!["DOB-1", "PAR-M6", "CHP-3"]);
        assert_eq!(suggestions[0].score, 70.0);
        assert_eq!(suggestions[1].score, 50.0);
        assert_eq!(suggestions[2].score, 31.7);
        assert!(suggestions[2]
            .reasons
            .iter()
            .any(|r| r == "diverged in 1 of 1 counts"));

        assert_eq!(f.engine.suggest(&f.catalog, 1, as_of).len(), 1);
    }

    #[test]
    fn suggestions_skip_products_in_active_counts() {
        let mut f = floor(CountPolicy::default());
        let hinge = f.hinge;
        running(&mut f, CountMethod::Simple, CountScope::Products(vec![hinge]));
        let suggestions = f.engine.suggest(&f.catalog, 10, test_time());
        assert!(suggestions.iter().all(|s| s.product_id != f.hinge));
    }
}
