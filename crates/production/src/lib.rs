//! Compositions, production orders and demand simulation.
//!
//! A composition lists the components of one finished unit. Submitting a
//! production order explodes its composition, checks stock for every
//! component up front and then consumes them through the stock ledger.

pub mod composition;
pub mod engine;
pub mod explosion;
pub mod order;
pub mod simulation;

pub use composition::{Composition, CompositionItem, CompositionRegistry, ImportReport, NewComposition};
pub use engine::ProductionOrderEngine;
pub use explosion::explode;
pub use order::{
    ExitType, OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDraft, ProductionOrderItem,
};
pub use simulation::{simulate, DemandLine, DemandRequest};
