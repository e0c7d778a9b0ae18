//! Inventory counts: scoped physical counts, divergence analysis, ledger
//! adjustments and count suggestions.

pub mod count;
pub mod engine;
pub mod suggest;

pub use count::{
    divergence_percent, CountEntry, CountMethod, CountScope, CountStatus, InventoryCount,
    InventoryCountItem, ItemStatus, NewInventoryCount,
};
pub use engine::{CountPolicy, InventoryCountEngine};
pub use suggest::{CountSuggestion, SuggestionWeights};
