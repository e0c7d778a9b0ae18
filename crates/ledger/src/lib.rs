//! Stock ledger.
//!
//! The append-and-correct log of movements. Each movement changes exactly one
//! product's `current_stock` by a signed delta derived from its type; amend and
//! retract reverse the previous effect before applying the new one.

pub mod filter;
pub mod ledger;
pub mod movement;

pub use filter::MovementFilter;
pub use ledger::StockLedger;
pub use movement::{labels, Movement, MovementType, MovementUpdate, NewMovement};
