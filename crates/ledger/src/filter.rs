//! Movement query filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::ProductId;

use crate::movement::{Movement, MovementType};

/// Filter criteria for ledger queries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    /// Movements at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Movements strictly before this instant.
    pub to: Option<DateTime<Utc>>,
    pub movement_type: Option<MovementType>,
    pub product_id: Option<ProductId>,
    /// Case-insensitive exact match.
    pub collaborator: Option<String>,
    /// Case-insensitive exact match.
    pub purpose: Option<String>,
    pub project_code: Option<String>,
}

impl MovementFilter {
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        if self.from.is_some_and(|from| movement.occurred_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| movement.occurred_at >= to) {
            return false;
        }
        if self.movement_type.is_some_and(|t| movement.movement_type != t) {
            return false;
        }
        if self.product_id.is_some_and(|p| movement.product_id != p) {
            return false;
        }
        if let Some(collaborator) = self.collaborator.as_deref() {
            if !movement.collaborator.eq_ignore_ascii_case(collaborator.trim()) {
                return false;
            }
        }
        if let Some(purpose) = self.purpose.as_deref() {
            if !movement.purpose.eq_ignore_ascii_case(purpose.trim()) {
                return false;
            }
        }
        if let Some(project) = self.project_code.as_deref() {
            if movement.project_code.as_deref() != Some(project) {
                return false;
            }
        }
        true
    }
}
