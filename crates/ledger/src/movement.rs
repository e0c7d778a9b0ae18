use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{DomainError, DomainResult, Entity, MovementId, ProductId};

/// Well-known `purpose` / location labels written by the engines.
pub mod labels {
    /// Purpose and destination of production consumption.
    pub const PRODUCTION: &str = "production";
    /// Purpose of synthetic movements emitted by inventory count adjustments.
    pub const INVENTORY_ADJUSTMENT: &str = "inventory adjustment";
}

/// Kind of stock movement. The kind alone decides the sign of the stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Entrada,
    Saida,
    Devolucao,
    /// Like-for-like exchange: recorded for traceability, net-zero on stock.
    Troca,
    Avaria,
    Perda,
    /// Inventory count found more than the system held.
    AjusteEntrada,
    /// Inventory count found less than the system held.
    AjusteSaida,
}

impl MovementType {
    pub const ALL: [MovementType; 8] = [
        MovementType::Entrada,
        MovementType::Saida,
        MovementType::Devolucao,
        MovementType::Troca,
        MovementType::Avaria,
        MovementType::Perda,
        MovementType::AjusteEntrada,
        MovementType::AjusteSaida,
    ];

    /// +1, -1 or 0.
    pub fn sign(self) -> i64 {
        match self {
            MovementType::Entrada | MovementType::Devolucao | MovementType::AjusteEntrada => 1,
            MovementType::Saida
            | MovementType::Avaria
            | MovementType::Perda
            | MovementType::AjusteSaida => -1,
            MovementType::Troca => 0,
        }
    }

    /// Signed stock change for `quantity` units of this kind.
    pub fn delta(self, quantity: i64) -> i64 {
        self.sign() * quantity
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::Entrada => "ENTRADA",
            MovementType::Saida => "SAIDA",
            MovementType::Devolucao => "DEVOLUCAO",
            MovementType::Troca => "TROCA",
            MovementType::Avaria => "AVARIA",
            MovementType::Perda => "PERDA",
            MovementType::AjusteEntrada => "AJUSTE_ENTRADA",
            MovementType::AjusteSaida => "AJUSTE_SAIDA",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded stock movement.
///
/// The movement is the only source of truth for the sign and size of a stock
/// change: amending or retracting it reverses exactly what it applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub origin: String,
    pub destination: String,
    pub purpose: String,
    #[serde(default)]
    pub project_code: Option<String>,
    pub collaborator: String,
    #[serde(default)]
    pub observation: Option<String>,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Movement {
    type Id = MovementId;
    const KIND: &'static str = "movement";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Movement {
    pub fn delta(&self) -> i64 {
        self.movement_type.delta(self.quantity)
    }
}

/// Input for `StockLedger::record`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
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
    pub occurred_at: DateTime<Utc>,
}

impl NewMovement {
    pub fn new(
        product_id: ProductId,
        movement_type: MovementType,
        quantity: i64,
        collaborator: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            movement_type,
            quantity,
            origin: String::new(),
            destination: String::new(),
            purpose: String::new(),
            project_code: None,
            collaborator: collaborator.into(),
            observation: None,
            occurred_at,
        }
    }

    pub fn with_route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.destination = destination.into();
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn with_project(mut self, project_code: impl Into<String>) -> Self {
        self.project_code = Some(project_code.into());
        self
    }

    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        validate_quantity(self.quantity)?;
        if self.collaborator.trim().is_empty() {
            return Err(DomainError::validation("collaborator cannot be empty"));
        }
        Ok(())
    }

    pub(crate) fn into_movement(self) -> Movement {
        Movement {
            id: MovementId::new(),
            product_id: self.product_id,
            movement_type: self.movement_type,
            quantity: self.quantity,
            origin: self.origin,
            destination: self.destination,
            purpose: self.purpose,
            project_code: self.project_code,
            collaborator: self.collaborator.trim().to_string(),
            observation: self.observation,
            occurred_at: self.occurred_at,
            updated_at: None,
        }
    }
}

/// Correction of a recorded movement (quantity, type and note only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementUpdate {
    pub quantity: Option<i64>,
    pub movement_type: Option<MovementType>,
    pub observation: Option<String>,
}

pub(crate) fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}
