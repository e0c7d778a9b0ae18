//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic failure: retrying with the same inputs
/// reproduces the same error. Storage concerns belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input was rejected before any mutation took place.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A production order needs more of a component than is on hand.
    #[error(
        "insufficient stock for {product_code}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_code: String,
        requested: i64,
        available: i64,
    },

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A status machine was asked to leave a terminal state or skip a step.
    #[error("invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Uniqueness or reference conflict (duplicate code, record still in use).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn insufficient_stock(product_code: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            product_code: product_code.into(),
            requested,
            available,
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl core::fmt::Debug,
        to: impl core::fmt::Debug,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}
