//! Domain error model.

use thiserror::Error;

use crate::Quantity;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is an expected, recoverable business outcome; none of them should
/// ever bring the process down.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty name, zero capacity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Not enough room (warehouse free space or truck capacity) for the requested units.
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity {
        requested: Quantity,
        available: Quantity,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_capacity(requested: Quantity, available: Quantity) -> Self {
        Self::InsufficientCapacity {
            requested,
            available,
        }
    }
}

/// Reject blank entity names.
pub fn ensure_name(kind: &str, name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation(format!("{kind} name cannot be empty")));
    }
    Ok(())
}
