//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                          │
//! │  ├── CoreError        - InvalidState / OutOfStock / amount overflow    │
//! │  └── ValidationError  - Input validation failures (InvalidInput)       │
//! │                                                                         │
//! │  caja-db errors (separate crate)                                       │
//! │  └── DbError          - Database and posting failures                  │
//! │                                                                         │
//! │  caja-app errors                                                       │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError ─┬──────────────► DbError → ApiError → Caller   │
//! │                         └─► CoreError ─┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is terminal for the operation that raised it; nothing is
//! retried.

use thiserror::Error;

use crate::quantity::Quantity;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the state guards, the stock floor
/// and line pricing.
///
/// Existence checks belong to the storage layer, so there is no NotFound
/// here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The entity exists but is in the wrong state for the operation.
    ///
    /// ## When This Occurs
    /// - Opening a session while another is open
    /// - Posting to or closing a closed session
    /// - Cancelling a cancelled purchase, refunding a refunded sale
    #[error("{0}")]
    InvalidState(String),

    /// A tracked product would be driven below zero stock.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    OutOfStock {
        product: String,
        available: Quantity,
        requested: Quantity,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        CoreError::InvalidState(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any row is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfStock {
            product: "Yerba 1kg".to_string(),
            available: Quantity::from_units(3),
            requested: Quantity::from_milli(5500),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Yerba 1kg: available 3, requested 5.5"
        );

        let err = CoreError::invalid_state("Register session abc is closed");
        assert_eq!(err.to_string(), "Register session abc is closed");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        assert_eq!(validation_err.to_string(), "amount must be positive");

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
