//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── ValidationError  - Bad user input (empty name, "abc" as price)    │
//! │  ├── StateError       - Order is in the wrong state (closed)           │
//! │  ├── EncodingError    - A payload field broke the EMV framing          │
//! │  └── CoreError        - Union of the three                             │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  comanda-ledger errors                                                 │
//! │  └── LedgerError      - What views see (with an ErrorCode)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ValidationError and StateError are user-facing: the action is aborted and
//! nothing was written. EncodingError is a contract violation by the caller;
//! the payload builder pre-truncates every field so it should not surface in
//! normal operation.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation not allowed in the order's current state.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// A payload field could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Validation always runs before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. non-numeric amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. product name already in the catalog).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// State Error
// =============================================================================

/// Order state violations.
///
/// ## When This Occurs
/// ```text
/// Order #7 (Closed)
///      │
///      ▼
/// add item / change quantity / remove item / rename
///      │
///      ▼
/// StateError::OrderClosed { order_id: 7, operation: "add item" }
///      │
///      ▼
/// UI shows: "Order 7 is closed; cannot add item"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The order is closed and its line items are frozen.
    #[error("Order {order_id} is closed; cannot {operation}")]
    OrderClosed { order_id: i64, operation: String },

    /// The operation only applies to closed orders.
    #[error("Order {order_id} is still open; cannot {operation}")]
    OrderOpen { order_id: i64, operation: String },
}

impl StateError {
    /// Creates an [`StateError::OrderClosed`] for the given operation.
    pub fn closed(order_id: i64, operation: impl Into<String>) -> Self {
        StateError::OrderClosed {
            order_id,
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Encoding Error
// =============================================================================

/// EMV field framing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Tags are exactly two ASCII digits.
    #[error("Invalid field tag '{tag}': expected two ASCII digits")]
    InvalidTag { tag: String },

    /// The length prefix has two decimal digits, so values cap at 99.
    #[error("Field {tag} value has {len} characters; maximum is {max}")]
    ValueTooLong { tag: String, len: usize, max: usize },

    /// The length prefix is not two decimal digits.
    #[error("Field {tag} has invalid length prefix '{raw}'")]
    InvalidLength { tag: String, raw: String },

    /// Input ended before the declared value length.
    #[error("Field {tag} declares {declared} characters but only {available} remain")]
    Truncated {
        tag: String,
        declared: usize,
        available: usize,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_message() {
        let err = StateError::closed(7, "add item");
        assert_eq!(err.to_string(), "Order 7 is closed; cannot add item");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("order name").to_string(),
            "order name is required"
        );
        assert_eq!(
            ValidationError::invalid_format("price", "not a number").to_string(),
            "price has invalid format: not a number"
        );
    }

    #[test]
    fn test_encoding_error_message() {
        let err = EncodingError::ValueTooLong {
            tag: "59".to_string(),
            len: 120,
            max: 99,
        };
        assert_eq!(
            err.to_string(),
            "Field 59 value has 120 characters; maximum is 99"
        );
    }

    #[test]
    fn test_errors_convert_to_core_error() {
        let core: CoreError = ValidationError::required("sku").into();
        assert!(matches!(core, CoreError::Validation(_)));

        let core: CoreError = StateError::closed(1, "remove item").into();
        assert!(matches!(core, CoreError::State(_)));

        let core: CoreError = EncodingError::InvalidTag {
            tag: "A1".to_string(),
        }
        .into();
        assert!(matches!(core, CoreError::Encoding(_)));
    }
}
