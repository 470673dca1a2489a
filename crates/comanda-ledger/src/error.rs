//! # Ledger Error Type
//!
//! Unified error type for ledger operations, plus the serializable
//! [`ApiError`] views receive.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Ledger                             │
//! │                                                                         │
//! │  ledger.add_free_item(7, "Bolo", price, 1)                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation? ── ValidationError::Required ───────────┐                 │
//! │         │                                             │                 │
//! │         ▼                                             │                 │
//! │  Order closed? ── StateError::OrderClosed ───────────┤                 │
//! │         │                                             ▼                 │
//! │         ▼                                        LedgerError            │
//! │  Database? ── DbError::QueryFailed ──────────────────┤                 │
//! │         │                                             │                 │
//! │         ▼                                             ▼                 │
//! │  Success                              ApiError { code, message }        │
//! │                                       { "code": "ORDER_CLOSED",         │
//! │                                         "message": "Order 7 is ..." }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use comanda_core::{CoreError, EncodingError, StateError, ValidationError};
use comanda_db::DbError;

// =============================================================================
// Ledger Error
// =============================================================================

/// Errors returned by [`crate::Ledger`] operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// User input was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The order is in the wrong state for the operation.
    #[error(transparent)]
    State(#[from] StateError),

    /// The payload could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The order total is zero or negative, so there is nothing to
    /// encode in a payment code.
    #[error("Order {order_id} has nothing to charge")]
    NothingToCharge { order_id: i64 },

    #[error("Database error: {0}")]
    Database(DbError),
}

impl LedgerError {
    /// Creates a not found error.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Validation(_) => ErrorCode::ValidationError,
            LedgerError::State(StateError::OrderClosed { .. }) => ErrorCode::OrderClosed,
            LedgerError::State(StateError::OrderOpen { .. }) => ErrorCode::OrderOpen,
            LedgerError::Encoding(_) => ErrorCode::EncodingError,
            LedgerError::Config(_) => ErrorCode::ConfigError,
            LedgerError::NotFound { .. } => ErrorCode::NotFound,
            LedgerError::NothingToCharge { .. } => ErrorCode::NothingToCharge,
            LedgerError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Whether the cashier can fix this by changing input or order state.
    ///
    /// Database, configuration and encoding failures need someone to
    /// look at the installation instead.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_)
                | LedgerError::State(_)
                | LedgerError::NotFound { .. }
                | LedgerError::NothingToCharge { .. }
        )
    }
}

/// Core errors unwrap into their matching ledger variant.
impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => LedgerError::Validation(e),
            CoreError::State(e) => LedgerError::State(e),
            CoreError::Encoding(e) => LedgerError::Encoding(e),
        }
    }
}

/// Storage errors that mean something to the cashier are lifted out of
/// the database variant.
///
/// `DbError::InvalidState` stays a database error here: turning it into a
/// [`StateError`] needs the order id, which only the ledger call knows.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => {
                LedgerError::Validation(ValidationError::Duplicate { field, value })
            }
            other => LedgerError::Database(other),
        }
    }
}

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// API Error
// =============================================================================

/// Error codes for view responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// Line items of a closed order are frozen.
    OrderClosed,
    /// The operation needs a closed order.
    OrderOpen,
    NothingToCharge,
    EncodingError,
    ConfigError,
    DatabaseError,
}

/// What a view receives when a ledger call fails.
///
/// ```json
/// { "code": "NOTHING_TO_CHARGE", "message": "Order 3 has nothing to charge" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let code = err.code();
        match err {
            LedgerError::Database(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Database operation failed");
                ApiError::new(code, "Database operation failed")
            }
            LedgerError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
                ApiError::new(code, "Ledger is not configured correctly")
            }
            other => ApiError::new(code, other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_lift_into_ledger_variants() {
        let err = LedgerError::from(DbError::not_found("Order", 9));
        assert!(matches!(err, LedgerError::NotFound { ref id, .. } if id == "9"));
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err = LedgerError::from(DbError::duplicate("name", "Coxinha"));
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::Duplicate { .. })
        ));

        let err = LedgerError::from(DbError::PoolExhausted);
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            LedgerError::from(StateError::closed(7, "add item")).code(),
            ErrorCode::OrderClosed
        );
        assert_eq!(
            LedgerError::NothingToCharge { order_id: 1 }.code(),
            ErrorCode::NothingToCharge
        );
        assert!(LedgerError::NothingToCharge { order_id: 1 }.is_recoverable());
    }

    #[test]
    fn test_api_error_serialization() {
        let api = ApiError::from(LedgerError::from(StateError::closed(7, "add item")));
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "ORDER_CLOSED");
        assert_eq!(json["message"], "Order 7 is closed; cannot add item");
    }

    #[test]
    fn test_api_error_hides_database_details() {
        let api = ApiError::from(LedgerError::Database(DbError::Internal(
            "disk I/O error at page 42".to_string(),
        )));
        assert_eq!(api.message, "Database operation failed");
    }
}
