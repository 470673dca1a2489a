//! # Store Errors
//!
//! What can go wrong between the repositories and SQLite.
//!
//! ```text
//! sqlx::Error ──► DbError ──► LedgerError ──► ApiError { code, message }
//!                   │
//!                   └─ constraint failures are recognised from SQLite's
//!                      message text so callers can match on them
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A status-guarded write matched no row: the order was closed (or
    /// is missing) by the time the statement ran.
    #[error("{entity} {id} is not {expected}")]
    InvalidState {
        entity: String,
        id: String,
        expected: String,
    },

    /// `products.name` already taken, in any letter case.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Usually a line item naming a product id that doesn't exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Schema CHECK rejected the row (negative price, zero quantity, a
    /// closed order without `closed_at`).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    #[error("Cannot open store: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Statement failed: {0}")]
    QueryFailed(String),

    #[error("No store connection available")]
    PoolExhausted,

    #[error("Unexpected store error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// The guarded write on `entity` `id` needed it to be `expected`.
    pub fn invalid_state(
        entity: impl Into<String>,
        id: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        DbError::InvalidState {
            entity: entity.into(),
            id: id.to_string(),
            expected: expected.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// ```text
/// RowNotFound                          → NotFound
/// "UNIQUE constraint failed: t.col"    → UniqueViolation { field: "t.col" }
/// "FOREIGN KEY constraint failed"      → ForeignKeyViolation
/// "CHECK constraint failed: ..."       → CheckViolation
/// other database message               → QueryFailed
/// PoolTimedOut / PoolClosed            → PoolExhausted / ConnectionFailed
/// anything else                        → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();

                if let Some(field) = message.strip_prefix("UNIQUE constraint failed: ") {
                    // The repository knows the offending value; it replaces this.
                    DbError::duplicate(field, "?")
                } else if message.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message }
                } else if message.contains("CHECK constraint failed") {
                    DbError::CheckViolation { message }
                } else {
                    DbError::QueryFailed(message)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("store is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(DbError::not_found("Order", 7).to_string(), "Order not found: 7");
        assert_eq!(
            DbError::invalid_state("Order", 7, "open").to_string(),
            "Order 7 is not open"
        );
        assert_eq!(
            DbError::duplicate("name", "Pastel").to_string(),
            "Duplicate name: 'Pastel' already exists"
        );
    }

    #[test]
    fn test_sqlx_mapping() {
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_check_constraint_is_recognised() {
        let db = crate::Database::new(crate::DbConfig::in_memory()).await.unwrap();
        let err = sqlx::query("INSERT INTO products (name, price_cents) VALUES ('x', -1)")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
