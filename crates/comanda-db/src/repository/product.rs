//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Name Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.name is UNIQUE COLLATE NOCASE                                 │
//! │                                                                         │
//! │  insert("Pastel")   ✓                                                  │
//! │  insert("PASTEL")   ✗ UNIQUE constraint failed: products.name          │
//! │                       → DbError::UniqueViolation { field: "name", .. } │
//! │                                                                         │
//! │  Listings sort by lower(name), so "açaí" and "Água" sit where a        │
//! │  cashier expects regardless of how they were typed.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

/// Maps a unique violation to a duplicate-name error naming `name`.
fn duplicate_name(err: sqlx::Error, name: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("name", name),
        other => other,
    }
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the whole catalog ordered by name, ignoring case.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents
            FROM products
            ORDER BY lower(name) ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches products whose name contains `query`.
    ///
    /// An empty query lists the catalog (up to `limit`).
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents
            FROM products
            WHERE ?1 = '' OR name LIKE '%' || ?1 || '%'
            ORDER BY lower(name) ASC, id ASC
            LIMIT ?2
            "#,
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price_cents FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Finds a product by name, ignoring case.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price_cents FROM products WHERE name = ?1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product and returns it with its assigned id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already exists (any case)
    pub async fn insert(&self, name: &str, price_cents: i64) -> DbResult<Product> {
        debug!(name = %name, price_cents, "Inserting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price_cents)
            VALUES (?1, ?2)
            RETURNING id, name, price_cents
            "#,
        )
        .bind(name)
        .bind(price_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, name))?;

        Ok(product)
    }

    /// Updates name and price of an existing product.
    ///
    /// Line items already on orders keep their snapshot price.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = product.id, "Updating product");

        let result = sqlx::query("UPDATE products SET name = ?2, price_cents = ?3 WHERE id = ?1")
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price_cents)
            .execute(&self.pool)
            .await
            .map_err(|e| duplicate_name(e, &product.name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Line items referencing it keep their price and lose the link
    /// (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog entries (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let pastel = repo.insert("Pastel de carne", 800).await.unwrap();
        assert!(pastel.id > 0);
        assert_eq!(pastel.price_cents, 800);

        let fetched = repo.get_by_id(pastel.id).await.unwrap().unwrap();
        assert_eq!(fetched, pastel);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_ignores_case() {
        let db = db().await;
        let repo = db.products();

        repo.insert("Coxinha", 650).await.unwrap();
        let err = repo.insert("COXINHA", 700).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "COXINHA"));

        let found = repo.find_by_name("coxinha").await.unwrap().unwrap();
        assert_eq!(found.name, "Coxinha");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_lowercase_name() {
        let db = db().await;
        let repo = db.products();

        repo.insert("suco", 600).await.unwrap();
        repo.insert("Bolo", 1250).await.unwrap();
        repo.insert("café", 400).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Bolo", "café", "suco"]);
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        let repo = db.products();

        repo.insert("Pastel de carne", 800).await.unwrap();
        repo.insert("Pastel de queijo", 750).await.unwrap();
        repo.insert("Caldo de cana", 500).await.unwrap();

        assert_eq!(repo.search("pastel", 10).await.unwrap().len(), 2);
        assert_eq!(repo.search("", 10).await.unwrap().len(), 3);
        assert_eq!(repo.search("", 1).await.unwrap().len(), 1);
        assert!(repo.search("pizza", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = db().await;
        let repo = db.products();

        let mut bolo = repo.insert("Bolo", 1000).await.unwrap();
        let suco = repo.insert("Suco", 600).await.unwrap();

        bolo.price_cents = 1250;
        repo.update(&bolo).await.unwrap();
        assert_eq!(repo.get_by_id(bolo.id).await.unwrap().unwrap().price_cents, 1250);

        bolo.name = "suco".to_string();
        assert!(matches!(
            repo.update(&bolo).await,
            Err(DbError::UniqueViolation { .. })
        ));

        repo.delete(suco.id).await.unwrap();
        assert!(matches!(
            repo.delete(suco.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
