//! # Order Repository
//!
//! Database operations for orders (comandas) and their line items.
//!
//! ## Status Guards
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every write that must not touch a closed order carries the guard      │
//! │  in the SQL itself, so a close that lands between the ledger's check   │
//! │  and its write cannot be overwritten:                                  │
//! │                                                                         │
//! │  INSERT INTO line_items (...)                                          │
//! │  SELECT ... WHERE EXISTS (SELECT 1 FROM orders                         │
//! │                           WHERE id = ?1 AND status = 'open')           │
//! │                                                                         │
//! │  UPDATE line_items SET quantity = ?2                                   │
//! │  WHERE id = ?1 AND order_id IN (SELECT id FROM orders                  │
//! │                                 WHERE status = 'open')                 │
//! │                                                                         │
//! │  UPDATE orders SET status = 'closed', ... WHERE id = ?1                │
//! │                                            AND status = 'open'         │
//! │                                                                         │
//! │  0 rows affected → DbError::InvalidState                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are always summed from `line_items`; nothing caches them.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::{
    LineItem, Order, OrderStatus, OrderSummary, PaidStatus, SettlementMethod,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    name: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    paid: Option<i64>,
    settlement_method: Option<SettlementMethod>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            name: row.name,
            status: row.status,
            created_at: row.created_at,
            closed_at: row.closed_at,
            paid: PaidStatus::from_db(row.paid),
            settlement_method: row.settlement_method,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    #[sqlx(flatten)]
    order: OrderRow,
    total_cents: i64,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        OrderSummary {
            order: row.order.into(),
            total: comanda_core::Money::from_cents(row.total_cents),
        }
    }
}

const ORDER_COLUMNS: &str =
    "o.id, o.name, o.status, o.created_at, o.closed_at, o.paid, o.settlement_method";

const LIVE_TOTAL: &str = "COALESCE((SELECT SUM(i.quantity * i.unit_price_cents) \
                          FROM line_items i WHERE i.order_id = o.id), 0) AS total_cents";

const ITEM_COLUMNS: &str = "i.id, i.order_id, i.product_id, i.description, \
                            p.name AS product_name, i.quantity, i.unit_price_cents";

// =============================================================================
// New Line Item
// =============================================================================

/// A line item about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: Option<i64>,
    pub description: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewLineItem {
    /// A catalog line. `unit_price_cents` is the price snapshot.
    pub fn product(product_id: i64, quantity: i64, unit_price_cents: i64) -> Self {
        NewLineItem {
            product_id: Some(product_id),
            description: None,
            quantity,
            unit_price_cents,
        }
    }

    /// A free-text line.
    pub fn free(description: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        NewLineItem {
            product_id: None,
            description: Some(description.into()),
            quantity,
            unit_price_cents,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order and line item operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Creates an open order stamped with the current time.
    pub async fn create(&self, name: &str) -> DbResult<Order> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (name, status, created_at)
            VALUES (?1, 'open', ?2)
            RETURNING id, name, status, created_at, closed_at, paid, settlement_method
            "#,
        )
        .bind(name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(order_id = row.id, name = %row.name, "Order inserted");
        Ok(row.into())
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Renames an open order.
    pub async fn rename(&self, id: i64, name: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET name = ?2 WHERE id = ?1 AND status = 'open'")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("Order", id, "open"));
        }

        Ok(())
    }

    /// Open orders with their live totals, ordered by name ignoring case.
    ///
    /// `filter` keeps only names containing it.
    pub async fn list_open(&self, filter: Option<&str>) -> DbResult<Vec<OrderSummary>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());

        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, {LIVE_TOTAL}
            FROM orders o
            WHERE o.status = 'open'
              AND (?1 IS NULL OR o.name LIKE '%' || ?1 || '%')
            ORDER BY lower(o.name) ASC, o.id ASC
            "#
        ))
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Closed orders with their totals.
    ///
    /// Without `day`, most recently closed first. With `day`, only orders
    /// closed on that date at `utc_offset`, sorted by name like the open list.
    pub async fn list_closed(
        &self,
        day: Option<NaiveDate>,
        utc_offset: FixedOffset,
    ) -> DbResult<Vec<OrderSummary>> {
        let day = day.map(|d| d.format("%Y-%m-%d").to_string());

        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, {LIVE_TOTAL}
            FROM orders o
            WHERE o.status = 'closed'
              AND (?1 IS NULL OR date(o.closed_at, ?2) = ?1)
            ORDER BY CASE WHEN ?1 IS NULL THEN o.closed_at END DESC,
                     lower(o.name) ASC,
                     o.id ASC
            "#
        ))
        .bind(day)
        .bind(date_modifier(utc_offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Closes an open order.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidState)` - the order is not open (or missing)
    pub async fn close(
        &self,
        id: i64,
        paid: PaidStatus,
        method: SettlementMethod,
        closed_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'closed',
                closed_at = ?2,
                paid = ?3,
                settlement_method = ?4
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(closed_at)
        .bind(paid.to_db())
        .bind(method)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("Order", id, "open"));
        }

        debug!(order_id = id, ?paid, ?method, "Order closed");
        Ok(())
    }

    /// Sets the paid flag of a closed order. Line items are untouched.
    pub async fn set_paid(&self, id: i64, paid: PaidStatus) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE orders SET paid = ?2 WHERE id = ?1 AND status = 'closed'")
                .bind(id)
                .bind(paid.to_db())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("Order", id, "closed"));
        }

        Ok(())
    }

    /// Deletes an order together with its line items.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM line_items WHERE order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found("Order", id));
        }

        tx.commit().await?;
        debug!(order_id = id, "Order deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Line items
    // -------------------------------------------------------------------------

    /// Appends a line item to an open order.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidState)` - the order is closed (or missing)
    /// * `Err(DbError::ForeignKeyViolation)` - unknown product id
    pub async fn insert_item(&self, order_id: i64, item: &NewLineItem) -> DbResult<LineItem> {
        let item_id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO line_items (order_id, product_id, description, quantity, unit_price_cents)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE EXISTS (SELECT 1 FROM orders WHERE id = ?1 AND status = 'open')
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.description.as_deref())
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .fetch_optional(&self.pool)
        .await?;

        let Some(item_id) = item_id else {
            return Err(DbError::invalid_state("Order", order_id, "open"));
        };

        debug!(order_id, item_id, quantity = item.quantity, "Line item inserted");

        self.get_item(item_id)
            .await?
            .ok_or_else(|| DbError::not_found("Line item", item_id))
    }

    /// Gets a line item by its ID.
    pub async fn get_item(&self, item_id: i64) -> DbResult<Option<LineItem>> {
        let item = sqlx::query_as::<_, LineItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM line_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.id = ?1
            "#
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Line items of an order, newest first.
    pub async fn list_items(&self, order_id: i64) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM line_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.order_id = ?1
            ORDER BY i.id DESC
            "#
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Sets the quantity of a line on an open order.
    pub async fn set_item_quantity(&self, item_id: i64, quantity: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE line_items SET quantity = ?2
            WHERE id = ?1
              AND order_id IN (SELECT id FROM orders WHERE status = 'open')
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("Line item", item_id, "on an open order"));
        }

        Ok(())
    }

    /// Removes a line from an open order.
    pub async fn remove_item(&self, item_id: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM line_items
            WHERE id = ?1
              AND order_id IN (SELECT id FROM orders WHERE status = 'open')
            "#,
        )
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("Line item", item_id, "on an open order"));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    /// Sum of quantity × unit price over the order's lines. 0 when empty.
    pub async fn total_cents(&self, order_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity * unit_price_cents), 0)
            FROM line_items
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Sum of all closed orders whose `closed_at`, shifted by `utc_offset`,
    /// falls on `day`.
    pub async fn revenue_for_day(&self, day: NaiveDate, utc_offset: FixedOffset) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(i.quantity * i.unit_price_cents), 0)
            FROM line_items i
            INNER JOIN orders o ON o.id = i.order_id
            WHERE o.status = 'closed'
              AND date(o.closed_at, ?2) = ?1
            "#,
        )
        .bind(day.format("%Y-%m-%d").to_string())
        .bind(date_modifier(utc_offset))
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// SQLite date modifier moving a UTC timestamp to wall-clock time.
fn date_modifier(utc_offset: FixedOffset) -> String {
    format!("{:+} seconds", utc_offset.local_minus_utc())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn sao_paulo() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let orders = db.orders();

        let order = orders.create("Mesa 4").await.unwrap();
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.paid, PaidStatus::Unknown);
        assert!(order.closed_at.is_none());

        let fetched = orders.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(fetched, order);
        assert!(orders.get_by_id(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_items_and_total() {
        let db = db().await;
        let coxinha = db.products().insert("Coxinha", 750).await.unwrap();
        let orders = db.orders();
        let order = orders.create("Balcão").await.unwrap();

        assert_eq!(orders.total_cents(order.id).await.unwrap(), 0);

        let line = orders
            .insert_item(order.id, &NewLineItem::product(coxinha.id, 2, coxinha.price_cents))
            .await
            .unwrap();
        assert_eq!(line.product_name.as_deref(), Some("Coxinha"));
        orders
            .insert_item(order.id, &NewLineItem::free("Suco", 1, 500))
            .await
            .unwrap();

        assert_eq!(orders.total_cents(order.id).await.unwrap(), 2000);

        let items = orders.list_items(order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label(), "Suco");
        assert_eq!(items[1].label(), "Coxinha");

        orders.set_item_quantity(line.id, 3).await.unwrap();
        assert_eq!(orders.total_cents(order.id).await.unwrap(), 2750);

        orders.remove_item(line.id).await.unwrap();
        assert_eq!(orders.total_cents(order.id).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_catalog_change() {
        let db = db().await;
        let mut bolo = db.products().insert("Bolo", 1000).await.unwrap();
        let order = db.orders().create("Mesa 1").await.unwrap();
        db.orders()
            .insert_item(order.id, &NewLineItem::product(bolo.id, 1, bolo.price_cents))
            .await
            .unwrap();

        bolo.price_cents = 1500;
        db.products().update(&bolo).await.unwrap();
        assert_eq!(db.orders().total_cents(order.id).await.unwrap(), 1000);

        db.products().delete(bolo.id).await.unwrap();
        let items = db.orders().list_items(order.id).await.unwrap();
        assert_eq!(items[0].product_id, None);
        assert_eq!(db.orders().total_cents(order.id).await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_closed_order_guards() {
        let db = db().await;
        let orders = db.orders();
        let order = orders.create("Mesa 2").await.unwrap();
        let line = orders
            .insert_item(order.id, &NewLineItem::free("Café", 1, 400))
            .await
            .unwrap();

        orders
            .close(order.id, PaidStatus::Paid, SettlementMethod::Manual, Utc::now())
            .await
            .unwrap();

        assert!(matches!(
            orders.insert_item(order.id, &NewLineItem::free("Pão", 1, 100)).await,
            Err(DbError::InvalidState { .. })
        ));
        assert!(matches!(
            orders.set_item_quantity(line.id, 5).await,
            Err(DbError::InvalidState { .. })
        ));
        assert!(matches!(
            orders.remove_item(line.id).await,
            Err(DbError::InvalidState { .. })
        ));
        assert!(matches!(
            orders.rename(order.id, "Outro").await,
            Err(DbError::InvalidState { .. })
        ));
        assert!(matches!(
            orders
                .close(order.id, PaidStatus::NotPaid, SettlementMethod::None, Utc::now())
                .await,
            Err(DbError::InvalidState { .. })
        ));

        assert_eq!(orders.total_cents(order.id).await.unwrap(), 400);
        let closed = orders.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(closed.status, OrderStatus::Closed);
        assert_eq!(closed.paid, PaidStatus::Paid);
        assert_eq!(closed.settlement_method, Some(SettlementMethod::Manual));
        assert!(closed.closed_at.is_some());
    }

    #[tokio::test]
    async fn test_set_paid_requires_closed() {
        let db = db().await;
        let orders = db.orders();
        let order = orders.create("Mesa 3").await.unwrap();

        assert!(matches!(
            orders.set_paid(order.id, PaidStatus::Paid).await,
            Err(DbError::InvalidState { .. })
        ));

        orders
            .close(order.id, PaidStatus::NotPaid, SettlementMethod::Pix, Utc::now())
            .await
            .unwrap();
        orders.set_paid(order.id, PaidStatus::Paid).await.unwrap();

        let order = orders.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(order.paid, PaidStatus::Paid);
        assert_eq!(order.settlement_method, Some(SettlementMethod::Pix));
    }

    #[tokio::test]
    async fn test_listings() {
        let db = db().await;
        let orders = db.orders();

        let zeca = orders.create("zeca").await.unwrap();
        let ana = orders.create("Ana").await.unwrap();
        let bia = orders.create("Bia").await.unwrap();
        orders
            .insert_item(ana.id, &NewLineItem::free("Açaí", 2, 1200))
            .await
            .unwrap();

        let open = orders.list_open(None).await.unwrap();
        let names: Vec<&str> = open.iter().map(|s| s.order.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Bia", "zeca"]);
        assert_eq!(open[0].total.cents(), 2400);
        assert_eq!(open[1].total.cents(), 0);

        assert_eq!(orders.list_open(Some("ze")).await.unwrap().len(), 1);
        assert_eq!(orders.list_open(Some("  ")).await.unwrap().len(), 3);

        let yesterday = Utc::now() - Duration::days(1);
        orders
            .close(bia.id, PaidStatus::Paid, SettlementMethod::Manual, yesterday)
            .await
            .unwrap();
        orders
            .close(ana.id, PaidStatus::Paid, SettlementMethod::Manual, Utc::now())
            .await
            .unwrap();

        let closed = orders.list_closed(None, utc()).await.unwrap();
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].order.id, ana.id);
        assert_eq!(closed[0].total.cents(), 2400);

        let today = orders.list_closed(Some(Utc::now().date_naive()), utc()).await.unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].order.id, ana.id);

        assert_eq!(orders.list_open(None).await.unwrap()[0].order.id, zeca.id);
    }

    #[tokio::test]
    async fn test_revenue_for_day() {
        let db = db().await;
        let orders = db.orders();
        let now = Utc::now();

        let a = orders.create("A").await.unwrap();
        orders.insert_item(a.id, &NewLineItem::free("x", 2, 750)).await.unwrap();
        orders.insert_item(a.id, &NewLineItem::free("y", 1, 500)).await.unwrap();
        orders
            .close(a.id, PaidStatus::NotPaid, SettlementMethod::Pix, now)
            .await
            .unwrap();

        let b = orders.create("B").await.unwrap();
        orders.insert_item(b.id, &NewLineItem::free("z", 1, 999)).await.unwrap();
        orders
            .close(b.id, PaidStatus::Paid, SettlementMethod::Manual, now - Duration::days(2))
            .await
            .unwrap();

        // Open orders never count.
        let c = orders.create("C").await.unwrap();
        orders.insert_item(c.id, &NewLineItem::free("w", 1, 10_000)).await.unwrap();

        assert_eq!(orders.revenue_for_day(now.date_naive(), utc()).await.unwrap(), 2000);
        assert_eq!(
            orders
                .revenue_for_day((now - Duration::days(2)).date_naive(), utc())
                .await
                .unwrap(),
            999
        );
    }

    #[tokio::test]
    async fn test_late_closing_counts_toward_local_day() {
        let db = db().await;
        let orders = db.orders();

        // 22:30 in São Paulo on the 19th is 01:30Z on the 20th.
        let late = orders.create("Mesa 3").await.unwrap();
        orders.insert_item(late.id, &NewLineItem::free("Pizza", 1, 4500)).await.unwrap();
        orders
            .close(
                late.id,
                PaidStatus::Paid,
                SettlementMethod::Manual,
                Utc.with_ymd_and_hms(2026, 10, 20, 1, 30, 0).unwrap(),
            )
            .await
            .unwrap();

        let evening = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();

        assert_eq!(orders.revenue_for_day(evening, sao_paulo()).await.unwrap(), 4500);
        assert_eq!(orders.revenue_for_day(next_day, sao_paulo()).await.unwrap(), 0);
        assert_eq!(orders.revenue_for_day(next_day, utc()).await.unwrap(), 4500);

        let listed = orders.list_closed(Some(evening), sao_paulo()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].order.id, late.id);
        assert!(orders.list_closed(Some(next_day), sao_paulo()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_day_listing_is_sorted_by_name() {
        let db = db().await;
        let orders = db.orders();
        let day = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        for (name, minutes) in [("bia", 0), ("Caio", 10), ("ana", 20)] {
            let order = orders.create(name).await.unwrap();
            orders
                .close(
                    order.id,
                    PaidStatus::Paid,
                    SettlementMethod::Manual,
                    day + Duration::minutes(minutes),
                )
                .await
                .unwrap();
        }

        let names = |list: Vec<OrderSummary>| -> Vec<String> {
            list.into_iter().map(|s| s.order.name).collect()
        };

        let by_day = orders.list_closed(Some(day.date_naive()), utc()).await.unwrap();
        assert_eq!(names(by_day), ["ana", "bia", "Caio"]);

        let all = orders.list_closed(None, utc()).await.unwrap();
        assert_eq!(names(all), ["ana", "Caio", "bia"]);
    }

    #[tokio::test]
    async fn test_delete_removes_items() {
        let db = db().await;
        let orders = db.orders();
        let order = orders.create("Mesa 9").await.unwrap();
        let line = orders
            .insert_item(order.id, &NewLineItem::free("Pastel", 1, 800))
            .await
            .unwrap();

        orders.delete(order.id).await.unwrap();

        assert!(orders.get_by_id(order.id).await.unwrap().is_none());
        assert!(orders.get_item(line.id).await.unwrap().is_none());
        assert!(matches!(
            orders.delete(order.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_is_foreign_key_violation() {
        let db = db().await;
        let order = db.orders().create("Mesa 5").await.unwrap();
        assert!(matches!(
            db.orders()
                .insert_item(order.id, &NewLineItem::product(12345, 1, 100))
                .await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
