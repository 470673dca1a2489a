//! # Ledger Service
//!
//! The operations views call: orders, line items, settlement, payment codes
//! and the product catalog.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Lifecycle                                      │
//! │                                                                         │
//! │  ┌──────────┐   add/change/remove items   ┌──────────┐                 │
//! │  │  create  │───────────────────────────►│   Open   │◄──┐             │
//! │  └──────────┘                             └────┬─────┘   │ rename      │
//! │                                                │         │             │
//! │                               close_order(disposition)   │             │
//! │                                                │─────────┘             │
//! │                                                ▼                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Closed: items frozen, closed_at set, paid + method recorded    │  │
//! │  │          SettlementEvent published once                          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                    │                           │                        │
//! │              toggle_paid                build_settlement_payload        │
//! │         (Paid ⇄ NotPaid only)        (re-reads the total every call)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validate, Then Mutate
//! Every check runs before the write. The write itself is guarded by the
//! order status in SQL, so a close that lands in between turns into the
//! same [`StateError`] the check would have produced.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PixSettings;
use crate::error::{LedgerError, LedgerResult};
use comanda_core::pix::{build_payload, derive_transaction_id, PayloadParams};
use comanda_core::validation::{
    parse_free_item, parse_price, validate_order_name, validate_price_cents,
    validate_product_name, validate_quantity, validate_search_query,
};
use comanda_core::{
    DayClock, LineItem, Money, Order, OrderSummary, PaidStatus, Product, SettlementBus,
    SettlementDisposition, SettlementEvent, StateError, ValidationError,
};
use comanda_db::{Database, DbError, NewLineItem};

/// Upper bound for catalog searches.
const SEARCH_LIMIT: u32 = 50;

// =============================================================================
// Results
// =============================================================================

/// What [`Ledger::close_order`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The order was open and is now closed; this event was published.
    Closed(SettlementEvent),
    /// The order was already closed. Nothing changed, nothing published.
    AlreadyClosed,
}

impl CloseOutcome {
    pub fn event(&self) -> Option<&SettlementEvent> {
        match self {
            CloseOutcome::Closed(event) => Some(event),
            CloseOutcome::AlreadyClosed => None,
        }
    }
}

/// A payment code ready to show as text or QR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementPayload {
    pub order_id: i64,
    /// Total at the moment the payload was built.
    pub amount: Money,
    pub transaction_id: String,
    /// The "copia e cola" string.
    pub payload: String,
}

// =============================================================================
// Ledger
// =============================================================================

/// Ledger service. Cheap to clone: clones share the pool and the bus.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
    bus: SettlementBus,
    pix: PixSettings,
    clock: DayClock,
}

/// Turns the repository's status-guard failure into the order's state error.
fn order_closed(order_id: i64, operation: &'static str) -> impl FnOnce(DbError) -> LedgerError {
    move |err| match err {
        DbError::InvalidState { .. } => StateError::closed(order_id, operation).into(),
        other => other.into(),
    }
}

impl Ledger {
    /// A ledger whose business days follow the machine's local time.
    pub fn new(db: Database, bus: SettlementBus, pix: PixSettings) -> Self {
        Ledger {
            db,
            bus,
            pix,
            clock: DayClock::Local,
        }
    }

    pub fn with_day_clock(mut self, clock: DayClock) -> Self {
        self.clock = clock;
        self
    }

    /// Decides which day a closing counts toward.
    pub fn day_clock(&self) -> DayClock {
        self.clock
    }

    /// The bus settlement events are published on.
    pub fn bus(&self) -> &SettlementBus {
        &self.bus
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn pix_settings(&self) -> &PixSettings {
        &self.pix
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn create_order(&self, name: &str) -> LedgerResult<Order> {
        let name = validate_order_name(name)?;
        let order = self.db.orders().create(&name).await?;

        info!(order_id = order.id, name = %order.name, "Order created");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: i64) -> LedgerResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Order", order_id))
    }

    pub async fn rename_order(&self, order_id: i64, name: &str) -> LedgerResult<Order> {
        let name = validate_order_name(name)?;
        let mut order = self.get_order(order_id).await?;
        order.ensure_open("rename order")?;

        self.db
            .orders()
            .rename(order_id, &name)
            .await
            .map_err(order_closed(order_id, "rename order"))?;

        debug!(order_id, name = %name, "Order renamed");
        order.name = name;
        Ok(order)
    }

    /// Deletes an order and its items, open or closed.
    pub async fn delete_order(&self, order_id: i64) -> LedgerResult<()> {
        self.db.orders().delete(order_id).await?;
        info!(order_id, "Order deleted");
        Ok(())
    }

    /// Open orders with live totals. `filter` matches part of the name.
    pub async fn list_open_orders(&self, filter: Option<&str>) -> LedgerResult<Vec<OrderSummary>> {
        let filter = filter.map(validate_search_query).transpose()?;
        Ok(self.db.orders().list_open(filter.as_deref()).await?)
    }

    /// Closed orders, most recent first. With `day`, only those closed on
    /// that business day, sorted by name.
    pub async fn list_closed_orders(
        &self,
        day: Option<NaiveDate>,
    ) -> LedgerResult<Vec<OrderSummary>> {
        let offset = match day {
            Some(day) => self.clock.utc_offset_on(day),
            None => self.clock.utc_offset_on(self.clock.today()),
        };
        Ok(self.db.orders().list_closed(day, offset).await?)
    }

    // -------------------------------------------------------------------------
    // Line items
    // -------------------------------------------------------------------------

    /// Adds a catalog product, freezing its current price on the line.
    pub async fn add_product_item(
        &self,
        order_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> LedgerResult<LineItem> {
        validate_quantity(quantity)?;
        self.get_order(order_id).await?.ensure_open("add item")?;

        let product = self.get_product(product_id).await?;
        let item = self
            .db
            .orders()
            .insert_item(
                order_id,
                &NewLineItem::product(product.id, quantity, product.price_cents),
            )
            .await
            .map_err(order_closed(order_id, "add item"))?;

        debug!(order_id, item_id = item.id, product_id, quantity, "Product item added");
        Ok(item)
    }

    /// Adds a line that is not in the catalog.
    pub async fn add_free_item(
        &self,
        order_id: i64,
        description: &str,
        unit_price: Money,
        quantity: i64,
    ) -> LedgerResult<LineItem> {
        let description = validate_product_name(description)?;
        validate_price_cents(unit_price.cents())?;
        validate_quantity(quantity)?;
        self.get_order(order_id).await?.ensure_open("add item")?;

        let item = self
            .db
            .orders()
            .insert_item(
                order_id,
                &NewLineItem::free(description, quantity, unit_price.cents()),
            )
            .await
            .map_err(order_closed(order_id, "add item"))?;

        debug!(order_id, item_id = item.id, quantity, "Free item added");
        Ok(item)
    }

    /// Adds a free line typed as `"description price"`, e.g. `"Bolo 12,50"`.
    pub async fn add_free_item_entry(
        &self,
        order_id: i64,
        entry: &str,
        quantity: i64,
    ) -> LedgerResult<LineItem> {
        let (description, price) = parse_free_item(entry)?;
        self.add_free_item(order_id, &description, price, quantity).await
    }

    /// Loads a line item and checks its order is still open.
    async fn open_item(&self, item_id: i64, operation: &'static str) -> LedgerResult<LineItem> {
        let item = self
            .db
            .orders()
            .get_item(item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Line item", item_id))?;

        self.get_order(item.order_id).await?.ensure_open(operation)?;
        Ok(item)
    }

    pub async fn set_item_quantity(&self, item_id: i64, quantity: i64) -> LedgerResult<LineItem> {
        validate_quantity(quantity)?;
        let mut item = self.open_item(item_id, "change quantity").await?;

        self.db
            .orders()
            .set_item_quantity(item_id, quantity)
            .await
            .map_err(order_closed(item.order_id, "change quantity"))?;

        debug!(order_id = item.order_id, item_id, quantity, "Item quantity changed");
        item.quantity = quantity;
        Ok(item)
    }

    pub async fn increment_item(&self, item_id: i64) -> LedgerResult<LineItem> {
        let item = self.open_item(item_id, "change quantity").await?;
        self.set_item_quantity(item_id, item.quantity + 1).await
    }

    /// Lowers the quantity by one, stopping at 1. Use
    /// [`Ledger::remove_item`] to take the line away.
    pub async fn decrement_item(&self, item_id: i64) -> LedgerResult<LineItem> {
        let item = self.open_item(item_id, "change quantity").await?;
        if item.quantity <= 1 {
            return Ok(item);
        }
        self.set_item_quantity(item_id, item.quantity - 1).await
    }

    pub async fn remove_item(&self, item_id: i64) -> LedgerResult<()> {
        let item = self.open_item(item_id, "remove item").await?;

        self.db
            .orders()
            .remove_item(item_id)
            .await
            .map_err(order_closed(item.order_id, "remove item"))?;

        debug!(order_id = item.order_id, item_id, "Item removed");
        Ok(())
    }

    /// Items of an order, newest first.
    pub async fn list_items(&self, order_id: i64) -> LedgerResult<Vec<LineItem>> {
        self.get_order(order_id).await?;
        Ok(self.db.orders().list_items(order_id).await?)
    }

    /// Current total, summed from the items on every call.
    pub async fn compute_order_total(&self, order_id: i64) -> LedgerResult<Money> {
        self.get_order(order_id).await?;
        let cents = self.db.orders().total_cents(order_id).await?;
        Ok(Money::from_cents(cents))
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Closes an order and publishes its [`SettlementEvent`].
    ///
    /// ```text
    /// read order ── closed? ──► AlreadyClosed (no write, no event)
    ///     │
    ///     ▼
    /// total = Σ quantity × unit price
    ///     │
    ///     ▼
    /// UPDATE ... WHERE status = 'open' ── lost a race? ──► AlreadyClosed
    ///     │
    ///     ▼
    /// bus.publish({ order_id, total })  (handler failures are only logged)
    /// ```
    pub async fn close_order(
        &self,
        order_id: i64,
        disposition: SettlementDisposition,
    ) -> LedgerResult<CloseOutcome> {
        let order = self.get_order(order_id).await?;
        if order.is_closed() {
            debug!(order_id, "Order already closed");
            return Ok(CloseOutcome::AlreadyClosed);
        }

        let total = Money::from_cents(self.db.orders().total_cents(order_id).await?);

        let closed = self
            .db
            .orders()
            .close(
                order_id,
                disposition.paid_status(),
                disposition.method(),
                Utc::now(),
            )
            .await;
        match closed {
            Ok(()) => {}
            Err(DbError::InvalidState { .. }) => {
                debug!(order_id, "Order closed concurrently");
                return Ok(CloseOutcome::AlreadyClosed);
            }
            Err(e) => return Err(e.into()),
        }

        let event = SettlementEvent { order_id, total };
        let report = self.bus.publish(&event);

        info!(
            order_id,
            total = %total,
            ?disposition,
            delivered = report.delivered,
            failed = report.failed,
            "Order closed"
        );
        Ok(CloseOutcome::Closed(event))
    }

    /// Builds the payment code for an order from its current total.
    ///
    /// The total is read now, never taken from a settlement event, so a
    /// code always matches what the order holds.
    ///
    /// ## Returns
    /// * `Err(LedgerError::NothingToCharge)` - total is zero or negative
    /// * `Err(LedgerError::Validation)` - no PIX key configured
    pub async fn build_settlement_payload(&self, order_id: i64) -> LedgerResult<SettlementPayload> {
        let order = self.get_order(order_id).await?;
        let amount = Money::from_cents(self.db.orders().total_cents(order_id).await?);

        if !amount.is_chargeable() {
            return Err(LedgerError::NothingToCharge { order_id });
        }

        let transaction_id = derive_transaction_id(order.id, &order.name);
        let params = PayloadParams::new(self.pix.key.clone().unwrap_or_default(), amount)
            .merchant(&self.pix.merchant_name, &self.pix.merchant_city)
            .message(self.pix.description_for(order.id))
            .transaction_id(&transaction_id);

        let payload = build_payload(&params)?;

        info!(order_id, amount = %amount, transaction_id = %transaction_id, "Payment code built");
        Ok(SettlementPayload {
            order_id,
            amount,
            transaction_id,
            payload,
        })
    }

    /// Flips the paid flag of a closed order: Paid becomes NotPaid and
    /// anything else becomes Paid. Items are untouched.
    pub async fn toggle_paid(&self, order_id: i64) -> LedgerResult<PaidStatus> {
        let order = self.get_order(order_id).await?;
        order.ensure_closed("change paid status")?;

        let paid = order.paid.toggled();
        self.db
            .orders()
            .set_paid(order_id, paid)
            .await
            .map_err(|err| match err {
                DbError::InvalidState { .. } => LedgerError::State(StateError::OrderOpen {
                    order_id,
                    operation: "change paid status".to_string(),
                }),
                other => other.into(),
            })?;

        info!(order_id, ?paid, "Paid status changed");
        Ok(paid)
    }

    /// Sum of orders closed on business day `day`.
    pub async fn revenue_for_day(&self, day: NaiveDate) -> LedgerResult<Money> {
        let offset = self.clock.utc_offset_on(day);
        let cents = self.db.orders().revenue_for_day(day, offset).await?;
        Ok(Money::from_cents(cents))
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    pub async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().list().await?)
    }

    pub async fn search_products(&self, query: &str) -> LedgerResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        Ok(self.db.products().search(&query, SEARCH_LIMIT).await?)
    }

    pub async fn get_product(&self, product_id: i64) -> LedgerResult<Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", product_id))
    }

    /// Adds a catalog product. `price` is user text, `"7,50"` or `"7.50"`.
    ///
    /// Names are unique ignoring case.
    pub async fn create_product(&self, name: &str, price: &str) -> LedgerResult<Product> {
        let name = validate_product_name(name)?;
        let price = parse_price(price)?;
        self.ensure_name_free(&name, None).await?;

        let product = self.db.products().insert(&name, price.cents()).await?;
        info!(product_id = product.id, name = %product.name, price = %price, "Product created");
        Ok(product)
    }

    /// Renames and reprices a product. Items already on orders keep the
    /// price they were added with.
    pub async fn update_product(
        &self,
        product_id: i64,
        name: &str,
        price: &str,
    ) -> LedgerResult<Product> {
        let name = validate_product_name(name)?;
        let price = parse_price(price)?;
        let mut product = self.get_product(product_id).await?;
        self.ensure_name_free(&name, Some(product_id)).await?;

        product.name = name;
        product.price_cents = price.cents();
        self.db.products().update(&product).await?;

        info!(product_id, name = %product.name, price = %price, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: i64) -> LedgerResult<()> {
        self.db.products().delete(product_id).await?;
        info!(product_id, "Product deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i64>) -> LedgerResult<()> {
        match self.db.products().find_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(ValidationError::Duplicate {
                    field: "product name".to_string(),
                    value: name.to_string(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
