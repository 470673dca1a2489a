//! # Domain Types
//!
//! Core domain types used throughout the comanda ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  name (unique)  │   │  name           │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  product_id?    │       │
//! │  └─────────────────┘   │  closed_at?     │   │  description?   │       │
//! │                        │  paid           │   │  quantity       │       │
//! │                        │  method?        │   │  unit_price     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │   PaidStatus    │   │SettlementMethod │       │
//! │  │  Open / Closed  │   │  Unknown (NULL) │   │  Manual         │       │
//! │  └─────────────────┘   │  Paid    (1)    │   │  Pix            │       │
//! │                        │  NotPaid (0)    │   │  None           │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order total is never stored. It is derived from the line items every
//! time it is needed (see [`order_total`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::StateError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog entry that can be added to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name, unique ignoring case.
    pub name: String,

    /// Current catalog price in centavos.
    pub price_cents: i64,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order. Open → Closed, and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Items may be added, changed and removed.
    #[default]
    Open,
    /// Settled. Line items are frozen.
    Closed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
        }
    }
}

// =============================================================================
// Paid Status
// =============================================================================

/// Whether a closed order has actually been paid.
///
/// Stored as a nullable integer: NULL = unknown, 1 = paid, 0 = not paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaidStatus {
    #[default]
    Unknown,
    Paid,
    NotPaid,
}

impl PaidStatus {
    /// Converts the stored column value.
    pub fn from_db(value: Option<i64>) -> Self {
        match value {
            None => PaidStatus::Unknown,
            Some(0) => PaidStatus::NotPaid,
            Some(_) => PaidStatus::Paid,
        }
    }

    /// Value written to the `paid` column.
    pub fn to_db(self) -> Option<i64> {
        match self {
            PaidStatus::Unknown => None,
            PaidStatus::Paid => Some(1),
            PaidStatus::NotPaid => Some(0),
        }
    }

    /// The flag a cashier gets by tapping "paid" on a closed order.
    ///
    /// Paid flips to NotPaid; NotPaid and Unknown both become Paid.
    pub fn toggled(self) -> Self {
        match self {
            PaidStatus::Paid => PaidStatus::NotPaid,
            PaidStatus::NotPaid | PaidStatus::Unknown => PaidStatus::Paid,
        }
    }
}

// =============================================================================
// Settlement Method
// =============================================================================

/// How the cashier settled the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    /// Cash or card at the counter, confirmed by the cashier.
    Manual,
    /// A PIX payload was generated for the customer.
    Pix,
    /// Closed without payment.
    None,
}

// =============================================================================
// Settlement Disposition
// =============================================================================

/// What the cashier chose when closing an order.
///
/// ```text
/// Disposition   │ paid     │ settlement_method
/// ──────────────┼──────────┼──────────────────
/// Paid          │ Paid     │ Manual
/// NotPaid       │ NotPaid  │ None
/// PixPending    │ NotPaid  │ Pix
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SettlementDisposition {
    Paid,
    NotPaid,
    /// Closed now, paid later by scanning the PIX code.
    PixPending,
}

impl SettlementDisposition {
    pub fn paid_status(self) -> PaidStatus {
        match self {
            SettlementDisposition::Paid => PaidStatus::Paid,
            SettlementDisposition::NotPaid | SettlementDisposition::PixPending => {
                PaidStatus::NotPaid
            }
        }
    }

    pub fn method(self) -> SettlementMethod {
        match self {
            SettlementDisposition::Paid => SettlementMethod::Manual,
            SettlementDisposition::NotPaid => SettlementMethod::None,
            SettlementDisposition::PixPending => SettlementMethod::Pix,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A comanda: a named tab that collects line items until it is closed.
///
/// `closed_at` is set if and only if `status` is Closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub name: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub paid: PaidStatus,
    pub settlement_method: Option<SettlementMethod>,
}

impl Order {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.status == OrderStatus::Closed
    }

    /// Fails with [`StateError::OrderClosed`] unless the order is open.
    pub fn ensure_open(&self, operation: &str) -> Result<(), StateError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StateError::closed(self.id, operation))
        }
    }

    /// Fails with [`StateError::OrderOpen`] unless the order is closed.
    pub fn ensure_closed(&self, operation: &str) -> Result<(), StateError> {
        if self.is_closed() {
            Ok(())
        } else {
            Err(StateError::OrderOpen {
                order_id: self.id,
                operation: operation.to_string(),
            })
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One line on an order: a catalog product or a free-text entry.
///
/// The unit price is a snapshot taken when the line was added, so later
/// catalog price changes never alter an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    /// Set for catalog items. Cleared if the product is later deleted.
    pub product_id: Option<i64>,
    /// Set for free-text items.
    pub description: Option<String>,
    /// Current catalog name, joined in when listing.
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl LineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × unit price.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Text shown for the line: product name, else description.
    pub fn label(&self) -> &str {
        self.product_name
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("")
    }
}

/// Sum of the line totals. Zero for an order without items.
pub fn order_total(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

// =============================================================================
// Settlement Event
// =============================================================================

/// Published once when an order transitions to Closed.
///
/// Carries the total as computed at closing time. Views needing a payload
/// must ask the ledger again instead of trusting this snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementEvent {
    pub order_id: i64,
    pub total: Money,
}

// =============================================================================
// Order Summary
// =============================================================================

/// An order together with its live total, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummary {
    pub order: Order,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
