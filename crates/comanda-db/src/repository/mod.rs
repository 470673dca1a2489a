//! # Repository Module
//!
//! Database repository implementations for the comanda ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger service                                                        │
//! │       │                                                                 │
//! │       │  db.orders().insert_item(7, &item)                             │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create / get_by_id / rename                                       │
//! │  ├── insert_item / set_item_quantity / remove_item                     │
//! │  ├── total_cents                                                       │
//! │  └── close / set_paid / delete                                         │
//! │       │                                                                 │
//! │       │  SQL Query (status-guarded for every item write)               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories enforce storage-level guards only. Input validation and
//! the choice of which error the user sees belong to the ledger.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and search
//! - [`order::OrderRepository`] - Orders, line items, totals, revenue

pub mod order;
pub mod product;
