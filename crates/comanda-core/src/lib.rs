//! # comanda-core: Pure Business Logic for the Comanda Ledger
//!
//! Everything that can be decided without touching the store lives here:
//! money arithmetic, order rules, the PIX payload codec and the settlement
//! event bus.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Views                                        │   │
//! │  │    Open orders ──► Order detail ──► Close ──► PIX code          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    comanda-ledger                               │   │
//! │  │    create_order, close_order, build_settlement_payload, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    pix    │  │  events   │  │   │
//! │  │   │   Order   │  │   Money   │  │  payload  │  │ Settlement│  │   │
//! │  │   │ LineItem  │  │  parse    │  │  crc/field│  │    Bus    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    comanda-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, LineItem, SettlementEvent)
//! - [`money`] - Money type with integer centavos
//! - [`error`] - Domain error types
//! - [`validation`] - Input parsing and business rule validation
//! - [`pix`] - PIX "copia e cola" payload codec
//! - [`events`] - Settlement event bus
//! - [`clock`] - Business day of a UTC timestamp
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::money::Money;
//! use comanda_core::pix::{build_payload, verify_payload, PayloadParams};
//!
//! let params = PayloadParams::new("cashier@example.com", Money::from_cents(2000))
//!     .merchant("Loja", "São Paulo");
//! let payload = build_payload(&params).unwrap();
//!
//! assert!(payload.contains("540520.00"));
//! assert!(verify_payload(&payload));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod events;
pub mod money;
pub mod pix;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::DayClock;
pub use error::{CoreError, CoreResult, EncodingError, StateError, ValidationError};
pub use events::{PublishReport, SettlementBus, Subscription};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single line.
///
/// Catches a slipped finger (100 instead of 10) before it reaches a total.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of an order name, in characters.
pub const MAX_ORDER_NAME_LEN: usize = 100;

/// Maximum length of a product name or free-item description.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Longest PIX key that still fits in the merchant account template.
///
/// Template 26 holds at most 99 characters; the GUI sub-field takes 18 and
/// the key's own tag and length take 4.
pub const MAX_PIX_KEY_LEN: usize = 77;
