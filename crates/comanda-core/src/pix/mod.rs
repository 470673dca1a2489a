//! # PIX "Copia e Cola" Payload Codec
//!
//! Builds the EMV Merchant-Presented QR string a customer pastes into their
//! bank app to pay an order.
//!
//! ## Payload Anatomy
//! ```text
//! 000201                                   payload format indicator
//! 26 41                                    merchant account information
//!    0014BR.GOV.BCB.PIX                      GUI
//!    0119cashier@example.com                 PIX key
//!    0209COMANDA 1                           description (optional)
//! 52040000                                 merchant category code
//! 5303986                                  currency (BRL)
//! 540520.00                                amount
//! 5802BR                                   country
//! 5904LOJA                                 merchant name (≤25)
//! 6009SAO PAULO                            merchant city (≤15)
//! 62070503***                              additional data: reference label
//! 6304 6AD4                                CRC-16 over everything before it
//! ```
//!
//! ## Modules
//! - [`sanitize`] - free text → uppercase printable ASCII
//! - [`field`] - tag/length/value framing
//! - [`crc`] - CRC-16/CCITT-FALSE checksum
//! - [`payload`] - the builder and verifier

pub mod crc;
pub mod field;
pub mod payload;
pub mod sanitize;

pub use crc::{crc16, crc16_ccitt};
pub use field::{decode_field, encode_field, parse_fields, Field};
pub use payload::{build_payload, derive_transaction_id, verify_payload, PayloadParams};
pub use sanitize::sanitize;
