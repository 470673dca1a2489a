//! Payload builder and verifier.
//!
//! ## Build Steps
//! ```text
//! PayloadParams
//!      │
//!      ├── key      → trimmed, copied verbatim (rejected if empty)
//!      ├── name     → sanitize → first 25 chars → "LOJA" if nothing left
//!      ├── city     → sanitize → first 15 chars → "SAO PAULO" if nothing left
//!      ├── message  → sanitize → first 25 chars → omitted if nothing left
//!      └── amount   → "12.50" (rejected if negative)
//!      │
//!      ▼
//! 00 ─ 26{00 01 02} ─ 52 ─ 53 ─ 54 ─ 58 ─ 59 ─ 60 ─ 62{05} ─ "6304"
//!      │
//!      ▼
//! append crc16(everything so far, "6304" included)
//! ```
//!
//! The payload describes a static QR code: the point-of-initiation field is
//! never emitted and the reference label is always `***`. The transaction id
//! is accepted and carried in [`PayloadParams`] for a later dynamic-QR flow,
//! but does not reach the string.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use super::crc::crc16;
use super::field::{encode_field, parse_fields, truncate};
use super::sanitize::{alphanumeric, sanitize};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

pub const PAYLOAD_FORMAT: &str = "01";
pub const PIX_GUI: &str = "BR.GOV.BCB.PIX";
pub const MERCHANT_CATEGORY_CODE: &str = "0000";
/// ISO 4217 numeric code for BRL.
pub const CURRENCY_BRL: &str = "986";
pub const COUNTRY_CODE: &str = "BR";
pub const DEFAULT_MERCHANT_NAME: &str = "LOJA";
pub const DEFAULT_MERCHANT_CITY: &str = "SAO PAULO";
pub const STATIC_REFERENCE_LABEL: &str = "***";

pub const MAX_MERCHANT_NAME_LEN: usize = 25;
pub const MAX_MERCHANT_CITY_LEN: usize = 15;
pub const MAX_DESCRIPTION_LEN: usize = 25;
pub const MAX_TRANSACTION_ID_LEN: usize = 25;

const CRC_TAG_AND_LEN: &str = "6304";

// =============================================================================
// Payload Params
// =============================================================================

/// Everything needed to build one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PayloadParams {
    /// PIX key of the receiving account (e-mail, phone, CPF/CNPJ or random).
    pub key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    pub amount: Money,
    /// Reserved for dynamic QR codes; not emitted.
    pub transaction_id: Option<String>,
    /// Shown to the payer by their bank app, when present.
    pub message: Option<String>,
}

impl PayloadParams {
    /// Params with default merchant name and city and no message.
    pub fn new(key: impl Into<String>, amount: Money) -> Self {
        Self {
            key: key.into(),
            merchant_name: String::new(),
            merchant_city: String::new(),
            amount,
            transaction_id: None,
            message: None,
        }
    }

    pub fn merchant(mut self, name: impl Into<String>, city: impl Into<String>) -> Self {
        self.merchant_name = name.into();
        self.merchant_city = city.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

fn sanitized_or(text: &str, max: usize, default: &str) -> String {
    let value = truncate(&sanitize(text), max);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the "copia e cola" string for `params`.
///
/// ## Errors
/// - [`ValidationError::Required`] if the key is blank
/// - [`ValidationError::OutOfRange`] if the amount is negative
/// - [`crate::EncodingError`] if the key overflows the account template
///
/// ```rust
/// use comanda_core::money::Money;
/// use comanda_core::pix::{build_payload, PayloadParams};
///
/// let params = PayloadParams::new("cashier@example.com", Money::from_cents(2000))
///     .merchant("LOJA", "SAO PAULO");
///
/// assert_eq!(
///     build_payload(&params).unwrap(),
///     "00020126410014BR.GOV.BCB.PIX0119cashier@example.com\
///      520400005303986540520.005802BR5904LOJA6009SAO PAULO62070503***63046AD4"
/// );
/// ```
pub fn build_payload(params: &PayloadParams) -> CoreResult<String> {
    let key = params.key.trim();
    if key.is_empty() {
        return Err(ValidationError::required("pix key").into());
    }
    if params.amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    let name = sanitized_or(
        &params.merchant_name,
        MAX_MERCHANT_NAME_LEN,
        DEFAULT_MERCHANT_NAME,
    );
    let city = sanitized_or(
        &params.merchant_city,
        MAX_MERCHANT_CITY_LEN,
        DEFAULT_MERCHANT_CITY,
    );
    let description = params
        .message
        .as_deref()
        .map(|m| truncate(&sanitize(m), MAX_DESCRIPTION_LEN))
        .filter(|m| !m.is_empty());

    let mut account = encode_field("00", PIX_GUI)? + &encode_field("01", key)?;
    if let Some(description) = &description {
        account += &encode_field("02", description)?;
    }

    let mut payload = String::with_capacity(160);
    payload += &encode_field("00", PAYLOAD_FORMAT)?;
    payload += &encode_field("26", &account)?;
    payload += &encode_field("52", MERCHANT_CATEGORY_CODE)?;
    payload += &encode_field("53", CURRENCY_BRL)?;
    payload += &encode_field("54", &params.amount.to_decimal_string())?;
    payload += &encode_field("58", COUNTRY_CODE)?;
    payload += &encode_field("59", &name)?;
    payload += &encode_field("60", &city)?;
    payload += &encode_field("62", &encode_field("05", STATIC_REFERENCE_LABEL)?)?;
    payload += CRC_TAG_AND_LEN;

    let crc = crc16(&payload);
    payload += &crc;

    debug!(
        amount_cents = params.amount.cents(),
        merchant_name = %name,
        has_description = description.is_some(),
        crc = %crc,
        "PIX payload built"
    );
    Ok(payload)
}

/// Transaction id for an order: `C{id}-{first 12 alphanumerics of name}`.
///
/// ```rust
/// use comanda_core::pix::derive_transaction_id;
///
/// assert_eq!(derive_transaction_id(7, "Mesa 4 (varanda)"), "C7-MESA4VARANDA");
/// ```
pub fn derive_transaction_id(order_id: i64, order_name: &str) -> String {
    let slug = truncate(&alphanumeric(order_name), 12);
    truncate(&format!("C{}-{}", order_id, slug), MAX_TRANSACTION_ID_LEN)
}

// =============================================================================
// Verifier
// =============================================================================

/// Checks that `payload` is well framed and its trailing CRC matches.
///
/// Lets a view validate a code before showing or copying it.
pub fn verify_payload(payload: &str) -> bool {
    if !payload.is_ascii() || payload.len() < 8 {
        return false;
    }

    let (body, checksum) = payload.split_at(payload.len() - 4);
    if !body.ends_with(CRC_TAG_AND_LEN) || crc16(body) != checksum {
        return false;
    }

    match parse_fields(payload) {
        Ok(fields) => {
            fields.first().map(|f| f.tag.as_str()) == Some("00")
                && fields.last().map(|f| f.tag.as_str()) == Some("63")
        }
        Err(_) => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
