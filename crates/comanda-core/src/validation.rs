//! # Validation Module
//!
//! Input validation for everything a cashier can type.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: View                                                         │
//! │  └── Raw text from inputs ("Bolo 12,50", "3", "Mesa 4")                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Parse text into typed values (Money, i64)                         │
//! │  └── Business rules (required, ranges, lengths)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity > 0, price >= 0)                      │
//! │  ├── UNIQUE product names (COLLATE NOCASE)                             │
//! │  └── Guarded UPDATEs (status = 'open')                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator runs before the ledger writes anything, so a rejected
//! input leaves the store untouched.

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_NAME_LEN, MAX_PIX_KEY_LEN, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_text(value: &str, field: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an order name and returns it trimmed.
///
/// ```rust
/// use comanda_core::validation::validate_order_name;
///
/// assert_eq!(validate_order_name("  Mesa 4 ").unwrap(), "Mesa 4");
/// assert!(validate_order_name("   ").is_err());
/// ```
pub fn validate_order_name(name: &str) -> ValidationResult<String> {
    required_text(name, "order name", MAX_ORDER_NAME_LEN)
}

/// Validates a product name and returns it trimmed.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_text(name, "product name", MAX_PRODUCT_NAME_LEN)
}

/// Validates a PIX key and returns it trimmed.
///
/// The key is copied into the payload verbatim (not sanitized), so only
/// emptiness and length are checked here.
pub fn validate_pix_key(key: &str) -> ValidationResult<String> {
    required_text(key, "pix key", MAX_PIX_KEY_LEN)
}

/// Validates a search query.
///
/// Can be empty (lists everything). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ```text
/// validate_quantity(qty)
///      │
///      ├── qty <= 0?  → MustBePositive
///      ├── qty > 999? → OutOfRange
///      └── OK → item is written
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in centavos. Zero is allowed (courtesy items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Parses a price typed by the cashier ("12,50" or "12.50").
pub fn parse_price(input: &str) -> ValidationResult<Money> {
    let price = Money::parse_field(input, "price")?;
    validate_price_cents(price.cents())?;
    Ok(price)
}

/// Parses the quantity field. An empty field means one unit.
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(1);
    }

    let qty = input.parse::<i64>().map_err(|_| {
        ValidationError::invalid_format("quantity", format!("'{}' is not a whole number", input))
    })?;
    validate_quantity(qty)?;
    Ok(qty)
}

// =============================================================================
// Free Item Entry
// =============================================================================

/// Splits a single "description price" entry into its parts.
///
/// The last whitespace-separated word is the price; everything before it
/// is the description.
///
/// ```rust
/// use comanda_core::validation::parse_free_item;
///
/// let (description, price) = parse_free_item("Bolo de fubá 12,50").unwrap();
/// assert_eq!(description, "Bolo de fubá");
/// assert_eq!(price.cents(), 1250);
///
/// assert!(parse_free_item("12,50").is_err()); // no description
/// assert!(parse_free_item("Bolo").is_err());  // no price
/// ```
pub fn parse_free_item(entry: &str) -> ValidationResult<(String, Money)> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(ValidationError::required("item"));
    }

    let format_error = || {
        ValidationError::invalid_format("item", "use 'description price', e.g. 'Bolo 12,50'")
    };

    let (description, price_text) = entry.rsplit_once(char::is_whitespace).ok_or_else(format_error)?;
    let description = required_text(description, "description", MAX_PRODUCT_NAME_LEN)?;
    let price = parse_price(price_text).map_err(|err| match err {
        ValidationError::InvalidFormat { .. } => format_error(),
        other => other,
    })?;

    Ok((description, price))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_order_name() {
        assert_eq!(validate_order_name("Mesa 4").unwrap(), "Mesa 4");
        assert_eq!(validate_order_name("  João  ").unwrap(), "João");
        assert_eq!(
            validate_order_name("   "),
            Err(ValidationError::required("order name"))
        );
        assert!(validate_order_name(&"A".repeat(101)).is_err());
        // Length counts characters, not bytes.
        assert!(validate_order_name(&"ç".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Pastel de carne").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_pix_key() {
        assert_eq!(
            validate_pix_key(" cashier@example.com ").unwrap(),
            "cashier@example.com"
        );
        assert!(validate_pix_key("").is_err());
        assert!(validate_pix_key(&"k".repeat(78)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("7,50").unwrap().cents(), 750);
        assert!(matches!(
            parse_price("-1"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_price("sete"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("").unwrap(), 1);
        assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
        assert!(parse_quantity("0").is_err());
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("muitos").is_err());
    }

    #[test]
    fn test_parse_free_item() {
        let (description, price) = parse_free_item("Bolo 12,50").unwrap();
        assert_eq!(description, "Bolo");
        assert_eq!(price.cents(), 1250);

        let (description, price) = parse_free_item("  Suco de caju   6.00 ").unwrap();
        assert_eq!(description, "Suco de caju");
        assert_eq!(price.cents(), 600);
    }

    #[test]
    fn test_parse_free_item_rejects_bad_entries() {
        assert!(matches!(
            parse_free_item(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_free_item("Bolo"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_free_item("Bolo doze"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_free_item("Bolo -2"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
