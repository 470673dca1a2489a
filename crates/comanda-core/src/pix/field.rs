//! Tag/length/value framing.
//!
//! Every EMV field is `TT LL VALUE`: a two-digit tag, a two-digit decimal
//! length, then exactly that many characters. Templates (tags 26 and 62)
//! nest further fields inside their value.

use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// Largest value a two-digit length prefix can describe.
pub const MAX_FIELD_LEN: usize = 99;

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub tag: String,
    pub value: String,
}

fn check_tag(tag: &str) -> Result<(), EncodingError> {
    if tag.len() == 2 && tag.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(EncodingError::InvalidTag {
            tag: tag.to_string(),
        })
    }
}

/// Frames `value` under `tag`.
///
/// Length is counted in characters. Payload values are sanitized to ASCII
/// before they get here, so characters and bytes coincide.
///
/// ```rust
/// use comanda_core::pix::encode_field;
///
/// assert_eq!(encode_field("58", "BR").unwrap(), "5802BR");
/// assert_eq!(encode_field("62", "").unwrap(), "6200");
/// assert!(encode_field("5", "BR").is_err());
/// ```
pub fn encode_field(tag: &str, value: &str) -> Result<String, EncodingError> {
    check_tag(tag)?;

    let len = value.chars().count();
    if len > MAX_FIELD_LEN {
        return Err(EncodingError::ValueTooLong {
            tag: tag.to_string(),
            len,
            max: MAX_FIELD_LEN,
        });
    }

    Ok(format!("{}{:02}{}", tag, len, value))
}

/// Reads one field off the front of `input` and returns it with the rest.
pub fn decode_field(input: &str) -> Result<(Field, &str), EncodingError> {
    let tag: String = input.chars().take(2).collect();
    let raw_len: String = input.chars().skip(2).take(2).collect();
    if raw_len.chars().count() < 2 {
        return Err(EncodingError::Truncated {
            tag,
            declared: 4,
            available: input.chars().count(),
        });
    }

    check_tag(&tag)?;
    if !raw_len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodingError::InvalidLength {
            tag,
            raw: raw_len,
        });
    }
    let declared: usize = raw_len.parse().map_err(|_| EncodingError::InvalidLength {
        tag: tag.clone(),
        raw: raw_len.clone(),
    })?;

    // Header is ASCII digits, so it is exactly 4 bytes.
    let body = &input[4..];
    let available = body.chars().count();
    if available < declared {
        return Err(EncodingError::Truncated {
            tag,
            declared,
            available,
        });
    }

    let split = body
        .char_indices()
        .nth(declared)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    let (value, rest) = body.split_at(split);

    Ok((
        Field {
            tag,
            value: value.to_string(),
        },
        rest,
    ))
}

/// Decodes a whole sequence of fields. Empty input yields no fields.
pub fn parse_fields(mut input: &str) -> Result<Vec<Field>, EncodingError> {
    let mut fields = Vec::new();
    while !input.is_empty() {
        let (field, rest) = decode_field(input)?;
        fields.push(field);
        input = rest;
    }
    Ok(fields)
}

/// First `max` characters of `text`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
