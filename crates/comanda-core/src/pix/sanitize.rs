//! Text sanitizer for payload fields.
//!
//! Bank apps render merchant name, city and description from a restricted
//! character set, so free text is reduced to uppercase printable ASCII:
//!
//! ```text
//! "Padaria São João"
//!      │  NFD: "a" + U+0303, "o" + U+0303
//!      ▼
//! "Padaria Sa~o Joa~o"   (combining marks shown as ~)
//!      │  keep 0x20..=0x7E only
//!      ▼
//! "Padaria Sao Joao"
//!      │  uppercase
//!      ▼
//! "PADARIA SAO JOAO"
//! ```

use unicode_normalization::UnicodeNormalization;

/// Reduces `text` to uppercase printable ASCII.
///
/// Accented letters keep their base letter; everything else outside
/// 0x20..=0x7E (combining marks, emoji, CJK) is dropped. Idempotent.
///
/// ```rust
/// use comanda_core::pix::sanitize;
///
/// assert_eq!(sanitize("Açaí com Pão"), "ACAI COM PAO");
/// assert_eq!(sanitize(""), "");
/// ```
pub fn sanitize(text: &str) -> String {
    text.nfd()
        .filter(|c| (' '..='~').contains(c))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Sanitized text with only ASCII letters and digits left.
pub(crate) fn alphanumeric(text: &str) -> String {
    sanitize(text)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
