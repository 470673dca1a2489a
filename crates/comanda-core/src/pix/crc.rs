//! CRC-16/CCITT-FALSE, the checksum closing every PIX payload.
//!
//! Polynomial 0x1021, initial value 0xFFFF, no reflection, no final XOR.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Raw CRC over `bytes`, most significant bit first.
pub fn crc16_ccitt(bytes: impl IntoIterator<Item = u8>) -> u16 {
    bytes.into_iter().fold(INIT, |mut crc, byte| {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// Checksum of `payload` as four uppercase hex digits.
///
/// Each character contributes its low 8 bits. Payloads are sanitized to
/// ASCII first, so this equals hashing the UTF-8 bytes.
///
/// ```rust
/// use comanda_core::pix::crc16;
///
/// assert_eq!(crc16("123456789"), "29B1");
/// ```
pub fn crc16(payload: &str) -> String {
    format!("{:04X}", crc16_ccitt(payload.chars().map(|c| c as u32 as u8)))
}
