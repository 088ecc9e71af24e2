//! Decimal, hex and bit-pattern conversions used by the frame builders and
//! reply decoders.
//!
//! The radio packs frequency digits as BCD: the pair `"57"` travels as the
//! byte `0x57`, not as decimal 57 (`0x39`). Replies are inspected the other
//! way round, by rendering bytes as hex text and reading digits and bits
//! back out of it.

use std::fmt;

use catlink_core::{Error, Result};

/// Pack a two-character decimal string into one BCD byte.
///
/// The tens digit lands in the high nibble and the units digit in the low
/// nibble.
///
/// # Example
///
/// ```
/// use catlink_ft817::codec::decimal_pair_to_hex;
///
/// assert_eq!(decimal_pair_to_hex("57").unwrap(), 0x57);
/// assert!(decimal_pair_to_hex("5A").is_err());
/// ```
pub fn decimal_pair_to_hex(pair: &str) -> Result<u8> {
    match pair.as_bytes() {
        [tens, units] if tens.is_ascii_digit() && units.is_ascii_digit() => {
            Ok(((tens - b'0') << 4) | (units - b'0'))
        }
        _ => Err(Error::Format(format!(
            "{pair:?} is not a two-digit decimal pair"
        ))),
    }
}

/// One byte exposed for bitwise inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPattern(u8);

impl BitPattern {
    /// Whether bit `bit` (0 = least significant) is set.
    pub fn is_set(self, bit: u8) -> bool {
        bit < 8 && self.0 & (1 << bit) != 0
    }

    /// Bits 0-3 as an unsigned value.
    pub fn low_nibble(self) -> u8 {
        self.0 & 0x0F
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

/// Parse a hex-encoded byte (`"8F"`, `"e7"`) into a [`BitPattern`].
///
/// Anything that is not exactly one byte of valid hex is a format error.
pub fn hex_byte_to_bits(hex_byte: &str) -> Result<BitPattern> {
    let bytes = hex::decode(hex_byte)
        .map_err(|e| Error::Format(format!("{hex_byte:?} is not valid hex: {e}")))?;
    match bytes.as_slice() {
        [byte] => Ok(BitPattern(*byte)),
        _ => Err(Error::Format(format!(
            "{hex_byte:?} is {} bytes, expected exactly one",
            bytes.len()
        ))),
    }
}

/// Render bytes as upper-case hex, two characters per byte.
pub fn to_hex_string(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_pair_packs_tens_high() {
        assert_eq!(decimal_pair_to_hex("14").unwrap(), 0x14);
        assert_eq!(decimal_pair_to_hex("00").unwrap(), 0x00);
        assert_eq!(decimal_pair_to_hex("99").unwrap(), 0x99);
        assert_eq!(decimal_pair_to_hex("07").unwrap(), 0x07);
    }

    #[test]
    fn decimal_pair_rejects_non_digits() {
        assert!(matches!(decimal_pair_to_hex("1a"), Err(Error::Format(_))));
        assert!(matches!(decimal_pair_to_hex(" 1"), Err(Error::Format(_))));
        assert!(matches!(decimal_pair_to_hex("-1"), Err(Error::Format(_))));
    }

    #[test]
    fn decimal_pair_rejects_wrong_length() {
        assert!(decimal_pair_to_hex("").is_err());
        assert!(decimal_pair_to_hex("1").is_err());
        assert!(decimal_pair_to_hex("123").is_err());
    }

    #[test]
    fn hex_byte_parses_either_case() {
        assert_eq!(hex_byte_to_bits("8F").unwrap().value(), 0x8F);
        assert_eq!(hex_byte_to_bits("e7").unwrap().value(), 0xE7);
    }

    #[test]
    fn hex_byte_rejects_malformed() {
        assert!(matches!(hex_byte_to_bits("G0"), Err(Error::Format(_))));
        assert!(matches!(hex_byte_to_bits("F"), Err(Error::Format(_))));
        assert!(matches!(hex_byte_to_bits(""), Err(Error::Format(_))));
        assert!(matches!(hex_byte_to_bits("0102"), Err(Error::Format(_))));
    }

    #[test]
    fn bit_pattern_inspection() {
        let bits = hex_byte_to_bits("A5").unwrap();
        assert!(bits.is_set(7));
        assert!(!bits.is_set(6));
        assert!(bits.is_set(5));
        assert!(bits.is_set(0));
        assert!(!bits.is_set(8));
        assert_eq!(bits.low_nibble(), 5);
        assert_eq!(bits.to_string(), "10100101");
    }

    #[test]
    fn hex_string_is_upper_case() {
        assert_eq!(to_hex_string(&[0x14, 0x57, 0x50, 0x00, 0x0A]), "145750000A");
        assert_eq!(to_hex_string(&[]), "");
    }
}
