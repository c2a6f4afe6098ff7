//! Hex payload decoding for script command fields.
//!
//! Text that cannot live inside the comma/angle-bracket script syntax
//! (SQL, formulas, titles, parameter blobs) travels as a `0x`-prefixed
//! run of hex digit pairs. The first two characters of the payload are
//! always consumed as the marker; each remaining pair is one byte, first
//! pair first.

use thiserror::Error;

/// Character width used to turn decoded bytes back into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextWidth {
    /// One byte per character, ASCII. Bytes above 0x7F decode to `?`.
    SingleByte,
    /// Two bytes per character, UTF-16 little-endian.
    DoubleByte,
}

/// A payload that could not be decoded.
///
/// Shared by the hex codec and the field decoders built on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input shorter than the 2-character `0x` marker.
    #[error("hex payload too short ({len} chars, need at least the 2-character marker)")]
    Truncated {
        /// Character count of the trimmed input.
        len: usize,
    },
    /// Odd number of hex digits after the marker.
    #[error("hex payload has an odd digit count ({len} digits after the marker)")]
    OddLength {
        /// Number of digits following the marker.
        len: usize,
    },
    /// A digit pair was not valid hexadecimal.
    #[error("invalid hex pair {pair:?} at digit offset {offset}")]
    BadDigit {
        /// The offending two characters.
        pair: String,
        /// Byte offset of the pair within the digit run.
        offset: usize,
    },
    /// A double-byte payload decoded to an odd number of bytes.
    #[error("double-byte payload has an odd byte count ({bytes})")]
    UnevenWide {
        /// Number of decoded bytes.
        bytes: usize,
    },
    /// A numeric field failed to parse.
    #[error("invalid number {value:?}")]
    BadNumber {
        /// The text that failed to parse.
        value: String,
    },
}

/// Decode a `0x`-prefixed hex payload into trimmed text.
///
/// The input is trimmed, the first two characters are discarded as the
/// marker (positionally — they are not checked to literally spell `0x`),
/// the remaining digit pairs become bytes, and the bytes decode with the
/// selected [`TextWidth`]. Leading and trailing whitespace is trimmed
/// from the decoded text.
pub fn decode_hex_text(hex: &str, width: TextWidth) -> Result<String, DecodeError> {
    let trimmed = hex.trim();
    let mut marker = trimmed.char_indices();
    if marker.next().is_none() || marker.next().is_none() {
        return Err(DecodeError::Truncated {
            len: trimmed.chars().count(),
        });
    }
    let digits = match marker.next() {
        Some((i, _)) => &trimmed[i..],
        None => "",
    };

    let bytes = decode_pairs(digits)?;
    let text = match width {
        TextWidth::SingleByte => bytes
            .iter()
            .map(|b| if *b < 0x80 { *b as char } else { '?' })
            .collect::<String>(),
        TextWidth::DoubleByte => {
            if bytes.len() % 2 != 0 {
                return Err(DecodeError::UnevenWide { bytes: bytes.len() });
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
    };
    Ok(text.trim().to_owned())
}

/// Parse a run of hex digit pairs into bytes.
fn decode_pairs(digits: &str) -> Result<Vec<u8>, DecodeError> {
    let raw = digits.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(DecodeError::OddLength { len: raw.len() });
    }
    let mut bytes = Vec::with_capacity(raw.len() / 2);
    for (i, pair) in raw.chunks_exact(2).enumerate() {
        if !pair[0].is_ascii_hexdigit() || !pair[1].is_ascii_hexdigit() {
            return Err(DecodeError::BadDigit {
                pair: String::from_utf8_lossy(pair).into_owned(),
                offset: i * 2,
            });
        }
        bytes.push((hex_digit_value(pair[0]) << 4) | hex_digit_value(pair[1]));
    }
    Ok(bytes)
}

/// Convert a single ASCII hex digit to its numeric value (0-15).
fn hex_digit_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'F' => b - b'A' + 10,
        b'a'..=b'f' => b - b'a' + 10,
        _ => unreachable!("hex_digit_value called with non-hex byte: {}", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii() {
        // "SELECT"
        let text = decode_hex_text("0x53454C454354", TextWidth::SingleByte).unwrap();
        assert_eq!(text, "SELECT");
    }

    #[test]
    fn decodes_utf16() {
        // "Test" as little-endian UTF-16
        let text = decode_hex_text("0x5400650073007400", TextWidth::DoubleByte).unwrap();
        assert_eq!(text, "Test");
    }

    #[test]
    fn empty_payload_is_empty_string() {
        assert_eq!(decode_hex_text("0x", TextWidth::SingleByte).unwrap(), "");
        assert_eq!(decode_hex_text("0x", TextWidth::DoubleByte).unwrap(), "");
    }

    #[test]
    fn too_short_fails() {
        assert_eq!(
            decode_hex_text("0", TextWidth::SingleByte),
            Err(DecodeError::Truncated { len: 1 })
        );
        assert_eq!(
            decode_hex_text("", TextWidth::SingleByte),
            Err(DecodeError::Truncated { len: 0 })
        );
    }

    #[test]
    fn odd_digit_count_fails() {
        assert_eq!(
            decode_hex_text("0x414", TextWidth::SingleByte),
            Err(DecodeError::OddLength { len: 3 })
        );
    }

    #[test]
    fn bad_digit_fails_with_offset() {
        assert_eq!(
            decode_hex_text("0x41ZZ", TextWidth::SingleByte),
            Err(DecodeError::BadDigit {
                pair: "ZZ".into(),
                offset: 2
            })
        );
    }

    #[test]
    fn marker_is_positional_not_checked() {
        // The first two characters are discarded whatever they are.
        assert_eq!(
            decode_hex_text("XY41", TextWidth::SingleByte).unwrap(),
            "A"
        );
    }

    #[test]
    fn input_and_result_are_trimmed() {
        // Surrounding whitespace on the payload is ignored, and the decoded
        // text loses its leading/trailing whitespace ("\x20A\x20" -> "A").
        assert_eq!(
            decode_hex_text("  0x204120  ", TextWidth::SingleByte).unwrap(),
            "A"
        );
    }

    #[test]
    fn high_bytes_decode_to_question_marks() {
        assert_eq!(
            decode_hex_text("0x41FF42", TextWidth::SingleByte).unwrap(),
            "A?B"
        );
    }

    #[test]
    fn uneven_wide_payload_fails() {
        assert_eq!(
            decode_hex_text("0x540065", TextWidth::DoubleByte),
            Err(DecodeError::UnevenWide { bytes: 3 })
        );
    }

    #[test]
    fn lowercase_digits_accepted() {
        assert_eq!(
            decode_hex_text("0x6a6b", TextWidth::SingleByte).unwrap(),
            "jk"
        );
    }

    #[test]
    fn round_trips_single_byte() {
        let original = "WHERE id = 42";
        let encoded = format!(
            "0x{}",
            original.bytes().map(|b| format!("{b:02X}")).collect::<String>()
        );
        assert_eq!(
            decode_hex_text(&encoded, TextWidth::SingleByte).unwrap(),
            original
        );
    }

    #[test]
    fn round_trips_double_byte() {
        let original = "Sales Summary";
        let encoded = format!(
            "0x{}",
            original
                .encode_utf16()
                .flat_map(|u| u.to_le_bytes())
                .map(|b| format!("{b:02X}"))
                .collect::<String>()
        );
        assert_eq!(
            decode_hex_text(&encoded, TextWidth::DoubleByte).unwrap(),
            original
        );
    }
}
