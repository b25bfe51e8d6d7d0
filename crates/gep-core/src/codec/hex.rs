// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Codec for binary registers rendered as hexadecimal text.

use crate::error::CodecError;
use crate::types::{Value, ValueType};

use super::BinaryCodec;

// =============================================================================
// HexBinaryCodec
// =============================================================================

/// Codec transforming remote byte sequences into hexadecimal strings.
///
/// Decoding renders each byte as two lowercase hex digits, separated by
/// single spaces unless `spaces` is disabled. Encoding parses a hex string
/// (whitespace is ignored), rejects odd digit counts and non-hex characters,
/// and enforces the configured length bounds on the resulting byte sequence.
///
/// # Examples
///
/// ```
/// use gep_core::codec::{BinaryCodec, HexBinaryCodec};
/// use gep_core::types::Value;
///
/// let codec = HexBinaryCodec::new(0, 16);
/// assert_eq!(codec.decode(&[0x0a, 0xff]).unwrap(), Value::Text("0a ff".into()));
/// assert_eq!(codec.encode(&Value::Text("0aff".into())).unwrap(), vec![0x0a, 0xff]);
/// ```
#[derive(Debug, Clone)]
pub struct HexBinaryCodec {
    /// Minimal length of the binary sequence in bytes.
    min_length: usize,
    /// Maximal length of the binary sequence in bytes.
    max_length: usize,
    /// Whether decoded output separates bytes with spaces.
    spaces: bool,
}

impl HexBinaryCodec {
    /// Creates a codec with the given length bounds and space-separated
    /// output.
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length: max_length.max(min_length),
            spaces: true,
        }
    }

    /// Returns a copy with byte separation configured.
    pub fn with_spaces(mut self, spaces: bool) -> Self {
        self.spaces = spaces;
        self
    }

    /// Returns the minimal sequence length in bytes.
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Returns the maximal sequence length in bytes.
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl BinaryCodec for HexBinaryCodec {
    fn value_type(&self) -> ValueType {
        ValueType::Text
    }

    fn decode(&self, remote: &[u8]) -> Result<Value, CodecError> {
        let separator = if self.spaces { 1 } else { 0 };
        let mut text = String::with_capacity(remote.len() * (2 + separator));
        for (i, byte) in remote.iter().enumerate() {
            if self.spaces && i != 0 {
                text.push(' ');
            }
            text.push_str(&format!("{:02x}", byte));
        }
        Ok(Value::Text(text))
    }

    fn encode(&self, local: &Value) -> Result<Vec<u8>, CodecError> {
        let text = local
            .as_text()
            .ok_or_else(|| CodecError::not_convertible(ValueType::Text, local.value_type()))?;

        let mut digits = Vec::with_capacity(text.len());
        for character in text.chars() {
            if character.is_ascii_whitespace() {
                continue;
            }
            let digit = character
                .to_digit(16)
                .ok_or(CodecError::InvalidHexDigit { character })?;
            digits.push(digit as u8);
        }

        if digits.len() % 2 != 0 {
            return Err(CodecError::OddHexLength {
                digits: digits.len(),
            });
        }

        let bytes: Vec<u8> = digits
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect();

        if bytes.len() < self.min_length || bytes.len() > self.max_length {
            return Err(CodecError::LengthOutOfRange {
                length: bytes.len(),
                min: self.min_length,
                max: self.max_length,
            });
        }

        Ok(bytes)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_spaces() {
        let codec = HexBinaryCodec::new(0, 16);
        assert_eq!(codec.decode(&[]).unwrap(), Value::Text(String::new()));
        assert_eq!(
            codec.decode(&[0x00, 0x0f, 0xa0]).unwrap(),
            Value::Text("00 0f a0".into())
        );
    }

    #[test]
    fn test_decode_without_spaces() {
        let codec = HexBinaryCodec::new(0, 16).with_spaces(false);
        assert_eq!(
            codec.decode(&[0x00, 0x0f, 0xa0]).unwrap(),
            Value::Text("000fa0".into())
        );
    }

    #[test]
    fn test_round_trip_within_bounds() {
        let codec = HexBinaryCodec::new(1, 4);
        for bytes in [vec![0x00], vec![0xde, 0xad], vec![1, 2, 3, 4]] {
            let decoded = codec.decode(&bytes).unwrap();
            assert_eq!(codec.encode(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_encode_ignores_whitespace() {
        let codec = HexBinaryCodec::new(0, 16);
        assert_eq!(
            codec.encode(&Value::Text(" de ad be ef ".into())).unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn test_encode_rejects_odd_digit_count() {
        let codec = HexBinaryCodec::new(0, 16);
        assert!(matches!(
            codec.encode(&Value::Text("abc".into())),
            Err(CodecError::OddHexLength { digits: 3 })
        ));
    }

    #[test]
    fn test_encode_rejects_non_hex() {
        let codec = HexBinaryCodec::new(0, 16);
        assert!(matches!(
            codec.encode(&Value::Text("zz".into())),
            Err(CodecError::InvalidHexDigit { character: 'z' })
        ));
    }

    #[test]
    fn test_encode_enforces_length_bounds() {
        let codec = HexBinaryCodec::new(2, 3);
        assert!(codec.encode(&Value::Text("aabb".into())).is_ok());
        assert!(matches!(
            codec.encode(&Value::Text("ff".repeat(4))),
            Err(CodecError::LengthOutOfRange { length: 4, .. })
        ));
        assert!(matches!(
            codec.encode(&Value::Text("ff".into())),
            Err(CodecError::LengthOutOfRange { length: 1, .. })
        ));
    }

    #[test]
    fn test_encode_rejects_non_text() {
        let codec = HexBinaryCodec::new(0, 16);
        assert!(matches!(
            codec.encode(&Value::Integer(1)),
            Err(CodecError::NotConvertible { .. })
        ));
    }
}
