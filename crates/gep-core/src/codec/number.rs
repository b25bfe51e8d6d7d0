// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Codec for scaled numeric registers.

use crate::error::CodecError;
use crate::types::{Value, ValueType};

use super::IntCodec;

// =============================================================================
// NumberCodec
// =============================================================================

/// Codec transforming remote integers into scaled local numbers.
///
/// The decoded value is `scale * remote + shift`, rounded to `decimals`
/// places. With `decimals == 0` the codec produces [`Value::Integer`],
/// otherwise [`Value::Decimal`]. Encoding inverts the transformation and
/// rounds to the nearest remote integer.
///
/// # Examples
///
/// ```
/// use gep_core::codec::{IntCodec, NumberCodec};
/// use gep_core::types::Value;
///
/// // A temperature register storing tenths of a degree.
/// let codec = NumberCodec::new(0.1, 0.0, 1);
/// assert_eq!(codec.decode(217).unwrap(), Value::Decimal(21.7));
/// assert_eq!(codec.encode(&Value::Decimal(21.7)).unwrap(), 217);
/// ```
#[derive(Debug, Clone)]
pub struct NumberCodec {
    /// Multiplicative constant: `local = scale * remote + shift`.
    scale: f64,
    /// Additive constant: `local = scale * remote + shift`.
    shift: f64,
    /// Number of decimal places kept after transformation (0-4).
    decimals: u32,
    /// Cached `10^decimals`.
    decimals_power: f64,
}

impl NumberCodec {
    /// Creates a codec with the given transformation.
    ///
    /// `decimals` is clamped to `0..=4`.
    pub fn new(scale: f64, shift: f64, decimals: u32) -> Self {
        let decimals = decimals.min(4);
        Self {
            scale,
            shift,
            decimals,
            decimals_power: 10f64.powi(decimals as i32),
        }
    }

    /// The identity codec: local value equals the remote integer.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0)
    }

    /// Returns the scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the shift.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Returns the number of decimal places.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }
}

impl IntCodec for NumberCodec {
    fn value_type(&self) -> ValueType {
        if self.decimals == 0 {
            ValueType::Integer
        } else {
            ValueType::Decimal
        }
    }

    fn decode(&self, remote: i32) -> Result<Value, CodecError> {
        let transformed = remote as f64 * self.scale + self.shift;
        if self.decimals == 0 {
            Ok(Value::Integer(transformed.round() as i64))
        } else {
            Ok(Value::Decimal(
                (transformed * self.decimals_power).round() / self.decimals_power,
            ))
        }
    }

    fn encode(&self, local: &Value) -> Result<i32, CodecError> {
        let numeric = local
            .as_f64()
            .ok_or_else(|| CodecError::not_convertible(self.value_type(), local.value_type()))?;

        let remote = ((numeric - self.shift) / self.scale).round();
        if !remote.is_finite() || remote < i32::MIN as f64 || remote > i32::MAX as f64 {
            return Err(CodecError::ValueOutOfRange { value: remote });
        }

        Ok(remote as i32)
    }
}

// =============================================================================
// Tests
// =============================================================================
