// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for the GEP register client.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GepError;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a register within a register collection.
///
/// Register ids occupy 15 bits on the wire: valid values are `0..=32767`.
///
/// # Examples
///
/// ```
/// use gep_core::types::RegisterId;
///
/// let id = RegisterId::new(42).unwrap();
/// assert_eq!(id.value(), 42);
/// assert!(RegisterId::new(40_000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterId(u16);

impl RegisterId {
    /// Highest valid register id (15-bit address space).
    pub const MAX: u16 = 0x7FFF;

    /// Creates a register id, validating the 15-bit range.
    pub fn new(id: u16) -> Result<Self, GepError> {
        if id > Self::MAX {
            return Err(GepError::InvalidRegisterId { id: id as u32 });
        }
        Ok(Self(id))
    }

    /// Returns the numeric value of the id.
    #[inline]
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for RegisterId {
    type Error = GepError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

/// Identifier of a register collection within a gateway.
///
/// The registry id doubles as the destination id of messages on the shared
/// bus; valid values are `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryId(u8);

impl RegistryId {
    /// Highest valid registry id (4-bit address space).
    pub const MAX: u8 = 15;

    /// Creates a registry id, validating the 4-bit range.
    pub fn new(id: u8) -> Result<Self, GepError> {
        if id > Self::MAX {
            return Err(GepError::InvalidRegistryId { id: id as u32 });
        }
        Ok(Self(id))
    }

    /// Returns the numeric value of the id.
    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for RegistryId {
    type Error = GepError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

// =============================================================================
// Values
// =============================================================================

/// A local register value produced or consumed by a value codec.
///
/// Equality on values drives change detection: a register fires its change
/// listener exactly when the freshly decoded value differs from the cached
/// one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Integer value (whole-number codecs).
    Integer(i64),
    /// Decimal value (scaled codecs with a fractional part).
    Decimal(f64),
    /// Boolean value.
    Bool(bool),
    /// Textual value (e.g. hex renderings of binary registers).
    Text(String),
    /// Raw byte value.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the runtime type descriptor of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Decimal(_) => ValueType::Decimal,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
        }
    }

    /// Returns the value as `i64` if it is numeric and whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `bool` if it is boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Bytes(v) => {
                for (i, b) in v.iter().enumerate() {
                    if i != 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Runtime descriptor of the kind of local value a codec produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Whole numbers.
    Integer,
    /// Numbers with a fractional part.
    Decimal,
    /// Booleans.
    Bool,
    /// Text.
    Text,
    /// Raw bytes.
    Bytes,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
            ValueType::Bytes => "bytes",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Tests
// =============================================================================
