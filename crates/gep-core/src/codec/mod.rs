// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Value codecs.
//!
//! A codec translates between device-side values (a 32-bit integer or a byte
//! sequence) and local typed [`Value`]s. Codecs are immutable after
//! construction and freely shared across registers.
//!
//! A decoder either produces a valid local value or fails; there is no
//! "invalid value" in-band result. The register layer treats a decode failure
//! exactly like a failed read.

mod boolean;
mod hex;
mod number;

pub use boolean::BooleanCodec;
pub use hex::HexBinaryCodec;
pub use number::NumberCodec;

use std::fmt;
use std::sync::Arc;

use crate::error::CodecError;
use crate::types::{Value, ValueType};

// =============================================================================
// Codec Traits
// =============================================================================

/// Codec operating on integer values of remote registers.
pub trait IntCodec: Send + Sync + fmt::Debug {
    /// Returns the type of local values this codec accepts and produces.
    fn value_type(&self) -> ValueType;

    /// Decodes a remote integer value into a local value.
    fn decode(&self, remote: i32) -> Result<Value, CodecError>;

    /// Encodes a local value into a remote integer value.
    fn encode(&self, local: &Value) -> Result<i32, CodecError>;
}

/// Codec operating on binary values of remote registers.
pub trait BinaryCodec: Send + Sync + fmt::Debug {
    /// Returns the type of local values this codec accepts and produces.
    fn value_type(&self) -> ValueType;

    /// Decodes a remote binary value into a local value.
    fn decode(&self, remote: &[u8]) -> Result<Value, CodecError>;

    /// Encodes a local value into a remote binary value.
    fn encode(&self, local: &Value) -> Result<Vec<u8>, CodecError>;
}

// =============================================================================
// RegisterCodec
// =============================================================================

/// The codec attached to a register: either integer-valued or binary-valued.
///
/// The variant decides which pair of collection operations a register uses
/// when polling and writing.
#[derive(Debug, Clone)]
pub enum RegisterCodec {
    /// Codec for an integer-valued register.
    Integer(Arc<dyn IntCodec>),
    /// Codec for a binary-valued register.
    Binary(Arc<dyn BinaryCodec>),
}

impl RegisterCodec {
    /// Wraps an integer codec.
    pub fn integer(codec: impl IntCodec + 'static) -> Self {
        Self::Integer(Arc::new(codec))
    }

    /// Wraps a binary codec.
    pub fn binary(codec: impl BinaryCodec + 'static) -> Self {
        Self::Binary(Arc::new(codec))
    }

    /// Returns the type of local values the codec produces.
    pub fn value_type(&self) -> ValueType {
        match self {
            RegisterCodec::Integer(codec) => codec.value_type(),
            RegisterCodec::Binary(codec) => codec.value_type(),
        }
    }

    /// Returns `true` for binary-valued codecs.
    pub fn is_binary(&self) -> bool {
        matches!(self, RegisterCodec::Binary(_))
    }
}

impl From<Arc<dyn IntCodec>> for RegisterCodec {
    fn from(codec: Arc<dyn IntCodec>) -> Self {
        Self::Integer(codec)
    }
}

impl From<Arc<dyn BinaryCodec>> for RegisterCodec {
    fn from(codec: Arc<dyn BinaryCodec>) -> Self {
        Self::Binary(codec)
    }
}

// =============================================================================
// Tests
// =============================================================================
