// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Codec for boolean registers.

use std::sync::{Arc, OnceLock};

use crate::error::CodecError;
use crate::types::{Value, ValueType};

use super::IntCodec;

// =============================================================================
// BooleanCodec
// =============================================================================

/// Codec transforming remote integers into booleans.
///
/// Any positive remote value decodes to `true`; zero and negative values
/// decode to `false`. The codec is stateless, so a single shared instance
/// serves every boolean register.
#[derive(Debug, Default)]
pub struct BooleanCodec;

static INSTANCE: OnceLock<Arc<BooleanCodec>> = OnceLock::new();

impl BooleanCodec {
    /// Returns the shared codec instance.
    pub fn instance() -> Arc<BooleanCodec> {
        Arc::clone(INSTANCE.get_or_init(|| Arc::new(BooleanCodec)))
    }
}

impl IntCodec for BooleanCodec {
    fn value_type(&self) -> ValueType {
        ValueType::Bool
    }

    fn decode(&self, remote: i32) -> Result<Value, CodecError> {
        Ok(Value::Bool(remote > 0))
    }

    fn encode(&self, local: &Value) -> Result<i32, CodecError> {
        match local {
            Value::Bool(true) => Ok(1),
            Value::Bool(false) => Ok(0),
            other => Err(CodecError::not_convertible(
                ValueType::Bool,
                other.value_type(),
            )),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
