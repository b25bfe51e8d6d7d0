// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gep-core
//!
//! Core abstractions shared by every crate of the GEP register client:
//!
//! - **Types**: `RegisterId`, `RegistryId`, `Value`, `ValueType`
//! - **Clock**: monotonic millisecond time source behind a trait
//! - **Statistics**: thread-safe request counters with snapshots
//! - **Settings**: per-register communication settings
//! - **Collection**: the `Gateway` and `RegisterCollection` traits that
//!   decouple the polling layer from the protocol layer
//! - **Codec**: value codecs translating device-side integers and byte
//!   sequences into local typed values
//! - **Error**: unified error hierarchy
//!
//! ## Example
//!
//! ```
//! use gep_core::codec::{IntCodec, NumberCodec};
//! use gep_core::types::Value;
//!
//! let codec = NumberCodec::new(0.1, 0.0, 1);
//! assert_eq!(codec.decode(217).unwrap(), Value::Decimal(21.7));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod clock;
pub mod codec;
pub mod collection;
pub mod error;
pub mod settings;
pub mod stats;
pub mod types;

pub use clock::{Clock, MonotonicClock};
pub use collection::{Gateway, RegisterCollection};
pub use error::{
    CodecError, ConfigError, ConfigResult, GepError, GepResult, ProtocolError, TransportError,
};
pub use settings::ConnectionSettings;
pub use stats::{RequestStatistics, StatisticsSnapshot};
pub use types::{RegisterId, RegistryId, Value, ValueType};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
