// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gep-config
//!
//! Configuration surface of the GEP register client: a serde schema for
//! register collections and their registers, a file loader dispatching on
//! the extension (YAML, TOML, JSON), and builders turning configuration into
//! live [`gep_registry::Register`]s and hint settings.
//!
//! ## Example
//!
//! ```yaml
//! collections:
//!   - id: boiler
//!     gepid: 3
//!     timeout: 1500
//!     hints: 200
//!     strategy: semi_greedy
//!     registers:
//!       - id: 5
//!         name: water-temperature
//!         update-interval: 2.5s
//!         codec: { type: number, scale: 0.1, decimals: 1 }
//!       - id: 9
//!         name: serial
//!         read-only: true
//!         codec: { type: binary, maxlength: 16 }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::{build_registers, hint_settings};
pub use loader::load_config;
pub use schema::{CodecConfig, CollectionConfig, RegisterConfig, RegistryConfig, UpdateInterval};
