// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gep-registry
//!
//! The polling layer of the GEP register client:
//!
//! - **Register**: a local mirror of one remote register, with poll
//!   bookkeeping, failure backoff, and a change listener
//! - **Hints**: configuration of change-hint probing per register collection
//! - **AutoUpdater**: a single background task that multiplexes register
//!   polls and hint probes across any number of collections
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gep_core::codec::{NumberCodec, RegisterCodec};
//! use gep_core::types::RegisterId;
//! use gep_registry::{AutoUpdater, Register};
//!
//! let register = Arc::new(Register::new(
//!     collection,
//!     RegisterId::new(5)?,
//!     false,
//!     RegisterCodec::integer(NumberCodec::identity()),
//! ));
//! register.set_change_listener(Some(Arc::new(|r| {
//!     println!("{:?} changed to {:?}", r.register_id(), r.value());
//! })));
//!
//! let updater = AutoUpdater::new();
//! updater.add_register(Arc::clone(&register));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod hints;
pub mod register;
pub mod updater;

pub use hints::{HintSettings, HintStrategy};
pub use register::{ChangeListener, Register};
pub use updater::AutoUpdater;
