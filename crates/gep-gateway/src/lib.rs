// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gep-gateway
//!
//! The GEP protocol layer of the register client:
//!
//! - **Wire**: the binary request/response codec, including the
//!   variable-length signed integer encoding
//! - **Messenger**: the contract of the message framing layer that carries
//!   tagged payloads over a serial or TCP stream socket
//! - **Gateway**: the request/response engine serializing requests over one
//!   messenger, plus the per-device [`GepRegisterCollection`] facade
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │            GepRegisterCollection           │
//! │   (RegisterCollection impl, statistics)    │
//! └────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌────────────────────────────────────────────┐
//! │                 GepGateway                 │
//! │ (serialized requests, tag matching, wire)  │
//! └────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌────────────────────────────────────────────┐
//! │                 Messenger                  │
//! │      (framing layer, out of this crate)    │
//! └────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod gateway;
pub mod messenger;
pub mod wire;

pub use gateway::{GepGateway, GepRegisterCollection};
pub use messenger::{MessageListener, Messenger};
