// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The contract of the message framing layer.
//!
//! A messenger turns a full-duplex byte stream (serial port, TCP socket)
//! into discrete tagged messages: it frames and checksums outgoing payloads
//! and delivers incoming `(tag, payload)` pairs through a listener. Concrete
//! messengers live outside this crate; the gateway only depends on this
//! trait.

use std::sync::Arc;

use async_trait::async_trait;

use gep_core::error::GepResult;
use gep_core::types::RegistryId;

/// Callback receiving incoming `(tag, payload)` messages.
///
/// The listener is invoked from the messenger's receive task and must not
/// block; the gateway's implementation only stores the payload and signals a
/// waiting request.
pub type MessageListener = Arc<dyn Fn(u16, &[u8]) + Send + Sync>;

// =============================================================================
// Messenger
// =============================================================================

/// A framing layer delivering tagged messages over one stream socket.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Opens the underlying socket and starts the receive task. Returns once
    /// the session is established.
    async fn start(&self) -> GepResult<()>;

    /// Stops the session. With `wait` set, returns only after the receive
    /// task has terminated; otherwise stopping is best-effort.
    async fn stop(&self, wait: bool) -> GepResult<()>;

    /// Returns whether the session is running.
    fn is_running(&self) -> bool;

    /// Sends a payload to the destination device, stamped with the request
    /// tag that the matching response will carry.
    async fn send_message(
        &self,
        destination: RegistryId,
        payload: &[u8],
        tag: u16,
    ) -> GepResult<()>;

    /// Installs the listener receiving incoming messages. The gateway calls
    /// this once at construction; later calls replace the listener.
    fn set_listener(&self, listener: MessageListener);
}
