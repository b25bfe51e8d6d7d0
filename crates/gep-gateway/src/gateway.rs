// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The GEP request/response engine.
//!
//! A [`GepGateway`] owns one [`Messenger`] and serializes arbitrary
//! request/response cycles over it: at most one request is in flight per
//! gateway at any time. Responses are matched to the open request by a
//! cycling message tag; anything else arriving on the socket is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use gep_core::collection::{Gateway, RegisterCollection};
use gep_core::error::{GepError, GepResult, ProtocolError, TransportError};
use gep_core::stats::RequestStatistics;
use gep_core::types::{RegisterId, RegistryId};

use crate::messenger::Messenger;
use crate::wire;

// =============================================================================
// GepGateway
// =============================================================================

/// Gateway to the register collections reachable through one messenger.
///
/// # Concurrency
///
/// Two locks cooperate per request: a serial-order lock held for the whole
/// request/response cycle (callers queue behind it, which makes the socket
/// effectively single-writer), and a short-lived request-slot lock shared
/// with the messenger's receive callback for handing over the response.
pub struct GepGateway {
    /// The framing layer carrying tagged messages.
    messenger: Arc<dyn Messenger>,
    /// Serializes whole request/response cycles.
    serial_lock: tokio::sync::Mutex<()>,
    /// The single open request, shared with the receive callback.
    slot: Arc<Mutex<RequestSlot>>,
    /// Register collections handed out so far, by registry id. Held weakly so
    /// an abandoned collection can be reclaimed.
    collections: Mutex<HashMap<u8, Weak<GepRegisterCollection>>>,
}

#[derive(Default)]
struct RequestSlot {
    /// Counter generating request tags, cycling within `0..TAG_MODULUS`.
    tag_counter: u16,
    /// The request currently awaiting its response, if any.
    open: Option<OpenRequest>,
}

struct OpenRequest {
    tag: u16,
    responder: oneshot::Sender<Vec<u8>>,
}

impl GepGateway {
    /// Creates a gateway over the given messenger and installs its receive
    /// listener.
    pub fn new(messenger: Arc<dyn Messenger>) -> Arc<Self> {
        let slot = Arc::new(Mutex::new(RequestSlot::default()));

        let listener_slot = Arc::clone(&slot);
        messenger.set_listener(Arc::new(move |tag, payload| {
            Self::handle_message(&listener_slot, tag, payload);
        }));

        Arc::new(Self {
            messenger,
            serial_lock: tokio::sync::Mutex::new(()),
            slot,
            collections: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the register collection hosted by the device with the given
    /// registry id, creating the facade on first use.
    ///
    /// The gateway does not keep the collection alive: once every outside
    /// reference (including registers) is gone, the facade and its statistics
    /// are reclaimed, and a later call creates a fresh one.
    pub fn register_collection(self: &Arc<Self>, registry: RegistryId) -> Arc<GepRegisterCollection> {
        let mut collections = self.collections.lock().expect("collection map lock poisoned");
        collections.retain(|_, collection| collection.strong_count() > 0);

        if let Some(existing) = collections.get(&registry.value()).and_then(Weak::upgrade) {
            return existing;
        }

        let collection = Arc::new(GepRegisterCollection {
            registry,
            gateway: Arc::clone(self),
            statistics: RequestStatistics::new(),
        });
        collections.insert(registry.value(), Arc::downgrade(&collection));
        collection
    }

    // =========================================================================
    // Request primitives
    // =========================================================================

    /// Delivers an incoming message to the open request, if the tag matches.
    fn handle_message(slot: &Mutex<RequestSlot>, tag: u16, payload: &[u8]) {
        let mut slot = slot.lock().expect("request slot lock poisoned");
        match slot.open.take() {
            Some(open) if open.tag == tag => {
                // The waiter may have given up in the meantime; that is fine.
                let _ = open.responder.send(payload.to_vec());
            }
            Some(open) => {
                tracing::trace!(
                    tag,
                    open_tag = open.tag,
                    "dropping response with non-matching tag"
                );
                slot.open = Some(open);
            }
            None => {
                tracing::trace!(tag, "dropping unsolicited message");
            }
        }
    }

    /// Sends a request and waits for the matching response.
    ///
    /// Returns `None` when no response arrived within the timeout. Tags cycle
    /// within `0..1000`; since the serial-order lock admits one request at a
    /// time, a stale reply can only be misattributed if it survives a full
    /// thousand later requests, which the protocol tolerates.
    async fn send_request(
        &self,
        destination: RegistryId,
        payload: &[u8],
        timeout: Option<Duration>,
    ) -> GepResult<Option<Vec<u8>>> {
        let _serial = self.serial_lock.lock().await;

        let (tag, receiver) = {
            let mut slot = self.slot.lock().expect("request slot lock poisoned");
            slot.tag_counter = (slot.tag_counter + 1) % wire::TAG_MODULUS;
            let tag = slot.tag_counter;
            let (responder, receiver) = oneshot::channel();
            slot.open = Some(OpenRequest { tag, responder });
            (tag, receiver)
        };

        tracing::trace!(
            registry = destination.value(),
            tag,
            len = payload.len(),
            "sending request"
        );

        if let Err(error) = self.messenger.send_message(destination, payload, tag).await {
            self.clear_open_request();
            return Err(error);
        }

        let response = match timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(Ok(response)) => Some(response),
                Ok(Err(_)) => None,
                Err(_elapsed) => None,
            },
            None => receiver.await.ok(),
        };

        self.clear_open_request();

        if response.is_none() {
            tracing::debug!(registry = destination.value(), tag, "request timed out");
        }

        Ok(response)
    }

    fn clear_open_request(&self) {
        let mut slot = self.slot.lock().expect("request slot lock poisoned");
        slot.open = None;
    }

    // =========================================================================
    // Register operations
    // =========================================================================

    /// Reads the value of an integer register.
    pub async fn read_integer_register(
        &self,
        registry: RegistryId,
        register: RegisterId,
        timeout: Option<Duration>,
    ) -> GepResult<i32> {
        let request = wire::read_integer_request(register);
        let response = self
            .send_request(registry, &request, timeout)
            .await?
            .ok_or(TransportError::NoResponse { timeout })?;
        let payload = wire::ok_payload(&response)?;
        Ok(wire::decode_number(payload, 0)?)
    }

    /// Writes a value to an integer register.
    pub async fn write_integer_register(
        &self,
        registry: RegistryId,
        register: RegisterId,
        value: i32,
        timeout: Option<Duration>,
    ) -> GepResult<()> {
        let request = wire::write_integer_request(register, value);
        let response = self
            .send_request(registry, &request, timeout)
            .await?
            .ok_or(TransportError::NoResponse { timeout })?;
        wire::ok_payload(&response)?;
        Ok(())
    }

    /// Reads the value of a binary register.
    pub async fn read_binary_register(
        &self,
        registry: RegistryId,
        register: RegisterId,
        timeout: Option<Duration>,
    ) -> GepResult<Vec<u8>> {
        let request = wire::read_binary_request(register);
        let response = self
            .send_request(registry, &request, timeout)
            .await?
            .ok_or(TransportError::NoResponse { timeout })?;
        let payload = wire::ok_payload(&response)?;
        Ok(payload.to_vec())
    }

    /// Writes a value to a binary register.
    pub async fn write_binary_register(
        &self,
        registry: RegistryId,
        register: RegisterId,
        value: &[u8],
        timeout: Option<Duration>,
    ) -> GepResult<()> {
        let request = wire::write_binary_request(register, value);
        let response = self
            .send_request(registry, &request, timeout)
            .await?
            .ok_or(TransportError::NoResponse { timeout })?;
        wire::ok_payload(&response)?;
        Ok(())
    }

    /// Retrieves a change hint from a registry, optionally confirming a
    /// previously received hint. Returns `None` when the device reports no
    /// pending change.
    pub async fn change_hint(
        &self,
        registry: RegistryId,
        confirmed: Option<RegisterId>,
        timeout: Option<Duration>,
    ) -> GepResult<Option<RegisterId>> {
        let request = wire::change_hint_request(confirmed);
        let response = self
            .send_request(registry, &request, timeout)
            .await?
            .ok_or(TransportError::NoResponse { timeout })?;
        let payload = wire::ok_payload(&response)?;

        let hint = wire::decode_number(payload, 0)?;
        if hint < 0 {
            return Ok(None);
        }

        let register = u16::try_from(hint)
            .ok()
            .and_then(|id| RegisterId::new(id).ok())
            .ok_or_else(|| {
                ProtocolError::invalid_message(format!("hinted register id {} is out of range", hint))
            })?;
        Ok(Some(register))
    }
}

#[async_trait]
impl Gateway for GepGateway {
    async fn start(&self) -> GepResult<()> {
        let _serial = self.serial_lock.lock().await;
        self.messenger.start().await.map_err(|error| {
            GepError::from(TransportError::start_failed(format!(
                "messenger session failed: {}",
                error
            )))
        })?;
        tracing::info!("gateway session started");
        Ok(())
    }

    async fn stop(&self, wait: bool) -> GepResult<()> {
        let _serial = self.serial_lock.lock().await;
        self.messenger.stop(wait).await?;
        tracing::info!("gateway session stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.messenger.is_running()
    }
}

impl std::fmt::Debug for GepGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GepGateway")
            .field("running", &self.is_running())
            .finish()
    }
}

// =============================================================================
// GepRegisterCollection
// =============================================================================

/// Per-device facade over the gateway.
///
/// Forwards every operation with its registry id prefilled and counts the
/// request into its own statistics.
pub struct GepRegisterCollection {
    registry: RegistryId,
    gateway: Arc<GepGateway>,
    statistics: RequestStatistics,
}

impl GepRegisterCollection {
    /// Returns the registry id of this collection.
    pub fn registry_id(&self) -> RegistryId {
        self.registry
    }

    /// Returns the gateway this collection belongs to.
    pub fn gateway(&self) -> &Arc<GepGateway> {
        &self.gateway
    }
}

#[async_trait]
impl RegisterCollection for GepRegisterCollection {
    async fn read_integer(
        &self,
        register: RegisterId,
        timeout: Option<Duration>,
    ) -> GepResult<i32> {
        let result = self
            .gateway
            .read_integer_register(self.registry, register, timeout)
            .await;
        self.statistics.count_request(result.is_err());
        result
    }

    async fn write_integer(
        &self,
        register: RegisterId,
        value: i32,
        timeout: Option<Duration>,
    ) -> GepResult<()> {
        let result = self
            .gateway
            .write_integer_register(self.registry, register, value, timeout)
            .await;
        self.statistics.count_request(result.is_err());
        result
    }

    async fn read_binary(
        &self,
        register: RegisterId,
        timeout: Option<Duration>,
    ) -> GepResult<Vec<u8>> {
        let result = self
            .gateway
            .read_binary_register(self.registry, register, timeout)
            .await;
        self.statistics.count_request(result.is_err());
        result
    }

    async fn write_binary(
        &self,
        register: RegisterId,
        value: &[u8],
        timeout: Option<Duration>,
    ) -> GepResult<()> {
        let result = self
            .gateway
            .write_binary_register(self.registry, register, value, timeout)
            .await;
        self.statistics.count_request(result.is_err());
        result
    }

    async fn change_hint(
        &self,
        confirmed: Option<RegisterId>,
        timeout: Option<Duration>,
    ) -> GepResult<Option<RegisterId>> {
        let result = self
            .gateway
            .change_hint(self.registry, confirmed, timeout)
            .await;
        self.statistics.count_request(result.is_err());
        result
    }

    fn statistics(&self) -> &RequestStatistics {
        &self.statistics
    }
}

impl std::fmt::Debug for GepRegisterCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GepRegisterCollection")
            .field("registry", &self.registry.value())
            .finish()
    }
}
