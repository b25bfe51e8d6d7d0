// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mock implementations for testing the register client in isolation.
//!
//! The mocks are configurable (scripted responses, failure injection) and
//! record their interactions for verification.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use gep_core::clock::Clock;
use gep_core::error::{GepResult, TransportError};
use gep_core::stats::RequestStatistics;
use gep_core::types::{RegisterId, RegistryId};
use gep_gateway::messenger::{MessageListener, Messenger};

// =============================================================================
// ManualClock
// =============================================================================

/// A clock driven by the test.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time.
    pub fn set(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }

    /// Advances the current time.
    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// MockMessenger
// =============================================================================

/// A message sent through the [`MockMessenger`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Destination registry id.
    pub destination: u8,
    /// Raw request payload.
    pub payload: Vec<u8>,
    /// Request tag.
    pub tag: u16,
}

/// How the mock device answers one sent message.
pub enum MockReply {
    /// Stay silent; the request runs into its timeout.
    Silence,
    /// Reply with the payload, echoing the request tag.
    Reply(Vec<u8>),
    /// Reply with the payload under an arbitrary tag.
    ReplyWithTag(Vec<u8>, u16),
}

type Responder = Box<dyn Fn(&SentMessage) -> MockReply + Send + Sync>;

/// Scripted messenger standing in for the framing layer.
///
/// A responder closure inspects each sent message and decides the device's
/// answer; replies are delivered synchronously through the registered
/// listener.
#[derive(Default)]
pub struct MockMessenger {
    running: AtomicBool,
    fail_sends: AtomicBool,
    listener: Mutex<Option<MessageListener>>,
    responder: Mutex<Option<Responder>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MockMessenger {
    /// Creates a silent messenger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the responder deciding the device's answers.
    pub fn respond_with(
        &self,
        responder: impl Fn(&SentMessage) -> MockReply + Send + Sync + 'static,
    ) {
        *self.responder.lock().unwrap() = Some(Box::new(responder));
    }

    /// Makes every send fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Returns all messages sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the number of messages sent so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Delivers an unsolicited message to the listener, as if the device had
    /// sent one on its own.
    pub fn inject_message(&self, tag: u16, payload: &[u8]) {
        let listener = self.listener.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener(tag, payload);
        }
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn start(&self) -> GepResult<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _wait: bool) -> GepResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn send_message(
        &self,
        destination: RegistryId,
        payload: &[u8],
        tag: u16,
    ) -> GepResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::send_failed("mock send failure").into());
        }

        let message = SentMessage {
            destination: destination.value(),
            payload: payload.to_vec(),
            tag,
        };
        self.sent.lock().unwrap().push(message.clone());

        let reply = {
            let responder = self.responder.lock().unwrap();
            match responder.as_ref() {
                Some(responder) => responder(&message),
                None => MockReply::Silence,
            }
        };

        match reply {
            MockReply::Silence => {}
            MockReply::Reply(response) => self.inject_message(tag, &response),
            MockReply::ReplyWithTag(response, reply_tag) => {
                self.inject_message(reply_tag, &response)
            }
        }

        Ok(())
    }

    fn set_listener(&self, listener: MessageListener) {
        *self.listener.lock().unwrap() = Some(listener);
    }
}

// =============================================================================
// MockRegisterCollection
// =============================================================================

/// Scripted register collection for testing the polling layer without any
/// gateway underneath.
#[derive(Default)]
pub struct MockRegisterCollection {
    statistics: RequestStatistics,
    int_values: Mutex<HashMap<u16, i32>>,
    bin_values: Mutex<HashMap<u16, Vec<u8>>>,
    fail_next_read: AtomicBool,
    fail_all_reads: AtomicBool,
    hint_script: Mutex<VecDeque<Option<u16>>>,
    hint_requests: Mutex<Vec<Option<u16>>>,
    read_history: Mutex<Vec<u16>>,
    write_history: Mutex<Vec<(u16, i32)>>,
}

impl MockRegisterCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of an integer register.
    pub fn set_int_value(&self, register: u16, value: i32) {
        self.int_values.lock().unwrap().insert(register, value);
    }

    /// Sets the value of a binary register.
    pub fn set_bin_value(&self, register: u16, value: Vec<u8>) {
        self.bin_values.lock().unwrap().insert(register, value);
    }

    /// Appends a scripted hint answer; once the script is exhausted every
    /// probe reports "no hint".
    pub fn push_hint(&self, hint: Option<u16>) {
        self.hint_script.lock().unwrap().push_back(hint);
    }

    /// Makes the next read fail.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Makes every read fail.
    pub fn fail_all_reads(&self, fail: bool) {
        self.fail_all_reads.store(fail, Ordering::SeqCst);
    }

    /// Returns the confirmed ids carried by the hint probes received so far.
    pub fn hint_requests(&self) -> Vec<Option<u16>> {
        self.hint_requests.lock().unwrap().clone()
    }

    /// Returns the ids of all reads so far, in order.
    pub fn read_history(&self) -> Vec<u16> {
        self.read_history.lock().unwrap().clone()
    }

    /// Returns the number of reads of the given register.
    pub fn reads_of(&self, register: u16) -> usize {
        self.read_history
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == register)
            .count()
    }

    /// Returns all writes so far, in order.
    pub fn write_history(&self) -> Vec<(u16, i32)> {
        self.write_history.lock().unwrap().clone()
    }

    /// Waits until at least `count` reads happened, polling with a bounded
    /// deadline. Returns whether the count was reached.
    pub async fn wait_for_reads(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.read_history.lock().unwrap().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Waits until at least `count` hint probes happened.
    pub async fn wait_for_hint_requests(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.hint_requests.lock().unwrap().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn check_read_failure(&self) -> GepResult<()> {
        if self.fail_all_reads.load(Ordering::SeqCst)
            || self.fail_next_read.swap(false, Ordering::SeqCst)
        {
            return Err(TransportError::no_response(None).into());
        }
        Ok(())
    }
}

#[async_trait]
impl gep_core::collection::RegisterCollection for MockRegisterCollection {
    async fn read_integer(
        &self,
        register: RegisterId,
        _timeout: Option<Duration>,
    ) -> GepResult<i32> {
        self.read_history.lock().unwrap().push(register.value());
        let failed = self.check_read_failure();
        self.statistics.count_request(failed.is_err());
        failed?;

        self.int_values
            .lock()
            .unwrap()
            .get(&register.value())
            .copied()
            .ok_or_else(|| TransportError::no_response(None).into())
    }

    async fn write_integer(
        &self,
        register: RegisterId,
        value: i32,
        _timeout: Option<Duration>,
    ) -> GepResult<()> {
        self.write_history
            .lock()
            .unwrap()
            .push((register.value(), value));
        self.int_values.lock().unwrap().insert(register.value(), value);
        self.statistics.count_request(false);
        Ok(())
    }

    async fn read_binary(
        &self,
        register: RegisterId,
        _timeout: Option<Duration>,
    ) -> GepResult<Vec<u8>> {
        self.read_history.lock().unwrap().push(register.value());
        let failed = self.check_read_failure();
        self.statistics.count_request(failed.is_err());
        failed?;

        self.bin_values
            .lock()
            .unwrap()
            .get(&register.value())
            .cloned()
            .ok_or_else(|| TransportError::no_response(None).into())
    }

    async fn write_binary(
        &self,
        register: RegisterId,
        value: &[u8],
        _timeout: Option<Duration>,
    ) -> GepResult<()> {
        self.bin_values
            .lock()
            .unwrap()
            .insert(register.value(), value.to_vec());
        self.statistics.count_request(false);
        Ok(())
    }

    async fn change_hint(
        &self,
        confirmed: Option<RegisterId>,
        _timeout: Option<Duration>,
    ) -> GepResult<Option<RegisterId>> {
        self.hint_requests
            .lock()
            .unwrap()
            .push(confirmed.map(|id| id.value()));
        self.statistics.count_request(false);

        let hint = self.hint_script.lock().unwrap().pop_front().flatten();
        match hint {
            Some(id) => Ok(Some(RegisterId::new(id).expect("scripted hint id out of range"))),
            None => Ok(None),
        }
    }

    fn statistics(&self) -> &RequestStatistics {
        &self.statistics
    }
}
