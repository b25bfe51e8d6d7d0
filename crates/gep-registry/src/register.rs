// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Local representation of a remote register.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gep_core::clock::{Clock, MonotonicClock};
use gep_core::codec::RegisterCodec;
use gep_core::collection::RegisterCollection;
use gep_core::error::{GepError, GepResult};
use gep_core::settings::ConnectionSettings;
use gep_core::types::{RegisterId, Value, ValueType};

/// Callback invoked when the cached value of a register changed.
///
/// The listener runs on the task that observed the change (typically the
/// auto-updater task), outside of any register or scheduler lock. It may use
/// the register API freely but must not mutate auto-updater membership.
pub type ChangeListener = Arc<dyn Fn(&Register) + Send + Sync>;

/// Default interval between two value updates.
const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

// =============================================================================
// Register
// =============================================================================

/// A local mirror of one remote register.
///
/// The mirror caches the last decoded value, tracks consecutive read
/// failures, and derives the due time of the next poll. Reading the remote
/// register never throws at the caller: transport, protocol, and decode
/// failures only advance the failure counter, and after
/// [`ConnectionSettings::attempts_to_promote_read_fail`] consecutive misses
/// the cached value flips to invalid (`None`) while the last valid value is
/// kept separately.
pub struct Register {
    /// The remote collection hosting this register.
    collection: Arc<dyn RegisterCollection>,
    /// The identifier within the collection.
    id: RegisterId,
    /// Whether writes are rejected locally.
    read_only: bool,
    /// Codec translating remote values to local ones and back.
    codec: RegisterCodec,
    /// Time source for poll scheduling.
    clock: Arc<dyn Clock>,
    /// Mutable state; the lock is never held across I/O.
    state: Mutex<RegisterState>,
}

struct RegisterState {
    name: Option<String>,
    description: Option<String>,
    value: Option<Value>,
    last_valid_value: Option<Value>,
    update_interval: Duration,
    connection_settings: ConnectionSettings,
    /// Time of the last poll attempt; `None` before the first attempt.
    update_time_millis: Option<u64>,
    read_fails_in_row: u32,
    change_listener: Option<ChangeListener>,
}

impl Register {
    /// Creates a register mirror bound to a remote collection.
    pub fn new(
        collection: Arc<dyn RegisterCollection>,
        id: RegisterId,
        read_only: bool,
        codec: RegisterCodec,
    ) -> Self {
        Self::with_clock(collection, id, read_only, codec, Arc::new(MonotonicClock))
    }

    /// Creates a register mirror with an explicit time source.
    pub fn with_clock(
        collection: Arc<dyn RegisterCollection>,
        id: RegisterId,
        read_only: bool,
        codec: RegisterCodec,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collection,
            id,
            read_only,
            codec,
            clock,
            state: Mutex::new(RegisterState {
                name: None,
                description: None,
                value: None,
                last_valid_value: None,
                update_interval: DEFAULT_UPDATE_INTERVAL,
                connection_settings: ConnectionSettings::default(),
                update_time_millis: None,
                read_fails_in_row: 0,
                change_listener: None,
            }),
        }
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Reads the remote register and refreshes the cached value.
    ///
    /// This method never returns an error: failures only advance the
    /// register's failure bookkeeping. The change listener is invoked after
    /// the internal lock is released, once per call at most.
    pub async fn update_value(&self) {
        let (old_value, timeout) = {
            let state = self.lock_state();
            (state.value.clone(), state.connection_settings.timeout)
        };

        let listener = match self.read_and_decode(timeout).await {
            Ok(new_value) => {
                let mut state = self.lock_state();
                state.value = Some(new_value.clone());
                state.last_valid_value = Some(new_value.clone());
                state.read_fails_in_row = 0;
                state.update_time_millis = Some(self.clock.now_millis());
                if old_value.as_ref() != Some(&new_value) {
                    state.change_listener.clone()
                } else {
                    None
                }
            }
            Err(error) => {
                tracing::debug!(
                    register = self.id.value(),
                    error = %error,
                    "register update failed"
                );
                let mut state = self.lock_state();
                state.read_fails_in_row += 1;

                let mut listener = None;
                if state.read_fails_in_row >= state.connection_settings.attempts_to_promote_read_fail
                {
                    state.value = None;
                    if old_value.is_some() {
                        listener = state.change_listener.clone();
                    }
                }

                state.update_time_millis = Some(self.clock.now_millis());
                listener
            }
        };

        if let Some(listener) = listener {
            listener(self);
        }
    }

    async fn read_and_decode(&self, timeout: Option<Duration>) -> GepResult<Value> {
        match &self.codec {
            RegisterCodec::Binary(codec) => {
                let remote = self.collection.read_binary(self.id, timeout).await?;
                Ok(codec.decode(&remote)?)
            }
            RegisterCodec::Integer(codec) => {
                let remote = self.collection.read_integer(self.id, timeout).await?;
                Ok(codec.decode(remote)?)
            }
        }
    }

    /// Writes a new value to the remote register.
    ///
    /// Fails immediately on read-only registers. Whatever the outcome of the
    /// write, the cached value is refreshed afterwards so it reflects the
    /// state the device actually holds.
    pub async fn set_value(&self, value: Value) -> GepResult<()> {
        if self.read_only {
            return Err(GepError::ReadOnlyRegister);
        }

        let timeout = self.lock_state().connection_settings.timeout;

        let write_result = match &self.codec {
            RegisterCodec::Integer(codec) => match codec.encode(&value) {
                Ok(remote) => self.collection.write_integer(self.id, remote, timeout).await,
                Err(error) => Err(error.into()),
            },
            RegisterCodec::Binary(codec) => match codec.encode(&value) {
                Ok(remote) => self.collection.write_binary(self.id, &remote, timeout).await,
                Err(error) => Err(error.into()),
            },
        };

        self.update_value().await;

        write_result.map_err(GepError::write_failed)
    }

    /// Returns the milliseconds remaining until the next value update is due;
    /// `0` means the update must run immediately.
    ///
    /// While reads are failing, the regular update interval is tightened to a
    /// retry delay that grows by `retry_read_after_factor` with each
    /// consecutive failure, never exceeding the update interval itself. A
    /// clock reading earlier than the last poll yields `0`.
    pub fn millis_to_next_update(&self) -> u64 {
        let state = self.lock_state();

        let update_time = match state.update_time_millis {
            None => return 0,
            Some(time) => time,
        };

        let mut current_interval = state.update_interval.as_millis() as u64;
        if state.read_fails_in_row > 0 {
            if let Some(retry_after) = state.connection_settings.retry_read_after {
                let factor = state.connection_settings.retry_read_after_factor;
                let mut retry_interval = retry_after.as_millis() as f64;
                if factor >= 1.0 {
                    for _ in 1..state.read_fails_in_row {
                        retry_interval *= factor;
                        if retry_interval > current_interval as f64 {
                            break;
                        }
                    }
                }
                current_interval = current_interval.min(retry_interval.round() as u64);
            }
        }

        let now = self.clock.now_millis();
        match now.checked_sub(update_time) {
            None => 0,
            Some(elapsed) if elapsed >= current_interval => 0,
            Some(elapsed) => current_interval - elapsed,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the identifier of the register.
    pub fn register_id(&self) -> RegisterId {
        self.id
    }

    /// Returns whether the register is read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the type of local values this register holds.
    pub fn value_type(&self) -> ValueType {
        self.codec.value_type()
    }

    /// Returns the remote collection hosting this register.
    pub fn collection(&self) -> &Arc<dyn RegisterCollection> {
        &self.collection
    }

    /// Returns the cached value, or `None` while the value is invalid.
    pub fn value(&self) -> Option<Value> {
        self.lock_state().value.clone()
    }

    /// Returns the most recent valid value ever observed.
    pub fn last_valid_value(&self) -> Option<Value> {
        self.lock_state().last_valid_value.clone()
    }

    /// Returns the name of the register.
    pub fn name(&self) -> Option<String> {
        self.lock_state().name.clone()
    }

    /// Sets the name of the register.
    pub fn set_name(&self, name: impl Into<String>) {
        self.lock_state().name = Some(name.into());
    }

    /// Returns the description of the register.
    pub fn description(&self) -> Option<String> {
        self.lock_state().description.clone()
    }

    /// Sets the description of the register.
    pub fn set_description(&self, description: impl Into<String>) {
        self.lock_state().description = Some(description.into());
    }

    /// Returns the time of the last poll attempt, `None` before the first.
    pub fn update_time_millis(&self) -> Option<u64> {
        self.lock_state().update_time_millis
    }

    /// Returns the interval between two value updates.
    pub fn update_interval(&self) -> Duration {
        self.lock_state().update_interval
    }

    /// Sets the interval between two value updates. The interval must be
    /// positive.
    pub fn set_update_interval(&self, interval: Duration) -> GepResult<()> {
        if interval.is_zero() {
            return Err(gep_core::error::ConfigError::validation(
                "update-interval",
                "interval must be positive",
            )
            .into());
        }
        self.lock_state().update_interval = interval;
        Ok(())
    }

    /// Returns the connection settings.
    pub fn connection_settings(&self) -> ConnectionSettings {
        self.lock_state().connection_settings.clone()
    }

    /// Sets the connection settings.
    pub fn set_connection_settings(&self, settings: ConnectionSettings) {
        self.lock_state().connection_settings = settings;
    }

    /// Returns the change listener, if one is installed.
    pub fn change_listener(&self) -> Option<ChangeListener> {
        self.lock_state().change_listener.clone()
    }

    /// Installs or removes the change listener.
    pub fn set_change_listener(&self, listener: Option<ChangeListener>) {
        self.lock_state().change_listener = listener;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RegisterState> {
        self.state.lock().expect("register state lock poisoned")
    }
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Register")
            .field("id", &self.id.value())
            .field("read_only", &self.read_only)
            .field("value_type", &self.value_type())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
