// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gateway and register-collection contracts.
//!
//! These traits are the seam between the polling layer (`gep-registry`) and
//! the protocol layer (`gep-gateway`): registers and the auto-updater only
//! ever talk to `dyn RegisterCollection`, so scheduling logic can be tested
//! against scripted collections without any transport.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GepResult;
use crate::stats::RequestStatistics;
use crate::types::RegisterId;

// =============================================================================
// Gateway
// =============================================================================

/// A client-side object owning one transport session to remote registers.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Starts the gateway session. May block until the underlying transport
    /// is established.
    async fn start(&self) -> GepResult<()>;

    /// Stops the gateway session.
    ///
    /// With `wait` set, the call returns only after the session has
    /// terminated; otherwise stopping is best-effort.
    async fn stop(&self, wait: bool) -> GepResult<()>;

    /// Returns whether the gateway session is running.
    fn is_running(&self) -> bool;
}

// =============================================================================
// RegisterCollection
// =============================================================================

/// Access to a remote collection (group) of registers hosted by one device.
///
/// All operations take an optional timeout; `None` means the operation waits
/// indefinitely for its response.
#[async_trait]
pub trait RegisterCollection: Send + Sync {
    /// Reads the value of an integer register.
    async fn read_integer(
        &self,
        register: RegisterId,
        timeout: Option<Duration>,
    ) -> GepResult<i32>;

    /// Writes a value to an integer register.
    async fn write_integer(
        &self,
        register: RegisterId,
        value: i32,
        timeout: Option<Duration>,
    ) -> GepResult<()>;

    /// Reads the value of a binary register.
    async fn read_binary(
        &self,
        register: RegisterId,
        timeout: Option<Duration>,
    ) -> GepResult<Vec<u8>>;

    /// Writes a value to a binary register.
    async fn write_binary(
        &self,
        register: RegisterId,
        value: &[u8],
        timeout: Option<Duration>,
    ) -> GepResult<()>;

    /// Reads a change hint: the id of a register whose value changed since it
    /// was last read, or `None` when the device has nothing to report.
    ///
    /// A `confirmed` id tells the device that the client is aware of that
    /// register's change even though it was not read, allowing the device to
    /// surface the next pending hint.
    async fn change_hint(
        &self,
        confirmed: Option<RegisterId>,
        timeout: Option<Duration>,
    ) -> GepResult<Option<RegisterId>>;

    /// Returns the request statistics of this collection.
    fn statistics(&self) -> &RequestStatistics;
}
