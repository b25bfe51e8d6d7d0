// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Monotonic millisecond time source.
//!
//! All interval arithmetic in the client (poll scheduling, retry backoff,
//! hint probing, request timeouts) runs against this clock, never against
//! wall-clock time, so DST shifts and NTP adjustments cannot disturb
//! scheduling.

use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

/// Source of monotonic millisecond timestamps.
///
/// Implementations must never go backward. The timestamps carry no absolute
/// meaning; only differences between them are used.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// The process-wide monotonic clock.
///
/// All instances share one anchor taken at first use, so timestamps from
/// different instances are directly comparable.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

impl MonotonicClock {
    /// Creates a clock handle.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        let anchor = ANCHOR.get_or_init(Instant::now);
        anchor.elapsed().as_millis() as u64
    }
}

// =============================================================================
// Tests
// =============================================================================
