// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-register communication settings.

use std::time::Duration;

// =============================================================================
// ConnectionSettings
// =============================================================================

/// Settings that control how a register talks to its remote collection.
///
/// The value is immutable; derive modified copies with the `with_*` methods.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gep_core::settings::ConnectionSettings;
///
/// let settings = ConnectionSettings::default()
///     .with_timeout(Some(Duration::from_millis(500)));
/// assert_eq!(settings.timeout, Some(Duration::from_millis(500)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    /// Maximal time to complete a read or write operation. `None` means the
    /// operation has no timeout.
    pub timeout: Option<Duration>,

    /// Delay after a failed read before the next attempt. `None` disables
    /// accelerated retries; the regular update interval applies instead.
    pub retry_read_after: Option<Duration>,

    /// Number of consecutive failed reads after which the cached value is
    /// invalidated. At least 1.
    pub attempts_to_promote_read_fail: u32,

    /// Multiplication factor applied to the retry delay after each failed
    /// read in a row. At least 1.0.
    pub retry_read_after_factor: f64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_millis(2000)),
            retry_read_after: Some(Duration::from_millis(250)),
            attempts_to_promote_read_fail: 2,
            retry_read_after_factor: 2.0,
        }
    }
}

impl ConnectionSettings {
    /// Creates settings from explicit values.
    ///
    /// `attempts_to_promote_read_fail` is raised to at least 1 and the retry
    /// factor to at least 1.0.
    pub fn new(
        timeout: Option<Duration>,
        retry_read_after: Option<Duration>,
        attempts_to_promote_read_fail: u32,
        retry_read_after_factor: f64,
    ) -> Self {
        Self {
            timeout,
            retry_read_after,
            attempts_to_promote_read_fail: attempts_to_promote_read_fail.max(1),
            retry_read_after_factor: retry_read_after_factor.max(1.0),
        }
    }

    /// Returns a copy with a different timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with a different retry delay.
    pub fn with_retry_read_after(mut self, retry_read_after: Option<Duration>) -> Self {
        self.retry_read_after = retry_read_after;
        self
    }

    /// Returns a copy with a different invalidation threshold.
    pub fn with_attempts_to_promote_read_fail(mut self, attempts: u32) -> Self {
        self.attempts_to_promote_read_fail = attempts.max(1);
        self
    }

    /// Returns a copy with a different retry growth factor.
    pub fn with_retry_read_after_factor(mut self, factor: f64) -> Self {
        self.retry_read_after_factor = factor.max(1.0);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.timeout, Some(Duration::from_millis(2000)));
        assert_eq!(settings.retry_read_after, Some(Duration::from_millis(250)));
        assert_eq!(settings.attempts_to_promote_read_fail, 2);
        assert_eq!(settings.retry_read_after_factor, 2.0);
    }

    #[test]
    fn test_builders_keep_other_fields() {
        let settings = ConnectionSettings::default().with_timeout(None);
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.retry_read_after, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_lower_bounds() {
        let settings = ConnectionSettings::new(None, None, 0, 0.5);
        assert_eq!(settings.attempts_to_promote_read_fail, 1);
        assert_eq!(settings.retry_read_after_factor, 1.0);
    }
}
