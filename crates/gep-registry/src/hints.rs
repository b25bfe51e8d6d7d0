// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration of change-hint probing.
//!
//! Instead of blindly polling every register, the auto-updater can
//! periodically ask a register collection which register changed since its
//! last read. These settings control the probe interval, the probe timeout,
//! and how the probe cadence reacts to useful answers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gep_core::error::{ConfigError, GepResult};

// =============================================================================
// HintStrategy
// =============================================================================

/// Cadence of hint probes relative to their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HintStrategy {
    /// Probe on a fixed period regardless of the answers.
    Simple,
    /// Probe back-to-back while hints name managed registers; fall back to
    /// the period once a probe stops being useful.
    #[default]
    SemiGreedy,
    /// Probe back-to-back while the device names any register at all; fall
    /// back to the period only on an empty answer.
    Greedy,
}

impl HintStrategy {
    /// Decides whether the probe timestamp advances (pausing probing for one
    /// interval) given what the last probe returned.
    pub fn advances_probe_time(&self, hint_returned: bool, hint_for_managed: bool) -> bool {
        match self {
            HintStrategy::Simple => true,
            HintStrategy::SemiGreedy => !hint_for_managed,
            HintStrategy::Greedy => !hint_returned,
        }
    }
}

impl FromStr for HintStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(HintStrategy::Simple),
            "SEMI_GREEDY" => Ok(HintStrategy::SemiGreedy),
            "GREEDY" => Ok(HintStrategy::Greedy),
            other => Err(ConfigError::validation(
                "strategy",
                format!(
                    "unknown hint strategy '{}' (SIMPLE, SEMI_GREEDY, GREEDY expected)",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for HintStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HintStrategy::Simple => "SIMPLE",
            HintStrategy::SemiGreedy => "SEMI_GREEDY",
            HintStrategy::Greedy => "GREEDY",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// HintSettings
// =============================================================================

/// Settings of hint probing for one register collection.
///
/// The probe interval must be positive; the probe timeout may be `None`
/// (wait indefinitely for the probe response).
#[derive(Debug, Clone, PartialEq)]
pub struct HintSettings {
    interval: Duration,
    timeout: Option<Duration>,
    strategy: HintStrategy,
}

impl HintSettings {
    /// Creates settings probing at the given interval with no probe timeout
    /// and the default strategy.
    pub fn new(interval: Duration) -> GepResult<Self> {
        if interval.is_zero() {
            return Err(ConfigError::validation(
                "hints",
                "hint interval must be positive",
            )
            .into());
        }
        Ok(Self {
            interval,
            timeout: None,
            strategy: HintStrategy::default(),
        })
    }

    /// Returns a copy with the given probe timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with the given strategy.
    pub fn with_strategy(mut self, strategy: HintStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the probe interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the probe timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the probe strategy.
    pub fn strategy(&self) -> HintStrategy {
        self.strategy
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("simple".parse::<HintStrategy>().unwrap(), HintStrategy::Simple);
        assert_eq!(
            "Semi_Greedy".parse::<HintStrategy>().unwrap(),
            HintStrategy::SemiGreedy
        );
        assert_eq!("GREEDY".parse::<HintStrategy>().unwrap(), HintStrategy::Greedy);
        assert!("eager".parse::<HintStrategy>().is_err());
    }

    #[test]
    fn test_strategy_default() {
        assert_eq!(HintStrategy::default(), HintStrategy::SemiGreedy);
    }

    #[test]
    fn test_advance_rules() {
        // SIMPLE advances unconditionally.
        assert!(HintStrategy::Simple.advances_probe_time(true, true));
        assert!(HintStrategy::Simple.advances_probe_time(false, false));

        // SEMI_GREEDY keeps probing while hints are useful.
        assert!(!HintStrategy::SemiGreedy.advances_probe_time(true, true));
        assert!(HintStrategy::SemiGreedy.advances_probe_time(true, false));
        assert!(HintStrategy::SemiGreedy.advances_probe_time(false, false));

        // GREEDY keeps probing while the device names anything.
        assert!(!HintStrategy::Greedy.advances_probe_time(true, true));
        assert!(!HintStrategy::Greedy.advances_probe_time(true, false));
        assert!(HintStrategy::Greedy.advances_probe_time(false, false));
    }

    #[test]
    fn test_settings_validation() {
        assert!(HintSettings::new(Duration::ZERO).is_err());

        let settings = HintSettings::new(Duration::from_millis(500))
            .unwrap()
            .with_timeout(Some(Duration::from_millis(200)))
            .with_strategy(HintStrategy::Greedy);
        assert_eq!(settings.interval(), Duration::from_millis(500));
        assert_eq!(settings.timeout(), Some(Duration::from_millis(200)));
        assert_eq!(settings.strategy(), HintStrategy::Greedy);
    }
}
