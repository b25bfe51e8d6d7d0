// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request statistics.
//!
//! Every register collection owns one [`RequestStatistics`] instance that
//! counts the requests issued on its behalf. All operations are thread-safe
//! and a snapshot always observes a consistent `(total, failed)` pair.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

// =============================================================================
// RequestStatistics
// =============================================================================

/// Thread-safe counters of total and failed requests.
///
/// # Examples
///
/// ```
/// use gep_core::stats::RequestStatistics;
///
/// let stats = RequestStatistics::new();
/// stats.count_request(false);
/// stats.count_request(true);
///
/// let snapshot = stats.snapshot();
/// assert_eq!(snapshot.total, 2);
/// assert_eq!(snapshot.failed, 1);
/// ```
#[derive(Debug, Default)]
pub struct RequestStatistics {
    counters: Mutex<Counters>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    total: u64,
    failed: u64,
}

impl RequestStatistics {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request.
    pub fn count_request(&self, failed: bool) {
        let mut counters = self.counters.lock().expect("statistics lock poisoned");
        counters.total += 1;
        if failed {
            counters.failed += 1;
        }
    }

    /// Resets both counters to zero.
    pub fn reset(&self) {
        let mut counters = self.counters.lock().expect("statistics lock poisoned");
        *counters = Counters::default();
    }

    /// Returns the total number of requests.
    pub fn total(&self) -> u64 {
        self.counters.lock().expect("statistics lock poisoned").total
    }

    /// Returns the number of failed requests.
    pub fn failed(&self) -> u64 {
        self.counters.lock().expect("statistics lock poisoned").failed
    }

    /// Returns a consistent snapshot of both counters.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let counters = *self.counters.lock().expect("statistics lock poisoned");
        StatisticsSnapshot {
            total: counters.total,
            failed: counters.failed,
        }
    }
}

/// A point-in-time copy of request statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Total number of requests.
    pub total: u64,
    /// Number of failed requests.
    pub failed: u64,
}

impl StatisticsSnapshot {
    /// Returns the success rate in `0.0..=1.0`; `1.0` when no requests ran.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.total - self.failed) as f64 / self.total as f64
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counting() {
        let stats = RequestStatistics::new();
        stats.count_request(false);
        stats.count_request(false);
        stats.count_request(true);

        assert_eq!(stats.total(), 3);
        assert_eq!(stats.failed(), 1);
    }

    #[test]
    fn test_reset() {
        let stats = RequestStatistics::new();
        stats.count_request(true);
        stats.reset();

        assert_eq!(stats.total(), 0);
        assert_eq!(stats.failed(), 0);
    }

    #[test]
    fn test_snapshot_invariant() {
        let stats = RequestStatistics::new();
        stats.count_request(true);
        stats.count_request(false);

        let snapshot = stats.snapshot();
        assert!(snapshot.failed <= snapshot.total);
        assert_eq!(snapshot.success_rate(), 0.5);
    }

    #[test]
    fn test_concurrent_counting() {
        let stats = Arc::new(RequestStatistics::new());
        let mut handles = Vec::new();
        for worker in 0..4 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for i in 0..250 {
                    stats.count_request((i + worker) % 2 == 0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 1000);
        assert_eq!(snapshot.failed, 500);
    }
}
