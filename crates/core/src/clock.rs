// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time.
//!
//! Everything that stamps records or buckets quota counts by calendar day
//! takes a clock instead of calling `Utc::now()` directly, so tests can
//! drive day rollovers deterministically.

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar date as `YYYY-MM-DD`.
    fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}

/// Wall-clock time for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone)]
pub struct FakeClock {
    epoch_ms: std::sync::Arc<std::sync::atomic::AtomicI64>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClock {
    /// Create a clock pinned to an arbitrary fixed instant.
    pub fn new() -> Self {
        // 2026-01-01T00:00:00Z
        Self::at_epoch_ms(1_767_225_600_000)
    }

    pub fn at_epoch_ms(epoch_ms: i64) -> Self {
        Self {
            epoch_ms: std::sync::Arc::new(std::sync::atomic::AtomicI64::new(epoch_ms)),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        self.epoch_ms
            .fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_ms(days * 24 * 60 * 60 * 1000);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.epoch_ms.load(std::sync::atomic::Ordering::SeqCst);
        // In range for any i64 we advance to in tests
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
