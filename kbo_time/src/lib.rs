//! Time provider abstraction.
//!
//! Every component that stamps `started_at`/`completed_at` on an [`ImportJob`](kbo_types) or
//! needs "now" for a stale-lock check takes an explicit [`Time`] value rather than calling
//! `chrono::Utc::now()` itself. Callers obtain that value from a [`TimeProvider`] — production
//! callers from [`SystemProvider`] (or [`Time::now`] directly), tests from [`MockProvider`] — so
//! timestamp-sensitive behavior can be frozen and advanced deterministically without threading
//! the provider through every function signature.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self, clippy::clone_on_ref_ptr)]

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// A UTC point in time.
///
/// Thin wrapper around [`chrono::DateTime<Utc>`] so the rest of the workspace depends on this
/// crate rather than on `chrono` directly for job timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(DateTime<Utc>);

impl Time {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Construct from a Unix timestamp (seconds, nanoseconds).
    pub fn from_timestamp(secs: i64, nanos: u32) -> Self {
        Self(
            DateTime::from_timestamp(secs, nanos)
                .expect("timestamp within chrono's representable range"),
        )
    }

    /// The underlying [`chrono::DateTime<Utc>`].
    pub fn date_time(&self) -> DateTime<Utc> {
        self.0
    }

    /// Duration elapsed between `self` and `other` (`other` assumed to be later).
    pub fn elapsed_since(&self, other: Self) -> Duration {
        other.0 - self.0
    }

    /// `self` advanced by `delta`.
    pub fn checked_add(&self, delta: Duration) -> Option<Self> {
        self.0.checked_add_signed(delta).map(Self)
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Something that can report the current time.
///
/// Implemented by [`SystemProvider`] for production and [`MockProvider`] for tests.
pub trait TimeProvider: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Time;
}

/// A [`TimeProvider`] that returns the actual wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider {}

impl SystemProvider {
    /// Create a new [`SystemProvider`].
    pub fn new() -> Self {
        Self {}
    }
}

impl TimeProvider for SystemProvider {
    fn now(&self) -> Time {
        Time::now()
    }
}

/// A [`TimeProvider`] that returns a fixed, explicitly advanceable time.
///
/// Used in tests so that timestamp-sensitive behavior (the stale-lock sweeper's "running for
/// longer than N minutes" check) can be exercised without sleeping.
#[derive(Debug)]
pub struct MockProvider {
    now: Mutex<Time>,
}

impl MockProvider {
    /// Create a new [`MockProvider`] fixed at `start`.
    pub fn new(start: Time) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Set the provider's current time.
    pub fn set(&self, time: Time) {
        *self.now.lock() = time;
    }

    /// Advance the provider's current time by `delta`.
    pub fn inc(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now = now.checked_add(delta).expect("time overflow in MockProvider");
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> Time {
        *self.now.lock()
    }
}

/// Convenience constructor used throughout tests: a [`TimeProvider`] fixed at the Unix epoch.
pub fn mock_at_epoch() -> Arc<MockProvider> {
    Arc::new(MockProvider::new(Time::from_timestamp(0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_advances_on_inc() {
        let provider = MockProvider::new(Time::from_timestamp(0, 0));
        assert_eq!(provider.now(), Time::from_timestamp(0, 0));

        provider.inc(Duration::seconds(90));
        assert_eq!(provider.now(), Time::from_timestamp(90, 0));
    }

    #[test]
    fn mock_provider_set_is_absolute() {
        let provider = MockProvider::new(Time::from_timestamp(0, 0));
        provider.set(Time::from_timestamp(1_000, 0));
        assert_eq!(provider.now(), Time::from_timestamp(1_000, 0));
    }

    #[test]
    fn system_provider_reports_increasing_time() {
        let provider = SystemProvider::new();
        let a = provider.now();
        let b = provider.now();
        assert!(b >= a);
    }
}
