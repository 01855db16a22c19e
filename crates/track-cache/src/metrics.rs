//! Cache and monitor counters.
//!
//! Plain atomics shared behind an `Arc`; cheap enough to bump from the hot
//! path and readable from tests and health reporting without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one cache instance.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    registrations: AtomicU64,
    evictions: AtomicU64,
    subscribes: AtomicU64,
    unsubscribes: AtomicU64,
    transport_failures: AtomicU64,
    resets: AtomicU64,
}

impl CacheMetrics {
    /// Create a fresh, shareable counter set.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record an accepted `register` call.
    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an entry removed by capacity eviction.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a `set_subscribed(true)` issued to the transport.
    pub fn record_subscribe(&self) {
        self.subscribes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a `set_subscribed(false)` issued to the transport.
    pub fn record_unsubscribe(&self) {
        self.unsubscribes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed transport call (the item was skipped, not retried).
    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed track reset sequence.
    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Accepted `register` calls.
    #[must_use]
    pub fn registrations(&self) -> u64 {
        self.registrations.load(Ordering::Relaxed)
    }

    /// Entries removed by capacity eviction.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Subscribe calls issued.
    #[must_use]
    pub fn subscribes(&self) -> u64 {
        self.subscribes.load(Ordering::Relaxed)
    }

    /// Unsubscribe calls issued.
    #[must_use]
    pub fn unsubscribes(&self) -> u64 {
        self.unsubscribes.load(Ordering::Relaxed)
    }

    /// Transport calls that failed and were skipped.
    #[must_use]
    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    /// Completed reset sequences.
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }
}
