//! Bounded remote-track subscription cache with serialized mutation and
//! stuck-stream monitoring.
//!
//! A real-time media client cannot decode every incoming track; this crate
//! decides which remote publications stay subscribed and enforces that
//! decision against a live transport:
//!
//! - **Capacity with pinning**: a bounded cache per track kind, with
//!   recency-ordered eviction that never removes currently-pinned
//!   (visible) tracks.
//! - **Policy**: global video disable, per-participant block set and a
//!   quality target, replaced wholesale and re-applied retroactively to
//!   every pinned entry.
//! - **Serialized mutation**: every transport-mutating operation runs
//!   through one task mailbox per cache, so overlapping
//!   subscribe/unsubscribe/enable calls for the same track can never race.
//! - **Self-healing**: an independent monitor loop probes decoder progress
//!   counters and revives frozen tracks with bounded, backed-off resets.
//!
//! Which tracks *should* be visible is the caller's decision; the cache
//! only enforces capacity, policy and health on the set it is told about.
//!
//! # Architecture
//!
//! ```text
//! caller ──register/unregister──▶ TrackCacheHandle ──mpsc──▶ cache task
//!                                                             │ entry map
//!                                                             │ recency order
//!                                                             │ work queue
//!                                                             ▼
//!                                                        RemoteTrack calls
//! StuckTrackMonitor ──tracks_to_monitor / reset_track──▶ (same mailbox)
//! ```
//!
//! # Modules
//!
//! - [`cache`] - the generic cache task and the camera/microphone caches
//! - [`monitor`] - the stuck-stream monitor loop
//! - [`policy`] - subscription policy and per-kind profiles
//! - [`transport`] - the externally-owned track handle boundary
//! - [`config`] - cache and monitor configuration from environment
//! - [`errors`] - error types
//! - [`metrics`] - per-instance counters

pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod monitor;
pub mod policy;
pub mod transport;
pub mod types;

pub use cache::{AudioTrackCache, TrackCacheHandle, VideoTrackCache};
pub use config::{CacheConfig, MonitorConfig};
pub use errors::{CacheError, TransportError};
pub use monitor::{
    cache_reset_fn, MonitoredSetFn, ResetFn, StatsProbeFn, StuckTrackMonitor, TrackStatsSample,
};
pub use policy::{AudioProfile, CacheProfile, SubscriptionPolicy, VideoProfile};
pub use transport::{RemoteTrack, TrackHandle};
pub use types::{ParticipantIdentity, TrackKind, TrackSid, VideoQuality};
