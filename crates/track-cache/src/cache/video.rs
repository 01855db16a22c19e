//! Camera track cache.
//!
//! A [`TrackCacheHandle`] over the [`VideoProfile`]: subscription policy
//! (global video disable, per-participant block set, quality target) is
//! consulted on every queue drain, and `set_policy` re-enqueues every pinned
//! entry so a policy change is applied retroactively without
//! re-registration.

use crate::cache::actor::{TrackCacheActor, TrackCacheHandle};
use crate::config::CacheConfig;
use crate::errors::CacheError;
use crate::metrics::CacheMetrics;
use crate::policy::{SubscriptionPolicy, VideoProfile};
use crate::transport::TrackHandle;
use crate::types::ParticipantIdentity;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Bounded cache of remote camera tracks.
pub struct VideoTrackCache {
    handle: TrackCacheHandle<VideoProfile>,
    task_handle: JoinHandle<()>,
}

impl VideoTrackCache {
    /// Spawn a camera cache with the given configuration.
    #[must_use]
    pub fn spawn(config: CacheConfig) -> Self {
        let (handle, task_handle) = TrackCacheActor::spawn(config, CancellationToken::new());
        Self {
            handle,
            task_handle,
        }
    }

    /// Pin a camera track. See [`TrackCacheHandle::register`].
    pub async fn register(&self, track: TrackHandle, owner: Option<ParticipantIdentity>) {
        self.handle.register(track, owner).await;
    }

    /// Unpin a camera track. See [`TrackCacheHandle::unregister`].
    pub async fn unregister(&self, track: TrackHandle) {
        self.handle.unregister(track).await;
    }

    /// Remove a torn-down track unconditionally.
    pub async fn handle_track_unpublished(&self, track: TrackHandle) {
        self.handle.handle_track_unpublished(track).await;
    }

    /// Replace the subscription policy wholesale and apply it retroactively
    /// to every pinned entry with a known owner.
    pub async fn set_policy(&self, policy: SubscriptionPolicy) {
        self.handle.set_policy(policy).await;
    }

    /// Re-enqueue entries that silently lost subscription state. See
    /// [`TrackCacheHandle::reconcile`].
    pub async fn reconcile(&self) {
        self.handle.reconcile().await;
    }

    /// Tracks the stuck-stream monitor may evaluate.
    pub async fn tracks_to_monitor(&self) -> Vec<TrackHandle> {
        self.handle.tracks_to_monitor().await
    }

    /// Unsubscribe, wait, and resubscribe a track through the serialized
    /// chain.
    pub async fn reset_track(&self, track: TrackHandle) -> Result<(), CacheError> {
        self.handle.reset_track(track).await
    }

    /// Best-effort teardown of every cached track, then stop.
    pub async fn destroy(&self) {
        self.handle.destroy().await;
    }

    /// Clonable handle to the underlying cache task.
    #[must_use]
    pub fn handle(&self) -> TrackCacheHandle<VideoProfile> {
        self.handle.clone()
    }

    /// Counters for this cache instance.
    #[must_use]
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        self.handle.metrics()
    }

    /// Whether the cache task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }
}
