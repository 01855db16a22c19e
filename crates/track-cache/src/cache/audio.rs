//! Microphone track cache.
//!
//! A [`TrackCacheHandle`] over the [`AudioProfile`] plus an exclusively
//! owned reverse map from sid to the publishing participant. Audio is never
//! policy-disabled once subscribed and carries no quality target.

use crate::cache::actor::{TrackCacheActor, TrackCacheHandle};
use crate::config::CacheConfig;
use crate::errors::CacheError;
use crate::metrics::CacheMetrics;
use crate::policy::AudioProfile;
use crate::transport::TrackHandle;
use crate::types::{ParticipantIdentity, TrackSid};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Bounded cache of remote microphone tracks.
pub struct AudioTrackCache {
    handle: TrackCacheHandle<AudioProfile>,
    task_handle: JoinHandle<()>,
    /// Sid to publishing participant; kept in lockstep with registrations.
    participants: Mutex<HashMap<TrackSid, ParticipantIdentity>>,
}

impl AudioTrackCache {
    /// Spawn a microphone cache with the given configuration.
    #[must_use]
    pub fn spawn(config: CacheConfig) -> Self {
        let (handle, task_handle) = TrackCacheActor::spawn(config, CancellationToken::new());
        Self {
            handle,
            task_handle,
            participants: Mutex::new(HashMap::new()),
        }
    }

    /// Pin a microphone track, recording which participant publishes it.
    pub async fn register_with_participant(
        &self,
        track: TrackHandle,
        participant: ParticipantIdentity,
    ) {
        if let Some(sid) = track.sid() {
            if let Ok(mut map) = self.participants.lock() {
                map.insert(sid, participant.clone());
            }
        }
        self.handle.register(track, Some(participant)).await;
    }

    /// The participant publishing the given sid, if registered.
    #[must_use]
    pub fn participant_for(&self, sid: &TrackSid) -> Option<ParticipantIdentity> {
        self.participants
            .lock()
            .ok()
            .and_then(|map| map.get(sid).cloned())
    }

    /// Unpin a microphone track and forget its participant mapping.
    pub async fn unregister(&self, track: TrackHandle) {
        if let Some(sid) = track.sid() {
            if let Ok(mut map) = self.participants.lock() {
                map.remove(&sid);
            }
        }
        self.handle.unregister(track).await;
    }

    /// Remove a torn-down track unconditionally, mapping included.
    pub async fn handle_track_unpublished(&self, track: TrackHandle) {
        if let Some(sid) = track.sid() {
            if let Ok(mut map) = self.participants.lock() {
                map.remove(&sid);
            }
        }
        self.handle.handle_track_unpublished(track).await;
    }

    /// Remove every cached track published by a departed participant.
    pub async fn remove_participant(&self, participant: &ParticipantIdentity) {
        let sids: Vec<TrackSid> = match self.participants.lock() {
            Ok(mut map) => {
                let sids: Vec<TrackSid> = map
                    .iter()
                    .filter(|(_, p)| *p == participant)
                    .map(|(sid, _)| sid.clone())
                    .collect();
                for sid in &sids {
                    map.remove(sid);
                }
                sids
            }
            Err(_) => Vec::new(),
        };

        for sid in sids {
            self.handle.remove_by_sid(sid).await;
        }
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

    /// Best-effort teardown of every cached track, then stop. Clears the
    /// participant map wholesale.
    pub async fn destroy(&self) {
        if let Ok(mut map) = self.participants.lock() {
            map.clear();
        }
        self.handle.destroy().await;
    }

    /// Clonable handle to the underlying cache task.
    #[must_use]
    pub fn handle(&self) -> TrackCacheHandle<AudioProfile> {
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
