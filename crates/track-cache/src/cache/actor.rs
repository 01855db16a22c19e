//! Generic bounded subscription cache task.
//!
//! One task owns all cache state for one track kind. Its mailbox is the
//! serialized operation chain: register, unregister, eviction teardown and
//! reset can never interleave their transport calls, because each runs to
//! completion inside a single message turn. A failed transport call aborts
//! only the item it belongs to; the mailbox keeps draining.
//!
//! # Eviction
//!
//! After every register/unregister the entry count is forced back under
//! capacity by walking the recency order from least- to most-recently
//! touched, skipping pinned entries. If every entry is pinned the cache
//! transiently exceeds capacity; that is accepted, not an error.
//!
//! # Work queue
//!
//! Subscription work is queued per sid and drained FIFO with coalescing:
//! an item is skipped when the same sid appears again later in the queue,
//! so the newest request wins. Items whose owner became unknown or whose
//! handle no longer reports the expected sid are dropped, and a dropped
//! item always clears the entry's `enqueued` flag so the sid can be
//! re-enqueued later.

use crate::cache::messages::CacheMessage;
use crate::config::CacheConfig;
use crate::errors::{CacheError, TransportError};
use crate::metrics::CacheMetrics;
use crate::policy::{CacheProfile, SubscriptionPolicy};
use crate::transport::TrackHandle;
use crate::types::{ParticipantIdentity, TrackSid};

use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// One tracked publication while present in the cache.
struct CacheEntry {
    /// Current handle for this sid; replaced in place when the transport
    /// hands out a new object for the same logical track.
    track: TrackHandle,
    /// True while a caller currently wants this track active.
    pinned: bool,
    /// Publishing participant; subscription work needs this to proceed.
    owner: Option<ParticipantIdentity>,
    /// True while a work item for this sid sits in the queue.
    enqueued: bool,
}

/// Handle to a cache task.
///
/// Cheap to clone; all methods are safe to call after the cache has been
/// destroyed (they become no-ops, or return empty/`Err(Destroyed)` for the
/// request/response operations).
pub struct TrackCacheHandle<P: CacheProfile> {
    sender: mpsc::Sender<CacheMessage>,
    cancel_token: CancellationToken,
    metrics: Arc<CacheMetrics>,
    _profile: PhantomData<P>,
}

impl<P: CacheProfile> Clone for TrackCacheHandle<P> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            cancel_token: self.cancel_token.clone(),
            metrics: Arc::clone(&self.metrics),
            _profile: PhantomData,
        }
    }
}

impl<P: CacheProfile> TrackCacheHandle<P> {
    /// Pin a track and enqueue subscription work for it.
    ///
    /// Handles of the wrong kind or without a sid are ignored. Transport
    /// outcomes are never surfaced to the caller.
    pub async fn register(&self, track: TrackHandle, owner: Option<ParticipantIdentity>) {
        if track.kind() != P::KIND {
            return;
        }
        if self
            .sender
            .send(CacheMessage::Register { track, owner })
            .await
            .is_err()
        {
            debug!(
                target: "tc.cache",
                kind = P::KIND.as_str(),
                "register ignored, cache is gone"
            );
        }
    }

    /// Unpin a track. It stays cached (and subscribed) until evicted or
    /// removed, but is disabled and becomes an eviction candidate.
    pub async fn unregister(&self, track: TrackHandle) {
        if track.kind() != P::KIND {
            return;
        }
        if self
            .sender
            .send(CacheMessage::Unregister { track })
            .await
            .is_err()
        {
            debug!(
                target: "tc.cache",
                kind = P::KIND.as_str(),
                "unregister ignored, cache is gone"
            );
        }
    }

    /// The remote side tore the track down: remove it from every internal
    /// structure regardless of pin state.
    pub async fn handle_track_unpublished(&self, track: TrackHandle) {
        if track.kind() != P::KIND {
            return;
        }
        let Some(sid) = track.sid() else {
            return;
        };
        self.remove_by_sid(sid).await;
    }

    /// Remove a sid from every internal structure, pinned or not.
    pub(crate) async fn remove_by_sid(&self, sid: TrackSid) {
        let _ = self.sender.send(CacheMessage::Remove { sid }).await;
    }

    /// Replace the subscription policy wholesale. Every pinned entry with a
    /// known owner is re-enqueued so the new policy applies retroactively.
    pub async fn set_policy(&self, policy: SubscriptionPolicy) {
        let _ = self.sender.send(CacheMessage::SetPolicy { policy }).await;
    }

    /// Re-enqueue every owned entry whose handle reports unsubscribed, or
    /// subscribed-but-disabled when the policy does not ask for disable.
    ///
    /// A queue item abandoned by a failed transport call is not retried on
    /// its own; driving this periodically picks such entries back up. Sids
    /// still inside a resubscribe cooldown are skipped until a later pass.
    pub async fn reconcile(&self) {
        let _ = self.sender.send(CacheMessage::Reconcile).await;
    }

    /// The subset of cached tracks the stuck-stream monitor may evaluate:
    /// known owner, subscribed, enabled, decoder attached, not muted.
    ///
    /// Returns an empty set if the cache has been destroyed.
    pub async fn tracks_to_monitor(&self) -> Vec<TrackHandle> {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(CacheMessage::TracksToMonitor { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Unsubscribe a track, wait out the reset delay, re-enqueue it and
    /// drain the queue to completion. Serialized with every other mutating
    /// operation; returns once the drain has finished.
    pub async fn reset_track(&self, track: TrackHandle) -> Result<(), CacheError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CacheMessage::ResetTrack {
                track,
                respond_to: tx,
            })
            .await
            .map_err(|_| CacheError::Destroyed)?;
        rx.await.map_err(|_| CacheError::ResponseDropped)
    }

    /// Best-effort disable + unsubscribe of every cached track, then clear
    /// all state and stop the cache task. Never fails.
    pub async fn destroy(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(CacheMessage::Destroy { respond_to: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
        self.cancel_token.cancel();
    }

    /// Counters for this cache instance.
    #[must_use]
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Check whether the cache task has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The cache task implementation.
pub struct TrackCacheActor<P: CacheProfile> {
    config: CacheConfig,
    receiver: mpsc::Receiver<CacheMessage>,
    /// For self-scheduling `DrainQueue` turns.
    self_sender: mpsc::Sender<CacheMessage>,
    cancel_token: CancellationToken,
    /// Entries by sid.
    entries: HashMap<TrackSid, CacheEntry>,
    /// Most-recently-touched first; each live sid at most once.
    recency: VecDeque<TrackSid>,
    /// FIFO sids awaiting transport action.
    work_queue: VecDeque<TrackSid>,
    /// Per-sid earliest moment a resubscribe may be issued.
    cooldowns: HashMap<TrackSid, Instant>,
    policy: SubscriptionPolicy,
    /// True while a `DrainQueue` message is already in the mailbox.
    drain_scheduled: bool,
    /// Set when the mailbox was full and the drain must run inline.
    drain_inline: bool,
    metrics: Arc<CacheMetrics>,
    _profile: PhantomData<P>,
}

impl<P: CacheProfile> TrackCacheActor<P> {
    /// Spawn a cache task for one track kind.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        config: CacheConfig,
        cancel_token: CancellationToken,
    ) -> (TrackCacheHandle<P>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.mailbox_buffer);
        let metrics = CacheMetrics::new();

        let actor = Self {
            config,
            receiver,
            self_sender: sender.clone(),
            cancel_token: cancel_token.clone(),
            entries: HashMap::new(),
            recency: VecDeque::new(),
            work_queue: VecDeque::new(),
            cooldowns: HashMap::new(),
            policy: SubscriptionPolicy::default(),
            drain_scheduled: false,
            drain_inline: false,
            metrics: Arc::clone(&metrics),
            _profile: PhantomData,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = TrackCacheHandle {
            sender,
            cancel_token,
            metrics,
            _profile: PhantomData,
        };

        (handle, task_handle)
    }

    /// Run the cache message loop.
    #[instrument(skip_all, name = "tc.cache", fields(kind = P::KIND.as_str()))]
    async fn run(mut self) {
        info!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            capacity = self.config.capacity,
            "track cache started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    self.teardown().await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            let keep_going = self.handle_message(message).await;
                            if self.drain_inline {
                                self.drain_inline = false;
                                self.drain_queue().await;
                            }
                            if !keep_going {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        info!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            "track cache stopped"
        );
    }

    /// Handle a single message. Returns false once the task must stop.
    async fn handle_message(&mut self, message: CacheMessage) -> bool {
        match message {
            CacheMessage::Register { track, owner } => {
                self.handle_register(track, owner);
            }
            CacheMessage::Unregister { track } => {
                self.handle_unregister(&track);
            }
            CacheMessage::Remove { sid } => {
                self.handle_remove(&sid);
            }
            CacheMessage::SetPolicy { policy } => {
                self.handle_set_policy(policy);
            }
            CacheMessage::DrainQueue => {
                self.drain_scheduled = false;
                self.drain_queue().await;
            }
            CacheMessage::Reconcile => {
                self.handle_reconcile();
            }
            CacheMessage::TracksToMonitor { respond_to } => {
                let _ = respond_to.send(self.tracks_to_monitor());
            }
            CacheMessage::ResetTrack { track, respond_to } => {
                self.handle_reset(&track).await;
                let _ = respond_to.send(());
            }
            CacheMessage::Destroy { respond_to } => {
                self.teardown().await;
                let _ = respond_to.send(());
                return false;
            }
        }
        true
    }

    fn handle_register(&mut self, track: TrackHandle, owner: Option<ParticipantIdentity>) {
        let Some(sid) = track.sid() else {
            return;
        };
        self.metrics.record_registration();

        let needs_work = {
            let entry = self
                .entries
                .entry(sid.clone())
                .and_modify(|e| {
                    // The transport may hand out a new object for the same
                    // logical track; the newest handle wins.
                    e.track = Arc::clone(&track);
                    e.pinned = true;
                })
                .or_insert_with(|| CacheEntry {
                    track: Arc::clone(&track),
                    pinned: true,
                    owner: None,
                    enqueued: false,
                });
            if let Some(owner) = owner {
                entry.owner = Some(owner);
            }
            let needs_work = entry.owner.is_some() && !entry.enqueued;
            if needs_work {
                entry.enqueued = true;
            }
            needs_work
        };

        self.touch(&sid);
        if needs_work {
            self.work_queue.push_back(sid.clone());
            self.schedule_drain();
        }

        debug!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            sid = %sid,
            entries = self.entries.len(),
            "track registered"
        );

        self.run_eviction();
    }

    fn handle_unregister(&mut self, track: &TrackHandle) {
        let Some(sid) = track.sid() else {
            return;
        };

        let disable_target = {
            let Some(entry) = self.entries.get_mut(&sid) else {
                return;
            };
            entry.pinned = false;
            entry.owner = None;
            entry.enqueued = false;
            entry.track.is_subscribed().then(|| Arc::clone(&entry.track))
        };

        self.work_queue.retain(|s| s != &sid);
        // Newest unpinned entry: last to be evicted among the unpinned.
        self.touch(&sid);

        if let Some(track) = disable_target {
            self.transport_call(&sid, "disable", track.set_enabled(false));
        }

        debug!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            sid = %sid,
            "track unregistered"
        );

        self.run_eviction();
    }

    fn handle_remove(&mut self, sid: &TrackSid) {
        self.entries.remove(sid);
        self.recency.retain(|s| s != sid);
        self.work_queue.retain(|s| s != sid);
        self.cooldowns.remove(sid);

        debug!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            sid = %sid,
            "track removed"
        );
    }

    fn handle_set_policy(&mut self, policy: SubscriptionPolicy) {
        self.policy = policy;

        // Re-enqueue pinned entries so the new policy applies without
        // requiring re-registration.
        let stale: Vec<TrackSid> = self
            .entries
            .iter()
            .filter(|(_, e)| e.pinned && e.owner.is_some() && !e.enqueued)
            .map(|(sid, _)| sid.clone())
            .collect();

        for sid in stale {
            if let Some(entry) = self.entries.get_mut(&sid) {
                entry.enqueued = true;
                self.work_queue.push_back(sid);
            }
        }

        if !self.work_queue.is_empty() {
            self.schedule_drain();
        }
    }

    /// Re-enqueue owned entries whose transport state fell behind what the
    /// cache asked for.
    ///
    /// Catches items the drain abandoned after a failed subscribe, and
    /// entries a transport reconnect silently unsubscribed. Sids inside an
    /// active cooldown are left for a later pass so the drain never stalls
    /// on them here.
    fn handle_reconcile(&mut self) {
        let now = Instant::now();
        let stale: Vec<TrackSid> = self
            .entries
            .iter()
            .filter(|(sid, entry)| {
                if entry.enqueued {
                    return false;
                }
                let Some(owner) = &entry.owner else {
                    return false;
                };
                if self
                    .cooldowns
                    .get(*sid)
                    .is_some_and(|until| *until > now)
                {
                    return false;
                }
                !entry.track.is_subscribed()
                    || (!entry.track.is_enabled() && !P::should_disable(&self.policy, owner))
            })
            .map(|(sid, _)| sid.clone())
            .collect();

        if stale.is_empty() {
            return;
        }

        debug!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            count = stale.len(),
            "reconciling entries that lost subscription state"
        );

        for sid in stale {
            if let Some(entry) = self.entries.get_mut(&sid) {
                entry.enqueued = true;
                self.work_queue.push_back(sid);
            }
        }
        self.schedule_drain();
    }

    fn tracks_to_monitor(&self) -> Vec<TrackHandle> {
        self.entries
            .values()
            .filter(|e| {
                e.owner.is_some()
                    && e.track.is_subscribed()
                    && e.track.is_enabled()
                    && e.track.has_track()
                    && !e.track.is_muted()
            })
            .map(|e| Arc::clone(&e.track))
            .collect()
    }

    async fn handle_reset(&mut self, track: &TrackHandle) {
        if track.kind() != P::KIND {
            return;
        }
        let Some(sid) = track.sid() else {
            return;
        };

        info!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            sid = %sid,
            "resetting track"
        );

        self.cooldowns
            .insert(sid.clone(), Instant::now() + self.config.resubscribe_cooldown);
        if self.transport_call(&sid, "unsubscribe", track.set_subscribed(false)) {
            self.metrics.record_unsubscribe();
        }

        tokio::time::sleep(self.config.reset_delay).await;

        if let Some(entry) = self.entries.get_mut(&sid) {
            if entry.owner.is_some() && !entry.enqueued {
                entry.enqueued = true;
                self.work_queue.push_back(sid);
            }
        }

        self.drain_queue().await;
        self.metrics.record_reset();
    }

    /// Best-effort teardown of every cached track, then clear all state.
    async fn teardown(&mut self) {
        let entries: Vec<(TrackSid, TrackHandle)> = self
            .entries
            .drain()
            .map(|(sid, entry)| (sid, entry.track))
            .collect();

        for (sid, track) in entries {
            self.transport_call(&sid, "disable", track.set_enabled(false));
            if self.transport_call(&sid, "unsubscribe", track.set_subscribed(false)) {
                self.metrics.record_unsubscribe();
            }
        }

        self.recency.clear();
        self.work_queue.clear();
        self.cooldowns.clear();
    }

    /// Mark a sid most-recently-touched.
    fn touch(&mut self, sid: &TrackSid) {
        self.recency.retain(|s| s != sid);
        self.recency.push_front(sid.clone());
    }

    /// Drop cooldown entries whose window has passed. Evicted sids that
    /// never re-register would otherwise pin their cooldown forever.
    fn prune_cooldowns(&mut self) {
        let now = Instant::now();
        self.cooldowns.retain(|_, until| *until > now);
    }

    /// Evict unpinned entries, least-recently-touched first, until the count
    /// is within capacity or only pinned entries remain.
    fn run_eviction(&mut self) {
        self.prune_cooldowns();
        while self.entries.len() > self.config.capacity {
            let candidate = self
                .recency
                .iter()
                .rev()
                .find(|sid| self.entries.get(*sid).is_some_and(|e| !e.pinned))
                .cloned();
            let Some(sid) = candidate else {
                // Every entry is pinned; transiently exceeding capacity is
                // accepted.
                break;
            };
            self.evict(&sid);
        }
    }

    fn evict(&mut self, sid: &TrackSid) {
        let Some(entry) = self.entries.remove(sid) else {
            return;
        };
        self.recency.retain(|s| s != sid);
        self.work_queue.retain(|s| s != sid);

        if entry.track.is_subscribed() {
            self.cooldowns
                .insert(sid.clone(), Instant::now() + self.config.resubscribe_cooldown);
            self.transport_call(sid, "disable", entry.track.set_enabled(false));
            if self.transport_call(sid, "unsubscribe", entry.track.set_subscribed(false)) {
                self.metrics.record_unsubscribe();
            }
        }

        self.metrics.record_eviction();
        debug!(
            target: "tc.cache",
            kind = P::KIND.as_str(),
            sid = %sid,
            entries = self.entries.len(),
            "track evicted"
        );
    }

    /// Drain the work queue against the transport, one sid at a time.
    async fn drain_queue(&mut self) {
        while let Some(sid) = self.work_queue.pop_front() {
            if self.work_queue.contains(&sid) {
                // The same sid appears later in the queue; coalesce to the
                // newest request. `enqueued` stays set, the later item
                // clears it.
                continue;
            }

            let Some((track, owner)) = self.take_work_item(&sid) else {
                continue;
            };

            // Wait out any resubscribe cooldown for this sid.
            if let Some(until) = self.cooldowns.get(&sid).copied() {
                let now = Instant::now();
                if until > now {
                    debug!(
                        target: "tc.cache.queue",
                        kind = P::KIND.as_str(),
                        sid = %sid,
                        wait_ms = (until - now).as_millis() as u64,
                        "waiting out resubscribe cooldown"
                    );
                    tokio::time::sleep_until(until).await;
                }
                self.cooldowns.remove(&sid);
            }

            if !track.is_subscribed() {
                if self.transport_call(&sid, "subscribe", track.set_subscribed(true)) {
                    self.metrics.record_subscribe();
                } else {
                    // This item failed; the rest of the queue still runs.
                    continue;
                }
            }

            let disable = P::should_disable(&self.policy, &owner);
            if track.is_enabled() == disable
                && !self.transport_call(
                    &sid,
                    if disable { "disable" } else { "enable" },
                    track.set_enabled(!disable),
                )
            {
                continue;
            }

            if !disable {
                self.transport_call(&sid, "quality", P::apply_quality(&self.policy, track.as_ref()));
            }
        }
    }

    /// Validate a queue item and clear its `enqueued` flag.
    ///
    /// Returns `None` when the entry is gone, the owner is unknown, or the
    /// handle no longer reports the expected sid (the transport swapped
    /// handles mid-flight).
    fn take_work_item(&mut self, sid: &TrackSid) -> Option<(TrackHandle, ParticipantIdentity)> {
        let entry = self.entries.get_mut(sid)?;

        let Some(owner) = entry.owner.clone() else {
            entry.enqueued = false;
            return None;
        };

        if entry.track.sid().as_ref() != Some(sid) {
            entry.enqueued = false;
            warn!(
                target: "tc.cache.queue",
                kind = P::KIND.as_str(),
                sid = %sid,
                "queued handle no longer matches its sid, dropping item"
            );
            return None;
        }

        entry.enqueued = false;
        Some((Arc::clone(&entry.track), owner))
    }

    /// Schedule a queue drain as its own mailbox turn, so that bursts of
    /// registrations coalesce before any transport call fires.
    fn schedule_drain(&mut self) {
        if self.drain_scheduled {
            return;
        }
        match self.self_sender.try_send(CacheMessage::DrainQueue) {
            Ok(()) => self.drain_scheduled = true,
            // Mailbox full: fall back to draining at the end of this turn.
            Err(_) => self.drain_inline = true,
        }
    }

    /// Issue a transport call, swallowing and logging any failure.
    fn transport_call(
        &self,
        sid: &TrackSid,
        op: &'static str,
        result: Result<(), TransportError>,
    ) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                self.metrics.record_transport_failure();
                warn!(
                    target: "tc.cache",
                    kind = P::KIND.as_str(),
                    sid = %sid,
                    op,
                    %error,
                    "transport call failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::VideoProfile;
    use crate::transport::RemoteTrack;
    use crate::types::{TrackKind, VideoQuality};
    use std::time::Duration;

    // `tc_test_utils::MockTrack` cannot be used inside this crate's own
    // `#[cfg(test)]` modules: the dev-dependency cycle gives the lib-test
    // build its own instance of `RemoteTrack`, distinct from the one
    // `MockTrack` implements. This minimal local stand-in mirrors
    // `MockTrack::video`: sid assigned, video kind, unsubscribed.
    struct LocalMockTrack {
        sid: TrackSid,
    }

    impl LocalMockTrack {
        fn video(sid: &str) -> Arc<Self> {
            Arc::new(Self {
                sid: TrackSid::new(sid),
            })
        }
    }

    impl RemoteTrack for LocalMockTrack {
        fn sid(&self) -> Option<TrackSid> {
            Some(self.sid.clone())
        }

        fn kind(&self) -> TrackKind {
            TrackKind::Video
        }

        fn is_subscribed(&self) -> bool {
            false
        }

        fn is_enabled(&self) -> bool {
            false
        }

        fn is_muted(&self) -> bool {
            false
        }

        fn has_track(&self) -> bool {
            false
        }

        fn video_quality(&self) -> Option<VideoQuality> {
            None
        }

        fn set_subscribed(&self, _subscribed: bool) -> Result<(), TransportError> {
            Ok(())
        }

        fn set_enabled(&self, _enabled: bool) -> Result<(), TransportError> {
            Ok(())
        }

        fn set_video_quality(&self, _quality: VideoQuality) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn test_actor() -> TrackCacheActor<VideoProfile> {
        let (sender, receiver) = mpsc::channel(8);
        TrackCacheActor {
            config: CacheConfig::default(),
            receiver,
            self_sender: sender,
            cancel_token: CancellationToken::new(),
            entries: HashMap::new(),
            recency: VecDeque::new(),
            work_queue: VecDeque::new(),
            cooldowns: HashMap::new(),
            policy: SubscriptionPolicy::default(),
            drain_scheduled: false,
            drain_inline: false,
            metrics: CacheMetrics::new(),
            _profile: PhantomData,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cooldowns_are_pruned() {
        let mut actor = test_actor();
        let stale = TrackSid::new("TR_gone");
        actor
            .cooldowns
            .insert(stale.clone(), Instant::now() + Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(600)).await;
        let fresh = TrackSid::new("TR_fresh");
        actor
            .cooldowns
            .insert(fresh.clone(), Instant::now() + Duration::from_millis(500));

        actor.run_eviction();

        assert!(!actor.cooldowns.contains_key(&stale));
        assert!(actor.cooldowns.contains_key(&fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_skips_sids_in_cooldown() {
        let mut actor = test_actor();
        let sid = TrackSid::new("TR_a");
        actor.entries.insert(
            sid.clone(),
            CacheEntry {
                track: LocalMockTrack::video("TR_a"),
                pinned: true,
                owner: Some(ParticipantIdentity::new("alice")),
                enqueued: false,
            },
        );
        actor
            .cooldowns
            .insert(sid.clone(), Instant::now() + Duration::from_secs(2));

        // Unsubscribed but inside the cooldown window: left alone.
        actor.handle_reconcile();
        assert!(actor.work_queue.is_empty());

        tokio::time::advance(Duration::from_secs(3)).await;
        actor.handle_reconcile();
        assert_eq!(actor.work_queue.len(), 1);
        assert!(actor.entries.get(&sid).unwrap().enqueued);
    }
}
