//! Scriptable in-memory `RemoteTrack` for tests.
//!
//! State transitions mimic a real transport: subscribing attaches a decoder
//! (`has_track` becomes true), unsubscribing detaches it. Every mutating
//! call is recorded in order for assertions, and each call kind can be
//! scripted to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use track_cache::{RemoteTrack, TrackKind, TrackSid, TransportError, VideoQuality};
use uuid::Uuid;

/// A fresh unique sid, for tests that churn through many tracks.
pub fn unique_sid(prefix: &str) -> TrackSid {
    TrackSid::new(format!("{prefix}_{}", Uuid::new_v4().simple()))
}

/// One recorded mutating call on a [`MockTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCall {
    /// `set_subscribed` with the given value.
    SetSubscribed(bool),
    /// `set_enabled` with the given value.
    SetEnabled(bool),
    /// `set_video_quality` with the given level.
    SetVideoQuality(VideoQuality),
}

/// Scriptable remote track handle.
pub struct MockTrack {
    sid: Option<TrackSid>,
    kind: TrackKind,
    subscribed: AtomicBool,
    enabled: AtomicBool,
    muted: AtomicBool,
    has_track: AtomicBool,
    quality: Mutex<Option<VideoQuality>>,
    calls: Mutex<Vec<TransportCall>>,
    fail_subscribe: AtomicBool,
    fail_enable: AtomicBool,
    fail_quality: AtomicBool,
}

impl MockTrack {
    /// A video track with the given sid.
    pub fn video(sid: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(Some(TrackSid::new(sid)), TrackKind::Video))
    }

    /// An audio track with the given sid.
    pub fn audio(sid: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(Some(TrackSid::new(sid)), TrackKind::Audio))
    }

    /// A track the transport has not assigned a sid to yet.
    pub fn without_sid(kind: TrackKind) -> Arc<Self> {
        Arc::new(Self::new(None, kind))
    }

    fn new(sid: Option<TrackSid>, kind: TrackKind) -> Self {
        Self {
            sid,
            kind,
            subscribed: AtomicBool::new(false),
            enabled: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            has_track: AtomicBool::new(false),
            quality: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            fail_subscribe: AtomicBool::new(false),
            fail_enable: AtomicBool::new(false),
            fail_quality: AtomicBool::new(false),
        }
    }

    /// Every mutating call recorded so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }

    /// Number of `set_subscribed(true)` calls recorded.
    pub fn subscribe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == TransportCall::SetSubscribed(true))
            .count()
    }

    /// Number of `set_subscribed(false)` calls recorded.
    pub fn unsubscribe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == TransportCall::SetSubscribed(false))
            .count()
    }

    /// Forget all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().expect("mock lock poisoned").clear();
    }

    /// Script the publisher-side mute flag.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    /// Override decoder attachment independent of subscription state.
    pub fn set_has_track(&self, has_track: bool) {
        self.has_track.store(has_track, Ordering::SeqCst);
    }

    /// Make subsequent `set_subscribed` calls fail.
    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `set_enabled` calls fail.
    pub fn fail_enable(&self, fail: bool) {
        self.fail_enable.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `set_video_quality` calls fail.
    pub fn fail_quality(&self, fail: bool) {
        self.fail_quality.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().expect("mock lock poisoned").push(call);
    }
}

impl RemoteTrack for MockTrack {
    fn sid(&self) -> Option<TrackSid> {
        self.sid.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn has_track(&self) -> bool {
        self.has_track.load(Ordering::SeqCst)
    }

    fn video_quality(&self) -> Option<VideoQuality> {
        *self.quality.lock().expect("mock lock poisoned")
    }

    fn set_subscribed(&self, subscribed: bool) -> Result<(), TransportError> {
        self.record(TransportCall::SetSubscribed(subscribed));
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("scripted failure".to_string()));
        }
        self.subscribed.store(subscribed, Ordering::SeqCst);
        // A real transport attaches/detaches the decoder with subscription.
        self.has_track.store(subscribed, Ordering::SeqCst);
        Ok(())
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), TransportError> {
        self.record(TransportCall::SetEnabled(enabled));
        if self.fail_enable.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("scripted failure".to_string()));
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn set_video_quality(&self, quality: VideoQuality) -> Result<(), TransportError> {
        self.record(TransportCall::SetVideoQuality(quality));
        if self.fail_quality.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("scripted failure".to_string()));
        }
        *self.quality.lock().expect("mock lock poisoned") = Some(quality);
        Ok(())
    }
}
