//! Transport handle boundary.
//!
//! The cache never owns the remote publication itself, only bookkeeping
//! around a shared reference to one. `RemoteTrack` is the full surface the
//! cache consumes from the session layer: a few state probes and three
//! mutating calls whose failures are logged and swallowed at the call site.

use crate::errors::TransportError;
use crate::types::{TrackKind, TrackSid, VideoQuality};
use std::sync::Arc;

/// An externally-owned remote track publication.
///
/// Implementations are handed in by the session layer; the same logical
/// track may be represented by a new handle object after a transport
/// reconnect, which is why the cache re-validates handle identity against
/// the sid it was registered under.
///
/// Mutating calls are fire-and-forget at the transport level; a returned
/// error means the call was not accepted, never that the cache must stop.
pub trait RemoteTrack: Send + Sync {
    /// Stable sid of this publication, if the transport has assigned one.
    ///
    /// Handles without a sid are ignored by the cache entirely.
    fn sid(&self) -> Option<TrackSid>;

    /// Whether this publication carries audio or video.
    fn kind(&self) -> TrackKind;

    /// Whether data currently flows for this publication.
    fn is_subscribed(&self) -> bool;

    /// Whether a subscribed publication is actively decoded.
    fn is_enabled(&self) -> bool;

    /// Whether the publisher has muted this track.
    fn is_muted(&self) -> bool;

    /// Whether a decoder is attached (a media track object exists).
    fn has_track(&self) -> bool;

    /// Current target quality, video publications only.
    fn video_quality(&self) -> Option<VideoQuality>;

    /// Start or stop data flow.
    fn set_subscribed(&self, subscribed: bool) -> Result<(), TransportError>;

    /// Start or stop decoding of a subscribed publication.
    fn set_enabled(&self, enabled: bool) -> Result<(), TransportError>;

    /// Change the target quality, video publications only.
    fn set_video_quality(&self, quality: VideoQuality) -> Result<(), TransportError>;
}

/// Shared reference to a remote track handle.
pub type TrackHandle = Arc<dyn RemoteTrack>;
