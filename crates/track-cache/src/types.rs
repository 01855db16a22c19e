//! Common data types for the track subscription cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a remote track, stable for the track's lifetime.
///
/// Assigned by the transport; opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackSid(pub String);

impl TrackSid {
    /// Create a track sid from any string-like value.
    #[must_use]
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    /// The sid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a remote participant publishing tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantIdentity(pub String);

impl ParticipantIdentity {
    /// Create a participant identity from any string-like value.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of media a track carries. Fixed per cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Audio track (microphone, screen-share audio).
    Audio,
    /// Video track (camera, screen-share video).
    Video,
}

impl TrackKind {
    /// Returns the kind as a string for log labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

/// Target decode quality for a subscribed video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VideoQuality {
    /// Lowest spatial layer.
    Low,
    /// Middle spatial layer.
    Medium,
    /// Highest spatial layer.
    High,
}
