//! Error types for the track subscription cache.
//!
//! Nothing in this crate propagates transport failures to the caller of
//! `register`/`unregister`/`destroy`; these types exist for logging at the
//! point of failure and for the few request/response operations that can
//! observe a dead cache task.

use thiserror::Error;

/// Failure reported by a transport handle's mutating calls.
///
/// Every `set_subscribed`/`set_enabled`/`set_video_quality` call site wraps
/// the error, logs it, and moves on to the next queued item.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport rejected the call (session closed, permission revoked).
    #[error("transport rejected call: {0}")]
    Rejected(String),

    /// The underlying track or session no longer exists.
    #[error("track gone: {0}")]
    TrackGone(String),

    /// Any other transport-side failure.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Cache-side errors, visible only to request/response operations
/// (`tracks_to_monitor`, `reset_track`) when the cache task is gone.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache actor has shut down and its mailbox is closed.
    #[error("cache has been destroyed")]
    Destroyed,

    /// The cache actor dropped the response channel.
    #[error("cache response channel closed")]
    ResponseDropped,
}
