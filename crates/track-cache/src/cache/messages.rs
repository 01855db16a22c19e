//! Messages accepted by the cache task mailbox.
//!
//! The mailbox is the serialized operation chain: every transport-mutating
//! operation (register-triggered subscribe, unregister-triggered disable,
//! eviction teardown, reset) runs inside exactly one of these messages, one
//! at a time, in submission order.

use crate::policy::SubscriptionPolicy;
use crate::transport::TrackHandle;
use crate::types::{ParticipantIdentity, TrackSid};
use tokio::sync::oneshot;

/// A message to the cache task.
pub enum CacheMessage {
    /// Pin a track and enqueue subscription work for it.
    Register {
        /// Publication handle from the session layer.
        track: TrackHandle,
        /// Publishing participant, if known at registration time.
        owner: Option<ParticipantIdentity>,
    },

    /// Unpin a track; it stays cached but becomes eviction-eligible.
    Unregister {
        /// Publication handle from the session layer.
        track: TrackHandle,
    },

    /// Remove a track from every internal structure, pinned or not.
    Remove {
        /// Sid of the departed track.
        sid: TrackSid,
    },

    /// Replace the subscription policy wholesale and re-enqueue pinned
    /// entries so it applies retroactively.
    SetPolicy {
        /// The new policy.
        policy: SubscriptionPolicy,
    },

    /// Drain the pending work queue against the transport.
    ///
    /// Self-scheduled; at most one is outstanding at a time.
    DrainQueue,

    /// Re-enqueue owned entries that silently lost subscription (or lost
    /// their enabled state without the policy asking for it).
    Reconcile,

    /// Collect the entries the stuck-stream monitor may evaluate.
    TracksToMonitor {
        /// Receives the monitored subset.
        respond_to: oneshot::Sender<Vec<TrackHandle>>,
    },

    /// Unsubscribe a track, wait out the cooldown path, and resubscribe it.
    ResetTrack {
        /// Publication handle to reset.
        track: TrackHandle,
        /// Resolved once the queue has drained to completion.
        respond_to: oneshot::Sender<()>,
    },

    /// Best-effort teardown of every cached track, then stop the task.
    Destroy {
        /// Resolved once teardown has finished.
        respond_to: oneshot::Sender<()>,
    },
}
