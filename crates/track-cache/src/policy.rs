//! Subscription policy and per-kind cache profiles.
//!
//! The policy is a plain struct replaced wholesale on every `set_policy`
//! call; there are no partial updates. Kind-specific behavior (whether a
//! policy can disable a track, and how quality targets are applied) lives
//! in the [`CacheProfile`] trait, implemented by the `VideoProfile` and
//! `AudioProfile` marker types and fixed per cache instance.

use crate::errors::TransportError;
use crate::transport::RemoteTrack;
use crate::types::{ParticipantIdentity, TrackKind, VideoQuality};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Caller-supplied subscription policy.
///
/// Replaced as a unit on `set_policy`; the cache re-enqueues every pinned
/// entry with a known owner so the new policy is applied retroactively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPolicy {
    /// Disable decoding of every video track ("disable all incoming video").
    pub disable_all: bool,
    /// Participants whose tracks must not be decoded.
    pub blocked_identities: HashSet<ParticipantIdentity>,
    /// Target quality applied to enabled video tracks, if configured.
    pub target_quality: Option<VideoQuality>,
}

impl SubscriptionPolicy {
    /// Whether this policy blocks the given participant.
    #[must_use]
    pub fn blocks(&self, identity: &ParticipantIdentity) -> bool {
        self.blocked_identities.contains(identity)
    }
}

/// Kind-specific cache behavior, fixed at the type level.
pub trait CacheProfile: Send + Sync + 'static {
    /// The track kind this profile accepts; handles of any other kind are
    /// no-ops for the cache.
    const KIND: TrackKind;

    /// Whether a track owned by `identity` should currently be disabled.
    ///
    /// Consulted on every queue drain; a change in the answer flips the
    /// track's enabled state without unsubscribing it.
    fn should_disable(policy: &SubscriptionPolicy, identity: &ParticipantIdentity) -> bool;

    /// Apply the policy's quality target to a track that is not disabled.
    fn apply_quality(
        policy: &SubscriptionPolicy,
        track: &dyn RemoteTrack,
    ) -> Result<(), TransportError>;
}

/// Camera/video profile: honors the global disable flag, the per-participant
/// block set, and the configured quality target.
#[derive(Debug, Clone, Copy)]
pub struct VideoProfile;

impl CacheProfile for VideoProfile {
    const KIND: TrackKind = TrackKind::Video;

    fn should_disable(policy: &SubscriptionPolicy, identity: &ParticipantIdentity) -> bool {
        policy.disable_all || policy.blocks(identity)
    }

    fn apply_quality(
        policy: &SubscriptionPolicy,
        track: &dyn RemoteTrack,
    ) -> Result<(), TransportError> {
        let Some(target) = policy.target_quality else {
            return Ok(());
        };
        if track.video_quality() == Some(target) {
            return Ok(());
        }
        track.set_video_quality(target)
    }
}

/// Microphone/audio profile: never policy-disabled once subscribed, and has
/// no quality target.
#[derive(Debug, Clone, Copy)]
pub struct AudioProfile;

impl CacheProfile for AudioProfile {
    const KIND: TrackKind = TrackKind::Audio;

    fn should_disable(_policy: &SubscriptionPolicy, _identity: &ParticipantIdentity) -> bool {
        false
    }

    fn apply_quality(
        _policy: &SubscriptionPolicy,
        _track: &dyn RemoteTrack,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn blocked(identity: &str) -> SubscriptionPolicy {
        SubscriptionPolicy {
            disable_all: false,
            blocked_identities: HashSet::from([ParticipantIdentity::new(identity)]),
            target_quality: None,
        }
    }

    #[test]
    fn test_video_profile_disable_all() {
        let policy = SubscriptionPolicy {
            disable_all: true,
            ..Default::default()
        };
        assert!(VideoProfile::should_disable(
            &policy,
            &ParticipantIdentity::new("alice")
        ));
    }

    #[test]
    fn test_video_profile_block_list() {
        let policy = blocked("bob");
        assert!(VideoProfile::should_disable(
            &policy,
            &ParticipantIdentity::new("bob")
        ));
        assert!(!VideoProfile::should_disable(
            &policy,
            &ParticipantIdentity::new("alice")
        ));
    }

    #[test]
    fn test_audio_profile_never_disables() {
        let policy = SubscriptionPolicy {
            disable_all: true,
            blocked_identities: HashSet::from([ParticipantIdentity::new("bob")]),
            target_quality: None,
        };
        assert!(!AudioProfile::should_disable(
            &policy,
            &ParticipantIdentity::new("bob")
        ));
    }

    #[test]
    fn test_policy_wholesale_replace_semantics() {
        let a = blocked("bob");
        let b = SubscriptionPolicy::default();
        // Replacing a with b must drop the block list entirely.
        assert!(a.blocks(&ParticipantIdentity::new("bob")));
        assert!(!b.blocks(&ParticipantIdentity::new("bob")));
    }
}
