//! Bounded subscription cache: generic task plus the camera and microphone
//! specializations.

pub mod actor;
pub mod audio;
pub mod messages;
pub mod video;

pub use actor::{TrackCacheActor, TrackCacheHandle};
pub use audio::AudioTrackCache;
pub use video::VideoTrackCache;
