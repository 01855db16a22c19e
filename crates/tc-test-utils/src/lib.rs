//! # Track Cache Test Utilities
//!
//! Shared test utilities for the track subscription cache.
//!
//! This crate provides a scriptable in-memory transport handle and probe
//! builders for isolated cache/monitor testing without a real session.
//!
//! ## Modules
//!
//! - `mock_track` - scriptable `RemoteTrack` implementation recording every
//!   mutating call
//! - `probes` - ready-made liveness probe callbacks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tc_test_utils::MockTrack;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let track = MockTrack::video("TR_cam_1");
//!     cache.register(track.clone(), Some(identity("alice"))).await;
//!     // ...
//!     assert_eq!(track.calls(), vec![TransportCall::SetSubscribed(true), ..]);
//! }
//! ```

pub mod mock_track;
pub mod probes;

pub use mock_track::{unique_sid, MockTrack, TransportCall};
pub use probes::{always_stuck_probe, advancing_probe, failing_probe, silent_probe};
