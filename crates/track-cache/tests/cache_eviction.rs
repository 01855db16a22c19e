//! Capacity, pinning, LRU ordering, cooldown and removal behavior of the
//! video cache.
//!
//! Uses tokio's paused-clock test mode so cooldown waits inside the cache
//! task fast-forward deterministically.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::time::Duration;

use tc_test_utils::{MockTrack, TransportCall};
use track_cache::{CacheConfig, ParticipantIdentity, RemoteTrack, TrackKind, VideoTrackCache};

fn identity(name: &str) -> Option<ParticipantIdentity> {
    Some(ParticipantIdentity::new(name))
}

fn small_cache(capacity: usize) -> VideoTrackCache {
    VideoTrackCache::spawn(CacheConfig::default().with_capacity(capacity))
}

/// Wait until every previously submitted message, including the
/// self-scheduled queue drain, has been processed.
async fn settle(cache: &VideoTrackCache) {
    // First round-trip flushes the mailbox up to the drain message, the
    // second flushes the drain itself.
    let _ = cache.tracks_to_monitor().await;
    let _ = cache.tracks_to_monitor().await;
}

#[tokio::test(start_paused = true)]
async fn test_register_subscribes_and_enables() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;

    assert!(track.is_subscribed());
    assert!(track.is_enabled());
    assert_eq!(
        track.calls(),
        vec![
            TransportCall::SetSubscribed(true),
            TransportCall::SetEnabled(true)
        ]
    );
    assert_eq!(cache.tracks_to_monitor().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_register_without_owner_is_held_but_not_subscribed() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    cache.register(track.clone(), None).await;
    settle(&cache).await;

    assert!(!track.is_subscribed());
    assert!(track.calls().is_empty());
    // Held in the cache, but invisible to the monitor.
    assert!(cache.tracks_to_monitor().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wrong_kind_is_a_no_op() {
    let cache = small_cache(4);
    let track = MockTrack::audio("TR_mic");

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;

    assert!(track.calls().is_empty());
    assert!(cache.tracks_to_monitor().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_sid_is_a_no_op() {
    let cache = small_cache(4);
    let track = MockTrack::without_sid(TrackKind::Video);

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;

    assert!(track.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lru_eviction_of_unpinned_entry() {
    let cache = small_cache(1);
    let a = MockTrack::video("TR_a");
    let b = MockTrack::video("TR_b");

    cache.register(a.clone(), identity("alice")).await;
    settle(&cache).await;
    assert!(a.is_subscribed());

    cache.unregister(a.clone()).await;
    settle(&cache).await;
    // Unregister disables but keeps the subscription.
    assert!(a.is_subscribed());
    assert!(!a.is_enabled());

    cache.register(b.clone(), identity("bob")).await;
    settle(&cache).await;

    // A was the only unpinned entry: evicted with disable + unsubscribe.
    assert_eq!(a.unsubscribe_count(), 1);
    assert!(!a.is_subscribed());
    assert!(b.is_subscribed());

    let monitored = cache.tracks_to_monitor().await;
    assert_eq!(monitored.len(), 1);
    assert_eq!(monitored.first().unwrap().sid(), b.sid());
}

#[tokio::test(start_paused = true)]
async fn test_pinned_entries_are_never_evicted() {
    let cache = small_cache(1);
    let a = MockTrack::video("TR_a");
    let b = MockTrack::video("TR_b");

    cache.register(a.clone(), identity("alice")).await;
    cache.register(b.clone(), identity("bob")).await;
    settle(&cache).await;

    // Over capacity, but both pinned: the cache transiently exceeds its
    // bound instead of evicting a visible track.
    assert!(a.is_subscribed());
    assert!(b.is_subscribed());
    assert_eq!(a.unsubscribe_count(), 0);
    assert_eq!(b.unsubscribe_count(), 0);
    assert_eq!(cache.tracks_to_monitor().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unpinned_entry_is_recency_touched_on_unregister() {
    let cache = small_cache(2);
    let a = MockTrack::video("TR_a");
    let b = MockTrack::video("TR_b");
    let c = MockTrack::video("TR_c");

    cache.register(a.clone(), identity("alice")).await;
    cache.register(b.clone(), identity("bob")).await;
    settle(&cache).await;

    // Unpin both; A first, then B. B is now the newest unpinned entry.
    cache.unregister(a.clone()).await;
    cache.unregister(b.clone()).await;

    cache.register(c.clone(), identity("carol")).await;
    settle(&cache).await;

    // A, the least recently touched unpinned entry, goes first.
    assert_eq!(a.unsubscribe_count(), 1);
    assert_eq!(b.unsubscribe_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unpinning_over_capacity_evicts_down_to_the_bound() {
    let cache = small_cache(3);
    let tracks: Vec<_> = (0..5)
        .map(|_| {
            let sid = tc_test_utils::unique_sid("TR_cam");
            MockTrack::video(sid.as_str())
        })
        .collect();

    for track in &tracks {
        cache.register(track.clone(), identity("alice")).await;
    }
    settle(&cache).await;
    // All five pinned, so the cache sits over capacity.
    assert_eq!(cache.tracks_to_monitor().await.len(), 5);

    // Unpinning restores eviction pressure track by track.
    cache.unregister(tracks[0].clone()).await;
    cache.unregister(tracks[1].clone()).await;
    settle(&cache).await;

    assert_eq!(tracks[0].unsubscribe_count(), 1);
    assert_eq!(tracks[1].unsubscribe_count(), 1);
    assert_eq!(cache.tracks_to_monitor().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unpublish_removes_unconditionally() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;
    assert_eq!(cache.tracks_to_monitor().await.len(), 1);

    // Pinned and subscribed, removed anyway.
    cache.handle_track_unpublished(track.clone()).await;
    settle(&cache).await;
    assert!(cache.tracks_to_monitor().await.is_empty());

    // A fresh registration of the same sid behaves as brand new; the
    // transport hands out a new handle object for it.
    let reborn = MockTrack::video("TR_a");
    cache.register(reborn.clone(), identity("alice")).await;
    settle(&cache).await;
    assert_eq!(reborn.subscribe_count(), 1);
    assert_eq!(cache.tracks_to_monitor().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resubscribe_cooldown_defers_subscribe() {
    let cache = small_cache(1);
    let a = MockTrack::video("TR_a");
    let b = MockTrack::video("TR_b");

    cache.register(a.clone(), identity("alice")).await;
    settle(&cache).await;
    assert_eq!(a.subscribe_count(), 1);

    // Evict A under capacity pressure; the eviction unsubscribe records a
    // cooldown for its sid.
    cache.unregister(a.clone()).await;
    cache.register(b.clone(), identity("bob")).await;
    settle(&cache).await;
    assert_eq!(a.unsubscribe_count(), 1);

    // Re-register A within the cooldown window; pinning B keeps both alive.
    cache.register(a.clone(), identity("alice")).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(Duration::from_millis(100)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    // Still inside the 500ms window: no resubscribe yet.
    assert_eq!(a.subscribe_count(), 1);

    tokio::time::advance(Duration::from_millis(500)).await;
    settle(&cache).await;
    assert_eq!(a.subscribe_count(), 2);
    assert!(a.is_subscribed());
}

#[tokio::test(start_paused = true)]
async fn test_queue_coalescing_single_subscribe() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    // Two registrations in the same burst, before the queue drains.
    cache.register(track.clone(), identity("alice")).await;
    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;

    assert_eq!(track.subscribe_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_does_not_stall_the_queue() {
    let cache = small_cache(4);
    let bad = MockTrack::video("TR_bad");
    let good = MockTrack::video("TR_good");
    bad.fail_subscribe(true);

    cache.register(bad.clone(), identity("alice")).await;
    cache.register(good.clone(), identity("bob")).await;
    settle(&cache).await;

    // The failing item was skipped; the next one still ran.
    assert!(!bad.is_subscribed());
    assert!(good.is_subscribed());
    assert_eq!(cache.metrics().transport_failures(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconcile_retries_an_abandoned_subscribe() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");
    track.fail_subscribe(true);

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;
    assert!(!track.is_subscribed());

    // The failed item is abandoned; nothing retries it on its own.
    track.fail_subscribe(false);
    settle(&cache).await;
    assert!(!track.is_subscribed());

    cache.reconcile().await;
    settle(&cache).await;

    assert!(track.is_subscribed());
    assert!(track.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_reconcile_reenables_a_silently_disabled_entry() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;
    assert!(track.is_enabled());
    track.clear_calls();

    // The transport dropped the enabled state behind the cache's back.
    let _ = track.set_enabled(false);
    track.clear_calls();

    cache.reconcile().await;
    settle(&cache).await;

    assert!(track.is_enabled());
    assert_eq!(track.calls(), vec![TransportCall::SetEnabled(true)]);
}

#[tokio::test(start_paused = true)]
async fn test_reconcile_leaves_healthy_and_unpinned_entries_alone() {
    let cache = small_cache(4);
    let healthy = MockTrack::video("TR_healthy");
    let unpinned = MockTrack::video("TR_unpinned");

    cache.register(healthy.clone(), identity("alice")).await;
    cache.register(unpinned.clone(), identity("bob")).await;
    settle(&cache).await;
    cache.unregister(unpinned.clone()).await;
    settle(&cache).await;
    healthy.clear_calls();
    unpinned.clear_calls();

    cache.reconcile().await;
    settle(&cache).await;

    // The healthy entry gets no calls; the unpinned one was disabled on
    // purpose and stays that way.
    assert!(healthy.calls().is_empty());
    assert!(unpinned.calls().is_empty());
    assert!(!unpinned.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_muted_tracks_are_invisible_to_the_monitor() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;
    assert_eq!(cache.tracks_to_monitor().await.len(), 1);

    track.set_muted(true);
    assert!(cache.tracks_to_monitor().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reset_track_unsubscribes_then_resubscribes() {
    let cache = small_cache(4);
    let track = MockTrack::video("TR_a");

    cache.register(track.clone(), identity("alice")).await;
    settle(&cache).await;
    track.clear_calls();

    cache.reset_track(track.clone()).await.unwrap();

    let calls = track.calls();
    assert_eq!(calls.first(), Some(&TransportCall::SetSubscribed(false)));
    assert!(calls.contains(&TransportCall::SetSubscribed(true)));
    assert!(track.is_subscribed());
    assert!(track.is_enabled());
    assert_eq!(cache.metrics().resets(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_tears_down_everything() {
    let cache = small_cache(4);
    let a = MockTrack::video("TR_a");
    let b = MockTrack::video("TR_b");

    cache.register(a.clone(), identity("alice")).await;
    cache.register(b.clone(), identity("bob")).await;
    settle(&cache).await;

    cache.destroy().await;

    assert!(!a.is_subscribed());
    assert!(!b.is_subscribed());
    assert!(cache.tracks_to_monitor().await.is_empty());

    // Further calls are swallowed no-ops.
    let late = MockTrack::video("TR_late");
    cache.register(late.clone(), identity("carol")).await;
    assert!(late.calls().is_empty());
    assert!(cache.reset_track(late).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_eviction_metrics_are_counted() {
    let cache = small_cache(1);
    let a = MockTrack::video("TR_a");
    let b = MockTrack::video("TR_b");

    cache.register(a.clone(), identity("alice")).await;
    settle(&cache).await;
    cache.unregister(a.clone()).await;
    cache.register(b.clone(), identity("bob")).await;
    settle(&cache).await;

    let metrics = cache.metrics();
    assert_eq!(metrics.evictions(), 1);
    assert_eq!(metrics.registrations(), 2);
    assert_eq!(metrics.unsubscribes(), 1);
}
