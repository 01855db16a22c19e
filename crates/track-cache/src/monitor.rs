//! Stuck-stream monitor.
//!
//! An independent periodic loop that polls the cache for its monitored
//! tracks, asks a caller-supplied probe for a liveness sample per track,
//! and resets tracks that have stopped making progress. Resets are bounded
//! (3 attempts by default) with exponential per-track backoff.
//!
//! A track being reset is unsubscribed and disabled for part of the reset
//! sequence, so it transiently vanishes from the monitored set. Stats that
//! carry an in-flight reset or consumed attempts therefore survive absence
//! from the set; they are dropped only after a sustained departure, and a
//! track that truly left and returns starts with a clean slate.
//!
//! The monitor owns its own per-track stats, entirely separate from the
//! cache's state, and touches the cache only through its public operations.

use crate::cache::actor::TrackCacheHandle;
use crate::config::MonitorConfig;
use crate::policy::CacheProfile;
use crate::transport::TrackHandle;
use crate::types::TrackSid;

use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Expected minimum counter increase per tick when the probe does not
/// specify one.
pub const DEFAULT_MIN_EXPECTED_DELTA: u64 = 1;

/// Consecutive absent ticks before stats with consumed reset attempts are
/// dropped. Long enough to ride out a reset's unsubscribe window.
const STATS_RETENTION_TICKS: u32 = 10;

/// One liveness sample for a track, produced by the probe.
#[derive(Debug, Clone, Default)]
pub struct TrackStatsSample {
    /// Primary progress counter (e.g. packets or frames received).
    pub current_value: u64,
    /// The probe judged the track stuck outright.
    pub is_stuck: bool,
    /// Minimum increase of the primary counter expected since last tick.
    pub min_expected_delta: Option<u64>,
    /// Secondary counter (e.g. concealed samples), if available.
    pub secondary_counter: Option<u64>,
    /// A jump of the secondary counter by at least this much is unhealthy.
    pub max_secondary_delta: Option<u64>,
}

/// Boxed future returned by the monitor's callbacks.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Supplies the set of currently monitored tracks (from the cache).
pub type MonitoredSetFn = Arc<dyn Fn() -> BoxFuture<Vec<TrackHandle>> + Send + Sync>;

/// Probes one track for liveness. `Ok(None)` means no data this tick.
pub type StatsProbeFn =
    Arc<dyn Fn(TrackHandle) -> BoxFuture<anyhow::Result<Option<TrackStatsSample>>> + Send + Sync>;

/// Performs one reset of a stuck track.
pub type ResetFn = Arc<dyn Fn(TrackHandle) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// The default reset sequence: disable, wait, then the cache's serialized
/// unsubscribe → wait → resubscribe.
#[must_use]
pub fn cache_reset_fn<P: CacheProfile>(
    handle: TrackCacheHandle<P>,
    pre_reset_delay: Duration,
) -> ResetFn {
    Arc::new(move |track: TrackHandle| {
        let handle = handle.clone();
        Box::pin(async move {
            if let Err(error) = track.set_enabled(false) {
                warn!(
                    target: "tc.monitor",
                    %error,
                    "disable before reset failed"
                );
            }
            tokio::time::sleep(pre_reset_delay).await;
            handle.reset_track(track).await?;
            Ok(())
        })
    })
}

/// Per-track monitoring state. Created lazily on first sighting, pruned
/// when the track leaves the monitored set.
#[derive(Debug, Clone, Copy)]
struct MonitorStats {
    last_value: u64,
    last_secondary: u64,
    reset_attempts: u32,
    is_resetting: bool,
    next_allowed_reset: Instant,
    /// Consecutive ticks this track was missing from the monitored set.
    absent_ticks: u32,
}

impl MonitorStats {
    fn new() -> Self {
        Self {
            last_value: 0,
            last_secondary: 0,
            reset_attempts: 0,
            is_resetting: false,
            next_allowed_reset: Instant::now(),
            absent_ticks: 0,
        }
    }
}

/// Handle to a running stuck-stream monitor.
pub struct StuckTrackMonitor {
    cancel_token: CancellationToken,
    paused: Arc<AtomicBool>,
    task_handle: JoinHandle<()>,
}

impl StuckTrackMonitor {
    /// Spawn the monitor loop.
    ///
    /// `tracks` supplies the monitored set each tick (normally the cache's
    /// `tracks_to_monitor`), `probe` produces liveness samples, and `reset`
    /// recovers a stuck track (normally [`cache_reset_fn`]).
    #[must_use]
    pub fn spawn(
        config: MonitorConfig,
        tracks: MonitoredSetFn,
        probe: StatsProbeFn,
        reset: ResetFn,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let paused = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let monitor = MonitorLoop {
            config,
            tracks,
            probe,
            reset,
            stats: HashMap::new(),
            cancel_token: cancel_token.clone(),
            paused: Arc::clone(&paused),
            done_tx,
            done_rx,
        };

        let task_handle = tokio::spawn(monitor.run());

        Self {
            cancel_token,
            paused,
            task_handle,
        }
    }

    /// Pause or resume the monitor, e.g. while the session transport is
    /// reconnecting. Ticks while paused are complete no-ops.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
        info!(
            target: "tc.monitor",
            paused,
            "monitor pause state changed"
        );
    }

    /// Whether the monitor is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Stop the monitor loop.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Whether the monitor task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }
}

struct MonitorLoop {
    config: MonitorConfig,
    tracks: MonitoredSetFn,
    probe: StatsProbeFn,
    reset: ResetFn,
    stats: HashMap<TrackSid, MonitorStats>,
    cancel_token: CancellationToken,
    paused: Arc<AtomicBool>,
    /// Reset tasks report completion here; the loop then zeroes counters
    /// and clears the in-flight flag.
    done_tx: mpsc::UnboundedSender<TrackSid>,
    done_rx: mpsc::UnboundedReceiver<TrackSid>,
}

impl MonitorLoop {
    async fn run(mut self) {
        info!(
            target: "tc.monitor",
            interval_ms = self.config.check_interval.as_millis() as u64,
            max_attempts = self.config.max_reset_attempts,
            "stuck-stream monitor started"
        );

        let mut ticker = tokio::time::interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => break,

                Some(sid) = self.done_rx.recv() => {
                    self.finish_reset(&sid);
                }

                _ = ticker.tick() => {
                    if !self.paused.load(Ordering::SeqCst) {
                        self.tick().await;
                    }
                }
            }
        }

        info!(target: "tc.monitor", "stuck-stream monitor stopped");
    }

    async fn tick(&mut self) {
        let tracks = (self.tracks)().await;

        let mut active: HashSet<TrackSid> = HashSet::with_capacity(tracks.len());
        for track in tracks {
            let Some(sid) = track.sid() else {
                continue;
            };
            active.insert(sid.clone());
            self.check_track(sid, track).await;
        }

        // A track mid-reset is unsubscribed and falls out of the monitored
        // set; pruning its stats then would hand it a fresh attempt budget
        // every reset. Stats with an in-flight reset or consumed attempts
        // survive absence and are dropped only after a sustained departure.
        self.stats.retain(|sid, stats| {
            if active.contains(sid) {
                stats.absent_ticks = 0;
                return true;
            }
            if stats.is_resetting {
                return true;
            }
            if stats.reset_attempts > 0 {
                stats.absent_ticks += 1;
                return stats.absent_ticks < STATS_RETENTION_TICKS;
            }
            false
        });
    }

    async fn check_track(&mut self, sid: TrackSid, track: TrackHandle) {
        let stats = *self
            .stats
            .entry(sid.clone())
            .or_insert_with(MonitorStats::new);
        if stats.is_resetting {
            return;
        }

        let probe = Arc::clone(&self.probe);
        let sample = match probe(Arc::clone(&track)).await {
            Ok(Some(sample)) => sample,
            Ok(None) => return,
            Err(error) => {
                warn!(
                    target: "tc.monitor",
                    sid = %sid,
                    %error,
                    "stats probe failed, skipping track this tick"
                );
                return;
            }
        };

        if sample.current_value < stats.last_value {
            // Counter reset upstream (e.g. track restarted): resync and
            // withhold judgment this tick.
            if let Some(s) = self.stats.get_mut(&sid) {
                s.last_value = sample.current_value;
                s.last_secondary = sample.secondary_counter.unwrap_or(0);
            }
            return;
        }

        let min_expected = sample
            .min_expected_delta
            .unwrap_or(DEFAULT_MIN_EXPECTED_DELTA);
        let delta = sample.current_value - stats.last_value;

        let secondary_jump = match (sample.secondary_counter, sample.max_secondary_delta) {
            (Some(secondary), Some(max_delta)) => {
                secondary.saturating_sub(stats.last_secondary) >= max_delta
            }
            _ => false,
        };

        let unhealthy = sample.is_stuck || delta < min_expected || secondary_jump;

        if !unhealthy {
            if let Some(s) = self.stats.get_mut(&sid) {
                if s.reset_attempts > 0 {
                    info!(
                        target: "tc.monitor",
                        sid = %sid,
                        attempts = s.reset_attempts,
                        "track recovered, clearing reset attempts"
                    );
                    s.reset_attempts = 0;
                }
                s.last_value = sample.current_value;
                if let Some(secondary) = sample.secondary_counter {
                    s.last_secondary = secondary;
                }
            }
            return;
        }

        warn!(
            target: "tc.monitor",
            sid = %sid,
            delta,
            min_expected,
            flagged_stuck = sample.is_stuck,
            secondary_jump,
            "track appears stuck"
        );

        self.attempt_reset(sid, track);
    }

    fn attempt_reset(&mut self, sid: TrackSid, track: TrackHandle) {
        let now = Instant::now();
        let Some(stats) = self.stats.get_mut(&sid) else {
            return;
        };

        if stats.reset_attempts >= self.config.max_reset_attempts {
            debug!(
                target: "tc.monitor",
                sid = %sid,
                attempts = stats.reset_attempts,
                "reset ceiling reached, leaving track alone"
            );
            return;
        }
        if stats.is_resetting || now < stats.next_allowed_reset {
            return;
        }

        // Commit the attempt and the backoff window before the callback
        // runs, so a failing reset still consumes an attempt.
        stats.reset_attempts += 1;
        stats.is_resetting = true;
        let factor = 1u32.checked_shl(stats.reset_attempts).unwrap_or(u32::MAX);
        let backoff = std::cmp::min(
            self.config.max_backoff,
            self.config.check_interval.saturating_mul(factor),
        );
        stats.next_allowed_reset = now + backoff;

        warn!(
            target: "tc.monitor",
            sid = %sid,
            attempt = stats.reset_attempts,
            max_attempts = self.config.max_reset_attempts,
            backoff_ms = backoff.as_millis() as u64,
            "attempting track reset"
        );

        let reset = Arc::clone(&self.reset);
        let done_tx = self.done_tx.clone();
        let jitter_max = self.config.reset_jitter;
        tokio::spawn(async move {
            let jitter_ms = if jitter_max.is_zero() {
                0
            } else {
                rand::thread_rng().gen_range(0..=jitter_max.as_millis() as u64)
            };
            tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

            if let Err(error) = reset(Arc::clone(&track)).await {
                error!(
                    target: "tc.monitor",
                    sid = %sid,
                    %error,
                    "track reset failed"
                );
            }
            let _ = done_tx.send(sid);
        });
    }

    /// A reset resolved: zero the tracked counters and clear the in-flight
    /// flag, success or not. Attempts are deliberately kept.
    fn finish_reset(&mut self, sid: &TrackSid) {
        if let Some(stats) = self.stats.get_mut(sid) {
            stats.is_resetting = false;
            stats.last_value = 0;
            stats.last_secondary = 0;
        }
    }
}
