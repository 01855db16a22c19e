//! Ready-made liveness probe callbacks for monitor tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use track_cache::{StatsProbeFn, TrackStatsSample};

/// A probe that flags every track stuck on every tick.
pub fn always_stuck_probe() -> StatsProbeFn {
    Arc::new(|_track| {
        Box::pin(async {
            Ok(Some(TrackStatsSample {
                current_value: 0,
                is_stuck: true,
                ..Default::default()
            }))
        })
    })
}

/// A probe whose counter advances by `step` on every call; healthy as long
/// as `step` meets the expected minimum delta.
pub fn advancing_probe(step: u64) -> StatsProbeFn {
    let counter = Arc::new(AtomicU64::new(0));
    Arc::new(move |_track| {
        let value = counter.fetch_add(step, Ordering::SeqCst) + step;
        Box::pin(async move {
            Ok(Some(TrackStatsSample {
                current_value: value,
                is_stuck: false,
                ..Default::default()
            }))
        })
    })
}

/// A probe that never has data; tracks are simply not judged.
pub fn silent_probe() -> StatsProbeFn {
    Arc::new(|_track| Box::pin(async { Ok(None) }))
}

/// A probe that errors on every call, as if the underlying stats API is
/// unavailable.
pub fn failing_probe(message: &'static str) -> StatsProbeFn {
    Arc::new(move |_track| Box::pin(async move { Err(anyhow::anyhow!(message)) }))
}
