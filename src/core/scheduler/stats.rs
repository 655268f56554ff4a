//=========================================================================
// Loop Statistics
//=========================================================================
//
// Throughput figures published by the scheduler thread and read from
// anywhere. UPS and FPS share one atomic word so a reader always sees a
// matching pair from the same rollover.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};

//=== StatsSnapshot =======================================================

/// Point-in-time copy of [`LoopStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Updates fired during the last completed wall-clock second.
    pub ups: u32,
    /// Renders fired during the last completed wall-clock second.
    pub fps: u32,
    pub total_updates: u64,
    pub total_frames: u64,
    /// Iterations where the catch-up bound stopped lag draining early.
    pub capped_iterations: u64,
    /// Pacing sleeps that ended before their deadline.
    pub interrupted_sleeps: u64,
}

//=== LoopStats ===========================================================

/// Shared, lock-free throughput counters.
#[derive(Debug, Default)]
pub struct LoopStats {
    rates: AtomicU64,
    total_updates: AtomicU64,
    total_frames: AtomicU64,
    capped_iterations: AtomicU64,
    interrupted_sleeps: AtomicU64,
}

impl LoopStats {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Writers (scheduler thread) --------------------------------------

    pub(crate) fn publish_rates(&self, ups: u32, fps: u32) {
        let packed = (u64::from(ups) << 32) | u64::from(fps);
        self.rates.store(packed, Ordering::Release);
    }

    pub(crate) fn record_update(&self) {
        self.total_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame(&self) {
        self.total_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capped_iteration(&self) {
        self.capped_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interrupted_sleep(&self) {
        self.interrupted_sleeps.fetch_add(1, Ordering::Relaxed);
    }

    //--- Readers ----------------------------------------------------------

    /// `(ups, fps)` from the same rollover.
    pub fn rates(&self) -> (u32, u32) {
        let packed = self.rates.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }

    pub fn ups(&self) -> u32 {
        self.rates().0
    }

    pub fn fps(&self) -> u32 {
        self.rates().1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let (ups, fps) = self.rates();
        StatsSnapshot {
            ups,
            fps,
            total_updates: self.total_updates.load(Ordering::Relaxed),
            total_frames: self.total_frames.load(Ordering::Relaxed),
            capped_iterations: self.capped_iterations.load(Ordering::Relaxed),
            interrupted_sleeps: self.interrupted_sleeps.load(Ordering::Relaxed),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
