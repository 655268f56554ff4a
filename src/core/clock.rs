//=========================================================================
// Clock Source
//=========================================================================
//
// Two independent time domains used by the scheduler:
//
//   monotonic_nanos()  → lag accounting and pacing (never goes backwards)
//   wall_millis()      → once-per-second UPS/FPS rollover
//
// The domains are deliberately separate; the scheduler never mixes
// values from one with values from the other.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

//=== Clock Trait =========================================================

/// Source of timestamps for the scheduler.
pub trait Clock: Send + Sync + 'static {
    /// Monotonic timestamp in nanoseconds from an arbitrary origin.
    fn monotonic_nanos(&self) -> u64;

    /// Wall-clock timestamp in milliseconds.
    fn wall_millis(&self) -> u64;
}

//=== SystemClock =========================================================

/// OS-backed clock: `Instant` for the monotonic domain, `SystemTime`
/// for the wall-clock domain.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_nanos(&self) -> u64 {
        // u64 nanoseconds overflow after ~584 years of uptime.
        self.origin.elapsed().as_nanos() as u64
    }

    fn wall_millis(&self) -> u64 {
        // A wall clock set before 1970 reads as 0; rollover then simply
        // waits until the clock is sane again.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

//=== ManualClock =========================================================

/// Hand-driven clock for deterministic simulations and tests.
///
/// Clones share the same underlying time, so a test can keep one handle
/// and give another to the engine. Each domain advances only when told to.
///
/// ```
/// use decaf_engine::core::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let engine_side = clock.clone();
///
/// clock.advance_nanos(16_666_667);
/// assert_eq!(engine_side.monotonic_nanos(), 16_666_667);
/// assert_eq!(engine_side.wall_millis(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the monotonic domain only.
    pub fn advance_nanos(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Advances the wall-clock domain only.
    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Sets the wall-clock domain to an absolute value.
    pub fn set_wall_millis(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn monotonic_nanos(&self) -> u64 {
        self.nanos.load(Ordering::SeqCst)
    }

    fn wall_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
