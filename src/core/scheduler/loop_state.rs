//=========================================================================
// Loop State
//=========================================================================
//
// Mutable bookkeeping owned exclusively by the scheduler thread.
//
//   accumulate(now)   → elapsed since previous iteration added to lag
//   consume_tick()    → one update's worth of lag paid back
//   record_frame()    → one render counted
//   roll_over(millis) → once per wall-clock second: publish + reset
//
// Lag is kept in picoseconds; see `LoopConfig::tick_picos`.
//
//=========================================================================

//=== Constants ===========================================================

const PICOS_PER_NANO: u64 = 1_000;
const ROLLOVER_MILLIS: u64 = 1_000;

//=== LoopState ===========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    previous_timestamp: u64,
    lag_picos: u64,
    updates_this_second: u32,
    frames_this_second: u32,
    last_stats_millis: u64,
    current_ups: u32,
    current_fps: u32,
}

impl LoopState {
    /// Creates state for a loop starting at `now_nanos` / `now_millis`.
    pub fn new(now_nanos: u64, now_millis: u64) -> Self {
        Self {
            previous_timestamp: now_nanos,
            lag_picos: 0,
            updates_this_second: 0,
            frames_this_second: 0,
            last_stats_millis: now_millis,
            current_ups: 0,
            current_fps: 0,
        }
    }

    //--- Per-iteration bookkeeping ---------------------------------------

    /// Adds the time since the previous iteration to the lag.
    ///
    /// Returns the elapsed nanoseconds. A clock that appears to go
    /// backwards contributes nothing.
    pub(crate) fn accumulate(&mut self, now_nanos: u64) -> u64 {
        let elapsed = now_nanos.saturating_sub(self.previous_timestamp);
        self.previous_timestamp = now_nanos;
        self.lag_picos = self
            .lag_picos
            .saturating_add(elapsed.saturating_mul(PICOS_PER_NANO));
        elapsed
    }

    /// `true` while at least one whole tick of lag is owed.
    pub(crate) fn has_pending_tick(&self, tick_picos: u64) -> bool {
        self.lag_picos >= tick_picos
    }

    /// Pays back one tick of lag and counts the update.
    pub(crate) fn consume_tick(&mut self, tick_picos: u64) {
        self.lag_picos -= tick_picos;
        self.updates_this_second += 1;
    }

    pub(crate) fn record_frame(&mut self) {
        self.frames_this_second += 1;
    }

    /// Publishes and resets the per-second counters if at least one
    /// second of wall-clock time has passed since the last rollover.
    pub(crate) fn roll_over(&mut self, now_millis: u64) -> bool {
        if now_millis < self.last_stats_millis.saturating_add(ROLLOVER_MILLIS) {
            return false;
        }

        self.last_stats_millis = now_millis;
        self.current_ups = self.updates_this_second;
        self.current_fps = self.frames_this_second;
        self.updates_this_second = 0;
        self.frames_this_second = 0;
        true
    }

    //--- Accessors --------------------------------------------------------

    /// Monotonic timestamp (ns) taken at the start of the last iteration.
    pub fn previous_timestamp(&self) -> u64 {
        self.previous_timestamp
    }

    pub fn lag_picos(&self) -> u64 {
        self.lag_picos
    }

    /// Lag rounded down to whole nanoseconds.
    pub fn lag_nanos(&self) -> u64 {
        self.lag_picos / PICOS_PER_NANO
    }

    pub fn updates_this_second(&self) -> u32 {
        self.updates_this_second
    }

    pub fn frames_this_second(&self) -> u32 {
        self.frames_this_second
    }

    pub fn last_stats_millis(&self) -> u64 {
        self.last_stats_millis
    }

    pub fn current_ups(&self) -> u32 {
        self.current_ups
    }

    pub fn current_fps(&self) -> u32 {
        self.current_fps
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: u64 = 16_666_666_666;

    #[test]
    fn accumulate_adds_elapsed_to_lag() {
        let mut state = LoopState::new(1_000, 0);
        assert_eq!(state.accumulate(6_000), 5_000);
        assert_eq!(state.previous_timestamp(), 6_000);
        assert_eq!(state.lag_nanos(), 5_000);
        assert_eq!(state.lag_picos(), 5_000_000);
    }

    #[test]
    fn backwards_clock_adds_no_lag() {
        let mut state = LoopState::new(10_000, 0);
        assert_eq!(state.accumulate(4_000), 0);
        assert_eq!(state.lag_picos(), 0);
        assert_eq!(state.previous_timestamp(), 4_000);
    }

    #[test]
    fn consume_tick_pays_back_lag() {
        let mut state = LoopState::new(0, 0);
        state.accumulate(50_000_000);

        let mut updates = 0;
        while state.has_pending_tick(TICK) {
            state.consume_tick(TICK);
            updates += 1;
        }

        assert_eq!(updates, 3);
        assert_eq!(state.updates_this_second(), 3);
        assert!(state.lag_picos() < TICK);
    }

    #[test]
    fn roll_over_waits_for_a_full_second() {
        let mut state = LoopState::new(0, 5_000);
        state.consume_tick(0);
        state.record_frame();

        assert!(!state.roll_over(5_999));
        assert_eq!(state.current_ups(), 0);
        assert_eq!(state.updates_this_second(), 1, "counters keep accumulating");

        assert!(state.roll_over(6_000));
        assert_eq!(state.current_ups(), 1);
        assert_eq!(state.current_fps(), 1);
        assert_eq!(state.updates_this_second(), 0);
        assert_eq!(state.frames_this_second(), 0);
        assert_eq!(state.last_stats_millis(), 6_000);
    }

    #[test]
    fn roll_over_marker_moves_to_observed_time() {
        let mut state = LoopState::new(0, 0);
        assert!(state.roll_over(2_500));
        assert!(!state.roll_over(3_400));
        assert!(state.roll_over(3_500));
    }
}
