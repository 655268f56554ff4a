//=========================================================================
// Fixed-Timestep Scheduler
//=========================================================================
//
// Advances simulation at a fixed logical rate independent of render rate.
//
// One iteration:
//   1. lag += now - previous_timestamp
//   2. pointer mirror ← window.poll_pointer()
//   3. while lag >= tick: fire update-tick, lag -= tick      (0..N times)
//   4. fire render-tick with window.begin_frame()            (exactly 1)
//   5. once per wall-clock second: UPS/FPS ← counters, reset counters
//   6. sleep max(0, tick - time spent this iteration) in whole ms
//
// Steps 1-5 are `Scheduler::iterate`, which tests drive directly with a
// `ManualClock`. Step 6 and the running flag live in `Scheduler::run`,
// executed on the engine's loop thread.
//
// Starvation: if update handlers cost more than one tick, each iteration
// owes more lag than it drains. Iterations stretch, FPS collapses toward
// zero, and UPS settles at whatever the update work allows. This is
// visible in the stats and is not masked. `LoopConfig::with_max_updates_per_iteration` bounds the
// drain per iteration (carrying the rest of the lag forward) so that
// rendering keeps happening under sustained overload.
//
// No handler timeouts: a hung handler stalls the whole loop.
//
//=========================================================================

//=== Submodules ==========================================================

mod loop_state;
mod stats;

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::clock::Clock;
use crate::core::config::LoopConfig;
use crate::core::input::{PointerMirror, PointerView};
use crate::core::tick_bus::{TickBus, TickName};
use crate::core::window::Window;

//=== Public API ==========================================================

pub use loop_state::LoopState;
pub use stats::{LoopStats, StatsSnapshot};

//=== IterationReport =====================================================

/// What one call to [`Scheduler::iterate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    /// Monotonic nanoseconds since the previous iteration.
    pub elapsed_nanos: u64,
    /// Update ticks fired.
    pub updates: u32,
    /// Render ticks fired (always 1).
    pub renders: u32,
    /// The catch-up bound stopped draining with a whole tick still owed.
    pub capped: bool,
    /// UPS/FPS were published this iteration.
    pub rolled_over: bool,
}

//=== Scheduler ===========================================================

/// Fixed-timestep loop driver.
///
/// # Examples
///
/// Driving iterations by hand with a simulated clock:
///
/// ```
/// use std::sync::Arc;
/// use decaf_engine::core::clock::ManualClock;
/// use decaf_engine::core::config::LoopConfig;
/// use decaf_engine::core::scheduler::Scheduler;
/// use decaf_engine::core::tick_bus::TickBus;
/// use decaf_engine::core::window::HeadlessWindow;
///
/// let clock = ManualClock::new();
/// let config = LoopConfig::new(60.0)?;
/// let mut scheduler = Scheduler::new(
///     config,
///     Arc::new(clock.clone()),
///     TickBus::new(),
///     HeadlessWindow::new(),
/// );
///
/// clock.advance_nanos(50_000_000); // three ticks at 60 UPS
/// let report = scheduler.iterate();
/// assert_eq!((report.updates, report.renders), (3, 1));
/// # Ok::<(), decaf_engine::core::error::ConfigError>(())
/// ```
pub struct Scheduler<W: Window> {
    config: LoopConfig,
    state: LoopState,
    clock: Arc<dyn Clock>,
    bus: TickBus,
    pointer: PointerMirror,
    window: W,
    stats: Arc<LoopStats>,
    render_mismatch_reported: bool,
}

impl<W: Window> Scheduler<W> {
    //--- Construction -----------------------------------------------------

    /// Creates a scheduler whose state starts at the clock's current time.
    ///
    /// [`Scheduler::run`] restarts that state when the loop begins.
    pub fn new(config: LoopConfig, clock: Arc<dyn Clock>, bus: TickBus, window: W) -> Self {
        let state = LoopState::new(clock.monotonic_nanos(), clock.wall_millis());
        Self {
            config,
            state,
            clock,
            bus,
            pointer: PointerMirror::new(),
            window,
            stats: Arc::new(LoopStats::new()),
            render_mismatch_reported: false,
        }
    }

    //--- Iteration --------------------------------------------------------

    /// Runs steps 1-5 of one loop iteration.
    pub fn iterate(&mut self) -> IterationReport {
        //--- 1. Accumulate lag ---------------------------------------------
        let elapsed_nanos = self.state.accumulate(self.clock.monotonic_nanos());

        //--- 2. Mirror pointer ---------------------------------------------
        self.pointer.update(self.window.poll_pointer());

        //--- 3. Drain lag with update ticks --------------------------------
        let tick = self.config.tick_picos();
        let max_updates = self.config.max_updates_per_iteration();
        let mut updates = 0u32;
        let mut capped = false;

        while self.state.has_pending_tick(tick) {
            if max_updates.is_some_and(|max| updates >= max) {
                capped = true;
                break;
            }
            self.bus.fire_update();
            self.state.consume_tick(tick);
            self.stats.record_update();
            updates += 1;
        }

        if capped {
            self.stats.record_capped_iteration();
            debug!(
                target: "scheduler",
                "Catch-up bound hit after {} updates, {}ns of lag carried over",
                updates,
                self.state.lag_nanos()
            );
        }

        //--- 4. Render exactly once ----------------------------------------
        self.render();
        self.state.record_frame();
        self.stats.record_frame();

        //--- 5. Once-per-second throughput rollover -------------------------
        let rolled_over = self.state.roll_over(self.clock.wall_millis());
        if rolled_over {
            let (ups, fps) = (self.state.current_ups(), self.state.current_fps());
            self.stats.publish_rates(ups, fps);
            debug!(target: "scheduler", "UPS: {}, FPS: {}", ups, fps);
        }

        trace!(
            target: "scheduler",
            "Iteration: {}ns elapsed, {} updates, lag {}ns",
            elapsed_nanos,
            updates,
            self.state.lag_nanos()
        );

        IterationReport {
            elapsed_nanos,
            updates,
            renders: 1,
            capped,
            rolled_over,
        }
    }

    /// Restarts lag and the once-per-second marker at the clock's current
    /// time, discarding per-second counters. Time that passed before this
    /// call never turns into updates.
    pub fn reset_timing(&mut self) {
        self.state = LoopState::new(self.clock.monotonic_nanos(), self.clock.wall_millis());
    }

    /// Pacing delay after an iteration: the rest of one tick, truncated
    /// to whole milliseconds, never negative.
    pub fn pacing_delay(&self) -> Duration {
        let spent = self
            .clock
            .monotonic_nanos()
            .saturating_sub(self.state.previous_timestamp());
        let remaining = self.config.optimal_tick_duration() - spent as f64;

        if remaining <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_millis((remaining / 1_000_000.0) as u64)
        }
    }

    //--- Loop Body --------------------------------------------------------

    /// Iterates while `running` is set, pacing with an interruptible wait
    /// on `wake`. The flag is checked once per iteration, at the top.
    pub(crate) fn run(mut self, running: Arc<AtomicBool>, wake: Receiver<()>) {
        self.reset_timing();
        info!(
            target: "scheduler",
            "Loop started (target {} UPS, tick {:.0}ns)",
            self.config.target_ups(),
            self.config.optimal_tick_duration()
        );

        while running.load(Ordering::Acquire) {
            self.iterate();
            self.pace(&wake);
        }

        let stats = self.stats.snapshot();
        info!(
            target: "scheduler",
            "Loop exited after {} updates and {} frames",
            stats.total_updates,
            stats.total_frames
        );
    }

    fn pace(&self, wake: &Receiver<()>) {
        let delay = self.pacing_delay();
        if delay.is_zero() {
            return;
        }

        match wake.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) => {
                self.stats.record_interrupted_sleep();
                debug!(target: "scheduler", "Pacing sleep interrupted, continuing");
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.stats.record_interrupted_sleep();
                warn!(target: "scheduler", "Wake channel disconnected, pacing with plain sleep");
                thread::sleep(delay);
            }
        }
    }

    fn render(&mut self) {
        let mut frame = self.window.begin_frame();

        if let Err(e) = self.bus.fire(TickName::RENDER, &mut frame) {
            if !self.render_mismatch_reported {
                error!(target: "scheduler", "Render tick not dispatched: {}", e);
                self.render_mismatch_reported = true;
            }
        }

        self.window.end_frame(frame);
    }

    //--- Accessors --------------------------------------------------------

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn bus(&self) -> &TickBus {
        &self.bus
    }

    /// Read-only view of the pointer mirror this scheduler writes.
    pub fn pointer(&self) -> PointerView {
        self.pointer.view()
    }

    pub fn stats(&self) -> Arc<LoopStats> {
        Arc::clone(&self.stats)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::input::PointerSample;
    use crate::core::window::{HeadlessFrame, HeadlessWindow};
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicU32;

    //--- Test Helpers -----------------------------------------------------

    struct Rig {
        clock: ManualClock,
        scheduler: Scheduler<HeadlessWindow>,
        updates: Arc<AtomicU32>,
        renders: Arc<AtomicU32>,
    }

    fn rig(config: LoopConfig) -> Rig {
        let clock = ManualClock::new();
        let bus = TickBus::new();
        let updates = Arc::new(AtomicU32::new(0));
        let renders = Arc::new(AtomicU32::new(0));

        let u = updates.clone();
        bus.on_update(move || {
            u.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let r = renders.clone();
        bus.on_render(move |_: &mut HeadlessFrame| {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        let scheduler = Scheduler::new(config, Arc::new(clock.clone()), bus, HeadlessWindow::new());
        Rig {
            clock,
            scheduler,
            updates,
            renders,
        }
    }

    fn sixty() -> LoopConfig {
        LoopConfig::new(60.0).unwrap()
    }

    //--- Lag draining -----------------------------------------------------

    #[test]
    fn k_ticks_of_elapsed_time_fire_k_updates_and_one_render() {
        for k in 0..=8u32 {
            let mut rig = rig(sixty());
            let optimal = rig.scheduler.config().optimal_tick_duration();
            rig.clock.advance_nanos((f64::from(k) * optimal).ceil() as u64);

            let report = rig.scheduler.iterate();

            assert_eq!(report.updates, k, "k = {k}");
            assert_eq!(report.renders, 1);
            assert_eq!(rig.updates.load(Ordering::SeqCst), k);
            assert_eq!(rig.renders.load(Ordering::SeqCst), 1);
            assert!(
                (rig.scheduler.state().lag_nanos() as f64) < optimal,
                "residual lag must be below one tick"
            );
        }
    }

    #[test]
    fn residual_lag_carries_into_next_iteration() {
        let mut rig = rig(sixty());

        rig.clock.advance_nanos(10_000_000);
        assert_eq!(rig.scheduler.iterate().updates, 0);

        rig.clock.advance_nanos(10_000_000);
        assert_eq!(rig.scheduler.iterate().updates, 1);
        assert_eq!(rig.scheduler.state().lag_nanos(), 3_333_333);
    }

    #[test]
    fn reset_timing_discards_time_before_loop_start() {
        let mut rig = rig(sixty());
        rig.clock.advance_nanos(1_000_000_000);
        rig.clock.advance_millis(5_000);

        rig.scheduler.reset_timing();
        let report = rig.scheduler.iterate();

        assert_eq!(report.updates, 0);
        assert!(!report.rolled_over, "marker must restart at loop start");
        assert_eq!(rig.scheduler.state().lag_picos(), 0);
        assert_eq!(rig.scheduler.state().last_stats_millis(), 5_000);
    }

    #[test]
    fn zero_elapsed_still_renders() {
        let mut rig = rig(sixty());
        for _ in 0..5 {
            let report = rig.scheduler.iterate();
            assert_eq!((report.updates, report.renders), (0, 1));
        }
        assert_eq!(rig.renders.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn catch_up_is_unbounded_by_default() {
        let mut rig = rig(sixty());
        rig.clock.advance_nanos(2_000_000_000);

        let report = rig.scheduler.iterate();
        assert_eq!(report.updates, 120);
        assert!(!report.capped);
    }

    #[test]
    fn catch_up_bound_carries_lag_forward() {
        let config = sixty().with_max_updates_per_iteration(4).unwrap();
        let mut rig = rig(config);
        rig.clock.advance_nanos(100_000_000); // six ticks owed

        let first = rig.scheduler.iterate();
        assert_eq!(first.updates, 4);
        assert!(first.capped);

        let second = rig.scheduler.iterate();
        assert_eq!(second.updates, 2);
        assert!(!second.capped);
        assert_eq!(rig.renders.load(Ordering::SeqCst), 2);
        assert_eq!(rig.scheduler.stats().snapshot().capped_iterations, 1);
    }

    //--- Starvation -------------------------------------------------------
    //
    // Each update "costs" 40ms of both clocks (2.4 ticks at 60 UPS), so
    // lag grows faster than it drains.
    //
    const UPDATE_COST_NANOS: u64 = 40_000_000;

    fn make_updates_expensive(rig: &Rig) {
        let clock = rig.clock.clone();
        rig.scheduler.bus().on_update(move || {
            clock.advance_nanos(UPDATE_COST_NANOS);
            clock.advance_millis(UPDATE_COST_NANOS / 1_000_000);
            Ok(())
        });
    }

    #[test]
    fn starvation_with_catch_up_bound_collapses_fps_observably() {
        let config = sixty().with_max_updates_per_iteration(3).unwrap();
        let mut rig = rig(config);
        make_updates_expensive(&rig);
        let stats = rig.scheduler.stats();

        rig.clock.advance_nanos(16_666_667);
        let mut iterations = 0;
        let mut previous_lag = 0;
        loop {
            let report = rig.scheduler.iterate();
            iterations += 1;
            if iterations >= 3 {
                assert!(report.capped, "iteration {iterations} should hit the bound");
                assert!(rig.scheduler.state().lag_picos() > previous_lag, "lag keeps growing");
            }
            previous_lag = rig.scheduler.state().lag_picos();
            if report.rolled_over {
                break;
            }
            assert!(iterations < 100, "rollover never happened");
        }

        // Wall time: 40 + 80 + 8 * 120 = 1080ms over 10 iterations.
        assert_eq!(iterations, 10);
        assert_eq!(stats.rates(), (27, 10), "1 + 2 + 8 * 3 updates, one frame each");
        assert_eq!(stats.snapshot().capped_iterations, 8);
        assert!(stats.fps() < stats.ups());
    }

    #[test]
    fn starvation_without_bound_keeps_draining_and_stretches_iterations() {
        let mut rig = rig(sixty());
        make_updates_expensive(&rig);

        rig.clock.advance_nanos(16_666_667);
        let reports: Vec<IterationReport> = (0..5).map(|_| rig.scheduler.iterate()).collect();

        for pair in reports.windows(2) {
            assert!(pair[1].updates > pair[0].updates, "{reports:?}");
            assert!(pair[1].elapsed_nanos > pair[0].elapsed_nanos, "{reports:?}");
        }
        assert!(reports.iter().all(|r| !r.capped && r.renders == 1));
        assert_eq!(rig.scheduler.stats().snapshot().capped_iterations, 0);
    }

    //--- Throughput rollover ----------------------------------------------

    #[test]
    fn rates_unchanged_until_a_wall_second_passes() {
        let mut rig = rig(sixty());

        for _ in 0..10 {
            rig.clock.advance_nanos(16_666_667);
            rig.clock.advance_millis(50);
            assert!(!rig.scheduler.iterate().rolled_over);
        }

        assert_eq!(rig.scheduler.state().current_ups(), 0);
        assert_eq!(rig.scheduler.state().current_fps(), 0);
        assert_eq!(rig.scheduler.state().updates_this_second(), 10);
        assert_eq!(rig.scheduler.state().frames_this_second(), 10);
        assert_eq!(rig.scheduler.stats().rates(), (0, 0));
    }

    #[test]
    fn one_simulated_second_reports_sixty_ups_and_fps() {
        let mut rig = rig(sixty());
        let stats = rig.scheduler.stats();

        // Advance exactly 1e9ns in 60 steps of 16_666_666 or 16_666_667.
        let mut simulated = 0u64;
        for i in 1..=60u64 {
            let target = i * 1_000_000_000 / 60;
            rig.clock.advance_nanos(target - simulated);
            simulated = target;

            if i == 60 {
                assert_eq!(stats.rates(), (0, 0), "no rollover before a wall second");
                rig.clock.advance_millis(1_000);
            }

            rig.scheduler.iterate();
        }

        assert_eq!(simulated, 1_000_000_000);
        assert_eq!(rig.scheduler.state().current_ups(), 60);
        assert_eq!(rig.scheduler.state().current_fps(), 60);
        assert_eq!(stats.rates(), (60, 60));
        assert_eq!(rig.scheduler.state().updates_this_second(), 0);
        assert_eq!(rig.scheduler.state().frames_this_second(), 0);
    }

    //--- Pointer + render payload -----------------------------------------

    #[test]
    fn pointer_is_mirrored_each_iteration() {
        let clock = ManualClock::new();
        let window = HeadlessWindow::new();
        let handle = window.handle();
        let mut scheduler = Scheduler::new(sixty(), Arc::new(clock), TickBus::new(), window);
        let pointer = scheduler.pointer();

        handle.set_pointer(PointerSample::At { x: 40, y: 30 });
        scheduler.iterate();
        assert_eq!(pointer.position(), Some((40, 30)));

        handle.set_pointer(PointerSample::OffScreen);
        scheduler.iterate();
        assert!(pointer.is_off_screen());
        assert_eq!((pointer.x(), pointer.y()), (40, 30));
    }

    #[test]
    fn render_handlers_receive_the_window_frame() {
        let clock = ManualClock::new();
        let bus = TickBus::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let s = seen.clone();
        bus.on_render(move |frame: &mut HeadlessFrame| {
            s.lock().push(frame.index);
            Ok(())
        })
        .unwrap();

        let window = HeadlessWindow::new();
        let handle = window.handle();
        let mut scheduler = Scheduler::new(sixty(), Arc::new(clock), bus, window);

        for _ in 0..3 {
            scheduler.iterate();
        }
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
        assert_eq!(handle.presented_frames(), 3);
    }

    #[test]
    fn mistyped_render_subscriber_does_not_stop_the_loop() {
        let bus = TickBus::new();
        bus.on_render(|_: &mut String| Ok(())).unwrap();

        let mut scheduler =
            Scheduler::new(sixty(), Arc::new(ManualClock::new()), bus, HeadlessWindow::new());

        for _ in 0..3 {
            assert_eq!(scheduler.iterate().renders, 1);
        }
        assert_eq!(scheduler.stats().snapshot().total_frames, 3);
    }

    #[test]
    fn failing_update_handler_does_not_stall_draining() {
        let mut rig = rig(sixty());
        rig.scheduler.bus().on_update(|| Err("bad update".into()));
        rig.clock.advance_nanos(50_000_000);

        let report = rig.scheduler.iterate();
        assert_eq!(report.updates, 3);
        assert_eq!(rig.updates.load(Ordering::SeqCst), 3);
        assert_eq!(rig.scheduler.bus().failure_count(), 3);
    }

    //--- Pacing -----------------------------------------------------------

    #[test]
    fn pacing_delay_is_remaining_tick_in_whole_millis() {
        let rig = rig(sixty());
        assert_eq!(rig.scheduler.pacing_delay(), Duration::from_millis(16));

        rig.clock.advance_nanos(5_000_000);
        assert_eq!(rig.scheduler.pacing_delay(), Duration::from_millis(11));

        rig.clock.advance_nanos(20_000_000);
        assert_eq!(rig.scheduler.pacing_delay(), Duration::ZERO);
    }

    #[test]
    fn run_exits_when_flag_is_cleared_and_wake_interrupts_sleep() {
        let config = LoopConfig::new(1.0).unwrap(); // one-second pacing sleep
        let scheduler = Scheduler::new(
            config,
            Arc::new(crate::core::clock::SystemClock::new()),
            TickBus::new(),
            HeadlessWindow::new(),
        );
        let stats = scheduler.stats();
        let running = Arc::new(AtomicBool::new(true));
        let (wake_tx, wake_rx) = unbounded();

        let flag = running.clone();
        let started = std::time::Instant::now();
        let handle = thread::spawn(move || scheduler.run(flag, wake_rx));

        while stats.snapshot().total_frames == 0 {
            thread::yield_now();
        }
        running.store(false, Ordering::Release);
        wake_tx.send(()).unwrap();
        handle.join().unwrap();

        assert!(started.elapsed() < Duration::from_millis(900), "wake must cut the sleep short");
        assert_eq!(stats.snapshot().total_frames, 1);
        assert_eq!(stats.snapshot().interrupted_sleeps, 1);
    }
}
