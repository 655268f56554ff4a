//=========================================================================
// Decaf Engine
//
// Public facade: configuration, lifecycle, and read-only accessors.
//
// Architecture:
// ```text
//     EngineBuilder  ──build(window)──>  Engine  ──start()──>  [loop thread]
//         │                                │                       │
//         ├─ with_ups()                    ├─ tick_bus()           └─ Scheduler::run
//         ├─ with_max_updates_...()        ├─ pointer()
//         ├─ with_clock()                  ├─ ups() / fps()
//         └─ with_tick_bus()               └─ stop()  (flag + wake + join)
// ```
//
// Lifecycle: Ready ──start──> Running ──stop──> Stopped (terminal)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{LoopConfig, DEFAULT_UPS};
use crate::core::error::{panic_message, ConfigError, EngineError};
use crate::core::input::PointerView;
use crate::core::scheduler::{LoopStats, Scheduler, StatsSnapshot};
use crate::core::tick_bus::TickBus;
use crate::core::window::Window;

//=== AppInfo =============================================================

/// Application title and logical window size.
///
/// Pass-through configuration for the window collaborator; the loop
/// itself never reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **UPS**: 60.0 (logic updates per second)
/// - **Catch-up**: unbounded
/// - **Clock**: [`SystemClock`]
///
/// # Examples
///
/// ```no_run
/// use decaf_engine::EngineBuilder;
/// use decaf_engine::core::window::{HeadlessFrame, HeadlessWindow};
///
/// let mut engine = EngineBuilder::new("Decaf", 800, 600)
///     .with_ups(120.0)
///     .with_max_updates_per_iteration(8)
///     .build(HeadlessWindow::new())?;
///
/// engine.tick_bus().on_update(|| Ok(()));
/// engine.tick_bus().on_render(|frame: &mut HeadlessFrame| {
///     let _ = frame.buffers.back;
///     Ok(())
/// })?;
///
/// engine.start()?;
/// // ...
/// engine.stop()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EngineBuilder {
    info: AppInfo,
    ups: f64,
    max_updates_per_iteration: Option<u32>,
    clock: Arc<dyn Clock>,
    bus: TickBus,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            info: AppInfo {
                title: title.into(),
                width,
                height,
            },
            ups: DEFAULT_UPS,
            max_updates_per_iteration: None,
            clock: Arc::new(SystemClock::new()),
            bus: TickBus::new(),
        }
    }

    /// Sets the target logical updates per second.
    ///
    /// Validated in [`EngineBuilder::build`].
    pub fn with_ups(mut self, ups: f64) -> Self {
        self.ups = ups;
        self
    }

    /// Bounds update ticks per iteration (see [`LoopConfig`]).
    pub fn with_max_updates_per_iteration(mut self, max: u32) -> Self {
        self.max_updates_per_iteration = Some(max);
        self
    }

    /// Replaces the time source (e.g. with a `ManualClock`).
    pub fn with_clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Uses an existing bus, so subscriptions can be made before the
    /// window (and therefore the engine) exists.
    pub fn with_tick_bus(mut self, bus: TickBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    /// Validates the configuration and builds the engine around `window`.
    pub fn build<W: Window>(self, window: W) -> Result<Engine<W>, EngineError> {
        if self.info.width == 0 || self.info.height == 0 {
            return Err(ConfigError::InvalidWindowSize {
                width: self.info.width,
                height: self.info.height,
            }
            .into());
        }

        let mut config = LoopConfig::new(self.ups)?;
        if let Some(max) = self.max_updates_per_iteration {
            config = config.with_max_updates_per_iteration(max)?;
        }

        info!(
            target: "engine",
            "Building engine \"{}\" ({}x{}, {} UPS)",
            self.info.title,
            self.info.width,
            self.info.height,
            config.target_ups()
        );

        let scheduler = Scheduler::new(config, self.clock, self.bus.clone(), window);

        Ok(Engine {
            info: self.info,
            config,
            bus: self.bus,
            stats: scheduler.stats(),
            pointer: scheduler.pointer(),
            phase: Phase::Ready(scheduler),
        })
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("info", &self.info)
            .field("ups", &self.ups)
            .field("max_updates_per_iteration", &self.max_updates_per_iteration)
            .finish_non_exhaustive()
    }
}

//=== Engine ==============================================================

enum Phase<W: Window> {
    Ready(Scheduler<W>),
    Running {
        handle: JoinHandle<()>,
        running: Arc<AtomicBool>,
        wake: Sender<()>,
    },
    Stopped,
}

/// Decaf engine runtime.
///
/// Owns the fixed-timestep loop. [`Engine::start`] spawns the loop thread
/// and returns immediately; [`Engine::stop`] blocks until that thread has
/// exited, after which no tick fires again. A stopped engine is terminal.
pub struct Engine<W: Window> {
    info: AppInfo,
    config: LoopConfig,
    bus: TickBus,
    stats: Arc<LoopStats>,
    pointer: PointerView,
    phase: Phase<W>,
}

impl<W: Window> Engine<W> {
    //--- Lifecycle --------------------------------------------------------

    /// Spawns the loop thread. Non-blocking.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyRunning`] if already started.
    /// - [`EngineError::Terminated`] after `stop`.
    /// - [`EngineError::Spawn`] if the OS refuses the thread; the engine
    ///   is terminal afterwards.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let scheduler = match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Ready(scheduler) => scheduler,
            running @ Phase::Running { .. } => {
                self.phase = running;
                return Err(EngineError::AlreadyRunning);
            }
            Phase::Stopped => return Err(EngineError::Terminated),
        };

        let running = Arc::new(AtomicBool::new(true));
        let (wake, wake_rx) = bounded(1);

        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("decaf-loop".to_string())
            .spawn(move || scheduler.run(flag, wake_rx))?;

        info!(target: "engine", "Engine \"{}\" started", self.info.title);

        self.phase = Phase::Running {
            handle,
            running,
            wake,
        };
        Ok(())
    }

    /// Clears the running flag, wakes the pacing sleep, and joins the
    /// loop thread. The in-flight iteration always completes first.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotRunning`] if never started.
    /// - [`EngineError::Terminated`] if already stopped.
    /// - [`EngineError::JoinFailed`] if the loop thread panicked.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        let (handle, running, wake) = match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Running {
                handle,
                running,
                wake,
            } => (handle, running, wake),
            ready @ Phase::Ready(_) => {
                self.phase = ready;
                return Err(EngineError::NotRunning);
            }
            Phase::Stopped => return Err(EngineError::Terminated),
        };

        info!(target: "engine", "Stopping engine \"{}\"", self.info.title);

        running.store(false, Ordering::Release);
        // Full means a wake is already pending, which is just as good.
        let _ = wake.try_send(());

        handle.join().map_err(|panic| {
            let msg = panic_message(panic.as_ref());
            error!(target: "engine", "Loop thread panicked: {}", msg);
            EngineError::JoinFailed(msg)
        })?;

        info!(target: "engine", "Engine \"{}\" stopped", self.info.title);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    //--- Accessors --------------------------------------------------------

    /// Bus for subscribing to update/render ticks. Usable while running.
    pub fn tick_bus(&self) -> &TickBus {
        &self.bus
    }

    /// Read-only view of the pointer mirror.
    pub fn pointer(&self) -> PointerView {
        self.pointer.clone()
    }

    /// Updates during the last completed wall-clock second.
    pub fn ups(&self) -> u32 {
        self.stats.ups()
    }

    /// Frames during the last completed wall-clock second.
    pub fn fps(&self) -> u32 {
        self.stats.fps()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }
}

impl<W: Window> Drop for Engine<W> {
    fn drop(&mut self) {
        if self.is_running() {
            warn!(target: "engine", "Engine dropped while running, stopping loop");
            if let Err(e) = self.stop() {
                error!(target: "engine", "Shutdown on drop failed: {}", e);
            }
        }
    }
}

impl<W: Window> fmt::Debug for Engine<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("info", &self.info)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
