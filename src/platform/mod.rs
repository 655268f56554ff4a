//=========================================================================
// Platform Subsystem
//
// Hosts the engine inside a Winit event loop.
//
// Architecture:
// ```text
//  Main Thread (winit):                   Loop Thread (engine):
//  ┌───────────────────────────┐         ┌─────────────────────────┐
//  │  resumed()                │         │                         │
//  │   ├─ create OS window     │         │                         │
//  │   └─ build + start Engine ┼────────>│  Scheduler::run         │
//  │                           │         │   ├─ poll_pointer() ◄─┐ │
//  │  CursorMoved / CursorLeft │         │   ├─ update ticks     │ │
//  │   └─ CursorSlot ──────────┼─────────┼───┼───────────────────┘ │
//  │                           │         │   └─ render tick        │
//  │  Key / Mouse events       │         │       └─ request_redraw │
//  │   └─ Sender<RawInputEvent>┼──> app  │                         │
//  │                           │         │                         │
//  │  CloseRequested           │         │                         │
//  │   └─ Engine::stop() ──────┼────────>│  (joins)                │
//  └───────────────────────────┘         └─────────────────────────┘
// ```
//
// Key Design Decisions:
// - **Window created lazily**: winit only allows window creation once the
//   loop is active, so the engine is built inside `resumed()`.
// - **Main thread requirement**: winit mandates the main thread on
//   macOS/iOS, so `Platform::run` must be called from `main`.
// - **Graceful channel disconnect**: if the raw-input receiver is dropped,
//   forwarding stops with a warning; the window keeps running.
//
//=========================================================================

//=== Submodules ==========================================================

mod event_mapper;
mod winit_window;

//=== External Crates =====================================================

use std::sync::Arc;

use crossbeam_channel::Sender;
use log::*;
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::error::EngineError;
use crate::core::input::event::RawInputEvent;
use crate::engine::{Engine, EngineBuilder};
use event_mapper::map_window_event;

//=== Public API ==========================================================

pub use winit_window::{CursorSlot, WinitFrame, WinitWindow};

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
///
/// All of these are fatal for the running application.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to create event loop (rare, indicates OS-level issue).
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(#[source] winit::error::EventLoopError),

    /// Event loop execution error.
    #[error("event loop error: {0}")]
    EventLoopExecution(#[source] winit::error::EventLoopError),

    /// The OS window could not be created.
    #[error("window creation failed: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    /// Building, starting, or stopping the engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

//=== Platform ============================================================

/// Window host and raw input forwarder.
///
/// # Lifecycle
///
/// 1. **Construction**: `Platform::new(builder)`; nothing is created yet
/// 2. **Execution**: `platform.run()` blocks in the winit event loop
/// 3. **Resume**: window created, engine built around it and started
/// 4. **Shutdown**: close requested → engine stopped (joined) → loop exits
///
/// # Thread Safety
///
/// Lives on the main thread. The engine loop thread only sees the window
/// through [`WinitWindow`] and the shared [`CursorSlot`].
pub struct Platform {
    /// Consumed in `resumed()`.
    builder: Option<EngineBuilder>,

    /// Running engine (None until the window exists).
    engine: Option<Engine<WinitWindow>>,

    window: Option<Arc<winit::window::Window>>,
    cursor: CursorSlot,

    /// Raw key/mouse events for the application, if requested.
    input_sender: Option<Sender<RawInputEvent>>,

    /// First fatal error, returned from `run`.
    fatal: Option<PlatformError>,
}

impl Platform {
    //--- Construction -----------------------------------------------------

    pub fn new(builder: EngineBuilder) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            builder: Some(builder),
            engine: None,
            window: None,
            cursor: CursorSlot::new(),
            input_sender: None,
            fatal: None,
        }
    }

    /// Forwards every raw keyboard/mouse event to `sender`.
    pub fn with_input_sender(mut self, sender: Sender<RawInputEvent>) -> Self {
        self.input_sender = Some(sender);
        self
    }

    //--- Execution --------------------------------------------------------

    /// Runs the winit event loop until the window is closed.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop or window cannot be
    /// created, or if the engine fails to build, start, or stop cleanly.
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS Winit requirement).
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;
        event_loop
            .run_app(&mut self)
            .map_err(PlatformError::EventLoopExecution)?;

        // Surfaces a join failure to the caller.
        self.shutdown_engine();

        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn start_engine(&mut self, event_loop: &ActiveEventLoop) -> Result<(), PlatformError> {
        let Some(builder) = self.builder.take() else {
            debug!(target: "platform", "Engine already built (mobile resume?)");
            return Ok(());
        };

        let info = builder.info();
        let attrs = WindowAttributes::default()
            .with_title(info.title.clone())
            .with_inner_size(LogicalSize::new(info.width, info.height));

        let window = Arc::new(event_loop.create_window(attrs)?);
        info!(
            target: "platform",
            "Window created: {}x{} @ {}x DPI",
            window.inner_size().width,
            window.inner_size().height,
            window.scale_factor()
        );

        let mut engine = builder.build(WinitWindow::new(Arc::clone(&window), self.cursor.clone()))?;
        engine.start()?;

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }

    fn shutdown_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.stop() {
                error!(target: "platform", "Engine shutdown failed: {}", e);
                self.fatal.get_or_insert(e.into());
            }
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: PlatformError) {
        error!(target: "platform", "{}", err);
        self.fatal.get_or_insert(err);
        self.shutdown_engine();
        event_loop.exit();
    }

    /// Updates the cursor slot and forwards the event to the application.
    fn handle_input(&mut self, event: RawInputEvent) {
        match event {
            RawInputEvent::MouseMoved { x, y } => self.cursor.moved(f64::from(x), f64::from(y)),
            RawInputEvent::CursorLeft => self.cursor.left(),
            _ => {}
        }

        let Some(sender) = &self.input_sender else {
            return;
        };
        if sender.send(event).is_err() {
            warn!(
                target: "platform::input",
                "Input receiver disconnected, no longer forwarding raw input"
            );
            self.input_sender = None;
        }
    }

    //--- Test Accessors ---------------------------------------------------

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> &CursorSlot {
        &self.cursor
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Platform {
    /// Called when app becomes active (startup or mobile resume).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.start_engine(event_loop) {
            self.fail(event_loop, err);
        }
    }

    /// Handles per-window events.
    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.shutdown_engine();
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => {
                trace!(target: "platform", "Redraw requested");
            }

            _ => {
                if let Some(input) = map_window_event(&event) {
                    trace!(target: "platform::input", "{:?}", input);
                    self.handle_input(input);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        debug!(target: "platform", "Event loop exiting");
        self.shutdown_engine();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
