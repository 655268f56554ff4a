//=========================================================================
// Window Collaborator
//=========================================================================
//
// The scheduler's view of the window/input provider.
//
// Per iteration the scheduler calls, in order:
//   poll_pointer()  → written into the pointer mirror
//   begin_frame()   → passed by &mut to every render-tick handler
//   end_frame()     → present / swap buffers
//
// Window creation, graphics contexts, and raw OS event capture live
// behind this trait (see `platform` for the winit implementation).
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use crate::core::input::PointerSample;

//=== Window Trait ========================================================

/// Window/input provider driven by the scheduler thread.
pub trait Window: Send + 'static {
    /// Render-tick payload: drawing surface plus buffer handles.
    type Frame: Send + 'static;

    /// Current pointer position, or [`PointerSample::OffScreen`].
    fn poll_pointer(&mut self) -> PointerSample;

    /// Acquires the surface and back buffer for this iteration's render.
    fn begin_frame(&mut self) -> Self::Frame;

    /// Presents a rendered frame. Default: drop it.
    fn end_frame(&mut self, _frame: Self::Frame) {}
}

//=== SwapBuffers =========================================================

/// Back/front buffer indices of a two-buffer swap chain for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapBuffers {
    pub back: u8,
    pub front: u8,
}

impl SwapBuffers {
    /// Buffers alternate every frame.
    pub fn for_frame(index: u64) -> Self {
        let back = (index % 2) as u8;
        Self {
            back,
            front: 1 - back,
        }
    }
}

//=== HeadlessWindow ======================================================

/// Window without an OS surface, for simulations and tests.
///
/// Pointer samples are set from outside through a [`HeadlessHandle`];
/// presented frames are counted there too.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    shared: Arc<HeadlessShared>,
    next_frame: u64,
}

#[derive(Debug)]
struct HeadlessShared {
    pointer: Mutex<PointerSample>,
    presented: AtomicU64,
}

impl Default for HeadlessShared {
    fn default() -> Self {
        Self {
            pointer: Mutex::new(PointerSample::OffScreen),
            presented: AtomicU64::new(0),
        }
    }
}

/// Render payload produced by [`HeadlessWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessFrame {
    pub index: u64,
    pub buffers: SwapBuffers,
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote control for this window, usable from other threads.
    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Window for HeadlessWindow {
    type Frame = HeadlessFrame;

    fn poll_pointer(&mut self) -> PointerSample {
        *self.shared.pointer.lock()
    }

    fn begin_frame(&mut self) -> HeadlessFrame {
        let index = self.next_frame;
        self.next_frame += 1;
        HeadlessFrame {
            index,
            buffers: SwapBuffers::for_frame(index),
        }
    }

    fn end_frame(&mut self, _frame: HeadlessFrame) {
        self.shared.presented.fetch_add(1, Ordering::SeqCst);
    }
}

//=== HeadlessHandle ======================================================

/// Shared control of a [`HeadlessWindow`].
#[derive(Debug, Clone)]
pub struct HeadlessHandle {
    shared: Arc<HeadlessShared>,
}

impl HeadlessHandle {
    /// Sets the sample returned by subsequent pointer polls.
    pub fn set_pointer(&self, sample: PointerSample) {
        *self.shared.pointer.lock() = sample;
    }

    /// Number of frames passed to `end_frame` so far.
    pub fn presented_frames(&self) -> u64 {
        self.shared.presented.load(Ordering::SeqCst)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
