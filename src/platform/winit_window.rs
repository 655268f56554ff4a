//=========================================================================
// Winit Window Adapter
//=========================================================================
//
// Implements the scheduler's `Window` collaborator on top of a winit
// window owned by the event loop thread.
//
//   Event loop thread                 Loop thread
//   ─────────────────                 ───────────
//   CursorMoved / CursorLeft          poll_pointer()
//        │                                 ▲
//        └──────> CursorSlot ──────────────┘
//
//   begin_frame() → WinitFrame { window, index, buffers }
//   end_frame()   → request_redraw()
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use parking_lot::Mutex;
use winit::dpi::PhysicalSize;

//=== Internal Dependencies ===============================================

use crate::core::input::PointerSample;
use crate::core::window::{SwapBuffers, Window};

//=== CursorSlot ==========================================================

/// Latest cursor sample, written by the event loop and polled by the
/// loop thread once per iteration.
#[derive(Debug, Clone)]
pub struct CursorSlot {
    sample: Arc<Mutex<PointerSample>>,
}

impl CursorSlot {
    pub fn new() -> Self {
        Self {
            sample: Arc::new(Mutex::new(PointerSample::OffScreen)),
        }
    }

    /// Records a cursor position in physical pixels.
    pub fn moved(&self, x: f64, y: f64) {
        *self.sample.lock() = PointerSample::At {
            x: x.round() as i32,
            y: y.round() as i32,
        };
    }

    pub fn left(&self) {
        *self.sample.lock() = PointerSample::OffScreen;
    }

    pub fn sample(&self) -> PointerSample {
        *self.sample.lock()
    }
}

impl Default for CursorSlot {
    fn default() -> Self {
        Self::new()
    }
}

//=== WinitFrame ==========================================================

/// Render payload for a winit-backed engine.
///
/// Carries the window handle so render handlers can attach a surface
/// (softbuffer, wgpu, ...) of their choosing.
pub struct WinitFrame {
    pub window: Arc<winit::window::Window>,
    pub index: u64,
    pub buffers: SwapBuffers,
}

impl WinitFrame {
    pub fn size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }
}

//=== WinitWindow =========================================================

pub struct WinitWindow {
    window: Arc<winit::window::Window>,
    cursor: CursorSlot,
    next_frame: u64,
}

impl WinitWindow {
    pub fn new(window: Arc<winit::window::Window>, cursor: CursorSlot) -> Self {
        Self {
            window,
            cursor,
            next_frame: 0,
        }
    }
}

impl Window for WinitWindow {
    type Frame = WinitFrame;

    fn poll_pointer(&mut self) -> PointerSample {
        self.cursor.sample()
    }

    fn begin_frame(&mut self) -> WinitFrame {
        let index = self.next_frame;
        self.next_frame += 1;
        WinitFrame {
            window: Arc::clone(&self.window),
            index,
            buffers: SwapBuffers::for_frame(index),
        }
    }

    fn end_frame(&mut self, frame: WinitFrame) {
        frame.window.request_redraw();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_slot_starts_off_screen() {
        assert_eq!(CursorSlot::new().sample(), PointerSample::OffScreen);
    }

    #[test]
    fn cursor_slot_rounds_to_whole_pixels() {
        let slot = CursorSlot::new();
        slot.moved(10.4, 19.6);
        assert_eq!(slot.sample(), PointerSample::At { x: 10, y: 20 });
    }

    #[test]
    fn cursor_slot_is_shared_between_clones() {
        let writer = CursorSlot::new();
        let reader = writer.clone();

        writer.moved(3.0, 4.0);
        assert_eq!(reader.sample(), PointerSample::At { x: 3, y: 4 });

        writer.left();
        assert_eq!(reader.sample(), PointerSample::OffScreen);
    }
}
