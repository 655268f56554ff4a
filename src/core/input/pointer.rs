//=========================================================================
// Pointer State Mirror
//=========================================================================
//
// Latest pointer position/visibility, written once per loop iteration by
// the scheduler and read from anywhere.
//
// Architecture:
//   Window::poll_pointer() → PointerSample → PointerMirror::update()
//                                                   │ (single writer)
//                                                   ▼
//                                    Arc<RwLock<PointerState>>
//                                                   │ (many readers)
//                                                   ▼
//                                        PointerView::snapshot()
//
// All three fields are replaced under one write lock, so a reader can
// never see `off_screen == false` together with coordinates from an
// older sample.
//
// Readers never wait on each other. A read that lands during a write
// waits for that write only, which is a copy of three fields with no
// other work under the lock.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use parking_lot::RwLock;

//=== PointerSample =======================================================

/// One poll of the pointer from the window collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSample {
    /// Cursor is over the drawing surface at these surface coordinates.
    At { x: i32, y: i32 },
    /// Cursor is outside the drawing surface.
    OffScreen,
}

//=== PointerState ========================================================

/// Committed pointer snapshot.
///
/// While off screen, `x`/`y` keep the last on-screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerState {
    pub x: i32,
    pub y: i32,
    pub off_screen: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            off_screen: true,
        }
    }
}

impl PointerState {
    /// Position if the pointer is on screen.
    pub fn position(&self) -> Option<(i32, i32)> {
        (!self.off_screen).then_some((self.x, self.y))
    }

    fn apply(self, sample: PointerSample) -> Self {
        match sample {
            PointerSample::At { x, y } => Self {
                x,
                y,
                off_screen: false,
            },
            PointerSample::OffScreen => Self {
                off_screen: true,
                ..self
            },
        }
    }
}

//=== PointerMirror =======================================================

/// Write side of the pointer mirror. Owned by the scheduler.
///
/// Not `Clone`: there is exactly one writer.
#[derive(Debug, Default)]
pub struct PointerMirror {
    state: Arc<RwLock<PointerState>>,
}

impl PointerMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a new sample, replacing all fields at once.
    pub fn update(&self, sample: PointerSample) {
        let mut state = self.state.write();
        *state = state.apply(sample);
    }

    /// Creates a read-only view sharing this mirror's state.
    pub fn view(&self) -> PointerView {
        PointerView {
            state: Arc::clone(&self.state),
        }
    }
}

//=== PointerView =========================================================

/// Read side of the pointer mirror. Cheap to clone and `Send + Sync`.
#[derive(Debug, Clone)]
pub struct PointerView {
    state: Arc<RwLock<PointerState>>,
}

impl PointerView {
    /// Latest committed snapshot.
    ///
    /// Waits only while the scheduler is mid-commit (a three-field copy).
    pub fn snapshot(&self) -> PointerState {
        *self.state.read()
    }

    pub fn x(&self) -> i32 {
        self.snapshot().x
    }

    pub fn y(&self) -> i32 {
        self.snapshot().y
    }

    pub fn is_off_screen(&self) -> bool {
        self.snapshot().off_screen
    }

    /// `Some((x, y))` while the pointer is over the surface.
    pub fn position(&self) -> Option<(i32, i32)> {
        self.snapshot().position()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
