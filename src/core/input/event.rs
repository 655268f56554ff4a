//=========================================================================
// Raw Input Events
//
// Engine-level representation of raw keyboard and mouse events captured
// by the platform layer. These events are not consumed by the scheduler;
// they are forwarded to whoever registered for them (see
// `platform::Platform::with_input_sender`).
//
//=========================================================================

//=== MouseButton Enum ====================================================
// Represents a physical mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

//=== KeyCode Enum ========================================================
// Physical keyboard key in a simplified, cross-platform form.
// Keys not listed here arrive as `Unidentified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Numeric keys -----------------------------------------------------
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic keys --------------------------------------------------
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Arrow keys -------------------------------------------------------
    ArrowDown, ArrowLeft, ArrowRight, ArrowUp,

    //--- Control keys -----------------------------------------------------
    Space, Enter, Escape, Backspace, Tab,

    //--- Fallback ---------------------------------------------------------
    Unidentified,
}

//=== RawInputEvent =======================================================
// Concrete input event as normalized by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseButtonDown(MouseButton),
    MouseButtonUp(MouseButton),
    MouseMoved { x: f32, y: f32 },
    CursorLeft,
}

impl RawInputEvent {
    /// `true` for keyboard events.
    pub fn is_keyboard(&self) -> bool {
        matches!(self, Self::KeyDown(_) | Self::KeyUp(_))
    }

    /// `true` for mouse button, motion, and leave events.
    pub fn is_mouse(&self) -> bool {
        !self.is_keyboard()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
