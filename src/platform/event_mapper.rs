//=========================================================================
// Platform Event Mapper
//
// Converts Winit input events to engine-level `RawInputEvent` types.
//
// Responsibilities:
// - Translate keyboard and mouse events
// - Report cursor motion and cursor-left (for the pointer mirror)
// - Ignore window events that carry no input (`None`)
//
//=========================================================================

use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::core::input::event::{KeyCode, MouseButton, RawInputEvent};

//=== Key Conversion ======================================================
//
// Maps `WinitKeyCode` values to the engine's `KeyCode` enum.
// Keys without an engine counterpart map to `Unidentified`.
//

impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Numeric keys -----------------------------------------------------
            Digit0 => KeyCode::Digit0, Digit1 => KeyCode::Digit1,
            Digit2 => KeyCode::Digit2, Digit3 => KeyCode::Digit3,
            Digit4 => KeyCode::Digit4, Digit5 => KeyCode::Digit5,
            Digit6 => KeyCode::Digit6, Digit7 => KeyCode::Digit7,
            Digit8 => KeyCode::Digit8, Digit9 => KeyCode::Digit9,

            //--- Alphabetic keys --------------------------------------------------
            KeyA => KeyCode::KeyA, KeyB => KeyCode::KeyB, KeyC => KeyCode::KeyC,
            KeyD => KeyCode::KeyD, KeyE => KeyCode::KeyE, KeyF => KeyCode::KeyF,
            KeyG => KeyCode::KeyG, KeyH => KeyCode::KeyH, KeyI => KeyCode::KeyI,
            KeyJ => KeyCode::KeyJ, KeyK => KeyCode::KeyK, KeyL => KeyCode::KeyL,
            KeyM => KeyCode::KeyM, KeyN => KeyCode::KeyN, KeyO => KeyCode::KeyO,
            KeyP => KeyCode::KeyP, KeyQ => KeyCode::KeyQ, KeyR => KeyCode::KeyR,
            KeyS => KeyCode::KeyS, KeyT => KeyCode::KeyT, KeyU => KeyCode::KeyU,
            KeyV => KeyCode::KeyV, KeyW => KeyCode::KeyW, KeyX => KeyCode::KeyX,
            KeyY => KeyCode::KeyY, KeyZ => KeyCode::KeyZ,

            //--- Arrow keys -------------------------------------------------------
            ArrowDown => KeyCode::ArrowDown, ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight, ArrowUp => KeyCode::ArrowUp,

            //--- Control keys -----------------------------------------------------
            Space => KeyCode::Space, Enter => KeyCode::Enter,
            Escape => KeyCode::Escape, Backspace => KeyCode::Backspace,
            Tab => KeyCode::Tab,

            //--- Fallback ---------------------------------------------------------
            _ => KeyCode::Unidentified,
        }
    }
}

//=== Mouse Conversion ====================================================

impl From<WinitMouseButton> for MouseButton {
    fn from(button: WinitMouseButton) -> Self {
        match button {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

//=== Full Event Conversion ===============================================
//
// Notes:
// - `KeyboardInput` becomes `KeyDown`/`KeyUp`; non-code keys are
//   reported as `Unidentified`.
// - `MouseInput` becomes `MouseButtonDown`/`MouseButtonUp`.
// - `CursorMoved` maps to `MouseMoved` (physical pixels).
// - `CursorLeft` maps to `CursorLeft`.
//

/// Converts a window event to a raw input event, if it is one.
pub(crate) fn map_window_event(event: &WindowEvent) -> Option<RawInputEvent> {
    match event {
        //--- Keyboard Input ------------------------------------------
        WindowEvent::KeyboardInput { event: key_event, .. } => {
            let key = match key_event.physical_key {
                PhysicalKey::Code(code) => KeyCode::from(code),
                _ => KeyCode::Unidentified,
            };
            Some(key_transition(key, key_event.state))
        }

        //--- Mouse Button Input --------------------------------------
        WindowEvent::MouseInput { state, button, .. } => {
            Some(button_transition(MouseButton::from(*button), *state))
        }

        //--- Pointer -------------------------------------------------
        WindowEvent::CursorMoved { position, .. } => Some(RawInputEvent::MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),

        WindowEvent::CursorLeft { .. } => Some(RawInputEvent::CursorLeft),

        //--- Unhandled Events ----------------------------------------
        _ => None,
    }
}

fn key_transition(key: KeyCode, state: ElementState) -> RawInputEvent {
    match state {
        ElementState::Pressed => RawInputEvent::KeyDown(key),
        ElementState::Released => RawInputEvent::KeyUp(key),
    }
}

fn button_transition(button: MouseButton, state: ElementState) -> RawInputEvent {
    match state {
        ElementState::Pressed => RawInputEvent::MouseButtonDown(button),
        ElementState::Released => RawInputEvent::MouseButtonUp(button),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
