//=========================================================================
// Input
//
// Pointer mirror written by the scheduler each iteration, plus the raw
// keyboard/mouse event types forwarded by the platform layer.
//
//=========================================================================

//=== Submodules ==========================================================
pub mod event;
pub mod pointer;

//=== Public API ==========================================================
pub use event::{KeyCode, MouseButton, RawInputEvent};
pub use pointer::{PointerMirror, PointerSample, PointerState, PointerView};
