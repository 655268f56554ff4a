//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use decaf_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::core::error::{EngineError, HandlerResult};

// Ticks
pub use crate::core::tick_bus::{FireReport, Subscription, TickBus, TickName};

// Input
pub use crate::core::input::{KeyCode, MouseButton, PointerView, RawInputEvent};

// Windowing
pub use crate::core::window::Window;
pub use crate::platform::{Platform, WinitFrame};
