//=========================================================================
// Core Systems
//
// Everything that runs on, or is shared with, the engine loop thread.
//
// Responsibilities:
// - Fixed-timestep scheduling with lag catch-up (`scheduler`)
// - Named tick dispatch to subscribers (`tick_bus`)
// - Pointer state mirrored once per iteration (`input`)
// - Time sources and loop configuration (`clock`, `config`)
// - The window collaborator seam (`window`)
//
// Notes:
// The core never talks to the OS directly. Time comes through `Clock`,
// pointer samples and render frames through `Window`; `platform`
// supplies the winit-backed implementations.
//
//=========================================================================

pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod scheduler;
pub mod tick_bus;
pub mod window;
