//=========================================================================
// Decaf Engine - Library Root
//
// A fixed-timestep loop that fires `update-tick` at a steady logical rate
// and `render-tick` once per iteration, with a pointer mirror and a
// winit host.
//
// Typical usage:
// ```no_run
// use decaf_engine::EngineBuilder;
// use decaf_engine::platform::Platform;
//
// fn main() -> Result<(), Box<dyn std::error::Error>> {
//     Platform::new(EngineBuilder::new("Decaf", 800, 600)).run()?;
//     Ok(())
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the loop, tick bus, pointer mirror, and their seams
// (`Clock`, `Window`). Exposed for headless use and testing.
//
// `platform` hosts the engine inside a winit event loop.
//
pub mod core;
pub mod platform;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the builder and lifecycle facade.
//
mod engine;

//--- Public Exports ------------------------------------------------------

pub use engine::{AppInfo, Engine, EngineBuilder};
