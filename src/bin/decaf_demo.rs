//=========================================================================
// Decaf Demo
//
// Opens a window, moves a point at a fixed 60 UPS, and logs what the
// render tick sees. Run with `RUST_LOG=debug` to see UPS/FPS rollover.
//
//=========================================================================

use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use log::{error, info};
use parking_lot::Mutex;

use decaf_engine::prelude::*;

/// Simulation state shared between the update and render handlers.
#[derive(Debug, Default)]
struct Ball {
    x: f32,
    velocity: f32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!(target: "demo", "{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let bus = TickBus::new();
    let ball = Arc::new(Mutex::new(Ball {
        x: 0.0,
        velocity: 2.0,
    }));

    //--- Update: fixed-step simulation -------------------------------------
    let sim = Arc::clone(&ball);
    bus.on_update(move || {
        let mut ball = sim.lock();
        ball.x += ball.velocity;
        if !(0.0..=640.0).contains(&ball.x) {
            ball.velocity = -ball.velocity;
        }
        Ok(())
    });

    //--- Render: one frame per iteration -----------------------------------
    let view = Arc::clone(&ball);
    bus.on_render(move |frame: &mut WinitFrame| {
        if frame.index % 120 == 0 {
            let size = frame.size();
            info!(
                target: "demo",
                "frame {} ({}x{}, back buffer {}): ball at {:.1}",
                frame.index,
                size.width,
                size.height,
                frame.buffers.back,
                view.lock().x
            );
        }
        Ok(())
    })?;

    //--- Raw input: logged on a side thread --------------------------------
    let (input_tx, input_rx) = unbounded::<RawInputEvent>();
    thread::Builder::new()
        .name("decaf-input".to_string())
        .spawn(move || {
            for event in input_rx {
                if event.is_keyboard() {
                    info!(target: "demo", "{:?}", event);
                }
            }
        })?;

    let builder = EngineBuilder::new("Decaf Demo", 640, 480)
        .with_ups(60.0)
        .with_max_updates_per_iteration(10)
        .with_tick_bus(bus);

    Platform::new(builder).with_input_sender(input_tx).run()?;
    Ok(())
}
