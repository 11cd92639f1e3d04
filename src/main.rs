use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glow::HasContext;

use learngl::{abs::App, config::Config, logger, other, scenes, scenes::Variant};

/// Draws a couple of shapes with OpenGL and lets the keyboard move them around.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Which scene to show.
    #[arg(long, value_enum, default_value_t = Variant::Triangles)]
    variant: Variant,

    /// Path to a JSON config file. Defaults to `learngl/config.json` in the config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum level of log messages to print.
    #[arg(long, default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.log_level).context("failed to install logger")?;

    let config = Config::load(args.config.as_deref()).context("failed to load config")?;
    let mut app = App::new(&config.window)
        .map_err(anyhow::Error::msg)
        .context("failed to create window")?;
    log::info!(
        "Maximum nr of vertex attributes supported: {}",
        app.max_vertex_attribs()
    );

    let mut scene = scenes::create(args.variant, &app.gl, &config)
        .with_context(|| format!("failed to set up the {:?} scene", args.variant))?;

    let mut keyboard_state = other::KeyboardState::default();
    let mut last_frame_time = std::time::Instant::now();
    let [r, g, b, a] = config.clear_color;

    'running: loop {
        let now = std::time::Instant::now();
        let delta_time = now.duration_since(last_frame_time).as_secs_f32();
        last_frame_time = now;

        unsafe {
            app.gl.clear_color(r, g, b, a);
            app.gl.clear(glow::COLOR_BUFFER_BIT);
        }
        scene.render();

        for event in app.event_pump.poll_iter() {
            match event {
                sdl2::event::Event::Quit { .. }
                | sdl2::event::Event::KeyDown {
                    keycode: Some(sdl2::keyboard::Keycode::Escape),
                    ..
                } => break 'running,
                sdl2::event::Event::Window {
                    win_event: sdl2::event::WindowEvent::SizeChanged(width, height),
                    ..
                } => {
                    log::debug!("Window resized to {width}x{height}");
                    unsafe {
                        app.gl.viewport(0, 0, width, height);
                    }
                }
                sdl2::event::Event::KeyDown {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => keyboard_state.key_down(keycode),
                sdl2::event::Event::KeyUp {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => keyboard_state.key_up(keycode),
                _ => {}
            }
        }

        let update_ctx = other::UpdateContext::new(&keyboard_state, delta_time);
        scene.update(&update_ctx);

        app.window.gl_swap_window();
    }

    log::info!("Shutting down");
    drop(scene);
    Ok(())
}
