//! tile_tracer: real-time tiled CPU ray tracer rendered to the terminal
//!
//! Controls:
//! - W/S: move forward/back
//! - A/D: move left/right
//! - Space/C: move up/down
//! - Arrows: pitch and yaw
//! - P: pause, R: reset camera, Q or Escape: quit
//!
//! Log output goes to stderr; redirect it (`2>tracer.log`) while running
//! interactively.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tile_tracer::config::AppConfig;
use tile_tracer::scheduler::{available_workers, TileScheduler};
use tile_tracer::terminal::{parse_key_event, Action, FpsCounter, TerminalDisplay};
use tile_tracer::PixelBuffer;

/// Frame pacing for interactive mode (about 60 fps)
const FRAME_BUDGET: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Parser)]
#[command(name = "tile_tracer")]
#[command(version = "0.1.0")]
#[command(about = "Real-time tiled CPU ray tracer")]
struct Cli {
    /// Path to a scene config file (defaults to tracer.yaml or the built-in scene)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render interactively in the terminal
    Run {
        /// Override the worker thread count
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Render frames without a display and report timings
    Bench {
        /// Number of frames to render
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
        frames: u32,
        /// Override the worker thread count
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Validate the configuration and print the scene
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.log_level {
        logger.filter_level(level.into());
    }
    logger.init();

    let config = AppConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate()?;

    match cli.command {
        Commands::Run { workers } => run_interactive(&config, workers),
        Commands::Bench { frames, workers } => run_bench(&config, frames, workers),
        Commands::CheckConfig => {
            check_config(&config);
            Ok(())
        }
    }
}

/// Build the scheduler and report the tile layout for the configured window
fn start_scheduler(config: &AppConfig, workers: Option<usize>) -> anyhow::Result<TileScheduler> {
    let scheduler = match workers.or(config.render.workers) {
        Some(workers) => TileScheduler::new(workers)?,
        None => TileScheduler::with_available_parallelism()?,
    };

    let grid = scheduler.grid_for(config.window.width, config.window.height);
    let (block_w, block_h) = grid.block_size();
    log::info!("Available threads: {}", scheduler.workers());
    log::info!("Block size: {}x{} ({} tiles)", block_w, block_h, grid.tile_count());
    if !grid.is_exact() {
        log::warn!(
            "Window size {}x{} is not divisible by the {}x{} block size; {} pixels will not be rendered",
            config.window.width,
            config.window.height,
            block_w,
            block_h,
            grid.uncovered_pixels()
        );
    }

    Ok(scheduler)
}

fn run_interactive(config: &AppConfig, workers: Option<usize>) -> anyhow::Result<()> {
    let scheduler = start_scheduler(config, workers)?;
    let scene = config.scene();
    let initial_camera = config.camera();
    let mut camera = initial_camera;
    let mut buffer = PixelBuffer::new(config.window.width, config.window.height);

    let mut display = TerminalDisplay::new().context("Failed to initialize terminal")?;
    let mut fps = FpsCounter::default();
    let mut paused = false;
    let mut session = SessionLog::default();

    'main_loop: loop {
        let frame_start = Instant::now();
        display.check_resize();

        for key in display.poll_keys(Duration::from_millis(1))? {
            match parse_key_event(key) {
                Action::Quit => break 'main_loop,
                Action::Reset => camera = initial_camera,
                Action::Pause => paused = !paused,
                action => action.apply(&mut camera),
            }
        }

        if paused {
            std::thread::sleep(FRAME_BUDGET);
            continue;
        }

        let stats = scheduler.render_frame(&scene, camera, &mut buffer);
        log::debug!(
            "Frame rendered in {:.2}ms: {} tiles, {} pixels, {} hits",
            stats.elapsed.as_secs_f64() * 1000.0,
            stats.tiles,
            stats.pixels,
            stats.hits
        );

        let status = format!(
            "FPS: {:.0} | pos ({:.1}, {:.1}, {:.1}) | [WASD/Space/C] Move  [Arrows] Look  [R]eset  [P]ause  [Q]uit",
            fps.tick(),
            camera.position.x,
            camera.position.y,
            camera.position.z
        );

        if let Err(e) = display.present(&buffer, &status) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                break;
            }
            session.present_failed(e);
        }

        if let Some(rest) = FRAME_BUDGET.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    // stderr is hidden while the alternate screen is up
    drop(display);

    if let Some(line) = session.error_summary() {
        log::error!("{}", line);
    }
    let totals = scheduler.totals();
    log::info!("Rendered {} frames ({} tiles)", totals.frames, totals.tiles);
    Ok(())
}

/// Display errors seen while the terminal is in the alternate screen, held
/// back until the screen has been restored
#[derive(Debug, Default)]
struct SessionLog {
    present_errors: u64,
    last_error: Option<String>,
}

impl SessionLog {
    fn present_failed(&mut self, error: std::io::Error) {
        self.present_errors += 1;
        self.last_error = Some(error.to_string());
    }

    fn error_summary(&self) -> Option<String> {
        let last = self.last_error.as_ref()?;
        Some(format!("{} frames failed to display; last error: {}", self.present_errors, last))
    }
}

fn run_bench(config: &AppConfig, frames: u32, workers: Option<usize>) -> anyhow::Result<()> {
    let scheduler = start_scheduler(config, workers)?;
    let scene = config.scene();
    let camera = config.camera();
    let mut buffer = PixelBuffer::new(config.window.width, config.window.height);

    let start = Instant::now();
    for frame in 0..frames {
        let stats = scheduler.render_frame(&scene, camera, &mut buffer);
        log::debug!(
            "Frame {}: {:.2}ms, {} hits",
            frame,
            stats.elapsed.as_secs_f64() * 1000.0,
            stats.hits
        );
    }
    let elapsed = start.elapsed();

    let totals = scheduler.totals();
    let per_frame = elapsed.as_secs_f64() * 1000.0 / frames as f64;
    println!("Frames:       {}", totals.frames);
    println!("Workers:      {}", scheduler.workers());
    println!("Tiles:        {}", totals.tiles);
    println!("Pixels:       {}", totals.pixels);
    println!("Sphere hits:  {}", totals.hits);
    println!("Avg frame:    {:.2}ms ({:.1} fps)", per_frame, 1000.0 / per_frame);

    Ok(())
}

fn check_config(config: &AppConfig) {
    println!("✓ Configuration is valid\n");
    println!("Window: {}x{}", config.window.width, config.window.height);
    println!("Gamma: {}", config.render.gamma);
    match config.render.workers {
        Some(w) => println!("Workers: {}", w),
        None => println!("Workers: {} (hardware)", available_workers()),
    }
    println!(
        "Camera: position {:?}, rotation {:?}, fov {}",
        config.camera.position, config.camera.rotation, config.camera.fov
    );
    println!("\nSpheres:");
    for (i, s) in config.spheres.iter().enumerate() {
        println!("  [{}] center {:?} radius {} colour {:?}", i, s.center, s.radius, s.material.colour);
    }
    println!("\nLights:");
    for (i, l) in config.lights.iter().enumerate() {
        println!("  [{}] position {:?} colour {:?} intensity {}", i, l.position, l.colour, l.intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_rejects_zero_frames() {
        assert!(Cli::try_parse_from(["tile_tracer", "bench", "--frames", "0"]).is_err());

        let cli = Cli::try_parse_from(["tile_tracer", "bench", "--frames", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Bench { frames: 3, .. }));
    }

    #[test]
    fn test_session_log_keeps_display_errors() {
        let mut session = SessionLog::default();
        assert!(session.error_summary().is_none());

        session.present_failed(std::io::Error::other("first"));
        session.present_failed(std::io::Error::other("second"));
        let summary = session.error_summary().unwrap();
        assert!(summary.starts_with("2 frames failed"));
        assert!(summary.ends_with("second"));
    }
}
