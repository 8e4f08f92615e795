mod cli;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pointmorph_core::{Config, GestureMessage, LatestCell, Scene};
use pointmorph_feed::GestureFeed;
use pointmorph_platform::{GestureSource, LogRenderer, PointRenderer};
use pointmorph_ui::FeedLink;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::Cli;

const HEADLESS_DT: f32 = 1.0 / 60.0;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    info!("Pointmorph starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Pointmorph error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.resolve_config()?;
    let cell = LatestCell::<GestureMessage>::new();
    let mut feed = start_feed(&config, &cell);
    let events = feed.as_ref().map(GestureFeed::events);
    let mut scene = Scene::new(config);
    if let Some(shape) = cli.shape {
        scene.select_shape(shape);
    }

    let result: Result<(), Box<dyn std::error::Error>> = match cli.headless {
        Some(frames) => run_headless(scene, &cell, frames),
        None => pointmorph_ui::run(scene, FeedLink { cell, events }).map_err(|e| e.to_string().into()),
    };

    if let Some(feed) = feed.as_mut() {
        if let Err(e) = feed.stop() {
            warn!("gesture feed did not stop cleanly: {e}");
        }
    }
    result
}

/// `None` in demo mode or when the feed cannot start; the scene then runs on
/// its own targets.
fn start_feed(config: &Config, cell: &LatestCell<GestureMessage>) -> Option<GestureFeed> {
    if !config.feed.enabled {
        info!("demo mode, gesture feed disabled");
        return None;
    }
    let mut feed = GestureFeed::new(config.feed.clone(), cell.clone());
    match feed.start() {
        Ok(()) => Some(feed),
        Err(e) => {
            warn!("gesture feed unavailable, continuing in demo mode: {e}");
            None
        }
    }
}

fn run_headless(
    mut scene: Scene,
    cell: &LatestCell<GestureMessage>,
    frames: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut renderer = LogRenderer::new(60);
    renderer.init().map_err(|e| e.to_string())?;
    for _ in 0..frames {
        if let Some(message) = cell.take() {
            scene.apply_gestures(&message);
        }
        scene.advance(HEADLESS_DT);
        renderer.draw(&scene.frame()).map_err(|e| e.to_string())?;
        std::thread::sleep(Duration::from_secs_f32(HEADLESS_DT));
    }
    if let Some(stats) = renderer.last_stats() {
        info!(
            frames = renderer.frames(),
            points = stats.points,
            max_radius = stats.max_radius,
            "headless run finished"
        );
    }
    Ok(())
}
