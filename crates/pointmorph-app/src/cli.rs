use std::path::PathBuf;

use clap::Parser;
use pointmorph_core::{Config, ConfigError, ShapeKind, Transport};

#[derive(Parser, Debug, Clone)]
#[command(name = "pointmorph", version, about = "Gesture-driven particle shapes")]
pub struct Cli {
    /// TOML config; a missing file means defaults.
    #[arg(long, default_value = "pointmorph.toml")]
    pub config: PathBuf,

    /// Particle count override.
    #[arg(long)]
    pub count: Option<usize>,

    /// Gesture feed address override, e.g. 127.0.0.1:8765.
    #[arg(long)]
    pub feed: Option<String>,

    /// Read newline-delimited JSON over plain TCP instead of WebSocket frames.
    #[arg(long, default_value_t = false)]
    pub lines: bool,

    /// Shape shown at startup.
    #[arg(long)]
    pub shape: Option<ShapeKind>,

    /// Run without a gesture feed.
    #[arg(long, default_value_t = false)]
    pub demo: bool,

    /// Text rendered by the text shape.
    #[arg(long)]
    pub text: Option<String>,

    /// Used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Step this many frames without a window, logging frame stats.
    #[arg(long)]
    pub headless: Option<u64>,
}

impl Cli {
    /// Load the config file and apply command-line overrides on top.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load_or_default(&self.config)?;
        if let Some(count) = self.count {
            config.particles.count = count;
        }
        if let Some(address) = &self.feed {
            config.feed.address = address.clone();
        }
        if let Some(text) = &self.text {
            config.particles.text = text.clone();
        }
        if self.lines {
            config.feed.transport = Transport::Lines;
        }
        if self.demo {
            config.feed.enabled = false;
        }
        config.validate()?;
        Ok(config)
    }
}
