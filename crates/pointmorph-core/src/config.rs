//! Runtime configuration, loaded from TOML. Every field has a default so a
//! partial (or missing) file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::gesture::Finger;
use crate::shapes::ShapeKind;

pub const MAX_PARTICLES: usize = 200_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub particles: ParticleConfig,
    pub shapes: ShapeParams,
    pub animation: AnimationConfig,
    pub gestures: GestureConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    pub point_size: f32,
    pub color_intensity: f32,
    /// Radius of the ball the rest positions are scattered in.
    pub scatter_radius: f32,
    pub text: String,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 5000,
            point_size: 2.0,
            color_intensity: 1.0,
            scatter_radius: 5.0,
            text: "HELLO".into(),
        }
    }
}

/// Size parameters for the shape generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    pub sphere_radius: f32,
    pub cube_half: f32,
    pub pyramid_half: f32,
    pub pyramid_height: f32,
    pub diamond_radius: f32,
    pub star_outer: f32,
    pub star_inner: f32,
    pub star_depth: f32,
    pub text_width: f32,
    pub text_alpha_threshold: u8,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            sphere_radius: 2.2,
            cube_half: 1.6,
            pyramid_half: 1.8,
            pyramid_height: 3.6,
            diamond_radius: 2.4,
            star_outer: 2.6,
            star_inner: 1.1,
            star_depth: 0.3,
            text_width: 6.0,
            text_alpha_threshold: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Radians per second at multiplier 1.
    pub base_rotation_speed: f32,
    pub rotation_boost: f32,
    pub max_rotation_multiplier: f32,
    pub formation_rate: f32,
    pub rotation_rate: f32,
    pub zoom_rate: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub initial_zoom: f32,
    pub max_dt: f32,
    pub oscillation_frequency: f32,
    pub oscillation_threshold: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            base_rotation_speed: 0.25,
            rotation_boost: 1.0,
            max_rotation_multiplier: 4.0,
            formation_rate: 3.0,
            rotation_rate: 2.0,
            zoom_rate: 4.0,
            min_zoom: 3.0,
            max_zoom: 12.0,
            initial_zoom: 7.0,
            max_dt: 0.05,
            oscillation_frequency: 2.0,
            oscillation_threshold: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub min_finger_distance: f32,
    pub max_finger_distance: f32,
    pub max_speed_boost: f32,
    pub min_hand_size: f32,
    pub max_hand_size: f32,
    pub right_pinch: RightPinchMap,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_finger_distance: 0.015,
            max_finger_distance: 0.12,
            max_speed_boost: 3.0,
            min_hand_size: 0.08,
            max_hand_size: 0.25,
            right_pinch: RightPinchMap::default(),
        }
    }
}

/// Which shape a right-hand pinch of each finger selects. `None` leaves the
/// active shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightPinchMap {
    pub index: Option<ShapeKind>,
    pub middle: Option<ShapeKind>,
    pub ring: Option<ShapeKind>,
    pub pinky: Option<ShapeKind>,
}

impl Default for RightPinchMap {
    fn default() -> Self {
        Self {
            index: Some(ShapeKind::Sphere),
            middle: Some(ShapeKind::Cube),
            ring: Some(ShapeKind::Pyramid),
            pinky: Some(ShapeKind::Star),
        }
    }
}

impl RightPinchMap {
    pub fn shape_for(&self, finger: Finger) -> Option<ShapeKind> {
        match finger {
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }
}

/// Framing of the gesture stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `ws://` text frames, one JSON message per frame.
    #[default]
    WebSocket,
    /// Plain TCP, one JSON message per line.
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub address: String,
    pub transport: Transport,
    pub enabled: bool,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8765".into(),
            transport: Transport::WebSocket,
            enabled: true,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
            read_timeout_ms: 250,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.particles.count;
        if count == 0 || count > MAX_PARTICLES {
            return Err(ConfigError::Invalid(format!(
                "particles.count must be in 1..={MAX_PARTICLES}, got {count}"
            )));
        }
        let anim = &self.animation;
        if anim.min_zoom <= 0.0 || anim.min_zoom >= anim.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "animation zoom window [{}, {}] is empty",
                anim.min_zoom, anim.max_zoom
            )));
        }
        if anim.max_rotation_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "animation.max_rotation_multiplier must be >= 1".into(),
            ));
        }
        if anim.max_dt <= 0.0 {
            return Err(ConfigError::Invalid("animation.max_dt must be positive".into()));
        }
        let g = &self.gestures;
        if g.min_finger_distance >= g.max_finger_distance {
            return Err(ConfigError::Invalid(format!(
                "gestures finger window [{}, {}] is empty",
                g.min_finger_distance, g.max_finger_distance
            )));
        }
        if g.min_hand_size >= g.max_hand_size {
            return Err(ConfigError::Invalid(format!(
                "gestures hand size window [{}, {}] is empty",
                g.min_hand_size, g.max_hand_size
            )));
        }
        if self.feed.initial_backoff_ms == 0 || self.feed.initial_backoff_ms > self.feed.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "feed backoff must satisfy 0 < initial_backoff_ms <= max_backoff_ms".into(),
            ));
        }
        Ok(())
    }
}
