//! Pointmorph core engine: platform-agnostic shape generation, gesture
//! reduction and per-frame particle animation.

pub mod animation;
pub mod cell;
pub mod color;
pub mod config;
pub mod error;
pub mod gesture;
pub mod particles;
pub mod scene;
pub mod shapes;

pub use animation::{ease, AnimationState, Overrides, Smoothed};
pub use cell::LatestCell;
pub use config::{
    AnimationConfig, Config, FeedConfig, GestureConfig, ParticleConfig, ShapeParams, Transport,
};
pub use error::{ConfigError, MessageError};
pub use gesture::{parse_message, Finger, GestureMessage, GestureTargets, HandEvent, HandSummary, Side};
pub use glam::Vec3;
pub use particles::{ParticleSet, ShapeTargetTable};
pub use scene::{FrameView, Scene};
pub use shapes::ShapeKind;
