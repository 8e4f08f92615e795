//! Frame facade: owns the particle set, shape targets, animation state and
//! the output buffers handed to a point renderer.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::animation::{self, AnimationState};
use crate::color;
use crate::config::{Config, MAX_PARTICLES};
use crate::gesture::{self, GestureMessage};
use crate::particles::{ParticleSet, ShapeTargetTable};
use crate::shapes::ShapeKind;

/// Borrowed view of one frame's output.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// `x, y, z` per particle.
    pub positions: &'a [f32],
    /// `r, g, b` per particle, intensity already applied.
    pub colors: &'a [f32],
    pub rotation_angle: f32,
    pub camera_distance: f32,
    pub point_size: f32,
    pub active_shape: ShapeKind,
    pub frozen: bool,
}

impl FrameView<'_> {
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

pub struct Scene {
    config: Config,
    rng: StdRng,
    particles: ParticleSet,
    table: ShapeTargetTable,
    state: AnimationState,
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl Scene {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Like [`Scene::new`] but with a caller-seeded RNG.
    pub fn with_rng(config: Config, mut rng: StdRng) -> Self {
        let count = config.particles.count.clamp(1, MAX_PARTICLES);
        let particles = ParticleSet::generate(count, &config.particles, &mut rng);
        let table =
            ShapeTargetTable::build(count, &config.shapes, &config.particles.text, &mut rng);
        let state = AnimationState::new(&config.animation);
        let mut scene = Self {
            positions: particles.rest().to_vec(),
            colors: Vec::with_capacity(count),
            config,
            rng,
            particles,
            table,
            state,
        };
        scene.refresh_colors();
        scene
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Recreate the whole particle set and every shape target for `count`
    /// particles. Gesture targets survive, the frozen snapshot does not.
    pub fn rebuild(&mut self, count: usize) {
        let count = count.clamp(1, MAX_PARTICLES);
        let text = self.table.text().unwrap_or(&self.config.particles.text).to_owned();
        self.particles = ParticleSet::generate(count, &self.config.particles, &mut self.rng);
        self.table = ShapeTargetTable::build(count, &self.config.shapes, &text, &mut self.rng);
        self.positions = self.particles.rest().to_vec();
        self.state.invalidate_snapshot();
        self.config.particles.count = count;
        self.refresh_colors();
        info!(count, "rebuilt particle set");
    }

    /// Rebuild the text targets if `text` changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let rebuilt = self.table.set_text(text, &self.config.shapes, &mut self.rng);
        if rebuilt {
            self.config.particles.text = text.to_owned();
        }
        rebuilt
    }

    pub fn text(&self) -> &str {
        self.table.text().unwrap_or(&self.config.particles.text)
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.config.particles.color_intensity = intensity.max(0.0);
        self.refresh_colors();
    }

    pub fn set_point_size(&mut self, size: f32) {
        self.config.particles.point_size = size.max(0.0);
    }

    pub fn set_rotation_boost(&mut self, boost: f32) {
        self.config.animation.rotation_boost = boost.max(0.0);
    }

    fn refresh_colors(&mut self) {
        color::apply_intensity(
            self.particles.base_color(),
            self.config.particles.color_intensity,
            &mut self.colors,
        );
    }

    /// Feed one gesture message through the reducer.
    pub fn apply_gestures(&mut self, message: &GestureMessage) {
        self.state.targets = gesture::reduce(
            &self.state.targets,
            message,
            &self.config.gestures,
            &self.config.animation,
        );
    }

    pub fn select_shape(&mut self, shape: ShapeKind) {
        self.state.targets.active_shape = shape;
    }

    /// Manual freeze. Holds regardless of what the gesture stream says.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.state.overrides.frozen = frozen;
    }

    /// Manual formation, same effect as holding a right-hand pinch.
    pub fn set_forming(&mut self, forming: bool) {
        self.state.overrides.forming = forming;
    }

    pub fn advance(&mut self, dt: f32) {
        animation::step(
            &mut self.state,
            &self.particles,
            &self.table,
            &self.config.animation,
            dt,
            &mut self.positions,
        );
    }

    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            positions: bytemuck::cast_slice(&self.positions),
            colors: bytemuck::cast_slice(&self.colors),
            rotation_angle: self.state.smoothed.rotation_angle,
            camera_distance: self.state.smoothed.zoom_current,
            point_size: self.config.particles.point_size,
            active_shape: self.state.targets.active_shape,
            frozen: self.state.is_frozen(),
        }
    }
}
