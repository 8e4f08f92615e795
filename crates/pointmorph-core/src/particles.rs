//! Particle set and per-shape target table.
//!
//! Both are index-aligned: the target for particle `i` is always read at
//! index `i` of the active shape's array.

use std::collections::HashMap;

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info};

use crate::color;
use crate::config::{ParticleConfig, ShapeParams};
use crate::shapes::{self, ShapeKind};

const AMPLITUDE_RANGE: std::ops::RangeInclusive<f32> = 0.05..=0.15;

/// Parallel per-particle arrays. Regenerated wholesale on resize.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    rest: Vec<Vec3>,
    phase: Vec<f32>,
    amplitude: Vec<f32>,
    base_color: Vec<Vec3>,
}

impl ParticleSet {
    /// Fresh set of `count` particles scattered uniformly through a ball of
    /// `config.scatter_radius`.
    pub fn generate(count: usize, config: &ParticleConfig, rng: &mut impl Rng) -> Self {
        let radius = config.scatter_radius;
        let rest = (0..count)
            .map(|_| {
                let theta = rng.gen_range(0.0..std::f32::consts::TAU);
                let cos_phi: f32 = rng.gen_range(-1.0..=1.0);
                let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
                let r = radius * rng.gen::<f32>().cbrt();
                Vec3::new(r * sin_phi * theta.cos(), r * cos_phi, r * sin_phi * theta.sin())
            })
            .collect();
        let phase = (0..count).map(|_| rng.gen_range(0.0..std::f32::consts::TAU)).collect();
        let amplitude = (0..count).map(|_| rng.gen_range(AMPLITUDE_RANGE)).collect();
        let base_color = color::base_palette(count, rng);
        Self { rest, phase, amplitude, base_color }
    }

    /// Assemble a set from explicit arrays. Returns `None` unless all four
    /// have the same length.
    pub fn from_parts(
        rest: Vec<Vec3>,
        phase: Vec<f32>,
        amplitude: Vec<f32>,
        base_color: Vec<Vec3>,
    ) -> Option<Self> {
        let n = rest.len();
        (phase.len() == n && amplitude.len() == n && base_color.len() == n)
            .then_some(Self { rest, phase, amplitude, base_color })
    }

    pub fn len(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn rest(&self) -> &[Vec3] {
        &self.rest
    }

    pub fn phase(&self) -> &[f32] {
        &self.phase
    }

    pub fn amplitude(&self) -> &[f32] {
        &self.amplitude
    }

    pub fn base_color(&self) -> &[Vec3] {
        &self.base_color
    }
}

/// Target positions for every shape, precomputed for one particle count.
/// The text entry is cached by its string and only rebuilt when it changes.
#[derive(Debug, Clone, Default)]
pub struct ShapeTargetTable {
    count: usize,
    targets: HashMap<ShapeKind, Vec<Vec3>>,
    text_key: Option<String>,
}

impl ShapeTargetTable {
    /// Empty table for `count` particles. Every lookup falls back to the sphere
    /// until targets are inserted.
    pub fn empty(count: usize) -> Self {
        Self { count, targets: HashMap::new(), text_key: None }
    }

    /// Precompute every shape for `count` particles.
    pub fn build(count: usize, params: &ShapeParams, text: &str, rng: &mut impl Rng) -> Self {
        let mut table = Self::empty(count);
        for kind in ShapeKind::ALL {
            if kind == ShapeKind::Text {
                continue;
            }
            table.targets.insert(kind, shapes::generate(kind, count, params, text, rng));
        }
        table.set_text(text, params, rng);
        info!(count, "built shape targets");
        table
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn text(&self) -> Option<&str> {
        self.text_key.as_deref()
    }

    /// Insert a target array. Arrays whose length differs from the table's
    /// count are rejected and `false` is returned.
    pub fn insert(&mut self, kind: ShapeKind, points: Vec<Vec3>) -> bool {
        if points.len() != self.count {
            debug!(%kind, expected = self.count, got = points.len(), "rejected target array");
            return false;
        }
        self.targets.insert(kind, points);
        true
    }

    /// Rebuild the text targets if `text` differs from the cached string.
    /// Returns whether a rebuild happened.
    pub fn set_text(&mut self, text: &str, params: &ShapeParams, rng: &mut impl Rng) -> bool {
        if self.text_key.as_deref() == Some(text) && self.targets.contains_key(&ShapeKind::Text) {
            return false;
        }
        let points = shapes::text(self.count, text, params, rng);
        self.targets.insert(ShapeKind::Text, points);
        self.text_key = Some(text.to_owned());
        info!(count = self.count, text, "built text targets");
        true
    }

    /// Targets for `kind`, falling back to the sphere when `kind` is missing.
    /// Returns `None` only when the sphere itself is missing too.
    pub fn get(&self, kind: ShapeKind) -> Option<&[Vec3]> {
        self.targets
            .get(&kind)
            .or_else(|| self.targets.get(&ShapeKind::Sphere))
            .map(Vec::as_slice)
    }
}
