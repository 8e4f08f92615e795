//! Per-frame animation integrator.
//!
//! Field ownership in [`AnimationState`]:
//! - `targets` is written by the gesture reducer only (the UI may pick a shape).
//! - `overrides` is written by manual controls only; the reducer never touches it.
//! - `smoothed` and `frozen_snapshot` are written by [`step`] only.

use glam::Vec3;

use crate::config::AnimationConfig;
use crate::gesture::GestureTargets;
use crate::particles::{ParticleSet, ShapeTargetTable};

/// Values the integrator eases toward their targets every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    /// Blend from rest scatter (0) to the active shape (1).
    pub formation_progress: f32,
    /// In `[1, max_rotation_multiplier]`.
    pub rotation_multiplier: f32,
    pub zoom_current: f32,
    pub rotation_angle: f32,
    /// Seconds of animation time, drives the oscillation.
    pub elapsed: f32,
}

/// Manual switches, OR-ed with the matching gesture flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub frozen: bool,
    pub forming: bool,
}

#[derive(Debug, Clone)]
pub struct AnimationState {
    pub targets: GestureTargets,
    pub overrides: Overrides,
    pub smoothed: Smoothed,
    frozen_snapshot: Option<Vec<Vec3>>,
}

impl AnimationState {
    pub fn new(config: &AnimationConfig) -> Self {
        let targets = GestureTargets::new(config);
        Self {
            smoothed: Smoothed {
                formation_progress: 0.0,
                rotation_multiplier: 1.0,
                zoom_current: targets.zoom_target,
                rotation_angle: 0.0,
                elapsed: 0.0,
            },
            targets,
            overrides: Overrides::default(),
            frozen_snapshot: None,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_snapshot.is_some()
    }

    /// Drop the frozen snapshot. Called when the particle set is rebuilt.
    pub fn invalidate_snapshot(&mut self) {
        self.frozen_snapshot = None;
    }
}

/// Cubic smoothstep `t²(3 - 2t)`, `t` clamped to `0..1`.
pub fn ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// First-order approach of `current` toward `target`.
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * (rate * dt).min(1.0)
}

/// Advance one frame and write particle positions into `positions`.
///
/// `positions` must hold one entry per particle and carries the previous
/// frame's output in; it is what a freeze captures.
pub fn step(
    state: &mut AnimationState,
    particles: &ParticleSet,
    table: &ShapeTargetTable,
    config: &AnimationConfig,
    dt: f32,
    positions: &mut [Vec3],
) {
    let dt = dt.clamp(0.0, config.max_dt);
    let targets = state.targets;
    let frozen = targets.frozen || state.overrides.frozen;
    let forming = targets.right_pinch_active || state.overrides.forming;
    let s = &mut state.smoothed;
    s.elapsed += dt;

    let zoom_target = targets.zoom_target.clamp(config.min_zoom, config.max_zoom);
    s.zoom_current = approach(s.zoom_current, zoom_target, config.zoom_rate, dt);

    if frozen {
        let held = state.frozen_snapshot.as_ref().filter(|snap| snap.len() == positions.len());
        if let Some(snapshot) = held {
            positions.copy_from_slice(snapshot);
        } else {
            state.frozen_snapshot = Some(positions.to_vec());
        }
        return;
    }
    state.frozen_snapshot = None;

    let formation_goal = if forming { 1.0 } else { 0.0 };
    s.formation_progress = approach(s.formation_progress, formation_goal, config.formation_rate, dt);
    let rotation_goal = if targets.left_pinch_active { config.max_rotation_multiplier } else { 1.0 };
    s.rotation_multiplier = approach(s.rotation_multiplier, rotation_goal, config.rotation_rate, dt);

    let blend = ease(s.formation_progress);
    let rest = particles.rest();
    let goal = table.get(targets.active_shape).filter(|t| t.len() == rest.len());
    let oscillate = blend > config.oscillation_threshold;
    let wave_time = s.elapsed * config.oscillation_frequency;

    for (i, out) in positions.iter_mut().enumerate().take(rest.len()) {
        let Some(goal) = goal else {
            *out = rest[i];
            continue;
        };
        let target = goal[i];
        let mut p = rest[i] * (1.0 - blend) + target * blend;
        if oscillate {
            let wave = (wave_time + particles.phase()[i]).sin();
            p += target.normalize_or_zero() * (wave * particles.amplitude()[i] * blend);
        }
        *out = p;
    }

    let speed = s.rotation_multiplier * config.rotation_boost + targets.speed_boost;
    s.rotation_angle += targets.rotation_direction * config.base_rotation_speed * speed * dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;

    #[test]
    fn ease_hits_endpoints_and_is_monotonic() {
        assert_eq!(ease(0.0), 0.0);
        assert_eq!(ease(1.0), 1.0);
        let mut last = 0.0;
        for i in 0..=1000 {
            let v = ease(i as f32 / 1000.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn approach_never_overshoots() {
        assert_eq!(approach(0.0, 1.0, 100.0, 1.0), 1.0);
        let v = approach(0.0, 1.0, 2.0, 0.1);
        assert!((v - 0.2).abs() < 1e-6);
    }

    fn two_particles() -> (ParticleSet, ShapeTargetTable) {
        let set = ParticleSet::from_parts(
            vec![Vec3::ZERO, Vec3::X],
            vec![0.0, 1.0],
            vec![0.1, 0.1],
            vec![Vec3::ONE; 2],
        )
        .unwrap();
        let mut table = ShapeTargetTable::empty(2);
        table.insert(ShapeKind::Sphere, vec![Vec3::Y * 2.0, Vec3::Z * 2.0]);
        (set, table)
    }

    #[test]
    fn dt_is_clamped() {
        let config = AnimationConfig::default();
        let (set, table) = two_particles();
        let mut state = AnimationState::new(&config);
        let mut positions = set.rest().to_vec();
        step(&mut state, &set, &table, &config, 10.0, &mut positions);
        assert!((state.smoothed.elapsed - config.max_dt).abs() < 1e-6);
    }

    #[test]
    fn rotation_follows_direction_and_speed_boost() {
        let config = AnimationConfig::default();
        let (set, table) = two_particles();
        let mut state = AnimationState::new(&config);
        let mut positions = set.rest().to_vec();
        step(&mut state, &set, &table, &config, 0.02, &mut positions);
        let forward = state.smoothed.rotation_angle;
        assert!(forward > 0.0);

        let mut reversed = AnimationState::new(&config);
        reversed.targets.rotation_direction = -1.0;
        reversed.targets.speed_boost = 2.0;
        step(&mut reversed, &set, &table, &config, 0.02, &mut positions);
        assert!(reversed.smoothed.rotation_angle < -forward * 2.0);
    }

    #[test]
    fn freeze_holds_positions_and_rotation() {
        let config = AnimationConfig::default();
        let (set, table) = two_particles();
        let mut state = AnimationState::new(&config);
        state.targets.right_pinch_active = true;
        let mut positions = set.rest().to_vec();
        for _ in 0..10 {
            step(&mut state, &set, &table, &config, 0.016, &mut positions);
        }

        state.targets.frozen = true;
        step(&mut state, &set, &table, &config, 0.016, &mut positions);
        assert!(state.is_frozen());
        let held = positions.clone();
        let angle = state.smoothed.rotation_angle;
        for _ in 0..20 {
            step(&mut state, &set, &table, &config, 0.016, &mut positions);
            assert_eq!(positions, held);
        }
        assert_eq!(state.smoothed.rotation_angle, angle);

        state.targets.frozen = false;
        step(&mut state, &set, &table, &config, 0.016, &mut positions);
        assert!(!state.is_frozen());
        assert_ne!(positions, held);
    }

    #[test]
    fn oscillation_runs_along_the_target_direction() {
        let config = AnimationConfig::default();
        let (set, table) = two_particles();
        let goal = table.get(ShapeKind::Sphere).unwrap().to_vec();
        let mut state = AnimationState::new(&config);
        state.targets.right_pinch_active = true;
        state.smoothed.formation_progress = 1.0;
        let mut positions = set.rest().to_vec();
        step(&mut state, &set, &table, &config, 0.016, &mut positions);
        assert_eq!(ease(state.smoothed.formation_progress), 1.0);

        for i in 0..2 {
            let offset = positions[i] - goal[i];
            let along = goal[i].normalize();
            assert!(offset.cross(along).length() < 1e-6, "particle {i} drifts sideways");
            assert!(offset.length() <= set.amplitude()[i] + 1e-6);
        }
        // Phase 1.0 puts the second particle near the crest of its wave.
        let offset = positions[1] - goal[1];
        assert!(offset.length() > 0.05);
        assert!(offset.dot(goal[1]) > 0.0);
    }

    #[test]
    fn no_oscillation_below_the_blend_threshold() {
        let config = AnimationConfig::default();
        let (set, table) = two_particles();
        let goal = table.get(ShapeKind::Sphere).unwrap().to_vec();
        let mut state = AnimationState::new(&config);
        state.smoothed.formation_progress = 0.08;
        let mut positions = set.rest().to_vec();
        step(&mut state, &set, &table, &config, 0.016, &mut positions);

        let blend = ease(state.smoothed.formation_progress);
        assert!(blend > 0.0 && blend <= config.oscillation_threshold, "{blend}");
        for i in 0..2 {
            assert_eq!(positions[i], set.rest()[i] * (1.0 - blend) + goal[i] * blend);
        }
    }

    #[test]
    fn left_pinch_spins_up_to_the_max_multiplier() {
        let config = AnimationConfig::default();
        let (set, table) = two_particles();
        let mut positions = set.rest().to_vec();

        let mut idle = AnimationState::new(&config);
        step(&mut idle, &set, &table, &config, 0.016, &mut positions);
        let idle_delta = idle.smoothed.rotation_angle;

        let mut state = AnimationState::new(&config);
        state.targets.left_pinch_active = true;
        let mut last = state.smoothed.rotation_multiplier;
        for _ in 0..400 {
            step(&mut state, &set, &table, &config, 0.016, &mut positions);
            assert!(state.smoothed.rotation_multiplier >= last);
            last = state.smoothed.rotation_multiplier;
        }
        assert!((last - config.max_rotation_multiplier).abs() < 1e-3);

        let before = state.smoothed.rotation_angle;
        step(&mut state, &set, &table, &config, 0.016, &mut positions);
        let spun_delta = state.smoothed.rotation_angle - before;
        assert!(spun_delta > idle_delta * (config.max_rotation_multiplier - 0.1));

        state.targets.left_pinch_active = false;
        for _ in 0..400 {
            step(&mut state, &set, &table, &config, 0.016, &mut positions);
        }
        assert!((state.smoothed.rotation_multiplier - 1.0).abs() < 1e-3);
    }

    #[test]
    fn missing_targets_leave_particles_at_rest() {
        let config = AnimationConfig::default();
        let (set, _) = two_particles();
        let table = ShapeTargetTable::empty(2);
        let mut state = AnimationState::new(&config);
        state.targets.right_pinch_active = true;
        let mut positions = vec![Vec3::splat(9.0); 2];
        step(&mut state, &set, &table, &config, 0.016, &mut positions);
        assert_eq!(positions, set.rest());
    }
}
