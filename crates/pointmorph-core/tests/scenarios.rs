use pointmorph_core::animation::{self, AnimationState};
use pointmorph_core::gesture::{self, parse_message};
use pointmorph_core::{AnimationConfig, Config, GestureConfig, ParticleSet, Scene, ShapeKind, ShapeTargetTable, Vec3};

fn four_particle_scene(amplitude: f32) -> (ParticleSet, ShapeTargetTable) {
    let rest = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    let set = ParticleSet::from_parts(rest, vec![0.3, 1.1, 2.0, 4.2], vec![amplitude; 4], vec![Vec3::ONE; 4])
        .expect("parallel arrays");
    let mut table = ShapeTargetTable::empty(4);
    assert!(table.insert(
        ShapeKind::Sphere,
        vec![
            Vec3::new(0.0, 0.0, 2.2),
            Vec3::new(0.0, 0.0, -2.2),
            Vec3::new(2.2, 0.0, 0.0),
            Vec3::new(-2.2, 0.0, 0.0),
        ],
    ));
    (set, table)
}

#[test]
fn fully_formed_without_oscillation_lands_on_targets() {
    let config = AnimationConfig::default();
    let (set, table) = four_particle_scene(0.0);
    let mut state = AnimationState::new(&config);
    state.targets.right_pinch_active = true;
    state.smoothed.formation_progress = 1.0;
    let mut positions = set.rest().to_vec();

    animation::step(&mut state, &set, &table, &config, 0.016, &mut positions);

    assert_eq!(state.smoothed.formation_progress, 1.0);
    assert_eq!(positions, table.get(ShapeKind::Sphere).unwrap());
}

#[test]
fn holding_a_pinch_converges_on_the_shape() {
    let config = AnimationConfig::default();
    let (set, table) = four_particle_scene(0.1);
    let mut state = AnimationState::new(&config);
    state.targets.right_pinch_active = true;
    let mut positions = set.rest().to_vec();

    for _ in 0..2000 {
        animation::step(&mut state, &set, &table, &config, 1.0 / 60.0, &mut positions);
    }

    assert!((1.0 - state.smoothed.formation_progress).abs() < 1e-5);
    let targets = table.get(ShapeKind::Sphere).unwrap();
    for (i, (p, t)) in positions.iter().zip(targets).enumerate() {
        let bound = set.amplitude()[i] + 1e-3;
        assert!((*p - *t).length() <= bound, "particle {i} off by {}", (*p - *t).length());
    }
}

#[test]
fn releasing_the_pinch_returns_to_rest() {
    let config = AnimationConfig::default();
    let (set, table) = four_particle_scene(0.1);
    let mut state = AnimationState::new(&config);
    state.smoothed.formation_progress = 1.0;
    let mut positions = set.rest().to_vec();

    for _ in 0..2000 {
        animation::step(&mut state, &set, &table, &config, 1.0 / 60.0, &mut positions);
    }

    assert!(state.smoothed.formation_progress < 1e-5);
    for (p, r) in positions.iter().zip(set.rest()) {
        assert!((*p - *r).length() < 1e-3);
    }
}

#[test]
fn targets_are_index_aligned_not_nearest() {
    // Particle 1 rests at +X but its target is on -Z, far from the nearest
    // target (+X at index 2). It still goes to index 1.
    let config = AnimationConfig::default();
    let (set, table) = four_particle_scene(0.0);
    let mut state = AnimationState::new(&config);
    state.targets.right_pinch_active = true;
    state.smoothed.formation_progress = 1.0;
    let mut positions = set.rest().to_vec();
    animation::step(&mut state, &set, &table, &config, 0.016, &mut positions);
    assert_eq!(positions[1], Vec3::new(0.0, 0.0, -2.2));
}

#[test]
fn frozen_frames_are_byte_identical() {
    let mut config = Config::default();
    config.particles.count = 300;
    let mut scene = Scene::new(config);
    scene.set_forming(true);
    for _ in 0..30 {
        scene.advance(0.016);
    }
    scene.set_frozen(true);
    scene.advance(0.016);
    let first: Vec<u8> = le_bytes(scene.frame().positions);
    for _ in 0..50 {
        scene.advance(0.016);
        assert_eq!(le_bytes(scene.frame().positions), first);
    }
}

fn le_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn gesture_stream_drives_the_scene() {
    let mut config = Config::default();
    config.particles.count = 200;
    let mut scene = Scene::new(config);

    for line in [
        r#"{"hands":[{"side":"right","pinch_finger":"middle"}]}"#,
        r#"{"hands":[{"side":"right","pinch_finger":null}]}"#,
    ] {
        scene.apply_gestures(&parse_message(line).unwrap());
    }
    assert_eq!(scene.state().targets.active_shape, ShapeKind::Cube);

    scene.apply_gestures(&parse_message(r#"{"hands":[{"side":"left","pinch_finger":"pinky"}]}"#).unwrap());
    scene.advance(0.016);
    assert!(scene.frame().frozen);

    scene.apply_gestures(&parse_message(r#"{"hands":[]}"#).unwrap());
    scene.advance(0.016);
    assert!(!scene.frame().frozen);
}

#[test]
fn malformed_messages_leave_targets_untouched() {
    let anim = AnimationConfig::default();
    let gestures = GestureConfig::default();
    let mut targets = gesture::GestureTargets::new(&anim);
    targets = gesture::reduce(
        &targets,
        &parse_message(r#"{"hands":[{"side":"left","pinch_finger":"ring"}]}"#).unwrap(),
        &gestures,
        &anim,
    );
    for bad in ["{", "[]", r#"{"hands": 3}"#, ""] {
        if let Ok(message) = parse_message(bad) {
            targets = gesture::reduce(&targets, &message, &gestures, &anim);
        }
    }
    assert_eq!(targets.rotation_direction, -1.0);
}

#[test]
fn zoom_smoothing_tracks_the_clamped_target() {
    let mut config = Config::default();
    config.particles.count = 10;
    let mut scene = Scene::new(config.clone());
    scene.apply_gestures(
        &parse_message(r#"{"hands":[{"side":"left","pinch_finger":"middle","hand_size_norm":1.0}]}"#).unwrap(),
    );
    for _ in 0..1000 {
        scene.advance(0.05);
    }
    assert!((scene.frame().camera_distance - config.animation.min_zoom).abs() < 1e-4);
}
