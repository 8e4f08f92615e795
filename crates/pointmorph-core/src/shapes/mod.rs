//! Target point clouds for every shape.
//!
//! Each generator returns exactly `count` points; callers index them 1:1
//! against the particle set. Only the sphere is deterministic, the others
//! draw from the supplied RNG.

pub mod glyphs;

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ShapeParams;

/// Pixels per font cell when rasterizing text.
const TEXT_RASTER_SCALE: usize = 4;
const TEXT_DEPTH_JITTER: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Sphere,
    Cube,
    Pyramid,
    Diamond,
    Star,
    Text,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Sphere,
        ShapeKind::Cube,
        ShapeKind::Pyramid,
        ShapeKind::Diamond,
        ShapeKind::Star,
        ShapeKind::Text,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cube => "cube",
            ShapeKind::Pyramid => "pyramid",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Star => "star",
            ShapeKind::Text => "text",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.label() == name)
            .ok_or_else(|| format!("unknown shape '{s}'"))
    }
}

/// Fibonacci lattice on a sphere. Deterministic.
pub fn sphere(count: usize, radius: f32) -> Vec<Vec3> {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let denom = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|i| {
            let y = 1.0 - (i as f32 / denom) * 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = i as f32 * golden_angle;
            Vec3::new(theta.cos() * r * radius, y * radius, theta.sin() * r * radius)
        })
        .collect()
}

/// Points on the faces of an axis-aligned cube.
pub fn cube(count: usize, half: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let mut p = [
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
            ];
            let axis = rng.gen_range(0..3usize);
            p[axis] = if rng.gen_bool(0.5) { half } else { -half };
            Vec3::from_array(p)
        })
        .collect()
}

/// Square pyramid, apex up. The base half-width tapers linearly to zero.
pub fn pyramid(count: usize, half: f32, height: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let t: f32 = rng.gen();
            let w = half * (1.0 - t);
            Vec3::new(rng.gen_range(-w..=w), -half + t * height, rng.gen_range(-w..=w))
        })
        .collect()
}

/// Octahedron surface: random vectors normalized by their L1 norm.
pub fn diamond(count: usize, radius: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|_| loop {
            let v = Vec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            );
            let l1 = v.x.abs() + v.y.abs() + v.z.abs();
            if l1 > 1e-4 {
                break v / l1 * radius;
            }
        })
        .collect()
}

/// Flat star in the XY plane with a little depth jitter. Even indices sit on
/// the outer radius, odd ones on the inner radius.
pub fn star(count: usize, outer: f32, inner: f32, depth: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let base = if i % 2 == 0 { outer } else { inner };
            let angle = rng.gen_range(0.0..TAU);
            let r = base * rng.gen_range(0.7..=1.0);
            let z = (rng.gen::<f32>() - 0.5) * depth;
            Vec3::new(angle.cos() * r, angle.sin() * r, z)
        })
        .collect()
}

/// Raster `text` and place `count` points on its covered pixels, centred on
/// the origin and `params.text_width` units wide. Falls back to the sphere lattice when
/// nothing in `text` renders.
pub fn text(count: usize, text: &str, params: &ShapeParams, rng: &mut impl Rng) -> Vec<Vec3> {
    let Some(bitmap) = glyphs::rasterize(text, TEXT_RASTER_SCALE) else {
        warn!(text, "text shape has nothing to render, using sphere");
        return sphere(count, params.sphere_radius);
    };

    let scale = params.text_width / bitmap.width as f32;
    let cx = bitmap.width as f32 * 0.5;
    let cy = bitmap.height as f32 * 0.5;
    let collected: Vec<Vec3> = bitmap
        .coverage(params.text_alpha_threshold)
        .map(|(x, y)| {
            Vec3::new(
                (x as f32 + 0.5 - cx) * scale,
                (cy - y as f32 - 0.5) * scale,
                rng.gen_range(-TEXT_DEPTH_JITTER..=TEXT_DEPTH_JITTER),
            )
        })
        .collect();

    if collected.is_empty() {
        warn!(text, "text raster has no covered pixels, using sphere");
        return sphere(count, params.sphere_radius);
    }
    resample(&collected, count, scale * 0.5, rng)
}

/// Stretch or shrink `points` to exactly `count` entries. Shrinking keeps an
/// even stride through the source; growing repeats random source points with
/// an in-plane jitter of up to `jitter`.
fn resample(points: &[Vec3], count: usize, jitter: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    let len = points.len();
    if len >= count {
        return (0..count).map(|i| points[i * len / count]).collect();
    }
    let mut out = points.to_vec();
    out.extend((len..count).map(|_| {
        let p = points[rng.gen_range(0..len)];
        p + Vec3::new(rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter), 0.0)
    }));
    out
}

/// Generate the target cloud for `kind`.
pub fn generate(
    kind: ShapeKind,
    count: usize,
    params: &ShapeParams,
    text_value: &str,
    rng: &mut impl Rng,
) -> Vec<Vec3> {
    match kind {
        ShapeKind::Sphere => sphere(count, params.sphere_radius),
        ShapeKind::Cube => cube(count, params.cube_half, rng),
        ShapeKind::Pyramid => pyramid(count, params.pyramid_half, params.pyramid_height, rng),
        ShapeKind::Diamond => diamond(count, params.diamond_radius, rng),
        ShapeKind::Star => star(count, params.star_outer, params.star_inner, params.star_depth, rng),
        ShapeKind::Text => text(count, text_value, params, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn every_generator_returns_count_points() {
        let params = ShapeParams::default();
        let mut rng = rng();
        for count in [1usize, 2, 3, 17, 1000] {
            for kind in ShapeKind::ALL {
                let points = generate(kind, count, &params, "HI", &mut rng);
                assert_eq!(points.len(), count, "{kind} with count {count}");
                assert!(points.iter().all(|p| p.is_finite()));
            }
        }
    }

    #[test]
    fn sphere_is_bit_identical_across_calls() {
        let a = sphere(500, 2.2);
        let b = sphere(500, 2.2);
        let a_bits: Vec<[u32; 3]> = a.iter().map(|p| p.to_array().map(f32::to_bits)).collect();
        let b_bits: Vec<[u32; 3]> = b.iter().map(|p| p.to_array().map(f32::to_bits)).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn sphere_follows_fibonacci_lattice() {
        let points = sphere(5, 2.0);
        assert_eq!(points[0], Vec3::new(0.0, 2.0, 0.0));
        assert!((points[4].y + 2.0).abs() < 1e-6);
        let middle = points[2];
        assert!(middle.y.abs() < 1e-6);
        assert!((middle.length() - 2.0).abs() < 1e-5);
        for p in &points {
            assert!((p.length() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn single_point_sphere_is_the_north_pole() {
        assert_eq!(sphere(1, 3.0), vec![Vec3::new(0.0, 3.0, 0.0)]);
    }

    #[test]
    fn cube_points_lie_on_a_face() {
        let half = 1.5;
        for p in cube(2000, half, &mut rng()) {
            let on_face = p.to_array().iter().any(|c| (c.abs() - half).abs() < 1e-6);
            assert!(on_face, "{p:?} not on a face");
            assert!(p.abs().max_element() <= half + 1e-6);
        }
    }

    #[test]
    fn pyramid_tapers_toward_apex() {
        let (half, height) = (1.8, 3.6);
        for p in pyramid(2000, half, height, &mut rng()) {
            let t = (p.y + half) / height;
            assert!((-1e-5..=1.0 + 1e-5).contains(&t));
            let w = half * (1.0 - t) + 1e-4;
            assert!(p.x.abs() <= w && p.z.abs() <= w);
        }
    }

    #[test]
    fn diamond_points_have_unit_l1_norm() {
        for p in diamond(2000, 2.4, &mut rng()) {
            let l1 = p.x.abs() + p.y.abs() + p.z.abs();
            assert!((l1 - 2.4).abs() < 1e-4);
        }
    }

    #[test]
    fn star_alternates_outer_and_inner_bands() {
        let (outer, inner, depth) = (2.6, 1.1, 0.3);
        let points = star(1000, outer, inner, depth, &mut rng());
        for (i, p) in points.iter().enumerate() {
            let r = p.truncate().length();
            let base = if i % 2 == 0 { outer } else { inner };
            assert!(r >= base * 0.7 - 1e-4 && r <= base + 1e-4);
            assert!(p.z.abs() <= depth * 0.5 + 1e-6);
        }
    }

    #[test]
    fn text_points_sit_in_a_thin_slab_of_given_width() {
        let params = ShapeParams::default();
        let points = text(3000, "AB", &params, &mut rng());
        assert_eq!(points.len(), 3000);
        let half_w = params.text_width * 0.5 + 0.2;
        for p in &points {
            assert!(p.x.abs() <= half_w);
            assert!(p.z.abs() <= TEXT_DEPTH_JITTER + 1e-6);
        }
    }

    #[test]
    fn resample_shrinks_by_even_stride() {
        let line: Vec<Vec3> = (0..100).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let picked = resample(&line, 10, 0.0, &mut rng());
        let xs: Vec<f32> = picked.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]);
    }

    #[test]
    fn resample_pads_near_existing_points() {
        let source = vec![Vec3::X, Vec3::Y, Vec3::Z];
        let padded = resample(&source, 40, 0.05, &mut rng());
        assert_eq!(padded.len(), 40);
        assert_eq!(&padded[..3], &source[..]);
        for p in &padded[3..] {
            assert!(source.iter().any(|s| (*p - *s).length() <= 0.05 * 1.5));
        }
    }

    #[test]
    fn blank_text_falls_back_to_sphere() {
        let params = ShapeParams::default();
        let points = text(50, "   ", &params, &mut rng());
        assert_eq!(points, sphere(50, params.sphere_radius));
    }

    #[test]
    fn shape_names_parse_case_insensitively() {
        assert_eq!("Cube".parse::<ShapeKind>().unwrap(), ShapeKind::Cube);
        assert_eq!(" star ".parse::<ShapeKind>().unwrap(), ShapeKind::Star);
        assert!("torus".parse::<ShapeKind>().is_err());
    }
}
