//! Per-particle base palette and the intensity post-process.

use glam::Vec3;
use rand::Rng;

/// Number of hue bands the palette cycles through.
const HUE_BANDS: usize = 6;
const HUE_JITTER: f32 = 0.05;
const SATURATION: std::ops::RangeInclusive<f32> = 0.65..=0.9;
const LIGHTNESS: std::ops::RangeInclusive<f32> = 0.55..=0.7;

/// Base colors for `count` particles. Hue steps through a few bands by
/// index so neighbours differ, with a little jitter inside each band.
pub fn base_palette(count: usize, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let band = (i % HUE_BANDS) as f32 / HUE_BANDS as f32;
            let hue = (band + rng.gen_range(-HUE_JITTER..=HUE_JITTER)).rem_euclid(1.0);
            let saturation = rng.gen_range(SATURATION);
            let lightness = rng.gen_range(LIGHTNESS);
            hsl_to_rgb(hue, saturation, lightness)
        })
        .collect()
}

/// HSL to RGB, all components in 0..1.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Scale `base` by `intensity` into `out`, clamping every channel to 0..1.
/// `base` is left untouched so any intensity can be re-derived later.
pub fn apply_intensity(base: &[Vec3], intensity: f32, out: &mut Vec<Vec3>) {
    out.clear();
    out.extend(
        base.iter()
            .map(|c| (*c * intensity).clamp(Vec3::ZERO, Vec3::ONE)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn zero_saturation_is_gray() {
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.4), Vec3::splat(0.4));
    }

    #[test]
    fn palette_has_one_color_per_particle_in_range() {
        let palette = base_palette(999, &mut StdRng::seed_from_u64(3));
        assert_eq!(palette.len(), 999);
        for c in &palette {
            assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }
    }

    #[test]
    fn intensity_scales_and_clamps_without_touching_base() {
        let base = vec![Vec3::new(0.2, 0.5, 0.8)];
        let mut out = Vec::new();
        apply_intensity(&base, 2.0, &mut out);
        assert!(close(out[0], Vec3::new(0.4, 1.0, 1.0)));
        apply_intensity(&base, 0.5, &mut out);
        assert!(close(out[0], Vec3::new(0.1, 0.25, 0.4)));
        assert_eq!(base[0], Vec3::new(0.2, 0.5, 0.8));
    }
}
