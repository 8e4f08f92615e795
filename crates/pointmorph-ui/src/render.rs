//! Perspective point drawing onto an egui painter.

use egui::{Color32, Painter, Pos2, Rect, Shape};
use pointmorph_core::FrameView;
use pointmorph_platform::{PointRenderer, Result};

/// Vertical field of view of the pinhole camera.
const FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
const NEAR: f32 = 0.1;
const MIN_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub screen: Pos2,
    pub radius: f32,
    /// Distance from the camera along its view axis.
    pub depth: f32,
    pub color: Color32,
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rotate every point about Y, project it for a camera on +Z looking at the
/// origin, and return the visible points sorted far to near.
pub fn project(frame: &FrameView<'_>, viewport: Rect, out: &mut Vec<ProjectedPoint>) {
    out.clear();
    let (sin, cos) = frame.rotation_angle.sin_cos();
    let focal = viewport.height() * 0.5 / (FOV_Y * 0.5).tan();
    let center = viewport.center();
    let distance = frame.camera_distance;

    for (p, c) in frame.positions.chunks_exact(3).zip(frame.colors.chunks_exact(3)) {
        let x = p[0] * cos + p[2] * sin;
        let z = -p[0] * sin + p[2] * cos;
        let depth = distance - z;
        if depth <= NEAR {
            continue;
        }
        let scale = focal / depth;
        out.push(ProjectedPoint {
            screen: Pos2::new(center.x + x * scale, center.y - p[1] * scale),
            radius: (frame.point_size * 0.5 * distance / depth).max(MIN_RADIUS),
            depth,
            color: Color32::from_rgb(channel(c[0]), channel(c[1]), channel(c[2])),
        });
    }
    out.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

/// Draws a frame as filled circles into one painter region.
pub struct PainterRenderer<'a> {
    painter: &'a Painter,
    viewport: Rect,
    scratch: &'a mut Vec<ProjectedPoint>,
}

impl<'a> PainterRenderer<'a> {
    pub fn new(painter: &'a Painter, scratch: &'a mut Vec<ProjectedPoint>) -> Self {
        Self { viewport: painter.clip_rect(), painter, scratch }
    }
}

impl PointRenderer for PainterRenderer<'_> {
    fn draw(&mut self, frame: &FrameView<'_>) -> Result<()> {
        project(frame, self.viewport, self.scratch);
        self.painter.extend(
            self.scratch
                .iter()
                .map(|p| Shape::circle_filled(p.screen, p.radius, p.color)),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointmorph_core::ShapeKind;

    fn frame<'a>(positions: &'a [f32], colors: &'a [f32], angle: f32) -> FrameView<'a> {
        FrameView {
            positions,
            colors,
            rotation_angle: angle,
            camera_distance: 5.0,
            point_size: 2.0,
            active_shape: ShapeKind::Sphere,
            frozen: false,
        }
    }

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, egui::vec2(200.0, 100.0))
    }

    #[test]
    fn origin_lands_in_the_middle() {
        let mut out = Vec::new();
        project(&frame(&[0.0; 3], &[1.0; 3], 0.7), viewport(), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].screen, Pos2::new(100.0, 50.0));
        assert_eq!(out[0].depth, 5.0);
        assert_eq!(out[0].radius, 1.0);
        assert_eq!(out[0].color, Color32::WHITE);
    }

    #[test]
    fn sorted_far_to_near_and_closer_is_bigger() {
        let positions = [0.0, 0.0, 2.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0];
        let colors = [0.5; 9];
        let mut out = Vec::new();
        project(&frame(&positions, &colors, 0.0), viewport(), &mut out);
        let depths: Vec<f32> = out.iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![7.0, 5.0, 3.0]);
        assert!(out[2].radius > out[0].radius);
    }

    #[test]
    fn points_behind_the_camera_are_culled() {
        let positions = [0.0, 0.0, 6.0, 1.0, 0.0, 0.0];
        let colors = [1.0; 6];
        let mut out = Vec::new();
        project(&frame(&positions, &colors, 0.0), viewport(), &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn quarter_turn_moves_x_into_depth() {
        let positions = [1.0, 0.0, 0.0];
        let colors = [1.0; 3];
        let mut out = Vec::new();
        project(&frame(&positions, &colors, std::f32::consts::FRAC_PI_2), viewport(), &mut out);
        assert!((out[0].depth - 6.0).abs() < 1e-5);
        assert!((out[0].screen.x - 100.0).abs() < 1e-3);
        // y is up in the scene and down on screen.
        let up = [0.0, 1.0, 0.0];
        project(&frame(&up, &colors, 0.0), viewport(), &mut out);
        assert!(out[0].screen.y < 50.0);
    }
}
