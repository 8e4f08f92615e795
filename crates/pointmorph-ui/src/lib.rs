//! eframe viewer for a pointmorph [`Scene`].

pub mod render;

use crossbeam_channel::Receiver;
use egui::Key;
use pointmorph_core::config::MAX_PARTICLES;
use pointmorph_core::{Finger, GestureMessage, HandSummary, LatestCell, Scene, ShapeKind};
use pointmorph_platform::{PointRenderer, SourceStatus};
use tracing::{info, warn};

use crate::render::{PainterRenderer, ProjectedPoint};

const SHAPE_KEYS: [(Key, ShapeKind); 6] = [
    (Key::Num1, ShapeKind::Sphere),
    (Key::Num2, ShapeKind::Cube),
    (Key::Num3, ShapeKind::Pyramid),
    (Key::Num4, ShapeKind::Diamond),
    (Key::Num5, ShapeKind::Star),
    (Key::Num6, ShapeKind::Text),
];

/// Where gesture messages come from. `events` is `None` in demo mode.
pub struct FeedLink {
    pub cell: LatestCell<GestureMessage>,
    pub events: Option<Receiver<SourceStatus>>,
}

pub fn run(scene: Scene, feed: FeedLink) -> eframe::Result {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Pointmorph")
            .with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    info!(particles = scene.count(), "starting viewer");
    eframe::run_native(
        "Pointmorph",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(ViewerApp::new(scene, feed)))),
    )
}

pub struct ViewerApp {
    scene: Scene,
    feed: FeedLink,
    feed_status: Option<SourceStatus>,
    pending_count: usize,
    text_input: String,
    scratch: Vec<ProjectedPoint>,
}

impl ViewerApp {
    pub fn new(scene: Scene, feed: FeedLink) -> Self {
        let feed_status = feed.events.as_ref().map(|_| SourceStatus::Idle);
        Self {
            pending_count: scene.count(),
            text_input: scene.text().to_owned(),
            scene,
            feed,
            feed_status,
            scratch: Vec::new(),
        }
    }

    fn poll_feed(&mut self) {
        if let Some(events) = &self.feed.events {
            if let Some(latest) = events.try_iter().last() {
                self.feed_status = Some(latest);
            }
        }
        if let Some(message) = self.feed.cell.take() {
            self.scene.apply_gestures(&message);
        }
    }

    fn handle_keys(&mut self, context: &egui::Context) {
        if context.wants_keyboard_input() {
            return;
        }
        let (shape, toggle_freeze) = context.input(|i| {
            let shape = SHAPE_KEYS
                .iter()
                .find(|(key, _)| i.key_pressed(*key))
                .map(|(_, shape)| *shape);
            (shape, i.key_pressed(Key::Space))
        });
        if let Some(shape) = shape {
            self.scene.select_shape(shape);
        }
        if toggle_freeze {
            let frozen = self.scene.state().overrides.frozen;
            self.scene.set_frozen(!frozen);
        }
    }

    fn apply_text(&mut self) {
        let text = self.text_input.trim().to_owned();
        if self.scene.set_text(&text) {
            info!(%text, "text targets rebuilt");
        }
        self.scene.select_shape(ShapeKind::Text);
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pointmorph");
        ui.separator();

        let count = ui.add(
            egui::Slider::new(&mut self.pending_count, 1..=MAX_PARTICLES)
                .logarithmic(true)
                .text("particles"),
        );
        let released = count.drag_stopped() || (count.changed() && !count.dragged());
        if released && self.pending_count != self.scene.count() {
            self.scene.rebuild(self.pending_count);
        }

        let particles = &self.scene.config().particles;
        let (mut size, mut intensity) = (particles.point_size, particles.color_intensity);
        let mut boost = self.scene.config().animation.rotation_boost;
        if ui.add(egui::Slider::new(&mut size, 0.5..=8.0).text("point size")).changed() {
            self.scene.set_point_size(size);
        }
        if ui.add(egui::Slider::new(&mut intensity, 0.0..=2.0).text("intensity")).changed() {
            self.scene.set_intensity(intensity);
        }
        if ui.add(egui::Slider::new(&mut boost, 0.0..=5.0).text("rotation boost")).changed() {
            self.scene.set_rotation_boost(boost);
        }

        ui.separator();
        let mut selected = self.scene.state().targets.active_shape;
        ui.horizontal_wrapped(|ui| {
            for shape in ShapeKind::ALL {
                ui.selectable_value(&mut selected, shape, shape.label());
            }
        });
        if selected != self.scene.state().targets.active_shape {
            self.scene.select_shape(selected);
        }

        ui.horizontal(|ui| {
            let field = ui.text_edit_singleline(&mut self.text_input);
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            if ui.button("apply").clicked() || submitted {
                self.apply_text();
            }
        });

        ui.separator();
        let overrides = self.scene.state().overrides;
        let (mut frozen, mut forming) = (overrides.frozen, overrides.forming);
        if ui.checkbox(&mut frozen, "freeze (space)").changed() {
            self.scene.set_frozen(frozen);
        }
        if ui.checkbox(&mut forming, "form shape").changed() {
            self.scene.set_forming(forming);
        }
        ui.small("keys 1-6 pick a shape");
    }
}

fn pinch_label(finger: Option<Finger>) -> &'static str {
    finger.map(Finger::label).unwrap_or("-")
}

/// One-line summary of feed, hands and scene state.
pub fn status_line(
    feed: Option<&SourceStatus>,
    hands: &HandSummary,
    shape: ShapeKind,
    frozen: bool,
) -> String {
    let feed = match feed {
        None => "demo mode".to_owned(),
        Some(SourceStatus::Idle) => "feed idle".to_owned(),
        Some(SourceStatus::Connecting { attempt }) => format!("connecting (attempt {attempt})"),
        Some(SourceStatus::Connected { peer }) => format!("connected to {peer}"),
        Some(SourceStatus::Disconnected { retry_in_ms, .. }) => {
            format!("demo mode, retry in {:.1}s", *retry_in_ms as f32 / 1000.0)
        }
        Some(SourceStatus::Stopped) => "feed stopped".to_owned(),
    };
    format!(
        "{feed} | hands: {} | left: {} | right: {} | shape: {shape}{}",
        hands.hands,
        pinch_label(hands.left_pinch),
        pinch_label(hands.right_pinch),
        if frozen { " | frozen" } else { "" },
    )
}

impl eframe::App for ViewerApp {
    fn update(&mut self, context: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_feed();
        self.handle_keys(context);
        let dt = context.input(|i| i.stable_dt);
        self.scene.advance(dt);

        egui::SidePanel::left("controls").show(context, |ui| self.controls(ui));

        egui::TopBottomPanel::bottom("status").show(context, |ui| {
            let targets = &self.scene.state().targets;
            ui.label(status_line(
                self.feed_status.as_ref(),
                &targets.summary,
                targets.active_shape,
                self.scene.state().is_frozen(),
            ));
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(context, |ui| {
                let painter = ui.painter_at(ui.max_rect());
                let mut renderer = PainterRenderer::new(&painter, &mut self.scratch);
                if let Err(e) = renderer.draw(&self.scene.frame()) {
                    warn!("draw failed: {e}");
                }
            });

        context.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_reports_demo_mode_and_pinches() {
        let hands = HandSummary { hands: 2, left_pinch: Some(Finger::Middle), right_pinch: None };
        let line = status_line(None, &hands, ShapeKind::Cube, true);
        assert_eq!(line, "demo mode | hands: 2 | left: middle | right: - | shape: cube | frozen");
    }

    #[test]
    fn status_line_shows_retry_while_disconnected() {
        let status = SourceStatus::Disconnected { reason: "refused".into(), retry_in_ms: 2000 };
        let line = status_line(Some(&status), &HandSummary::default(), ShapeKind::Sphere, false);
        assert!(line.starts_with("demo mode, retry in 2.0s"));
        assert!(!line.contains("frozen"));
    }

    #[test]
    fn status_line_names_the_peer() {
        let status = SourceStatus::Connected { peer: "127.0.0.1:8765".into() };
        let line = status_line(Some(&status), &HandSummary::default(), ShapeKind::Star, false);
        assert!(line.starts_with("connected to 127.0.0.1:8765 | hands: 0"));
    }
}
