//! Virtual analog stick widget.
//!
//! Thin egui shell over [`StickTracker`]: translates raw pointer and touch
//! events into tracker calls and paints the base and knob. Two widgets can
//! be driven simultaneously by separate fingers; the tracker's contact-id
//! matching keeps them from cross-talking.

use crate::domain::models::StickEvent;
use crate::domain::stick::{ContactId, StickRegion, StickTracker};
use eframe::egui::{self, Color32, Sense, Stroke, TouchPhase, Vec2};

pub struct StickWidget {
    tracker: StickTracker,
}

impl Default for StickWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl StickWidget {
    pub fn new() -> Self {
        Self {
            tracker: StickTracker::new(),
        }
    }

    /// Render the stick and return the events this frame produced, in
    /// input order.
    pub fn show(&mut self, ui: &mut egui::Ui, size: f32) -> Vec<StickEvent> {
        let (rect, _response) = ui.allocate_exact_size(Vec2::splat(size), Sense::drag());
        let region = StickRegion {
            center_x: rect.center().x as f64,
            center_y: rect.center().y as f64,
            half_extent: (size / 2.0) as f64,
        };

        let mut produced = Vec::new();
        let events = ui.input(|i| i.events.clone());
        for event in events {
            let emitted = match event {
                // A finger on a touch surface. egui also synthesizes
                // pointer events for the first finger; the tracker's id
                // matching makes handling both harmless.
                egui::Event::Touch { id, phase, pos, .. } => {
                    let contact = ContactId::Touch(id.0);
                    match phase {
                        TouchPhase::Start if rect.contains(pos) => {
                            self.tracker
                                .begin(contact, pos.x as f64, pos.y as f64, &region)
                        }
                        TouchPhase::Move => {
                            self.tracker
                                .update(contact, pos.x as f64, pos.y as f64, &region)
                        }
                        TouchPhase::End | TouchPhase::Cancel => self.tracker.end(contact),
                        _ => None,
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    ..
                } if rect.contains(pos) => {
                    self.tracker
                        .begin(ContactId::Pointer, pos.x as f64, pos.y as f64, &region)
                }
                egui::Event::PointerButton {
                    button: egui::PointerButton::Primary,
                    pressed: false,
                    ..
                } => self.tracker.end(ContactId::Pointer),
                egui::Event::PointerMoved(pos) => {
                    self.tracker
                        .update(ContactId::Pointer, pos.x as f64, pos.y as f64, &region)
                }
                egui::Event::PointerGone => self.tracker.end(ContactId::Pointer),
                _ => None,
            };
            produced.extend(emitted);
        }

        self.paint(ui, rect);
        produced
    }

    fn paint(&self, ui: &egui::Ui, rect: egui::Rect) {
        let painter = ui.painter();
        let center = rect.center();
        let radius = rect.width() / 2.0;
        let knob_radius = radius * 0.4;

        painter.circle_filled(center, radius, Color32::from_rgb(60, 60, 80));
        painter.circle_stroke(center, radius, Stroke::new(2.0, Color32::from_rgb(100, 100, 120)));

        // Knob follows the current vector; control-space y points up.
        let v = self.tracker.vector();
        let travel = radius - knob_radius;
        let knob = center + Vec2::new(v.x as f32, -v.y as f32) * travel;

        let knob_color = if self.tracker.is_active() {
            Color32::from_rgb(80, 140, 220)
        } else {
            Color32::from_rgb(40, 40, 50)
        };
        painter.circle_filled(knob, knob_radius, knob_color);
        painter.circle_stroke(knob, knob_radius, Stroke::new(1.5, Color32::from_rgb(100, 100, 120)));
    }
}
