//! Analog input surface.
//!
//! Pure contact-tracking and vector math for a circular virtual stick.
//! The egui widget in `presentation::stick_widget` is only a shell that
//! feeds pointer/touch events into a [`StickTracker`].

use crate::domain::models::StickEvent;

/// Normalized 2-D stick reading, always inside the unit disk.
///
/// +x points right, +y points up (screen y is negated at production time).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogVector {
    pub x: f64,
    pub y: f64,
}

impl AnalogVector {
    pub const NEUTRAL: Self = Self { x: 0.0, y: 0.0 };
}

/// The circular interaction region a stick lives in, in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct StickRegion {
    pub center_x: f64,
    pub center_y: f64,
    pub half_extent: f64,
}

impl StickRegion {
    /// Normalized offset of a pointer position from the region center.
    ///
    /// Readings past the rim are scaled back onto the unit circle;
    /// readings inside it are reported exactly.
    pub fn vector_at(&self, px: f64, py: f64) -> AnalogVector {
        let mut x = (px - self.center_x) / self.half_extent;
        let mut y = (py - self.center_y) / self.half_extent;

        let distance = (x * x + y * y).sqrt();
        if distance > 1.0 {
            x /= distance;
            y /= distance;
        }

        AnalogVector { x, y: -y }
    }
}

/// Identity of the contact currently driving a stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactId {
    /// Mouse (or the platform's emulated pointer).
    Pointer,
    /// One finger on a touch surface.
    Touch(u64),
}

/// Tracks at most one active contact and turns its positions into
/// [`StickEvent`]s.
///
/// A second simultaneous contact is ignored until the tracked one ends, and
/// events for an untracked contact id never alter the current vector.
#[derive(Debug, Default)]
pub struct StickTracker {
    contact: Option<ContactId>,
    vector: AnalogVector,
}

impl StickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `contact`. Ignored while another contact is active.
    pub fn begin(
        &mut self,
        contact: ContactId,
        px: f64,
        py: f64,
        region: &StickRegion,
    ) -> Option<StickEvent> {
        if self.contact.is_some() {
            return None;
        }
        self.contact = Some(contact);
        self.vector = region.vector_at(px, py);
        Some(StickEvent::Move {
            x: self.vector.x,
            y: self.vector.y,
        })
    }

    /// Recompute the vector for a move of the tracked contact. Moves of any
    /// other contact are ignored.
    pub fn update(
        &mut self,
        contact: ContactId,
        px: f64,
        py: f64,
        region: &StickRegion,
    ) -> Option<StickEvent> {
        if self.contact != Some(contact) {
            return None;
        }
        self.vector = region.vector_at(px, py);
        Some(StickEvent::Move {
            x: self.vector.x,
            y: self.vector.y,
        })
    }

    /// End the tracked contact, emitting exactly one neutral event and
    /// freeing the tracker for a fresh interaction.
    pub fn end(&mut self, contact: ContactId) -> Option<StickEvent> {
        if self.contact != Some(contact) {
            return None;
        }
        self.contact = None;
        self.vector = AnalogVector::NEUTRAL;
        Some(StickEvent::Stop)
    }

    pub fn is_active(&self) -> bool {
        self.contact.is_some()
    }

    /// Current reading, used by the widget to place the knob.
    pub fn vector(&self) -> AnalogVector {
        self.vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn region() -> StickRegion {
        StickRegion {
            center_x: 100.0,
            center_y: 100.0,
            half_extent: 50.0,
        }
    }

    #[test]
    fn vector_inside_disk_is_exact() {
        let v = region().vector_at(110.0, 80.0);
        assert!((v.x - 0.2).abs() < EPS);
        assert!((v.y - 0.4).abs() < EPS);
    }

    #[test]
    fn vector_outside_disk_lands_on_unit_circle() {
        // Offset (2, -2) in normalized units, well past the rim.
        let v = region().vector_at(200.0, 200.0);
        let norm = (v.x * v.x + v.y * v.y).sqrt();
        assert!((norm - 1.0).abs() < EPS);
        assert!(v.x > 0.0 && v.y < 0.0);
    }

    #[test]
    fn vector_never_leaves_disk() {
        let r = region();
        for px in (-200..400).step_by(37) {
            for py in (-200..400).step_by(41) {
                let v = r.vector_at(px as f64, py as f64);
                assert!(v.x * v.x + v.y * v.y <= 1.0 + EPS, "({px}, {py}) escaped");
            }
        }
    }

    #[test]
    fn top_of_region_reads_straight_up() {
        let v = region().vector_at(100.0, 50.0);
        assert!((v.x - 0.0).abs() < EPS);
        assert!((v.y - 1.0).abs() < EPS);
    }

    #[test]
    fn release_emits_exactly_one_neutral_event() {
        let r = region();
        let mut tracker = StickTracker::new();
        tracker.begin(ContactId::Touch(7), 120.0, 100.0, &r);
        tracker.update(ContactId::Touch(7), 140.0, 90.0, &r);
        tracker.update(ContactId::Touch(7), 90.0, 130.0, &r);

        assert_eq!(tracker.end(ContactId::Touch(7)), Some(StickEvent::Stop));
        assert_eq!(tracker.end(ContactId::Touch(7)), None);
        assert_eq!(tracker.vector(), AnalogVector::NEUTRAL);
    }

    #[test]
    fn untracked_contact_never_alters_the_vector() {
        let r = region();
        let mut tracker = StickTracker::new();
        tracker.begin(ContactId::Touch(1), 120.0, 100.0, &r);
        let before = tracker.vector();

        assert_eq!(tracker.update(ContactId::Touch(2), 60.0, 60.0, &r), None);
        assert_eq!(tracker.update(ContactId::Pointer, 60.0, 60.0, &r), None);
        assert_eq!(tracker.end(ContactId::Touch(2)), None);
        assert_eq!(tracker.vector(), before);
        assert!(tracker.is_active());
    }

    #[test]
    fn second_contact_is_ignored_until_first_ends() {
        let r = region();
        let mut tracker = StickTracker::new();
        tracker.begin(ContactId::Touch(1), 120.0, 100.0, &r);
        assert_eq!(tracker.begin(ContactId::Touch(2), 80.0, 100.0, &r), None);

        tracker.end(ContactId::Touch(1));
        // Now a fresh interaction may start.
        assert!(tracker
            .begin(ContactId::Touch(2), 80.0, 100.0, &r)
            .is_some());
    }
}
