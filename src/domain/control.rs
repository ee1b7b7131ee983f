//! Control state aggregation.
//!
//! Owns the single [`ControlRecord`] for the session and merges stick
//! events into it. The full record is forwarded after every merge; there is
//! no diffing, a frame is a complete snapshot and last-write-wins at the
//! vehicle.

use crate::domain::models::{ControlRecord, StickEvent, StickSide};

pub struct ControlState {
    record: ControlRecord,
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlState {
    pub fn new() -> Self {
        Self {
            record: ControlRecord::neutral(),
        }
    }

    /// Merge one stick update into the record and return a copy for
    /// transmission.
    ///
    /// Left stick: horizontal -> `y`, vertical -> `z` negated (stick up
    /// means climb, which the firmware reads as negative `z`). Right stick:
    /// vertical -> `x`, horizontal -> `yaw`. Fields outside the stick's
    /// group keep their previous value; `id`, `pitch` and `roll` are never
    /// touched.
    pub fn apply(&mut self, side: StickSide, event: StickEvent) -> ControlRecord {
        match (side, event) {
            (StickSide::Left, StickEvent::Move { x, y }) => {
                self.record.y = x;
                self.record.z = -y;
            }
            (StickSide::Left, StickEvent::Stop) => {
                self.record.y = 0.0;
                self.record.z = 0.0;
            }
            (StickSide::Right, StickEvent::Move { x, y }) => {
                self.record.x = y;
                self.record.yaw = x;
            }
            (StickSide::Right, StickEvent::Stop) => {
                self.record.x = 0.0;
                self.record.yaw = 0.0;
            }
        }
        self.record
    }

    pub fn record(&self) -> ControlRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::STREAM_ID;

    #[test]
    fn id_is_constant_across_updates() {
        let mut state = ControlState::new();
        state.apply(StickSide::Left, StickEvent::Move { x: 0.3, y: -0.8 });
        state.apply(StickSide::Right, StickEvent::Move { x: -1.0, y: 0.5 });
        state.apply(StickSide::Left, StickEvent::Stop);
        assert_eq!(state.record().id, STREAM_ID);
    }

    #[test]
    fn untargeted_fields_keep_their_value() {
        let mut state = ControlState::new();
        state.apply(StickSide::Right, StickEvent::Move { x: 0.25, y: 0.75 });
        let record = state.apply(StickSide::Left, StickEvent::Move { x: 0.1, y: 0.2 });

        // Right-stick axes survive a left-stick merge exactly.
        assert_eq!(record.x, 0.75);
        assert_eq!(record.yaw, 0.25);
        assert_eq!(record.y, 0.1);
        assert_eq!(record.z, -0.2);
        assert_eq!(record.pitch, 0.0);
        assert_eq!(record.roll, 0.0);
    }

    #[test]
    fn left_stick_at_top_edge_commands_full_climb() {
        let mut state = ControlState::new();
        state.apply(StickSide::Right, StickEvent::Move { x: 0.4, y: 0.6 });
        let record = state.apply(StickSide::Left, StickEvent::Move { x: 0.0, y: 1.0 });

        assert_eq!(record.y, 0.0);
        assert_eq!(record.z, -1.0);
        // Whatever the right stick last set stays put.
        assert_eq!(record.x, 0.6);
        assert_eq!(record.yaw, 0.4);
    }

    #[test]
    fn stop_forces_the_pair_to_exactly_zero() {
        let mut state = ControlState::new();
        state.apply(StickSide::Left, StickEvent::Move { x: 0.9, y: 0.9 });
        state.apply(StickSide::Right, StickEvent::Move { x: -0.4, y: -0.3 });

        let record = state.apply(StickSide::Left, StickEvent::Stop);
        assert_eq!(record.y, 0.0);
        assert_eq!(record.z, 0.0);
        assert_eq!(record.x, -0.3);

        let record = state.apply(StickSide::Right, StickEvent::Stop);
        assert_eq!(record.x, 0.0);
        assert_eq!(record.yaw, 0.0);
    }
}
