//! Frame lifecycle state machine
//!
//! ```text
//!            weight == 0        0 < weight < 2000      weight >= 2000
//!   Empty  <------------->  Partial  <------------->  Full
//!     ^                                                 |
//!     +-------------------- harvest --------------------+
//!
//!   any ---- mark_damaged ----> Damaged ---- clear_damage ----> state_for_weight(weight)
//! ```
//!
//! While damaged, weight updates are recorded but do not move the state.

use tracing::debug;

use super::beehive::Hive;
use super::frame::{Frame, FrameState};
use super::ids::FrameId;
use crate::error::{HiveError, HiveResult};

/// Honey weight at which a frame counts as full
pub const FULL_FRAME_GRAMS: f64 = 2000.0;

/// Weight-driven state, ignoring damage
pub fn state_for_weight(grams: f64) -> FrameState {
    if grams <= 0.0 {
        FrameState::Empty
    } else if grams < FULL_FRAME_GRAMS {
        FrameState::Partial
    } else {
        FrameState::Full
    }
}

impl Frame {
    /// Record a new honey weight and derive the state from it
    ///
    /// The weight is always stored. A damaged frame stays damaged.
    ///
    /// # Errors
    ///
    /// Returns [`HiveError::InvalidArgument`] for negative or non-finite
    /// weights; the frame is unchanged.
    pub fn apply_weight(&mut self, grams: f64) -> HiveResult<FrameState> {
        if !grams.is_finite() || grams < 0.0 {
            return Err(HiveError::invalid(format!(
                "frame weight must be a non-negative number of grams, got {}",
                grams
            )));
        }
        self.honey_weight_grams = grams;
        if self.state != FrameState::Damaged {
            let next = state_for_weight(grams);
            if next != self.state {
                debug!(frame = %self.id, from = %self.state, to = %next, grams, "frame state changed");
            }
            self.state = next;
        }
        Ok(self.state)
    }

    /// Flag the frame as damaged. Damage cannot be inferred from weight.
    pub fn mark_damaged(&mut self) {
        if self.state != FrameState::Damaged {
            debug!(frame = %self.id, from = %self.state, "frame marked damaged");
            self.state = FrameState::Damaged;
        }
    }

    /// Lift the damage flag and resume weight-driven states
    pub fn clear_damage(&mut self) -> FrameState {
        if self.state == FrameState::Damaged {
            self.state = state_for_weight(self.honey_weight_grams);
            debug!(frame = %self.id, to = %self.state, "frame damage cleared");
        }
        self.state
    }

    /// Empty a full frame, returning the harvested grams
    ///
    /// # Errors
    ///
    /// Returns [`HiveError::NotReadyForHarvest`] unless the frame is full. This
    /// is a reported no-op: the frame is unchanged.
    pub fn harvest(&mut self) -> HiveResult<f64> {
        if !self.is_ready_for_harvest() {
            return Err(HiveError::NotReadyForHarvest {
                frame: self.id,
                state: self.state,
            });
        }
        let harvested = self.honey_weight_grams;
        self.honey_weight_grams = 0.0;
        self.state = FrameState::Empty;
        debug!(frame = %self.id, grams = harvested, "frame harvested");
        Ok(harvested)
    }
}

impl Hive {
    fn placed_frame_mut(&mut self, frame: FrameId) -> HiveResult<&mut Frame> {
        let hive = self.id();
        self.frame_mut(frame)
            .ok_or_else(|| HiveError::not_found(format!("frame {} on hive {}", frame, hive)))
    }

    /// [`Frame::apply_weight`] on a frame placed in this hive
    pub fn apply_frame_weight(&mut self, frame: FrameId, grams: f64) -> HiveResult<FrameState> {
        self.placed_frame_mut(frame)?.apply_weight(grams)
    }

    pub fn mark_frame_damaged(&mut self, frame: FrameId) -> HiveResult<()> {
        self.placed_frame_mut(frame)?.mark_damaged();
        Ok(())
    }

    pub fn clear_frame_damage(&mut self, frame: FrameId) -> HiveResult<FrameState> {
        Ok(self.placed_frame_mut(frame)?.clear_damage())
    }

    /// [`Frame::harvest`] on a frame placed in this hive
    pub fn harvest_frame(&mut self, frame: FrameId) -> HiveResult<f64> {
        self.placed_frame_mut(frame)?.harvest()
    }
}
