//! Frames and the slots they occupy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::frame_state::state_for_weight;
use super::ids::{ExtensionId, FrameId, HiveId};
use crate::error::{HiveError, HiveResult};

/// Lowest slot number in a container
pub const MIN_SLOT: u8 = 1;
/// Highest slot number in a container, also the per-container frame limit
pub const MAX_SLOT: u8 = 10;

/// Container-local frame position, always within `MIN_SLOT..=MAX_SLOT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Slot(u8);

impl Slot {
    /// Validate a raw slot number
    ///
    /// # Errors
    ///
    /// Returns [`HiveError::InvalidSlot`] if `number` is outside 1..=10.
    pub fn new(number: u32) -> HiveResult<Self> {
        if number < MIN_SLOT as u32 || number > MAX_SLOT as u32 {
            return Err(HiveError::InvalidSlot(number));
        }
        Ok(Self(number as u8))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// All valid slots in ascending order
    pub fn all() -> impl Iterator<Item = Slot> {
        (MIN_SLOT..=MAX_SLOT).map(Slot)
    }
}

impl TryFrom<u32> for Slot {
    type Error = HiveError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Slot::new(value)
    }
}

impl From<Slot> for u32 {
    fn from(slot: Slot) -> Self {
        slot.0 as u32
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame material. Cosmetic only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    #[default]
    Wax,
    Plastic,
    Wood,
}

/// Frame lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameState {
    #[default]
    Empty,
    Partial,
    Full,
    /// Only set explicitly; sticky until cleared
    Damaged,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameState::Empty => write!(f, "empty"),
            FrameState::Partial => write!(f, "partial"),
            FrameState::Full => write!(f, "full"),
            FrameState::Damaged => write!(f, "damaged"),
        }
    }
}

/// Hive-relative address of a frame container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ContainerKey {
    /// The hive's single mandatory base
    Base,
    /// One of the stacked extensions
    Extension(ExtensionId),
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKey::Base => write!(f, "base"),
            ContainerKey::Extension(id) => write!(f, "extension {}", id),
        }
    }
}

/// Non-owning back-reference from a placed frame to its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameLocation {
    pub hive: HiveId,
    pub container: ContainerKey,
}

/// A removable slotted unit holding honey
///
/// Slot, state, weight and location are only written by the structure
/// manager and the frame state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRecord")]
pub struct Frame {
    pub id: FrameId,
    pub name: String,
    pub frame_type: FrameType,
    pub(crate) slot: Option<Slot>,
    pub(crate) state: FrameState,
    pub(crate) honey_weight_grams: f64,
    pub(crate) location: Option<FrameLocation>,
    pub created_at: DateTime<Utc>,
}

impl Frame {
    /// Create an unplaced, empty wax frame
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FrameId::new(),
            name: name.into(),
            frame_type: FrameType::default(),
            slot: None,
            state: FrameState::Empty,
            honey_weight_grams: 0.0,
            location: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = frame_type;
        self
    }

    /// Slot assigned by the container, `None` while unplaced
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn honey_weight_grams(&self) -> f64 {
        self.honey_weight_grams
    }

    pub fn location(&self) -> Option<FrameLocation> {
        self.location
    }

    pub fn is_placed(&self) -> bool {
        self.location.is_some()
    }

    pub fn is_damaged(&self) -> bool {
        self.state == FrameState::Damaged
    }

    pub fn is_ready_for_harvest(&self) -> bool {
        self.state == FrameState::Full && self.honey_weight_grams > 0.0
    }
}

/// Serialized form of a [`Frame`], checked before it becomes one
#[derive(Deserialize)]
struct FrameRecord {
    id: FrameId,
    name: String,
    frame_type: FrameType,
    slot: Option<Slot>,
    state: FrameState,
    honey_weight_grams: f64,
    location: Option<FrameLocation>,
    created_at: DateTime<Utc>,
}

impl TryFrom<FrameRecord> for Frame {
    type Error = HiveError;

    fn try_from(record: FrameRecord) -> HiveResult<Self> {
        let grams = record.honey_weight_grams;
        if !grams.is_finite() || grams < 0.0 {
            return Err(HiveError::invalid(format!(
                "frame {} has invalid weight {}",
                record.id, grams
            )));
        }
        if record.state != FrameState::Damaged && record.state != state_for_weight(grams) {
            return Err(HiveError::invalid(format!(
                "frame {} is {} but holds {} g",
                record.id, record.state, grams
            )));
        }
        if record.location.is_some() && record.slot.is_none() {
            return Err(HiveError::invalid(format!(
                "frame {} is placed without a slot",
                record.id
            )));
        }
        Ok(Self {
            id: record.id,
            name: record.name,
            frame_type: record.frame_type,
            slot: record.slot,
            state: record.state,
            honey_weight_grams: grams,
            location: record.location,
            created_at: record.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 ; "zero")]
    #[test_case(11 ; "past the top")]
    #[test_case(255 ; "far out")]
    fn test_slot_rejects_out_of_range(number: u32) {
        assert_eq!(Slot::new(number), Err(HiveError::InvalidSlot(number)));
    }

    #[test]
    fn test_slot_accepts_bounds() {
        assert_eq!(Slot::new(1).unwrap().get(), 1);
        assert_eq!(Slot::new(10).unwrap().get(), 10);
        assert_eq!(Slot::all().count(), 10);
    }

    #[test]
    fn test_slot_deserialization_validates() {
        let ok: Slot = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<Slot>("12").is_err());
    }

    #[test]
    fn test_new_frame_defaults() {
        let frame = Frame::new("F1");
        assert_eq!(frame.state(), FrameState::Empty);
        assert_eq!(frame.frame_type, FrameType::Wax);
        assert_eq!(frame.honey_weight_grams(), 0.0);
        assert!(frame.slot().is_none());
        assert!(!frame.is_placed());
        assert!(!frame.is_ready_for_harvest());
    }

    #[test]
    fn test_frame_deserialization_round_trips() {
        let mut frame = Frame::new("F1");
        frame.apply_weight(2300.0).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        let back: Frame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
    }

    #[test_case("full", 500.0 ; "full but light")]
    #[test_case("empty", 2500.0 ; "empty but heavy")]
    #[test_case("partial", -5.0 ; "negative weight")]
    fn test_frame_deserialization_rejects_inconsistent_state(state: &str, grams: f64) {
        let mut json = serde_json::to_value(Frame::new("F1")).unwrap();
        json["state"] = state.into();
        json["honey_weight_grams"] = grams.into();
        assert!(serde_json::from_value::<Frame>(json).is_err());
    }

    #[test]
    fn test_damaged_frame_deserializes_at_any_weight() {
        let mut json = serde_json::to_value(Frame::new("F1")).unwrap();
        json["state"] = "damaged".into();
        json["honey_weight_grams"] = 2600.0_f64.into();
        let frame: Frame = serde_json::from_value(json).unwrap();
        assert!(frame.is_damaged());
    }

    #[test]
    fn test_placed_frame_requires_slot() {
        let mut json = serde_json::to_value(Frame::new("F1")).unwrap();
        json["location"] = serde_json::to_value(FrameLocation {
            hive: HiveId::new(),
            container: ContainerKey::Base,
        })
        .unwrap();
        assert!(serde_json::from_value::<Frame>(json).is_err());
    }

    #[test]
    fn test_container_key_serialization() {
        let json = serde_json::to_value(ContainerKey::Base).unwrap();
        assert_eq!(json["kind"], "base");
    }
}
