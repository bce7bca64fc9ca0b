//! Frame containers: the base and the stacked extensions
//!
//! Both kinds hold at most ten frames in uniquely numbered slots. The shared
//! storage lives in [`FrameRack`]; [`FrameContainer`] exposes the read side
//! uniformly so callers never need to know which kind they are looking at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frame::{ContainerKey, Frame, FrameLocation, Slot, MAX_SLOT};
use super::ids::{ExtensionId, FrameId, HiveId};
use crate::error::{HiveError, HiveResult};

/// Maximum frames per container
pub const MAX_FRAMES_PER_CONTAINER: usize = MAX_SLOT as usize;
/// Lowest extension level
pub const MIN_EXTENSION_LEVEL: u8 = 1;
/// Highest extension level
pub const MAX_EXTENSION_LEVEL: u8 = 5;

/// Slot-bounded frame storage, kept sorted by slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Frame>", into = "Vec<Frame>")]
pub struct FrameRack {
    frames: Vec<Frame>,
}

impl TryFrom<Vec<Frame>> for FrameRack {
    type Error = HiveError;

    /// Every frame needs a slot, no slot twice, at most ten frames
    fn try_from(mut frames: Vec<Frame>) -> HiveResult<Self> {
        if frames.len() > MAX_FRAMES_PER_CONTAINER {
            return Err(HiveError::CapacityExceeded {
                what: "container frames".to_string(),
                limit: MAX_FRAMES_PER_CONTAINER,
            });
        }
        if let Some(frame) = frames.iter().find(|f| f.slot.is_none()) {
            return Err(HiveError::invalid(format!(
                "frame {} is stored without a slot",
                frame.id
            )));
        }
        frames.sort_by_key(|f| f.slot);
        if let Some(pair) = frames.windows(2).find(|w| w[0].slot == w[1].slot) {
            return Err(HiveError::SlotOccupied {
                slot: pair[1].slot.map_or(0, |s| s.get()),
                container: "container".to_string(),
            });
        }
        Ok(Self { frames })
    }
}

impl From<FrameRack> for Vec<Frame> {
    fn from(rack: FrameRack) -> Self {
        rack.frames
    }
}

impl FrameRack {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= MAX_FRAMES_PER_CONTAINER
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_at(&self, slot: Slot) -> Option<&Frame> {
        self.frames.iter().find(|f| f.slot == Some(slot))
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub(crate) fn frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.iter_mut()
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    /// Capacity first, then slot uniqueness. Nothing is modified on error.
    pub(crate) fn check_insert(&self, slot: Slot, label: &str) -> HiveResult<()> {
        if self.is_full() {
            return Err(HiveError::CapacityExceeded {
                what: format!("{} frames", label),
                limit: MAX_FRAMES_PER_CONTAINER,
            });
        }
        if self.frame_at(slot).is_some() {
            return Err(HiveError::SlotOccupied {
                slot: slot.get(),
                container: label.to_string(),
            });
        }
        Ok(())
    }

    /// Caller must have passed `check_insert` for the same slot.
    pub(crate) fn insert_unchecked(&mut self, frame: Frame) {
        let pos = self
            .frames
            .iter()
            .position(|f| f.slot > frame.slot)
            .unwrap_or(self.frames.len());
        self.frames.insert(pos, frame);
    }

    pub(crate) fn remove(&mut self, id: FrameId) -> Option<Frame> {
        let pos = self.frames.iter().position(|f| f.id == id)?;
        Some(self.frames.remove(pos))
    }

    /// Frames are owned by the rack; dropping them is the cascade.
    pub(crate) fn drain(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }
}

/// Read-only view shared by the base and extensions
pub trait FrameContainer {
    /// Hive-relative address of this container
    fn key(&self) -> ContainerKey;

    fn rack(&self) -> &FrameRack;

    fn frame_count(&self) -> usize {
        self.rack().len()
    }

    fn frames(&self) -> &[Frame] {
        self.rack().frames()
    }

    fn is_slot_available(&self, slot: Slot) -> bool {
        self.rack().frame_at(slot).is_none()
    }

    fn frame_at_slot(&self, slot: Slot) -> Option<&Frame> {
        self.rack().frame_at(slot)
    }
}

/// The hive's foundation container. Has no level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub(crate) rack: FrameRack,
}

impl Base {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameContainer for Base {
    fn key(&self) -> ContainerKey {
        ContainerKey::Base
    }

    fn rack(&self) -> &FrameRack {
        &self.rack
    }
}

/// A stacked container sitting on top of the base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExtensionRecord")]
pub struct Extension {
    pub id: ExtensionId,
    pub name: String,
    level: u8,
    pub(crate) hive: Option<HiveId>,
    pub(crate) rack: FrameRack,
    pub created_at: DateTime<Utc>,
}

impl Extension {
    /// Create a detached, empty extension
    ///
    /// # Errors
    ///
    /// Returns [`HiveError::InvalidArgument`] if `level` is outside 1..=5.
    pub fn new(name: impl Into<String>, level: u8) -> HiveResult<Self> {
        check_level(level)?;
        Ok(Self {
            id: ExtensionId::new(),
            name: name.into(),
            level,
            hive: None,
            rack: FrameRack::default(),
            created_at: Utc::now(),
        })
    }

    /// Stacking position, 1 sits directly on the base
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Owning hive, `None` while detached
    pub fn hive(&self) -> Option<HiveId> {
        self.hive
    }
}

fn check_level(level: u8) -> HiveResult<()> {
    if !(MIN_EXTENSION_LEVEL..=MAX_EXTENSION_LEVEL).contains(&level) {
        return Err(HiveError::invalid(format!(
            "extension level {} outside {}..={}",
            level, MIN_EXTENSION_LEVEL, MAX_EXTENSION_LEVEL
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ExtensionRecord {
    id: ExtensionId,
    name: String,
    level: u8,
    hive: Option<HiveId>,
    rack: FrameRack,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExtensionRecord> for Extension {
    type Error = HiveError;

    /// Frames of an attached extension point back at it; frames of a
    /// detached one point nowhere.
    fn try_from(record: ExtensionRecord) -> HiveResult<Self> {
        check_level(record.level)?;
        let expected = record.hive.map(|hive| FrameLocation {
            hive,
            container: ContainerKey::Extension(record.id),
        });
        if let Some(frame) = record.rack.frames().iter().find(|f| f.location != expected) {
            return Err(HiveError::invalid(format!(
                "frame {} in extension {} has a mismatched location",
                frame.id, record.id
            )));
        }
        Ok(Self {
            id: record.id,
            name: record.name,
            level: record.level,
            hive: record.hive,
            rack: record.rack,
            created_at: record.created_at,
        })
    }
}

impl FrameContainer for Extension {
    fn key(&self) -> ContainerKey {
        ContainerKey::Extension(self.id)
    }

    fn rack(&self) -> &FrameRack {
        &self.rack
    }
}
