//! Hive structure manager
//!
//! The only code path that changes which extensions a hive has and which
//! frames sit in which container. Every mutator re-validates against the
//! current collections and leaves the hive untouched when it fails.
//!
//! `&mut Hive` is the exclusive-writer guarantee; see
//! [`SharedHive`](super::SharedHive) for the locked multi-threaded form.

use tracing::{debug, warn};

use super::beehive::Hive;
use super::container::{Extension, FrameContainer};
use super::frame::{ContainerKey, Frame, FrameLocation, Slot};
use super::ids::{ExtensionId, FrameId};
use crate::error::{HiveError, HiveResult};

/// Maximum extensions stacked on one hive
pub const MAX_EXTENSIONS: usize = 5;

impl Hive {
    /// Stack an extension on the hive
    ///
    /// The extension must be detached and empty, and its id new to this hive.
    ///
    /// # Errors
    ///
    /// - [`HiveError::CapacityExceeded`] if the hive already has five extensions
    /// - [`HiveError::InvalidArgument`] if the extension is attached, holds
    ///   frames, or reuses an id
    pub fn add_extension(&mut self, mut extension: Extension) -> HiveResult<ExtensionId> {
        if self.extensions.len() >= MAX_EXTENSIONS {
            warn!(hive = %self.id(), limit = MAX_EXTENSIONS, "extension rejected: hive is full");
            return Err(HiveError::CapacityExceeded {
                what: format!("hive {} extensions", self.id()),
                limit: MAX_EXTENSIONS,
            });
        }
        if extension.hive.is_some() {
            return Err(HiveError::invalid(format!(
                "extension {} already belongs to a hive",
                extension.id
            )));
        }
        if !extension.rack.is_empty() {
            return Err(HiveError::invalid(format!(
                "extension {} must be empty to be attached",
                extension.id
            )));
        }
        if self.extension(extension.id).is_some() {
            return Err(HiveError::invalid(format!(
                "extension {} is already on hive {}",
                extension.id, self.id()
            )));
        }

        let id = extension.id;
        extension.hive = Some(self.id());
        debug!(hive = %self.id(), extension = %id, level = extension.level(), "extension added");
        self.extensions.push(extension);
        Ok(id)
    }

    /// Take an extension off the hive
    ///
    /// Returns the detached extension with its frames, or `None` if the hive
    /// has no such extension. Frames inside a detached extension report no
    /// location, and since only empty extensions can be attached, they can
    /// never move to another hive.
    pub fn remove_extension(&mut self, id: ExtensionId) -> Option<Extension> {
        let pos = self.extensions.iter().position(|e| e.id == id)?;
        let mut extension = self.extensions.remove(pos);
        extension.hive = None;
        for frame in extension.rack.frames_mut() {
            frame.location = None;
        }
        debug!(hive = %self.id(), extension = %id, "extension removed");
        Some(extension)
    }

    /// Place a frame into a container at `slot`
    ///
    /// # Errors
    ///
    /// Checked in this order, nothing is modified on failure:
    /// - [`HiveError::InvalidSlot`] if `slot` is outside 1..=10
    /// - [`HiveError::NotFound`] if the container is not part of this hive
    /// - [`HiveError::InvalidArgument`] if the frame is already placed or its
    ///   id is already in the hive
    /// - [`HiveError::CapacityExceeded`] if the container holds ten frames
    /// - [`HiveError::SlotOccupied`] if another frame in the container uses `slot`
    pub fn add_frame(&mut self, container: ContainerKey, mut frame: Frame, slot: u32) -> HiveResult<FrameId> {
        let slot = Slot::new(slot)?;
        if self.container(container).is_none() {
            return Err(HiveError::not_found(format!("{} on hive {}", container, self.id())));
        }
        if frame.is_placed() {
            return Err(HiveError::invalid(format!("frame {} is already placed", frame.id)));
        }
        if self.find_frame(frame.id).is_some() {
            return Err(HiveError::invalid(format!(
                "frame {} is already in hive {}",
                frame.id, self.id()
            )));
        }

        let hive_id = self.id();
        let label = container.to_string();
        let rack = self
            .rack_mut(container)
            .ok_or_else(|| HiveError::not_found(format!("{} on hive {}", container, hive_id)))?;
        if let Err(e) = rack.check_insert(slot, &label) {
            warn!(hive = %hive_id, container = %label, slot = slot.get(), error = %e, "frame rejected");
            return Err(e);
        }

        let id = frame.id;
        frame.slot = Some(slot);
        frame.location = Some(FrameLocation {
            hive: hive_id,
            container,
        });
        rack.insert_unchecked(frame);
        debug!(hive = %hive_id, container = %label, slot = slot.get(), frame = %id, "frame added");
        Ok(id)
    }

    /// Take a frame out of a container
    ///
    /// Returns `Ok(None)` when the container has no such frame. The removed
    /// frame has its slot and location cleared.
    ///
    /// # Errors
    ///
    /// Returns [`HiveError::NotFound`] if the container is not part of this hive.
    pub fn remove_frame(&mut self, container: ContainerKey, frame: FrameId) -> HiveResult<Option<Frame>> {
        let hive_id = self.id();
        let rack = self
            .rack_mut(container)
            .ok_or_else(|| HiveError::not_found(format!("{} on hive {}", container, hive_id)))?;
        let removed = rack.remove(frame).map(|mut f| {
            f.slot = None;
            f.location = None;
            f
        });
        if removed.is_some() {
            debug!(hive = %hive_id, container = %container, frame = %frame, "frame removed");
        }
        Ok(removed)
    }

    /// Whether `slot` is free in `container`
    pub fn is_slot_available(&self, container: ContainerKey, slot: u32) -> HiveResult<bool> {
        let slot = Slot::new(slot)?;
        self.container(container)
            .map(|c| c.is_slot_available(slot))
            .ok_or_else(|| HiveError::not_found(format!("{} on hive {}", container, self.id())))
    }

    /// The frame at `slot` in `container`, if any
    pub fn frame_at_slot(&self, container: ContainerKey, slot: u32) -> HiveResult<Option<&Frame>> {
        let slot = Slot::new(slot)?;
        self.container(container)
            .map(|c| c.frame_at_slot(slot))
            .ok_or_else(|| HiveError::not_found(format!("{} on hive {}", container, self.id())))
    }

    /// Frames in the base plus every extension, computed on demand
    pub fn total_frames(&self) -> usize {
        self.containers().map(|c| c.frame_count()).sum()
    }

    /// Drop every extension and frame, returning how many of each went.
    /// Used when the hive itself is deleted.
    pub(crate) fn dismantle(&mut self) -> (usize, usize) {
        let frames = self.total_frames();
        let extensions = self.extensions.len();
        self.base.rack.drain();
        self.extensions.clear();
        (extensions, frames)
    }
}
