//! Lock-guarded hive for multi-threaded callers
//!
//! One `RwLock` per hive: mutators hold the write lock for the whole
//! check-then-insert, readers hold the read lock and therefore never see a
//! half-applied change. Separate hives never share a lock.

use parking_lot::RwLock;
use std::sync::Arc;

use super::beehive::Hive;
use super::container::Extension;
use super::frame::{ContainerKey, Frame, FrameState};
use super::ids::{ExtensionId, FrameId, HiveId};
use crate::error::HiveResult;

/// Cloneable handle to a hive behind its own lock
#[derive(Debug, Clone)]
pub struct SharedHive {
    id: HiveId,
    inner: Arc<RwLock<Hive>>,
}

impl SharedHive {
    pub fn new(hive: Hive) -> Self {
        Self {
            id: hive.id(),
            inner: Arc::new(RwLock::new(hive)),
        }
    }

    pub fn id(&self) -> HiveId {
        self.id
    }

    /// Consistent copy of the whole hive
    pub fn snapshot(&self) -> Hive {
        self.inner.read().clone()
    }

    /// Run a read-only closure against a consistent view
    pub fn read<T>(&self, f: impl FnOnce(&Hive) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run a closure with exclusive access. The closure must leave the hive
    /// unchanged when it returns an error.
    pub fn write<T>(&self, f: impl FnOnce(&mut Hive) -> HiveResult<T>) -> HiveResult<T> {
        f(&mut self.inner.write())
    }

    pub fn add_extension(&self, extension: Extension) -> HiveResult<ExtensionId> {
        self.inner.write().add_extension(extension)
    }

    pub fn remove_extension(&self, id: ExtensionId) -> Option<Extension> {
        self.inner.write().remove_extension(id)
    }

    pub fn add_frame(&self, container: ContainerKey, frame: Frame, slot: u32) -> HiveResult<FrameId> {
        self.inner.write().add_frame(container, frame, slot)
    }

    pub fn remove_frame(&self, container: ContainerKey, frame: FrameId) -> HiveResult<Option<Frame>> {
        self.inner.write().remove_frame(container, frame)
    }

    pub fn apply_frame_weight(&self, frame: FrameId, grams: f64) -> HiveResult<FrameState> {
        self.inner.write().apply_frame_weight(frame, grams)
    }

    pub fn harvest_frame(&self, frame: FrameId) -> HiveResult<f64> {
        self.inner.write().harvest_frame(frame)
    }

    pub fn is_slot_available(&self, container: ContainerKey, slot: u32) -> HiveResult<bool> {
        self.inner.read().is_slot_available(container, slot)
    }

    pub fn total_frames(&self) -> usize {
        self.inner.read().total_frames()
    }

    pub fn extension_count(&self) -> usize {
        self.inner.read().extension_count()
    }
}
