//! Error types shared by every beehouse component.
//!
//! Every failure the engine can produce is returned as a [`HiveError`];
//! nothing is swallowed internally. Mapping these onto HTTP statuses, SOAP
//! faults or exit codes is the caller's job.

use thiserror::Error;

use crate::hive::{FrameId, FrameState};

/// Result type alias for beehouse operations
pub type HiveResult<T> = Result<T, HiveError>;

/// Error types for hive composition, frame lifecycle and yield queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HiveError {
    /// Slot number outside 1..=10
    #[error("Invalid slot {0}: slots are numbered 1 to 10")]
    InvalidSlot(u32),

    /// A hive or container is already at its limit
    #[error("Capacity exceeded: {what} already holds {limit}")]
    CapacityExceeded { what: String, limit: usize },

    /// Another frame in the same container uses the slot
    #[error("Slot {slot} is already occupied in {container}")]
    SlotOccupied { slot: u8, container: String },

    /// Harvest requested on a frame that is not full
    #[error("Frame {frame} is not ready for harvest (state: {state})")]
    NotReadyForHarvest { frame: FrameId, state: FrameState },

    /// Negative threshold, malformed identifier, invalid field value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced hive, container or frame is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence collaborator could not be reached
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration file or environment override is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HiveError {
    /// Only storage faults are worth retrying, and the retry belongs to the
    /// persistence collaborator.
    pub fn is_transient(&self) -> bool {
        matches!(self, HiveError::StorageUnavailable(_))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        HiveError::InvalidArgument(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        HiveError::NotFound(message.into())
    }
}
