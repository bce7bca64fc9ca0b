//! Persistence abstraction
//!
//! Defines the `HiveStore` and `ReadingStore` traits so the hosting
//! application can inject its own storage. Hives are read and written as
//! whole entities. A lookup miss is `Ok(None)`; losing the backend surfaces
//! as `HiveError::StorageUnavailable`.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::error::HiveResult;
use crate::hive::{Hive, HiveId};
use crate::telemetry::SensorReading;

/// Whole-entity hive storage
#[async_trait]
pub trait HiveStore: Send + Sync {
    /// Load a hive with its base, extensions and frames
    async fn get_hive(&self, id: HiveId) -> HiveResult<Option<Hive>>;

    /// All stored hives, in no particular order
    async fn list_hives(&self) -> HiveResult<Vec<Hive>>;

    /// Store a new hive. Fails with `InvalidArgument` if the id is taken.
    async fn insert_hive(&self, hive: &Hive) -> HiveResult<()>;

    /// Replace a stored hive. Fails with `NotFound` if it does not exist.
    async fn save_hive(&self, hive: &Hive) -> HiveResult<()>;

    /// Delete a hive, returning whether it existed
    async fn delete_hive(&self, id: HiveId) -> HiveResult<bool>;
}

/// Append-only sensor reading log
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn append_reading(&self, reading: SensorReading) -> HiveResult<()>;

    /// Readings for a hive ordered by timestamp
    async fn readings_for(&self, hive: HiveId) -> HiveResult<Vec<SensorReading>>;
}
