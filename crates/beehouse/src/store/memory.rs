//! In-memory store
//!
//! Used by tests and by embedders that do not need durability. The
//! availability switch simulates losing the backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{HiveStore, ReadingStore};
use crate::error::{HiveError, HiveResult};
use crate::hive::{Hive, HiveId};
use crate::telemetry::SensorReading;

#[derive(Debug)]
pub struct InMemoryStore {
    hives: RwLock<HashMap<HiveId, Hive>>,
    readings: RwLock<HashMap<HiveId, Vec<SensorReading>>>,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            hives: RwLock::new(HashMap::new()),
            readings: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated connectivity
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if !available {
            tracing::warn!("in-memory store marked unavailable");
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> HiveResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(HiveError::StorageUnavailable("in-memory store offline".to_string()))
        }
    }

    pub fn hive_count(&self) -> usize {
        self.hives.read().len()
    }

    pub fn reading_count(&self) -> usize {
        self.readings.read().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl HiveStore for InMemoryStore {
    async fn get_hive(&self, id: HiveId) -> HiveResult<Option<Hive>> {
        self.ensure_available()?;
        Ok(self.hives.read().get(&id).cloned())
    }

    async fn list_hives(&self) -> HiveResult<Vec<Hive>> {
        self.ensure_available()?;
        Ok(self.hives.read().values().cloned().collect())
    }

    async fn insert_hive(&self, hive: &Hive) -> HiveResult<()> {
        self.ensure_available()?;
        let mut hives = self.hives.write();
        if hives.contains_key(&hive.id()) {
            return Err(HiveError::invalid(format!("hive {} already exists", hive.id())));
        }
        hives.insert(hive.id(), hive.clone());
        Ok(())
    }

    async fn save_hive(&self, hive: &Hive) -> HiveResult<()> {
        self.ensure_available()?;
        match self.hives.write().get_mut(&hive.id()) {
            Some(stored) => {
                *stored = hive.clone();
                Ok(())
            }
            None => Err(HiveError::not_found(format!("hive {}", hive.id()))),
        }
    }

    async fn delete_hive(&self, id: HiveId) -> HiveResult<bool> {
        self.ensure_available()?;
        Ok(self.hives.write().remove(&id).is_some())
    }
}

#[async_trait]
impl ReadingStore for InMemoryStore {
    async fn append_reading(&self, reading: SensorReading) -> HiveResult<()> {
        self.ensure_available()?;
        let mut readings = self.readings.write();
        let log = readings.entry(reading.hive).or_default();
        // Keep the log chronological; equal timestamps keep arrival order.
        let at = log.partition_point(|r| r.timestamp <= reading.timestamp);
        log.insert(at, reading);
        Ok(())
    }

    async fn readings_for(&self, hive: HiveId) -> HiveResult<Vec<SensorReading>> {
        self.ensure_available()?;
        Ok(self.readings.read().get(&hive).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_hive_round_trip() {
        let store = InMemoryStore::new();
        let hive = Hive::new("Meadow").unwrap();

        assert!(store.get_hive(hive.id()).await.unwrap().is_none());
        store.insert_hive(&hive).await.unwrap();
        assert_eq!(store.get_hive(hive.id()).await.unwrap(), Some(hive.clone()));
        assert_eq!(store.list_hives().await.unwrap().len(), 1);

        assert!(store.delete_hive(hive.id()).await.unwrap());
        assert!(!store.delete_hive(hive.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryStore::new();
        let hive = Hive::new("Meadow").unwrap();
        store.insert_hive(&hive).await.unwrap();
        let err = store.insert_hive(&hive).await.unwrap_err();
        assert!(matches!(err, HiveError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_save_missing_is_not_found() {
        let store = InMemoryStore::new();
        let hive = Hive::new("Ghost").unwrap();
        let err = store.save_hive(&hive).await.unwrap_err();
        assert!(matches!(err, HiveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_readings_are_chronological() {
        let store = InMemoryStore::new();
        let hive = HiveId::new();
        let now = Utc::now();
        for (offset, grams) in [(5, 800.0), (0, 1200.0), (3, 3400.0)] {
            let reading = SensorReading::weight(hive, grams).at(now + Duration::minutes(offset));
            store.append_reading(reading).await.unwrap();
        }

        let values: Vec<f64> = store
            .readings_for(hive)
            .await
            .unwrap()
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![1200.0, 3400.0, 800.0]);
        assert!(store.readings_for(HiveId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryStore::new();
        store.set_available(false);

        let err = store.get_hive(HiveId::new()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.readings_for(HiveId::new()).await.is_err());

        store.set_available(true);
        assert!(store.get_hive(HiveId::new()).await.unwrap().is_none());
    }
}
