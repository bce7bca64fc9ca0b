//! Hive Service
//!
//! The entry point for reporting and API layers. Every mutation loads the
//! hive from the store, changes it through the structure manager or the
//! frame lifecycle, and saves the whole entity back.
//!
//! Mutations of one hive are serialised by a per-hive async lock held across
//! load, mutate and save, so a capacity check and the insert it guards can
//! never interleave with another writer. Different hives use different locks
//! and never contend. Reads go straight to the store.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{HiveError, HiveResult};
use crate::hive::{
    AgentId, ContainerKey, Extension, ExtensionId, Frame, FrameId, FrameState, Hive, HiveId,
    HiveUpdate, NewHive, SiteId,
};
use crate::production::{validate_threshold, HiveYield, ProductionClassifier, ProductionLevel};
use crate::store::{HiveStore, ReadingStore};
use crate::telemetry::{SensorReading, YieldAggregator, YieldSummary};

/// Outcome of a mutation together with the hive as saved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revision<T> {
    pub value: T,
    pub hive: Hive,
    /// The hive's `updated_at` after the call
    pub updated_at: DateTime<Utc>,
}

/// Hive operations over an injected store
pub struct HiveService<S> {
    store: Arc<S>,
    config: EngineConfig,
    classifier: ProductionClassifier,
    locks: DashMap<HiveId, Arc<Mutex<()>>>,
}

impl<S> HiveService<S>
where
    S: HiveStore + ReadingStore,
{
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let classifier = ProductionClassifier::new(YieldAggregator::new(&config));
        Self {
            store,
            config,
            classifier,
            locks: DashMap::new(),
        }
    }

    /// Service with default configuration
    pub fn with_store(store: Arc<S>) -> Self {
        Self::new(store, EngineConfig::default())
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_for(&self, id: HiveId) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().clone()
    }

    /// Drop the hive's lock entry unless another task holds or awaits it.
    /// The map then only ever holds locks of hives with a call in flight.
    fn release_lock(&self, id: HiveId, lock: Arc<Mutex<()>>) {
        // One reference belongs to the map, one to `lock`.
        self.locks
            .remove_if(&id, |_, held| Arc::ptr_eq(held, &lock) && Arc::strong_count(held) <= 2);
    }

    async fn load(&self, id: HiveId) -> HiveResult<Hive> {
        self.store
            .get_hive(id)
            .await?
            .ok_or_else(|| HiveError::not_found(format!("hive {}", id)))
    }

    /// Run `op` against the stored hive under its lock. `op` reports whether
    /// it changed anything; unchanged hives are neither stamped nor saved.
    async fn mutate<T, F>(&self, id: HiveId, op: F) -> HiveResult<Revision<T>>
    where
        T: Send,
        F: FnOnce(&mut Hive, DateTime<Utc>) -> HiveResult<(T, bool)> + Send,
    {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.mutate_locked(id, op).await
        };
        self.release_lock(id, lock);
        result
    }

    async fn mutate_locked<T, F>(&self, id: HiveId, op: F) -> HiveResult<Revision<T>>
    where
        T: Send,
        F: FnOnce(&mut Hive, DateTime<Utc>) -> HiveResult<(T, bool)> + Send,
    {
        let mut hive = self.load(id).await?;
        let at = Utc::now();
        let (value, changed) = op(&mut hive, at)?;
        if changed {
            hive.touch(at);
            self.store.save_hive(&hive).await?;
        }
        let updated_at = hive.updated_at();
        Ok(Revision {
            value,
            hive,
            updated_at,
        })
    }

    // Hive lifecycle

    pub async fn create_hive(&self, new: NewHive) -> HiveResult<Hive> {
        let hive = Hive::create(new)?;
        self.store.insert_hive(&hive).await?;
        info!(hive = %hive.id(), name = hive.name(), "hive created");
        Ok(hive)
    }

    pub async fn get_hive(&self, id: HiveId) -> HiveResult<Option<Hive>> {
        self.store.get_hive(id).await
    }

    pub async fn hive_exists(&self, id: HiveId) -> HiveResult<bool> {
        Ok(self.store.get_hive(id).await?.is_some())
    }

    pub async fn count_hives(&self) -> HiveResult<usize> {
        Ok(self.store.list_hives().await?.len())
    }

    /// All hives ordered by name
    pub async fn list_hives(&self) -> HiveResult<Vec<Hive>> {
        let mut hives = self.store.list_hives().await?;
        hives.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        Ok(hives)
    }

    pub async fn list_by_site(&self, site: SiteId) -> HiveResult<Vec<Hive>> {
        self.list_where(|h| h.site_id() == Some(site)).await
    }

    pub async fn list_by_agent(&self, agent: AgentId) -> HiveResult<Vec<Hive>> {
        self.list_where(|h| h.current_agent() == Some(agent)).await
    }

    pub async fn list_active(&self) -> HiveResult<Vec<Hive>> {
        self.list_where(Hive::is_active).await
    }

    async fn list_where(&self, keep: impl Fn(&Hive) -> bool) -> HiveResult<Vec<Hive>> {
        let mut hives = self.list_hives().await?;
        hives.retain(|h| keep(h));
        Ok(hives)
    }

    /// Apply a metadata patch. An empty patch still stamps `updated_at`.
    pub async fn update_hive(&self, id: HiveId, update: HiveUpdate) -> HiveResult<Revision<()>> {
        self.mutate(id, move |hive, at| {
            hive.apply_update(update, at)?;
            Ok(((), true))
        })
        .await
    }

    /// Flip the active flag, returning the new value
    pub async fn toggle_active(&self, id: HiveId) -> HiveResult<Revision<bool>> {
        self.mutate(id, |hive, at| {
            let active = !hive.is_active();
            hive.apply_update(HiveUpdate::new().active(active), at)?;
            Ok((active, true))
        })
        .await
    }

    /// Delete a hive together with its extensions and frames. Readings are
    /// left to the telemetry side. Returns whether the hive existed.
    pub async fn delete_hive(&self, id: HiveId) -> HiveResult<bool> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.delete_locked(id).await
        };
        self.release_lock(id, lock);
        result
    }

    async fn delete_locked(&self, id: HiveId) -> HiveResult<bool> {
        match self.store.get_hive(id).await? {
            Some(mut hive) => {
                let (extensions, frames) = hive.dismantle();
                let deleted = self.store.delete_hive(id).await?;
                info!(hive = %id, extensions, frames, "hive deleted");
                Ok(deleted)
            }
            None => Ok(false),
        }
    }

    // Structure

    pub async fn add_extension(&self, id: HiveId, extension: Extension) -> HiveResult<Revision<ExtensionId>> {
        self.mutate(id, move |hive, _| Ok((hive.add_extension(extension)?, true)))
            .await
    }

    /// Removing an extension the hive does not have is a no-op yielding
    /// `None`
    pub async fn remove_extension(
        &self,
        id: HiveId,
        extension: ExtensionId,
    ) -> HiveResult<Revision<Option<Extension>>> {
        self.mutate(id, move |hive, _| {
            let removed = hive.remove_extension(extension);
            let changed = removed.is_some();
            Ok((removed, changed))
        })
        .await
    }

    pub async fn add_frame(
        &self,
        id: HiveId,
        container: ContainerKey,
        frame: Frame,
        slot: u32,
    ) -> HiveResult<Revision<FrameId>> {
        self.mutate(id, move |hive, _| Ok((hive.add_frame(container, frame, slot)?, true)))
            .await
    }

    pub async fn remove_frame(
        &self,
        id: HiveId,
        container: ContainerKey,
        frame: FrameId,
    ) -> HiveResult<Revision<Option<Frame>>> {
        self.mutate(id, move |hive, _| {
            let removed = hive.remove_frame(container, frame)?;
            let changed = removed.is_some();
            Ok((removed, changed))
        })
        .await
    }

    pub async fn total_frames(&self, id: HiveId) -> HiveResult<usize> {
        Ok(self.load(id).await?.total_frames())
    }

    pub async fn is_slot_available(&self, id: HiveId, container: ContainerKey, slot: u32) -> HiveResult<bool> {
        self.load(id).await?.is_slot_available(container, slot)
    }

    // Frame lifecycle

    pub async fn record_frame_weight(
        &self,
        id: HiveId,
        frame: FrameId,
        grams: f64,
    ) -> HiveResult<Revision<FrameState>> {
        self.mutate(id, move |hive, _| Ok((hive.apply_frame_weight(frame, grams)?, true)))
            .await
    }

    /// Flag a frame as damaged. An already damaged frame is left unsaved.
    pub async fn mark_frame_damaged(&self, id: HiveId, frame: FrameId) -> HiveResult<Revision<()>> {
        self.mutate(id, move |hive, _| {
            let before = state_of(hive, frame);
            hive.mark_frame_damaged(frame)?;
            Ok(((), before != Some(FrameState::Damaged)))
        })
        .await
    }

    /// Lift the damage flag. An undamaged frame is left unsaved.
    pub async fn clear_frame_damage(&self, id: HiveId, frame: FrameId) -> HiveResult<Revision<FrameState>> {
        self.mutate(id, move |hive, _| {
            let before = state_of(hive, frame);
            let after = hive.clear_frame_damage(frame)?;
            Ok((after, before != Some(after)))
        })
        .await
    }

    /// Harvest a full frame, returning the grams taken. A frame that is not
    /// full yields `NotReadyForHarvest` and nothing is saved.
    pub async fn harvest_frame(&self, id: HiveId, frame: FrameId) -> HiveResult<Revision<f64>> {
        self.mutate(id, move |hive, _| Ok((hive.harvest_frame(frame)?, true)))
            .await
    }

    // Telemetry

    /// Store a reading for an existing hive. Abnormal readings are logged
    /// and stored all the same; the return value says whether it was one.
    pub async fn ingest_reading(&self, reading: SensorReading) -> HiveResult<bool> {
        if !self.hive_exists(reading.hive).await? {
            return Err(HiveError::not_found(format!("hive {}", reading.hive)));
        }
        let abnormal = self.classifier.aggregator().is_abnormal(&reading);
        if abnormal {
            warn!(
                hive = %reading.hive,
                indicator = %reading.indicator,
                value = reading.value,
                "abnormal sensor reading"
            );
        }
        self.store.append_reading(reading).await?;
        Ok(abnormal)
    }

    pub async fn readings(&self, id: HiveId) -> HiveResult<Vec<SensorReading>> {
        self.store.readings_for(id).await
    }

    /// Peak weight reading for the hive, 0 without readings
    pub async fn current_honey_quantity(&self, id: HiveId) -> HiveResult<f64> {
        self.load(id).await?;
        let readings = self.store.readings_for(id).await?;
        Ok(self.classifier.aggregator().current_honey_quantity(id, &readings))
    }

    pub async fn yield_summary(&self, id: HiveId) -> HiveResult<YieldSummary> {
        self.load(id).await?;
        let readings = self.store.readings_for(id).await?;
        Ok(self.classifier.aggregator().summarize(id, &readings))
    }

    // Production

    pub async fn high_production(&self, threshold: f64) -> HiveResult<Vec<HiveYield>> {
        self.rank(threshold, ProductionLevel::High).await
    }

    pub async fn low_production(&self, threshold: f64) -> HiveResult<Vec<HiveYield>> {
        self.rank(threshold, ProductionLevel::Low).await
    }

    pub async fn high_production_with_default(&self) -> HiveResult<Vec<HiveYield>> {
        self.high_production(self.config.high_production_threshold).await
    }

    pub async fn low_production_with_default(&self) -> HiveResult<Vec<HiveYield>> {
        self.low_production(self.config.low_production_threshold).await
    }

    async fn rank(&self, threshold: f64, level: ProductionLevel) -> HiveResult<Vec<HiveYield>> {
        validate_threshold(threshold)?;
        let hives = self.store.list_hives().await?;
        let mut fleet = Vec::with_capacity(hives.len());
        for hive in hives {
            let readings = self.store.readings_for(hive.id()).await?;
            fleet.push((hive, readings));
        }
        self.classifier.classify(
            fleet.iter().map(|(hive, readings)| (hive, readings.as_slice())),
            threshold,
            level,
        )
    }
}

fn state_of(hive: &Hive, frame: FrameId) -> Option<FrameState> {
    hive.find_frame(frame).map(|(_, f)| f.state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> HiveService<InMemoryStore> {
        HiveService::with_store(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_mutation_stamps_and_saves() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();

        let revision = service
            .add_frame(hive.id(), ContainerKey::Base, Frame::new("f1"), 1)
            .await
            .unwrap();
        assert!(revision.updated_at >= hive.updated_at());
        assert_eq!(revision.hive.total_frames(), 1);

        let stored = service.get_hive(hive.id()).await.unwrap().unwrap();
        assert_eq!(stored, revision.hive);
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_saved() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        service
            .add_frame(hive.id(), ContainerKey::Base, Frame::new("f1"), 3)
            .await
            .unwrap();
        let before = service.get_hive(hive.id()).await.unwrap().unwrap();

        let err = service
            .add_frame(hive.id(), ContainerKey::Base, Frame::new("f2"), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, HiveError::SlotOccupied { slot: 3, .. }));
        assert_eq!(service.get_hive(hive.id()).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_removing_absent_extension_is_noop() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        let revision = service.remove_extension(hive.id(), ExtensionId::new()).await.unwrap();
        assert!(revision.value.is_none());
        assert_eq!(revision.updated_at, hive.updated_at());
    }

    #[tokio::test]
    async fn test_unknown_hive_is_not_found() {
        let service = service();
        let err = service
            .add_extension(HiveId::new(), Extension::new("super", 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, HiveError::NotFound(_)));
        assert!(matches!(
            service.current_honey_quantity(HiveId::new()).await,
            Err(HiveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_hive_leaves_no_lock_behind() {
        let service = service();
        for _ in 0..1000 {
            let result = service.remove_extension(HiveId::new(), ExtensionId::new()).await;
            assert!(matches!(result, Err(HiveError::NotFound(_))));
        }
        assert!(!service.delete_hive(HiveId::new()).await.unwrap());
        assert_eq!(service.locks.len(), 0);
    }

    #[tokio::test]
    async fn test_locks_released_after_mutations() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        service
            .add_frame(hive.id(), ContainerKey::Base, Frame::new("f1"), 1)
            .await
            .unwrap();
        assert!(service
            .add_frame(hive.id(), ContainerKey::Base, Frame::new("f2"), 1)
            .await
            .is_err());
        assert!(service.delete_hive(hive.id()).await.unwrap());
        assert_eq!(service.locks.len(), 0);
    }

    #[tokio::test]
    async fn test_repeated_damage_marks_are_not_saved() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        let frame = service
            .add_frame(hive.id(), ContainerKey::Base, Frame::new("f1"), 1)
            .await
            .unwrap()
            .value;

        let first = service.mark_frame_damaged(hive.id(), frame).await.unwrap();
        let again = service.mark_frame_damaged(hive.id(), frame).await.unwrap();
        assert_eq!(again.updated_at, first.updated_at);
        assert_eq!(service.get_hive(hive.id()).await.unwrap().unwrap(), first.hive);

        let cleared = service.clear_frame_damage(hive.id(), frame).await.unwrap();
        assert_eq!(cleared.value, FrameState::Empty);
        assert!(cleared.updated_at >= first.updated_at);
        let noop = service.clear_frame_damage(hive.id(), frame).await.unwrap();
        assert_eq!(noop.updated_at, cleared.updated_at);
        assert_eq!(noop.value, FrameState::Empty);
    }

    #[tokio::test]
    async fn test_toggle_active() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        assert!(!service.toggle_active(hive.id()).await.unwrap().value);
        assert!(service.list_active().await.unwrap().is_empty());
        assert!(service.toggle_active(hive.id()).await.unwrap().value);
        assert_eq!(service.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_but_keeps_readings() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        service
            .add_extension(hive.id(), Extension::new("super", 1).unwrap())
            .await
            .unwrap();
        service
            .ingest_reading(SensorReading::weight(hive.id(), 1500.0))
            .await
            .unwrap();

        assert!(service.delete_hive(hive.id()).await.unwrap());
        assert!(!service.hive_exists(hive.id()).await.unwrap());
        assert!(!service.delete_hive(hive.id()).await.unwrap());
        assert_eq!(service.readings(hive.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_requires_hive() {
        let service = service();
        let err = service
            .ingest_reading(SensorReading::weight(HiveId::new(), 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, HiveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_abnormal_reading_is_stored() {
        let service = service();
        let hive = service.create_hive(NewHive::new("Acacia")).await.unwrap();
        let abnormal = service
            .ingest_reading(SensorReading::weight(hive.id(), -20.0))
            .await
            .unwrap();
        assert!(abnormal);
        assert_eq!(service.current_honey_quantity(hive.id()).await.unwrap(), -20.0);
    }

    #[tokio::test]
    async fn test_negative_threshold_rejected_before_io() {
        let store = Arc::new(InMemoryStore::new());
        let service = HiveService::with_store(store.clone());
        store.set_available(false);
        let err = service.high_production(-5.0).await.unwrap_err();
        assert!(matches!(err, HiveError::InvalidArgument(_)));
    }
}
