//! The hive aggregate
//!
//! A hive owns exactly one [`Base`] and up to five [`Extension`]s. Metadata
//! changes go through [`Hive::apply_update`], which validates the whole
//! patch before touching anything and stamps `updated_at` once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::container::{Base, Extension, FrameContainer, FrameRack};
use super::frame::{ContainerKey, Frame, FrameLocation};
use super::ids::{AgentId, ExtensionId, FrameId, HiveId, SiteId};
use super::structure::MAX_EXTENSIONS;
use crate::error::{HiveError, HiveResult};

/// Maximum hive name length in characters
pub const MAX_NAME_LEN: usize = 100;
/// Maximum hive description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Parameters for creating a hive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHive {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub site_id: Option<SiteId>,
    #[serde(default)]
    pub current_agent: Option<AgentId>,
}

impl NewHive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn with_agent(mut self, agent: AgentId) -> Self {
        self.current_agent = Some(agent);
        self
    }
}

/// Partial metadata update. `None` leaves a field untouched; the nested
/// options clear a field when set to `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiveUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub site_id: Option<Option<SiteId>>,
    #[serde(default)]
    pub current_agent: Option<Option<AgentId>>,
}

impl HiveUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn site(mut self, site_id: Option<SiteId>) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn agent(mut self, agent: Option<AgentId>) -> Self {
        self.current_agent = Some(agent);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn validate_name(name: &str) -> HiveResult<()> {
    if name.trim().is_empty() {
        return Err(HiveError::invalid("hive name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(HiveError::invalid(format!(
            "hive name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> HiveResult<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(HiveError::invalid(format!(
            "hive description exceeds {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

/// A beehive and its physical container hierarchy
///
/// Deserialization re-checks the hierarchy invariants, so a hive handed over
/// by storage is as trustworthy as one built through the structure manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HiveRecord")]
pub struct Hive {
    id: HiveId,
    name: String,
    description: Option<String>,
    active: bool,
    site_id: Option<SiteId>,
    current_agent: Option<AgentId>,
    pub(crate) base: Base,
    pub(crate) extensions: Vec<Extension>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct HiveRecord {
    id: HiveId,
    name: String,
    description: Option<String>,
    active: bool,
    site_id: Option<SiteId>,
    current_agent: Option<AgentId>,
    base: Base,
    extensions: Vec<Extension>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HiveRecord> for Hive {
    type Error = HiveError;

    fn try_from(record: HiveRecord) -> HiveResult<Self> {
        validate_name(&record.name)?;
        validate_description(record.description.as_deref())?;
        let hive = Self {
            id: record.id,
            name: record.name,
            description: record.description,
            active: record.active,
            site_id: record.site_id,
            current_agent: record.current_agent,
            base: record.base,
            extensions: record.extensions,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        hive.check_hierarchy()?;
        Ok(hive)
    }
}

impl Hive {
    /// Cross-container invariants that a single rack or extension cannot
    /// see on its own
    fn check_hierarchy(&self) -> HiveResult<()> {
        if self.extensions.len() > MAX_EXTENSIONS {
            return Err(HiveError::CapacityExceeded {
                what: format!("hive {} extensions", self.id),
                limit: MAX_EXTENSIONS,
            });
        }

        let mut extension_ids = HashSet::new();
        for extension in &self.extensions {
            if !extension_ids.insert(extension.id) {
                return Err(HiveError::invalid(format!(
                    "extension {} appears twice on hive {}",
                    extension.id, self.id
                )));
            }
            if extension.hive != Some(self.id) {
                return Err(HiveError::invalid(format!(
                    "extension {} does not point back at hive {}",
                    extension.id, self.id
                )));
            }
        }

        let mut frame_ids = HashSet::new();
        for (container, frame) in self.frames() {
            if !frame_ids.insert(frame.id) {
                return Err(HiveError::invalid(format!(
                    "frame {} appears twice on hive {}",
                    frame.id, self.id
                )));
            }
            let expected = FrameLocation {
                hive: self.id,
                container,
            };
            if frame.location != Some(expected) {
                return Err(HiveError::invalid(format!(
                    "frame {} in {} has a mismatched location",
                    frame.id, container
                )));
            }
        }
        Ok(())
    }

    /// Create an active hive with an empty base and no extensions
    pub fn create(new: NewHive) -> HiveResult<Self> {
        validate_name(&new.name)?;
        validate_description(new.description.as_deref())?;
        let now = Utc::now();
        Ok(Self {
            id: HiveId::new(),
            name: new.name.trim().to_string(),
            description: new.description,
            active: true,
            site_id: new.site_id,
            current_agent: new.current_agent,
            base: Base::new(),
            extensions: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Shorthand for `Hive::create(NewHive::new(name))`
    pub fn new(name: impl Into<String>) -> HiveResult<Self> {
        Self::create(NewHive::new(name))
    }

    /// Identity, fixed at creation
    pub fn id(&self) -> HiveId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    pub fn current_agent(&self) -> Option<AgentId> {
        self.current_agent
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a metadata patch atomically and stamp the update time
    ///
    /// Returns the resulting `updated_at`, which stays put if `at` is older.
    ///
    /// # Errors
    ///
    /// Returns [`HiveError::InvalidArgument`] if the new name or description
    /// fails validation. The hive is unchanged on error.
    pub fn apply_update(&mut self, update: HiveUpdate, at: DateTime<Utc>) -> HiveResult<DateTime<Utc>> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(description) = &update.description {
            validate_description(description.as_deref())?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(site_id) = update.site_id {
            self.site_id = site_id;
        }
        if let Some(agent) = update.current_agent {
            self.current_agent = agent;
        }
        self.touch(at);
        Ok(self.updated_at)
    }

    /// Record that the hive changed at `at`. Never moves backwards.
    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    /// Extensions in stacking order of insertion
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn extension(&self, id: ExtensionId) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.id == id)
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Uniform view over the base or one extension
    pub fn container(&self, key: ContainerKey) -> Option<&dyn FrameContainer> {
        match key {
            ContainerKey::Base => Some(&self.base as &dyn FrameContainer),
            ContainerKey::Extension(id) => self.extension(id).map(|e| e as &dyn FrameContainer),
        }
    }

    pub(crate) fn rack_mut(&mut self, key: ContainerKey) -> Option<&mut FrameRack> {
        match key {
            ContainerKey::Base => Some(&mut self.base.rack),
            ContainerKey::Extension(id) => self
                .extensions
                .iter_mut()
                .find(|e| e.id == id)
                .map(|e| &mut e.rack),
        }
    }

    /// Every container, base first
    pub fn containers(&self) -> impl Iterator<Item = &dyn FrameContainer> {
        std::iter::once(&self.base as &dyn FrameContainer)
            .chain(self.extensions.iter().map(|e| e as &dyn FrameContainer))
    }

    /// Every frame in the hive, paired with its container
    pub fn frames(&self) -> impl Iterator<Item = (ContainerKey, &Frame)> {
        self.containers()
            .flat_map(|c| c.frames().iter().map(move |f| (c.key(), f)))
    }

    pub fn find_frame(&self, id: FrameId) -> Option<(ContainerKey, &Frame)> {
        self.frames().find(|(_, f)| f.id == id)
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        if let Some(frame) = self.base.rack.frame_mut(id) {
            return Some(frame);
        }
        self.extensions
            .iter_mut()
            .find_map(|e| e.rack.frame_mut(id))
    }
}
