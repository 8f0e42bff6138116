//! Override store: the in-memory record map and its backing file.
//!
//! Reads go through an [`ArcSwap`] snapshot and never block. Every mutation and
//! every persist runs under a single writer lock, so two first-time discoveries
//! of the same item produce one record and one file write.
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::host::{EffectCatalog, EmbeddedEffect, FoodCatalog, FoodDefaults};
use crate::identity::ItemIdentity;
use crate::record::{
    EffectSpec, OverrideDocument, OverrideMap, OverrideRecord, RetainedEntries, parse_overrides,
    render_overrides,
};

/// Errors raised while reading or writing the backing file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed override file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize overrides: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage behind the override map.
pub trait OverrideSource: Send + Sync {
    /// Current document, or `None` when nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    fn read(&self) -> Result<Option<String>, StoreError>;

    /// Replace the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn write(&self, contents: &str) -> Result<(), StoreError>;

    /// Human-readable location for log lines.
    fn location(&self) -> PathBuf;
}

/// Backing file on disk.
#[derive(Debug, Clone)]
pub struct OverrideFile {
    path: PathBuf,
}

impl OverrideFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl OverrideSource for OverrideFile {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        // Write beside the target and rename so readers never see a partial file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

/// In-memory backing document, for hosts without a writable config directory.
#[derive(Debug, Default)]
pub struct MemorySource {
    contents: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemorySource {
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            writes: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    /// Replace the document without counting a write, as an operator edit would.
    pub fn set_contents(&self, contents: impl Into<String>) {
        *self.contents.lock() = Some(contents.into());
    }

    /// Number of writes issued by the store.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl OverrideSource for MemorySource {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        *self.contents.lock() = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}

impl<S: OverrideSource + ?Sized> OverrideSource for Arc<S> {
    fn read(&self) -> Result<Option<String>, StoreError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        (**self).write(contents)
    }

    fn location(&self) -> PathBuf {
        (**self).location()
    }
}

/// What the backing document looked like when it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    /// No document yet (or an empty one).
    Missing,
    Loaded,
    /// Unreadable or malformed; left untouched on disk.
    Unreadable,
}

/// Summary of a `load`/`reload` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub source: SourceState,
    /// Records read from the backing document.
    pub from_file: usize,
    /// Records synthesized for catalog items the document did not mention.
    pub discovered: usize,
    pub total: usize,
    pub persisted: bool,
}

/// Owns the override map and mediates all access to it.
pub struct OverrideStore {
    source: Box<dyn OverrideSource>,
    records: ArcSwap<OverrideMap>,
    /// Writer lock; guards the file entries written back unchanged.
    writer: Mutex<RetainedEntries>,
    namespace: String,
    track_variants: bool,
    pretty: bool,
}

impl OverrideStore {
    /// Store backed by `source`; starts empty until [`OverrideStore::load`].
    pub fn new(source: impl OverrideSource + 'static, config: &EngineConfig) -> Self {
        Self {
            source: Box::new(source),
            records: ArcSwap::from_pointee(OverrideMap::new()),
            writer: Mutex::new(RetainedEntries::new()),
            namespace: config.namespace.clone(),
            track_variants: config.track_variants,
            pretty: config.pretty,
        }
    }

    /// Store backed by the override file named in `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(OverrideFile::new(config.overrides_path()), config)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn track_variants(&self) -> bool {
        self.track_variants
    }

    #[must_use]
    pub fn location(&self) -> PathBuf {
        self.source.location()
    }

    /// Read the backing file, fill in every catalog item it does not mention,
    /// and write the merged map back.
    pub fn load<C, E>(&self, catalog: &C, effects: &E) -> LoadReport
    where
        C: FoodCatalog + ?Sized,
        E: EffectCatalog + ?Sized,
    {
        let mut retained = self.writer.lock();
        let report = self.merge_locked(&mut retained, OverrideMap::new(), catalog, effects);
        log::info!(
            "Loaded {} food entries ({} generated from defaults)",
            report.total,
            report.discovered
        );
        report
    }

    /// Re-read the backing file while running.
    ///
    /// Identities present in the file take the file's record; identities only
    /// known in memory (auto-discovered since the last write) are kept.
    pub fn reload<C, E>(&self, catalog: &C, effects: &E) -> LoadReport
    where
        C: FoodCatalog + ?Sized,
        E: EffectCatalog + ?Sized,
    {
        let mut retained = self.writer.lock();
        let current = OverrideMap::clone(&self.records.load());
        let report = self.merge_locked(&mut retained, current, catalog, effects);
        log::info!("Config reloaded with {} food entries", report.total);
        report
    }

    fn merge_locked<C, E>(
        &self,
        retained: &mut RetainedEntries,
        mut records: OverrideMap,
        catalog: &C,
        effects: &E,
    ) -> LoadReport
    where
        C: FoodCatalog + ?Sized,
        E: EffectCatalog + ?Sized,
    {
        let (source, from_file) = match self.read_source() {
            Ok(Some(document)) => {
                let count = document.records.len();
                records.extend(document.records);
                *retained = document.retained;
                (SourceState::Loaded, count)
            }
            Ok(None) => {
                retained.clear();
                (SourceState::Missing, 0)
            }
            Err(err) => {
                log::error!("{err}; keeping in-memory overrides");
                (SourceState::Unreadable, 0)
            }
        };

        let mut discovered = 0;
        for item in catalog.food_items() {
            let identity = item.clone().normalized(self.track_variants);
            if records.contains_key(&identity) {
                continue;
            }
            match catalog.defaults(&item) {
                Ok(defaults) => {
                    let record = default_record(&defaults, &[], effects, &self.namespace);
                    records.insert(identity, record);
                    discovered += 1;
                }
                Err(err) => log::error!("Failed to read defaults for {identity}: {err}"),
            }
        }

        let total = records.len();
        self.records.store(Arc::new(records));

        // Never overwrite a document the operator can still fix by hand.
        let persisted = match source {
            SourceState::Unreadable => false,
            SourceState::Missing | SourceState::Loaded => self.persist_locked(retained),
        };

        LoadReport {
            source,
            from_file,
            discovered,
            total,
            persisted,
        }
    }

    fn read_source(&self) -> Result<Option<OverrideDocument>, StoreError> {
        let Some(contents) = self.source.read()? else {
            return Ok(None);
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        parse_overrides(&contents, self.track_variants)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.source.location(),
                source,
            })
    }

    /// Record for `identity`, if any. Never blocks on writers.
    #[must_use]
    pub fn get(&self, identity: &ItemIdentity) -> Option<OverrideRecord> {
        let identity = identity.clone().normalized(self.track_variants);
        self.records.load().get(&identity).cloned()
    }

    /// Current map snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<OverrideMap> {
        self.records.load_full()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.load().is_empty()
    }

    /// Insert `record` unless `identity` already has one.
    ///
    /// Returns the stored record and whether this call inserted it. The map is
    /// updated before the write so later lookups see the record immediately.
    pub fn register_if_absent(
        &self,
        identity: ItemIdentity,
        record: OverrideRecord,
    ) -> (OverrideRecord, bool) {
        let identity = identity.normalized(self.track_variants);
        if let Some(existing) = self.records.load().get(&identity) {
            return (existing.clone(), false);
        }

        let retained = self.writer.lock();
        let current = self.records.load_full();
        if let Some(existing) = current.get(&identity) {
            return (existing.clone(), false);
        }

        let mut next = OverrideMap::clone(&current);
        next.insert(identity.clone(), record.clone());
        self.records.store(Arc::new(next));
        log::info!("Registered new food entry {identity}");

        self.persist_locked(&retained);
        (record, true)
    }

    /// Write the full map to the backing file. Failures are logged.
    pub fn save(&self) -> bool {
        let retained = self.writer.lock();
        self.persist_locked(&retained)
    }

    fn persist_locked(&self, retained: &RetainedEntries) -> bool {
        let records = self.records.load();
        let result = render_overrides(&records, retained, self.pretty)
            .map_err(StoreError::from)
            .and_then(|document| self.source.write(&document));
        match result {
            Ok(()) => {
                log::debug!(
                    "Saved {} food entries to {}",
                    records.len(),
                    self.source.location().display()
                );
                true
            }
            Err(err) => {
                log::error!("Failed to save food overrides: {err}");
                false
            }
        }
    }
}

/// Record mirroring an item's own nutrition and effects.
///
/// The item's built-in effect comes first, followed by effects embedded on the
/// specific instance. Effects the catalog cannot name are dropped.
pub fn default_record<E>(
    defaults: &FoodDefaults,
    embedded: &[EmbeddedEffect],
    effects: &E,
    namespace: &str,
) -> OverrideRecord
where
    E: EffectCatalog + ?Sized,
{
    let mut record = OverrideRecord::with_nutrition(defaults.hunger, defaults.saturation);

    if let Some(builtin) = defaults.default_effect {
        match effects.effect_name(builtin.effect) {
            Some(name) => record.effects.push(EffectSpec::new(
                format!("{namespace}:{name}"),
                builtin.duration,
                builtin.amplifier,
                Some(builtin.chance),
            )),
            None => log::warn!("Built-in effect {:?} has no catalog name", builtin.effect),
        }
    }

    for entry in embedded {
        let name = effects
            .effect_by_id(entry.id)
            .and_then(|handle| effects.effect_name(handle));
        match name {
            Some(name) => record.effects.push(EffectSpec::new(
                format!("{namespace}:{name}"),
                entry.duration,
                entry.amplifier,
                entry.chance,
            )),
            None => log::warn!("Embedded effect id {} is not in the effect catalog", entry.id),
        }
    }

    record
}
