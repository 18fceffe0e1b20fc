use std::path::Path;

use tokio::sync::broadcast;

use super::record::HistoryClock;
use super::{
    change_channel, notify, ConversionRecord, FileShell, HistoryChange, HistoryError, RecordStore,
    SystemShell,
};

/// Conversions the user chose to keep, backed by a [`RecordStore`].
///
/// Writes go to the store first and only then show up in [`records`]; a failed
/// write leaves the in-memory view as it was. The `has_missing_files` flag is
/// changed only by [`scan_for_missing_files`] and [`clear_missing_files`].
///
/// [`records`]: Self::records
/// [`scan_for_missing_files`]: Self::scan_for_missing_files
/// [`clear_missing_files`]: Self::clear_missing_files
pub struct PersistentHistoryStore<S: RecordStore, F: FileShell = SystemShell> {
    store: S,
    shell: F,
    records: Vec<ConversionRecord>,
    has_missing_files: bool,
    clock: HistoryClock,
    changes: broadcast::Sender<HistoryChange>,
}

impl<S: RecordStore> PersistentHistoryStore<S, SystemShell> {
    pub fn open(store: S) -> Result<Self, HistoryError> {
        Self::open_with_shell(store, SystemShell)
    }
}

impl<S: RecordStore, F: FileShell> PersistentHistoryStore<S, F> {
    /// Load every saved record from `store`.
    pub fn open_with_shell(store: S, shell: F) -> Result<Self, HistoryError> {
        let records = store.enumerate_all()?;
        log::info!("Loaded {} saved conversions", records.len());
        let clock = HistoryClock::starting_at(records.first().map(|r| r.timestamp));
        Ok(Self {
            store,
            shell,
            records,
            has_missing_files: false,
            clock,
            changes: change_channel(),
        })
    }

    /// Re-read the in-memory view from the store.
    pub fn reload(&mut self) -> Result<(), HistoryError> {
        self.records = self.store.enumerate_all()?;
        self.clock = HistoryClock::starting_at(self.records.first().map(|r| r.timestamp));
        Ok(())
    }

    pub fn record(
        &mut self,
        input_file_name: &str,
        input_format: &str,
        output_format: &str,
        output_file_location: &Path,
    ) -> Result<ConversionRecord, HistoryError> {
        self.record_with_thumbnail(
            input_file_name,
            input_format,
            output_format,
            output_file_location,
            None,
        )
    }

    pub fn record_with_thumbnail(
        &mut self,
        input_file_name: &str,
        input_format: &str,
        output_format: &str,
        output_file_location: &Path,
        thumbnail: Option<Vec<u8>>,
    ) -> Result<ConversionRecord, HistoryError> {
        let size = self.shell.size(output_file_location).unwrap_or(0);
        let record = ConversionRecord::new(
            input_file_name,
            input_format,
            output_format,
            output_file_location,
            self.clock.now(),
            size,
        )
        .with_thumbnail(thumbnail);

        self.store.insert(&record)?;
        self.records.insert(0, record.clone());
        log::info!(
            "Saved conversion {} -> {}",
            record.input_file_name,
            record.output_file_location.display()
        );
        notify(&self.changes, HistoryChange::Added(record.id.clone()));
        Ok(record)
    }

    /// Forget `record`. The output file itself is never touched.
    pub fn remove(&mut self, record: &ConversionRecord) -> Result<bool, HistoryError> {
        self.store.delete(&record.id)?;
        let before = self.records.len();
        self.records.retain(|r| r.id != record.id);
        let removed = self.records.len() != before;
        if removed {
            notify(&self.changes, HistoryChange::Removed(record.id.clone()));
        }
        Ok(removed)
    }

    pub fn clear_all(&mut self) -> Result<usize, HistoryError> {
        let deleted = self.store.delete_all()?;
        self.records.clear();
        log::info!("Cleared {} saved conversions", deleted);
        notify(&self.changes, HistoryChange::Cleared);
        Ok(deleted)
    }

    /// Probe every record's output file and update `has_missing_files`.
    /// Returns how many are missing right now.
    pub fn scan_for_missing_files(&mut self) -> usize {
        let missing = self
            .records
            .iter()
            .filter(|r| !self.shell.exists(&r.output_file_location))
            .count();
        if missing > 0 {
            log::info!("{} saved conversions point at missing files", missing);
        }
        self.set_has_missing_files(missing > 0);
        missing
    }

    /// Drop every record whose output file is currently missing.
    pub fn clear_missing_files(&mut self) -> Result<usize, HistoryError> {
        let missing: Vec<String> = self
            .records
            .iter()
            .filter(|r| !self.shell.exists(&r.output_file_location))
            .map(|r| r.id.clone())
            .collect();

        if !missing.is_empty() {
            self.store.delete_many(&missing)?;
            self.records.retain(|r| !missing.contains(&r.id));
            log::info!("Removed {} conversions with missing files", missing.len());
            notify(&self.changes, HistoryChange::RemovedMany(missing.clone()));
        }

        let still_missing = self
            .records
            .iter()
            .any(|r| !self.shell.exists(&r.output_file_location));
        if !still_missing {
            self.set_has_missing_files(false);
        }
        Ok(missing.len())
    }

    /// Ask the OS to open the output file.
    ///
    /// `Ok(false)` means the file is gone and nothing was attempted.
    pub fn open_file(&self, record: &ConversionRecord) -> Result<bool, HistoryError> {
        self.hand_to_shell(record, |shell, path| shell.open(path))
    }

    /// Ask the OS file manager to show the output file.
    ///
    /// `Ok(false)` means the file is gone and nothing was attempted.
    pub fn reveal_in_finder(&self, record: &ConversionRecord) -> Result<bool, HistoryError> {
        self.hand_to_shell(record, |shell, path| shell.reveal(path))
    }

    fn hand_to_shell(
        &self,
        record: &ConversionRecord,
        action: impl FnOnce(&F, &Path) -> std::io::Result<()>,
    ) -> Result<bool, HistoryError> {
        let path = &record.output_file_location;
        // Re-probe: the last scan may be stale.
        if !self.shell.exists(path) {
            log::warn!("Skipping shell request, file is gone: {}", path.display());
            return Ok(false);
        }
        action(&self.shell, path).map_err(|source| HistoryError::Shell {
            path: path.clone(),
            source,
        })?;
        Ok(true)
    }

    /// Whether `record`'s output file exists right now.
    pub fn is_file_accessible(&self, record: &ConversionRecord) -> bool {
        self.shell.exists(&record.output_file_location)
    }

    pub fn has_missing_files(&self) -> bool {
        self.has_missing_files
    }

    /// Newest first.
    pub fn records(&self) -> &[ConversionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryChange> {
        self.changes.subscribe()
    }

    fn set_has_missing_files(&mut self, value: bool) {
        if self.has_missing_files != value {
            self.has_missing_files = value;
            notify(&self.changes, HistoryChange::MissingFilesChanged(value));
        }
    }
}

// ── Tests ───────────────────────────────────────────────────
