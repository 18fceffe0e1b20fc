use std::path::Path;

use tokio::sync::broadcast;

use super::record::HistoryClock;
use super::{change_channel, notify, ConversionRecord, FileShell, HistoryChange, SystemShell};

/// How many recent conversions the session list keeps.
pub const VOLATILE_HISTORY_LIMIT: usize = 50;

/// Recent conversions for the current process only.
///
/// Starts empty, never touches disk, and silently drops the oldest entry once
/// more than [`VOLATILE_HISTORY_LIMIT`] are held.
pub struct VolatileHistoryTracker<F: FileShell = SystemShell> {
    records: Vec<ConversionRecord>,
    shell: F,
    clock: HistoryClock,
    changes: broadcast::Sender<HistoryChange>,
}

impl VolatileHistoryTracker<SystemShell> {
    pub fn new() -> Self {
        Self::with_shell(SystemShell)
    }
}

impl Default for VolatileHistoryTracker<SystemShell> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileShell> VolatileHistoryTracker<F> {
    pub fn with_shell(shell: F) -> Self {
        Self {
            records: Vec::with_capacity(VOLATILE_HISTORY_LIMIT + 1),
            shell,
            clock: HistoryClock::default(),
            changes: change_channel(),
        }
    }

    /// Log a finished conversion. A missing output is recorded with size 0.
    pub fn record(
        &mut self,
        input_file_name: &str,
        input_format: &str,
        output_format: &str,
        output_file_location: &Path,
    ) -> ConversionRecord {
        let size = self.shell.size(output_file_location).unwrap_or(0);
        let record = ConversionRecord::new(
            input_file_name,
            input_format,
            output_format,
            output_file_location,
            self.clock.now(),
            size,
        );

        self.records.insert(0, record.clone());
        notify(&self.changes, HistoryChange::Added(record.id.clone()));

        if self.records.len() > VOLATILE_HISTORY_LIMIT {
            for evicted in self.records.drain(VOLATILE_HISTORY_LIMIT..) {
                log::debug!("Evicted recent conversion {}", evicted.output_file_name);
                notify(&self.changes, HistoryChange::Evicted(evicted.id));
            }
        }

        record
    }

    /// Drop the entry with `record`'s id. Unknown records are ignored.
    pub fn remove(&mut self, record: &ConversionRecord) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != record.id);
        let removed = self.records.len() != before;
        if removed {
            notify(&self.changes, HistoryChange::Removed(record.id.clone()));
        }
        removed
    }

    pub fn clear(&mut self) {
        self.records.clear();
        notify(&self.changes, HistoryChange::Cleared);
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

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryChange> {
        self.changes.subscribe()
    }
}

// ── Tests ───────────────────────────────────────────────────
