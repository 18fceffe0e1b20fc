//! Conversion history: a session-only recent list and a durable saved list.

use std::path::PathBuf;

use tokio::sync::broadcast;

mod persistent;
mod record;
mod shell;
mod store;
mod volatile;

pub use persistent::PersistentHistoryStore;
pub use record::{format_file_size, ConversionRecord};
pub use shell::{FileShell, SystemShell};
pub use store::RecordStore;
pub use volatile::{VolatileHistoryTracker, VOLATILE_HISTORY_LIMIT};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("history storage error: {0}")]
    Storage(String),
    #[error("could not hand {} to the shell: {source}", .path.display())]
    Shell {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Published after every change to a history component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryChange {
    Added(String),
    Removed(String),
    /// One event for a bulk removal so a large clear cannot overrun subscribers.
    RemovedMany(Vec<String>),
    /// Dropped by the capacity limit, not by the user.
    Evicted(String),
    Cleared,
    MissingFilesChanged(bool),
}

const CHANGE_CHANNEL_CAPACITY: usize = 64;

fn change_channel() -> broadcast::Sender<HistoryChange> {
    broadcast::channel(CHANGE_CHANNEL_CAPACITY).0
}

fn notify(tx: &broadcast::Sender<HistoryChange>, change: HistoryChange) {
    // No subscribers is fine.
    let _ = tx.send(change);
}
