use super::{ConversionRecord, HistoryError};

/// Durable storage behind [`super::PersistentHistoryStore`].
///
/// A successful `insert` or delete must be visible to the next
/// `enumerate_all` on the same process.
pub trait RecordStore {
    fn insert(&self, record: &ConversionRecord) -> Result<(), HistoryError>;

    /// Returns whether a row was removed.
    fn delete(&self, id: &str) -> Result<bool, HistoryError>;

    /// Removes all of `ids` or none of them.
    fn delete_many(&self, ids: &[String]) -> Result<usize, HistoryError>;

    fn delete_all(&self) -> Result<usize, HistoryError>;

    /// Newest first; equal timestamps come back newest-inserted first.
    fn enumerate_all(&self) -> Result<Vec<ConversionRecord>, HistoryError>;
}
