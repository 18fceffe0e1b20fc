#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryStats {
    pub record_count: u64,
    /// Accessible output files among the saved records.
    pub accessible_count: u64,
    pub db_size_bytes: u64,
}
