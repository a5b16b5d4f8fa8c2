/// Shared data structures for the catalog state
///
/// These structs represent the rows that flow between
/// the database layer and the command line.

/// A discovered image file as stored in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Unique database ID
    pub id: i64,
    /// Filename only (e.g., "Black tom ford.avif")
    pub file_name: String,
    /// Storage path or URL (e.g., "photos/Black tom ford.avif")
    pub path: String,
    /// Which source found it: 'directory', 'listing', 'index' or 'probe'
    pub source: String,
    /// Unix timestamp of discovery
    pub discovered_at: i64,
    /// File status: 'exists' or 'deleted'
    pub file_status: String,
}

/// A resolution persisted between runs
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResolution {
    pub display_name: String,
    /// Empty string when the lookup had no brand
    pub brand_name: String,
    pub path: String,
    pub found: bool,
    /// Unix timestamp of the lookup
    pub resolved_at: i64,
}

/// Result of importing a candidate set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported_count: usize,
    pub skipped_count: usize,
}
