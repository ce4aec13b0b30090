/// Errors produced by the ingestion core
///
/// Only two kinds abort work: `InvalidInput` (raised before any network
/// call) and `ExtractionFailed` (fatal for the one item it occurred on).
/// Fetch failures degrade into empty content at the call site.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid source URL: {0}")]
    InvalidInput(String),

    #[error("both fetch paths failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("required field could not be extracted: {0}")]
    ExtractionFailed(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
