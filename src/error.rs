use thiserror::Error;

/// Everything that can go wrong in the aggregation and merge paths.
/// Validation errors are raised before any mutation, so the store and the
/// snapshot artifact are never left half-written.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("malformed score row at position {position}: {reason}")]
  MalformedRow { position: usize, reason: String },

  #[error("store unavailable: {0}")]
  StoreUnavailable(#[from] diesel::result::Error),

  #[error("failed to parse batch row at line {position}")]
  BatchParse {
    position: u64,
    #[source]
    source: csv::Error,
  },

  #[error("batch header has no vote_address column")]
  MissingVoteColumn,

  #[error("batch spans multiple epochs: {0:?}")]
  MultiEpochBatch(Vec<i64>),

  #[error("batch is empty after header filtering")]
  EmptyBatch,

  #[error("snapshot write failed: {0}")]
  WriteFailure(#[from] std::io::Error),

  #[error("snapshot encoding failed: {0}")]
  Encode(#[from] serde_json::Error),
}
