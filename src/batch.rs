use std::io::Read;

use log::warn;

use crate::error::SyncError;
use crate::models::PostProcessRow;

/// Header token of the post-process csv format. A data row carrying this
/// literal as its vote address is a stray header line (typically from
/// concatenated files) and is stripped before validation.
pub const HEADER_TOKEN: &str = "vote_address";

/// A batch that passed validation: non-empty, exactly one epoch.
#[derive(Debug, PartialEq)]
pub struct ValidatedBatch {
  pub epoch: i64,
  pub rows: Vec<PostProcessRow>,
}

/// Read a post-process batch from csv. Stray header lines are stripped with
/// a warning; any other row that fails to parse is an error carrying the
/// line it came from, never an empty result.
pub fn read<R: Read>(input: R) -> Result<Vec<PostProcessRow>, SyncError> {
  let mut reader = csv::Reader::from_reader(input);
  let headers = reader
    .headers()
    .map_err(|e| batch_parse(1, e))?
    .clone();
  let vote_idx = headers
    .iter()
    .position(|h| h == HEADER_TOKEN)
    .ok_or(SyncError::MissingVoteColumn)?;

  let mut rows = Vec::new();
  let mut stripped = 0usize;
  for record in reader.records() {
    let record = record.map_err(|e| {
      let line = e.position().map(|p| p.line()).unwrap_or_default();
      batch_parse(line, e)
    })?;
    if record.get(vote_idx) == Some(HEADER_TOKEN) {
      stripped += 1;
      continue;
    }
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let row: PostProcessRow = record
      .deserialize(Some(&headers))
      .map_err(|e| batch_parse(line, e))?;
    rows.push(row);
  }
  if stripped > 0 {
    warn!("stripped {} stray header line(s) from batch", stripped);
  }
  Ok(rows)
}

/// Check that the batch is non-empty and references exactly one epoch.
/// No store access happens here; a failed validation means no mutation was
/// ever attempted.
pub fn validate(rows: Vec<PostProcessRow>) -> Result<ValidatedBatch, SyncError> {
  let mut epochs: Vec<i64> = rows.iter().map(|r| r.epoch).collect();
  epochs.sort_unstable();
  epochs.dedup();
  match epochs.len() {
    0 => Err(SyncError::EmptyBatch),
    1 => Ok(ValidatedBatch {
      epoch: epochs[0],
      rows,
    }),
    _ => Err(SyncError::MultiEpochBatch(epochs)),
  }
}

fn batch_parse(position: u64, source: csv::Error) -> SyncError {
  SyncError::BatchParse { position, source }
}
