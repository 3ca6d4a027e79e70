use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::aggregate::ValidatorSnapshot;
use crate::error::SyncError;

/// Write the snapshot to `dest` via a temporary sibling file and a rename,
/// so a reader of `dest` sees either the complete previous artifact or the
/// complete new one. On failure the previous artifact is left untouched and
/// the temporary file is removed best-effort.
pub fn persist(snapshot: &ValidatorSnapshot, dest: &Path) -> Result<(), SyncError> {
  let tmp = tmp_path(dest);
  debug!("snapshot: writing {} records to {}", snapshot.len(), tmp.display());

  let result = write_artifact(snapshot, &tmp)
    .and_then(|_| fs::rename(&tmp, dest).map_err(SyncError::from));
  if result.is_err() {
    let _ = fs::remove_file(&tmp);
  }
  result
}

fn tmp_path(dest: &Path) -> PathBuf {
  let mut os = dest.as_os_str().to_owned();
  os.push(".tmp");
  PathBuf::from(os)
}

fn write_artifact(snapshot: &ValidatorSnapshot, tmp: &Path) -> Result<(), SyncError> {
  let file = fs::File::create(tmp)?;
  let mut writer = BufWriter::new(file);
  serde_json::to_writer(&mut writer, snapshot)?;
  writer.flush()?;
  writer
    .into_inner()
    .map_err(|e| SyncError::WriteFailure(e.into_error()))?
    .sync_all()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aggregate::ValidatorIndex;
  use crate::scan::EpochRow;

  fn row(vote: &str, epoch: i64, score: i64) -> EpochRow {
    EpochRow {
      vote_address: vote.to_string(),
      epoch,
      keybase_id: None,
      name: Some(format!("Validator {}", vote)),
      score,
      avg_position: 50.0,
      commission: 5,
      active_stake: 1000.0,
      epoch_credits: 300_000,
      data_center_concentration: 0.1,
      can_halt_the_network_group: false,
      stake_state: "staked".to_string(),
      stake_state_reason: String::new(),
      pct: 0.5,
      stake_conc: 0.0,
      adj_credits: 299_000,
    }
  }

  fn snapshot_of(rows: Vec<EpochRow>) -> ValidatorSnapshot {
    let mut index = ValidatorIndex::new();
    for r in rows {
      index.observe(r);
    }
    index.into_snapshot()
  }

  #[test]
  fn writes_complete_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("snapshot.json");

    let snapshot = snapshot_of(vec![row("V1", 101, 90), row("V2", 101, 80), row("V1", 100, 70)]);
    persist(&snapshot, &dest).unwrap();

    let json: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["validator_vote_address"], "V1");
    assert_eq!(records[0]["validator_description"], "Validator V1");
    assert!(records[0]["keybase_id"].is_null());
    assert_eq!(records[0]["stats"].as_array().unwrap().len(), 2);
    assert_eq!(records[0]["stats"][0]["epoch"], 101);
    assert_eq!(records[0]["stats"][1]["epoch"], 100);
    assert_eq!(records[1]["validator_vote_address"], "V2");

    // no temporary left behind
    assert!(!dir.path().join("snapshot.json.tmp").exists());
  }

  #[test]
  fn replaces_previous_artifact_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("snapshot.json");

    persist(&snapshot_of(vec![row("V1", 101, 90)]), &dest).unwrap();
    persist(&snapshot_of(vec![row("V2", 102, 50)]), &dest).unwrap();

    let json: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["validator_vote_address"], "V2");
  }

  #[test]
  fn write_failure_is_reported_and_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("no-such-dir").join("snapshot.json");

    let err = persist(&snapshot_of(vec![row("V1", 101, 90)]), &dest).unwrap_err();
    match err {
      SyncError::WriteFailure(_) => {}
      other => panic!("expected WriteFailure, got {:?}", other),
    }
    assert!(!dest.exists());
  }
}
