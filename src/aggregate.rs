use std::collections::HashMap;

use serde::Serialize;

use crate::scan::EpochRow;

/// One validator's measurements for a single epoch, in the order the
/// snapshot artifact serializes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochStat {
  pub epoch: i64,
  pub score: i64,
  pub avg_position: f64,
  pub commission: i16,
  pub active_stake: f64,
  pub epoch_credits: i64,
  pub data_center_concentration: f64,
  pub can_halt_the_network_group: bool,
  pub stake_state: String,
  pub stake_state_reason: String,
  pub pct: f64,
  pub stake_conc: f64,
  pub adj_credits: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorRecord {
  pub validator_vote_address: String,
  pub keybase_id: Option<String>,
  pub validator_description: Option<String>,
  pub stats: Vec<EpochStat>,
}

/// The full ordered record sequence produced by one aggregation run.
/// Serializes as a plain JSON array.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ValidatorSnapshot(Vec<ValidatorRecord>);

impl ValidatorSnapshot {
  pub fn records(&self) -> &[ValidatorRecord] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// In-memory grouping of scanned rows by vote address. Purely an
/// accumulator: feed rows through [`observe`](ValidatorIndex::observe) (the
/// scan drives it as a fold) and finish with
/// [`into_snapshot`](ValidatorIndex::into_snapshot).
///
/// Record order is first-seen order, which under the epoch-descending scan
/// means a validator is positioned by the most recent epoch it appears in.
#[derive(Debug, Default)]
pub struct ValidatorIndex {
  positions: HashMap<String, usize>,
  records: Vec<ValidatorRecord>,
  duplicate_epochs: usize,
}

impl ValidatorIndex {
  pub fn new() -> Self {
    ValidatorIndex::default()
  }

  /// Append one scanned row to its validator's stat sequence, creating the
  /// record on first sight of the vote address.
  ///
  /// Rows repeating a (vote_address, epoch) pair are preserved as emitted
  /// and counted in [`duplicate_epochs`](ValidatorIndex::duplicate_epochs);
  /// the store contract is one row per validator per epoch, so a non-zero
  /// count is an upstream anomaly for the caller to report.
  pub fn observe(&mut self, row: EpochRow) {
    let position = match self.positions.get(&row.vote_address) {
      Some(&position) => position,
      None => {
        let position = self.records.len();
        self.positions.insert(row.vote_address.clone(), position);
        self.records.push(ValidatorRecord {
          validator_vote_address: row.vote_address.clone(),
          keybase_id: row.keybase_id.clone(),
          validator_description: row.name.clone(),
          stats: Vec::new(),
        });
        position
      }
    };

    let record = &mut self.records[position];
    // the scan is epoch-descending, so duplicate epochs land adjacent
    if record.stats.last().map(|s| s.epoch) == Some(row.epoch) {
      self.duplicate_epochs += 1;
    }
    record.stats.push(EpochStat {
      epoch: row.epoch,
      score: row.score,
      avg_position: row.avg_position,
      commission: row.commission,
      active_stake: row.active_stake,
      epoch_credits: row.epoch_credits,
      data_center_concentration: row.data_center_concentration,
      can_halt_the_network_group: row.can_halt_the_network_group,
      stake_state: row.stake_state,
      stake_state_reason: row.stake_state_reason,
      pct: row.pct,
      stake_conc: row.stake_conc,
      adj_credits: row.adj_credits,
    });
  }

  pub fn duplicate_epochs(&self) -> usize {
    self.duplicate_epochs
  }

  pub fn into_snapshot(self) -> ValidatorSnapshot {
    ValidatorSnapshot(self.records)
  }
}
