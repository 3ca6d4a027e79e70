use std::collections::VecDeque;

use diesel::PgConnection;
use log::debug;

use crate::db;
use crate::error::SyncError;
use crate::models::ScoreRow;

/// A `scores` row that passed the required-field check: vote address and
/// epoch are guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochRow {
  pub vote_address: String,
  pub epoch: i64,
  pub keybase_id: Option<String>,
  pub name: Option<String>,
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

impl EpochRow {
  /// `position` is the 0-based offset of the row within the scan, used to
  /// locate the offending input when the row is malformed.
  fn try_from_raw(position: usize, raw: ScoreRow) -> Result<Self, SyncError> {
    let (vote_address, row_epoch) = match (raw.vote_address, raw.epoch) {
      (Some(vote), Some(e)) => (vote, e),
      (None, Some(raw_epoch)) => {
        return Err(SyncError::MalformedRow {
          position,
          reason: format!("missing vote_address (epoch {})", raw_epoch),
        })
      }
      (Some(vote), None) => {
        return Err(SyncError::MalformedRow {
          position,
          reason: format!("missing epoch (vote_address {})", vote),
        })
      }
      (None, None) => {
        return Err(SyncError::MalformedRow {
          position,
          reason: "missing vote_address and epoch".to_string(),
        })
      }
    };

    Ok(EpochRow {
      vote_address,
      epoch: row_epoch,
      keybase_id: raw.keybase_id,
      name: raw.name,
      score: raw.score,
      avg_position: raw.avg_position,
      commission: raw.commission,
      active_stake: raw.active_stake,
      epoch_credits: raw.epoch_credits,
      data_center_concentration: raw.data_center_concentration,
      can_halt_the_network_group: raw.can_halt_the_network_group,
      stake_state: raw.stake_state,
      stake_state_reason: raw.stake_state_reason,
      pct: raw.pct,
      stake_conc: raw.stake_conc,
      adj_credits: raw.adj_credits,
    })
  }
}

/// Lazy, single-pass scan of the full `scores` relation ordered by epoch
/// descending (row id as the stable tie-break). Rows are pulled from the
/// store one page at a time; each yielded row has been checked for the
/// required fields. The scanner is not restartable: once consumed, build a
/// new one.
pub struct EpochRowScanner<'a> {
  conn: &'a PgConnection,
  buf: VecDeque<ScoreRow>,
  fetched: i64,
  position: usize,
  exhausted: bool,
  failed: bool,
}

impl<'a> EpochRowScanner<'a> {
  pub fn new(conn: &'a PgConnection) -> Self {
    EpochRowScanner {
      conn,
      buf: VecDeque::new(),
      fetched: 0,
      position: 0,
      exhausted: false,
      failed: false,
    }
  }

  fn refill(&mut self) -> Result<(), SyncError> {
    let page = db::score_page(self.conn, self.fetched, db::SCAN_PAGE_SIZE)?;
    debug!(
      "scan: fetched page of {} rows at offset {}",
      page.len(),
      self.fetched
    );
    self.fetched += page.len() as i64;
    if (page.len() as i64) < db::SCAN_PAGE_SIZE {
      self.exhausted = true;
    }
    self.buf.extend(page);
    Ok(())
  }
}

impl<'a> Iterator for EpochRowScanner<'a> {
  type Item = Result<EpochRow, SyncError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed {
      return None;
    }
    if self.buf.is_empty() {
      if self.exhausted {
        return None;
      }
      if let Err(e) = self.refill() {
        self.failed = true;
        return Some(Err(e));
      }
    }
    let raw = match self.buf.pop_front() {
      Some(raw) => raw,
      None => return None,
    };
    let position = self.position;
    self.position += 1;
    Some(EpochRow::try_from_raw(position, raw))
  }
}
