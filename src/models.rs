use serde::{Deserialize, Serialize};

use crate::schema::scores2;

/// Raw row of the `scores` relation. `epoch` and `vote_address` are nullable
/// at the store level; the scanner refuses rows where either is missing.
#[derive(Debug, Clone, Queryable)]
pub struct ScoreRow {
  pub id: i64,
  pub epoch: Option<i64>,
  pub vote_address: Option<String>,
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

/// One externally computed scoring result for a single target epoch, as
/// emitted by the post-process step. Field names double as the csv header
/// and as the `scores2` column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Insertable)]
#[table_name = "scores2"]
pub struct PostProcessRow {
  pub epoch: i64,
  pub rank: i32,
  pub score: i64,
  pub name: String,
  pub credits_observed: i64,
  pub vote_address: String,
  pub commission: i16,
  pub average_position: f64,
  pub data_center_concentration: f64,
  pub avg_active_stake: f64,
  pub apy: Option<f64>,
  pub delinquent: bool,
  pub this_epoch_credits: i64,
  pub pct: f64,
  pub staked_amount: f64,
  pub should_have: f64,
  pub remove_level: i16,
  pub remove_level_reason: String,
  pub under_nakamoto_coefficient: bool,
  pub keybase_id: String,
  pub identity: String,
  pub stake_concentration: f64,
  pub base_score: i64,
}
