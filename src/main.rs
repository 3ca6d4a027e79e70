//! Batch pipeline around the validator scoring store: `snapshot` rebuilds
//! the per-validator history artifact from the `scores` relation, `merge`
//! atomically replaces one epoch's slice of `scores2` with a freshly
//! computed post-process batch. Run as a scheduled job, once per epoch.

#[macro_use]
extern crate diesel;

#[macro_use]
extern crate diesel_migrations;
embed_migrations!();

use std::path::Path;

use anyhow::Context;
use clap::{App, Arg, SubCommand};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{info, warn};

mod aggregate;
mod batch;
mod db;
mod error;
mod models;
mod scan;
mod schema;
mod snapshot;

use crate::error::SyncError;

type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

fn main() -> anyhow::Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let env_path = std::env::var("ENV_FILE").unwrap_or(String::from("./.env"));
  dotenv::from_path(env_path).ok();

  let matches = App::new("score-sync")
    .about("aggregates validator score history and merges post-process batches")
    .subcommand(
      SubCommand::with_name("snapshot")
        .about("rebuild the per-validator history snapshot from the scores relation")
        .arg(
          Arg::with_name("output")
            .long("output")
            .takes_value(true)
            .value_name("path")
            .default_value("scores-snapshot.json")
            .help("where to write the snapshot artifact"),
        ),
    )
    .subcommand(
      SubCommand::with_name("merge")
        .about("replace one epoch of scores2 with a post-process csv batch")
        .arg(
          Arg::with_name("scores-file")
            .long("scores-file")
            .takes_value(true)
            .value_name("path")
            .default_value("post-process.csv")
            .help("csv file emitted by the scoring step"),
        ),
    )
    .get_matches();

  // set up database connection pool
  let connspec = std::env::var("DATABASE_URL").context("DATABASE_URL env var missing")?;
  let manager = ConnectionManager::<PgConnection>::new(connspec);
  let pool: DbPool = r2d2::Pool::builder()
    .build(manager)
    .context("failed to create db pool")?;

  let conn = pool
    .get()
    .context("couldn't get db connection from pool")?;

  // run migrations
  embedded_migrations::run(&conn).context("failed to run migrations")?;

  match matches.subcommand() {
    ("snapshot", Some(sub)) => {
      run_snapshot(&conn, Path::new(sub.value_of("output").unwrap()))
    }
    ("merge", Some(sub)) => run_merge(&conn, Path::new(sub.value_of("scores-file").unwrap())),
    _ => anyhow::bail!("specify a subcommand: snapshot | merge"),
  }
}

fn run_snapshot(conn: &PgConnection, output: &Path) -> anyhow::Result<()> {
  info!("rebuilding validator snapshot from scores");

  let mut scanner = scan::EpochRowScanner::new(conn);
  let index = scanner.try_fold(aggregate::ValidatorIndex::new(), |mut index, row| {
    index.observe(row?);
    Ok::<_, SyncError>(index)
  })?;

  if index.duplicate_epochs() > 0 {
    warn!(
      "scores contains {} duplicate (vote_address, epoch) row(s); preserved as-is",
      index.duplicate_epochs()
    );
  }

  let snapshot = index.into_snapshot();
  info!("aggregated {} validators", snapshot.len());

  snapshot::persist(&snapshot, output)?;
  info!("snapshot written to {}", output.display());
  Ok(())
}

fn run_merge(conn: &PgConnection, scores_file: &Path) -> anyhow::Result<()> {
  info!("merging post-process batch from {}", scores_file.display());

  let file = std::fs::File::open(scores_file)
    .with_context(|| format!("couldn't open batch file {}", scores_file.display()))?;
  let rows = batch::read(file)?;
  let validated = batch::validate(rows)?;
  info!(
    "batch targets epoch {} with {} row(s)",
    validated.epoch,
    validated.rows.len()
  );

  let result =
    db::replace_epoch(conn, validated.epoch, &validated.rows).map_err(SyncError::from)?;
  info!(
    "merged epoch {}: deleted {} row(s), inserted {}",
    result.epoch, result.deleted, result.inserted
  );
  Ok(())
}
