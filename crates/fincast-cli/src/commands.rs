//! One function per subcommand. Each reads a snapshot of the store, runs the
//! model over it and prints a text report, or JSON with `--json`.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use fincast_core::{Record, RecordSet, store::RecordStore as _};
use fincast_model::{
  Aggregate,
  ForecastOptions,
  ForecastTable,
  SeriesFilter,
  TrendMethod,
  build_event_indicator_association_matrix,
  build_impact_matrix,
  explore::{self, target_value},
};
use fincast_store_sqlite::SqliteStore;
use serde::Serialize;

use crate::{config::ConfigFile, render};

pub struct Context {
  pub store:  SqliteStore,
  pub config: ConfigFile,
  pub json:   bool,
}

impl Context {
  async fn snapshot(&self) -> Result<RecordSet> {
    self
      .store
      .snapshot()
      .await
      .context("failed to read records from the store")
  }

  fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if self.json {
      println!("{}", serde_json::to_string_pretty(value)?);
    } else {
      print!("{}", text(value));
    }
    Ok(())
  }
}

/// Parse a unified-schema file, logging and skipping rows that fail.
/// Returns the good records and the number rejected.
async fn read_records(path: &Path) -> Result<(Vec<Record>, usize)> {
  let input = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read {}", path.display()))?;

  let mut records = Vec::new();
  let mut rejected = 0;
  for result in fincast_ingest::parse_many(&input) {
    match result {
      Ok(r) => records.push(r),
      Err(e) => {
        rejected += 1;
        tracing::warn!(file = %path.display(), "skipping row: {e}");
      }
    }
  }
  Ok((records, rejected))
}

// ─── Import / export ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ImportSummary {
  file:     PathBuf,
  inserted: usize,
  rejected: usize,
}

pub async fn import(ctx: &Context, files: &[PathBuf]) -> Result<()> {
  let mut summaries = Vec::new();
  for path in files {
    let (records, rejected) = read_records(path).await?;
    let inserted = ctx
      .store
      .insert_records(records)
      .await
      .context("failed to store imported records")?;
    tracing::info!(inserted, rejected, file = %path.display(), "imported records");
    summaries.push(ImportSummary {
      file: path.clone(),
      inserted,
      rejected,
    });
  }
  ctx.emit(&summaries, |s| {
    s.iter()
      .map(|s| {
        format!(
          "{}: {} inserted, {} rejected\n",
          s.file.display(),
          s.inserted,
          s.rejected
        )
      })
      .collect()
  })
}

/// Write the whole store back out as unified-schema rows.
pub async fn export(ctx: &Context, out: Option<&Path>) -> Result<()> {
  let records = ctx.snapshot().await?;
  let json = fincast_ingest::to_json_string(records.records())
    .context("failed to serialise records")?;
  match out {
    Some(path) => {
      tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
      tracing::info!(records = records.len(), file = %path.display(), "exported records");
    }
    None => println!("{json}"),
  }
  Ok(())
}

// ─── Overview ────────────────────────────────────────────────────────────────

pub async fn explore(ctx: &Context) -> Result<()> {
  let records = ctx.snapshot().await?;
  ctx.emit(&explore::explore(&records), render::summary)
}

pub async fn indicators(ctx: &Context) -> Result<()> {
  let records = ctx.snapshot().await?;
  ctx.emit(&explore::indicator_codes(&records), |codes| {
    codes.iter().map(|c| format!("{c}\n")).collect()
  })
}

pub async fn events(ctx: &Context) -> Result<()> {
  let records = ctx.snapshot().await?;
  ctx.emit(&explore::events_timeline(&records), |e| render::events(e))
}

/// Report coverage and link integrity; with `baseline`, report what the
/// store adds over that file. Fails when any impact link names a missing
/// event.
pub async fn verify(ctx: &Context, baseline: Option<&Path>) -> Result<()> {
  let records = ctx.snapshot().await?;
  let report = explore::coverage_report(&records);
  match baseline {
    Some(path) => {
      let (before, _) = read_records(path).await?;
      let diff = explore::compare_coverage(&RecordSet::new(before), &records);
      ctx.emit(&diff, render::coverage_diff)?;
    }
    None => ctx.emit(&report, render::coverage)?,
  }

  if !report.links.parent_id_links_valid {
    bail!(
      "impact links reference missing events: {}",
      report.links.orphan_parent_ids.join(", ")
    );
  }
  Ok(())
}

// ─── Forecasts ───────────────────────────────────────────────────────────────

/// Forecast flags shared by `forecast` and `access-usage`. Anything left out
/// falls back to the config file, then the built-in defaults.
#[derive(Debug, Args)]
pub struct ForecastArgs {
  /// Target years, comma-separated.
  #[arg(long, value_delimiter = ',', num_args = 1..)]
  years: Vec<i32>,

  /// Trend method: `linear` or `last`.
  #[arg(long)]
  method: Option<TrendMethod>,

  /// Prediction-interval level, strictly between 0 and 1.
  #[arg(long)]
  confidence: Option<f64>,

  /// Leave out the trend interval columns.
  #[arg(long)]
  no_ci: bool,

  /// Forecast the trend alone, ignoring events.
  #[arg(long)]
  no_events: bool,

  /// Treat impact estimates as percent changes of the baseline.
  #[arg(long)]
  percent_change: bool,

  #[arg(long)]
  location: Option<String>,

  #[arg(long)]
  gender: Option<String>,
}

impl ForecastArgs {
  fn options(&self, config: &ConfigFile) -> ForecastOptions {
    let mut options = config.forecast.options();
    if !self.years.is_empty() {
      options.target_years = self.years.clone();
    }
    if let Some(method) = self.method {
      options.trend_method = method;
    }
    if let Some(c) = self.confidence {
      options.confidence = Some(c);
    }
    if self.no_ci {
      options.confidence = None;
    }
    options.apply_events = !self.no_events;
    options.unit_is_percentage = !self.percent_change;
    options.filter = SeriesFilter {
      location: self.location.clone(),
      gender:   self.gender.clone(),
    };
    options
  }
}

#[derive(Debug, Serialize)]
struct ForecastReport {
  #[serde(flatten)]
  table:   ForecastTable,
  /// Target values by year, for the years that have one.
  targets: BTreeMap<i32, f64>,
}

impl ForecastReport {
  fn new(records: &RecordSet, table: ForecastTable) -> Self {
    let targets = table
      .rows
      .iter()
      .filter_map(|r| Some((r.year, target_value(records, &table.indicator_code, r.year)?)))
      .collect();
    Self { table, targets }
  }

  fn render(&self) -> String { render::forecast(&self.table, &self.targets) }
}

pub async fn forecast(ctx: &Context, code: &str, args: &ForecastArgs) -> Result<()> {
  let records = ctx.snapshot().await?;
  let table = fincast_model::forecast_indicator(&records, code, &args.options(&ctx.config))?;
  ctx.emit(&ForecastReport::new(&records, table), ForecastReport::render)
}

pub async fn access_usage(ctx: &Context, args: &ForecastArgs) -> Result<()> {
  let records = ctx.snapshot().await?;
  let codes = ctx.config.access_usage_codes();
  let (access, usage) =
    fincast_model::forecast_access_usage(&records, &codes, &args.options(&ctx.config))?;
  let pair = [
    ForecastReport::new(&records, access),
    ForecastReport::new(&records, usage),
  ];
  ctx.emit(&pair, |pair| {
    pair
      .iter()
      .map(ForecastReport::render)
      .collect::<Vec<_>>()
      .join("\n")
  })
}

// ─── Impacts ─────────────────────────────────────────────────────────────────

pub async fn impacts(ctx: &Context, indicator: Option<&str>) -> Result<()> {
  let records = ctx.snapshot().await?;
  let matrix = build_impact_matrix(&records);
  let rows: Vec<_> = match indicator {
    Some(code) => matrix.for_indicator(code).cloned().collect(),
    None => matrix.rows().to_vec(),
  };
  ctx.emit(&rows, |r| render::impacts(r))
}

pub async fn associations(
  ctx: &Context,
  indicators: &[String],
  aggregate: Aggregate,
) -> Result<()> {
  let records = ctx.snapshot().await?;
  let labels = explore::event_labels(&records);
  let columns = (!indicators.is_empty()).then_some(indicators);
  let grid = build_event_indicator_association_matrix(
    &build_impact_matrix(&records),
    Some(&labels),
    columns,
    aggregate,
  );
  ctx.emit(&grid, render::associations)
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser)]
  struct Harness {
    #[command(flatten)]
    args: ForecastArgs,
  }

  fn parse(argv: &[&str]) -> ForecastOptions {
    let h = Harness::parse_from(std::iter::once("fincast").chain(argv.iter().copied()));
    h.args.options(&ConfigFile::default())
  }

  #[test]
  fn no_flags_use_configured_defaults() {
    assert_eq!(parse(&[]), ConfigFile::default().forecast.options());
  }

  #[test]
  fn flags_override_defaults() {
    let o = parse(&[
      "--years",
      "2030,2026",
      "--method",
      "last",
      "--no-ci",
      "--percent-change",
      "--gender",
      "female",
    ]);
    assert_eq!(o.target_years, vec![2030, 2026]);
    assert_eq!(o.trend_method, TrendMethod::Last);
    assert_eq!(o.confidence, None);
    assert!(!o.unit_is_percentage);
    assert!(o.apply_events);
    assert_eq!(o.filter.gender.as_deref(), Some("female"));
  }

  #[test]
  fn file_defaults_apply_under_flags() {
    let config: ConfigFile = toml::from_str("[forecast]\nconfidence = 0.8\n").unwrap();
    let h = Harness::parse_from(["fincast", "--no-events"]);
    let o = h.args.options(&config);
    assert_eq!(o.confidence, Some(0.8));
    assert!(!o.apply_events);
  }
}
