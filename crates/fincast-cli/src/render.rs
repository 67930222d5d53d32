//! Plain-text rendering of reports. Every function returns the full text so
//! the caller decides where it goes.

use std::{collections::BTreeMap, fmt::Write as _};

use fincast_model::{
  AssociationMatrix,
  ForecastTable,
  explore::{CoverageDiff, CoverageReport, ExplorationSummary, TimelineEntry},
  impact::ImpactRow,
};

/// `-` for undefined (NaN) values.
fn num(v: f64) -> String {
  if v.is_finite() { format!("{v:.2}") } else { "-".to_string() }
}

fn opt(v: Option<f64>) -> String { v.map_or_else(|| "-".to_string(), num) }

fn text(v: &Option<String>) -> &str { v.as_deref().unwrap_or("-") }

// ─── Forecasts ───────────────────────────────────────────────────────────────

/// `targets` maps years to target values; those years get a gap line.
pub fn forecast(table: &ForecastTable, targets: &BTreeMap<i32, f64>) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{} ({} trend, {} historical points{})",
    table.indicator_code,
    table.trend_method,
    table.history_points,
    if table.history_code != table.indicator_code {
      format!(" from {}", table.history_code)
    } else {
      String::new()
    }
  );
  let _ = writeln!(
    out,
    "{:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
    "year", "baseline", "adjusted", "ci_lo", "ci_hi", "pessim.", "base", "optim."
  );
  for r in &table.rows {
    let _ = writeln!(
      out,
      "{:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
      r.year,
      num(r.value_baseline),
      num(r.value_adjusted),
      opt(r.ci_lower),
      opt(r.ci_upper),
      num(r.scenario_pessimistic),
      num(r.scenario_base),
      num(r.scenario_optimistic),
    );
  }
  for r in &table.rows {
    if let Some(&t) = targets.get(&r.year) {
      let _ = writeln!(out, "target {}: {} (gap {})", r.year, num(t), num(r.gap_to(t)));
    }
  }
  out
}

// ─── Events and impacts ──────────────────────────────────────────────────────

pub fn events(entries: &[TimelineEntry]) -> String {
  let mut out = String::new();
  for e in entries {
    let date = e.date.map_or_else(|| "undated".to_string(), |d| d.to_string());
    let _ = writeln!(
      out,
      "{date:<10}  {:<12} {:<20} {} [{}]",
      e.record_id,
      text(&e.category),
      text(&e.name),
      text(&e.status),
    );
  }
  out
}

pub fn impacts(rows: &[ImpactRow]) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:<12} {:<10} {:<20} {:>8} {:>4} {:<10}",
    "event", "date", "indicator", "effect", "lag", "lands"
  );
  for r in rows {
    let lands = r
      .effective_date()
      .map_or_else(|| "-".to_string(), |d| d.to_string());
    let _ = writeln!(
      out,
      "{:<12} {:<10} {:<20} {:>8} {:>4} {:<10}",
      r.event_id,
      r.event_date,
      r.related_indicator,
      num(r.signed_estimate()),
      r.lag_months,
      lands,
    );
  }
  out
}

pub fn associations(grid: &AssociationMatrix) -> String {
  let mut out = String::new();
  let _ = write!(out, "{:<28}", "event");
  for code in &grid.indicators {
    let _ = write!(out, " {code:>16}");
  }
  out.push('\n');
  for row in &grid.rows {
    let _ = write!(out, "{:<28}", row.label);
    for cell in &row.effects {
      let _ = write!(out, " {:>16}", opt(*cell));
    }
    out.push('\n');
  }
  out
}

// ─── Overview ────────────────────────────────────────────────────────────────

pub fn summary(s: &ExplorationSummary) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "records by type:");
  for (kind, n) in &s.record_types {
    let _ = writeln!(out, "  {:<12} {n}", kind.to_string());
  }
  for (title, counts) in [
    ("pillar", &s.pillars),
    ("source type", &s.source_types),
    ("confidence", &s.confidence),
  ] {
    let _ = writeln!(out, "observations by {title}:");
    for (k, n) in counts {
      let _ = writeln!(out, "  {k:<12} {n}");
    }
  }
  if let (Some(first), Some(last)) = (s.first_observation, s.last_observation) {
    let _ = writeln!(out, "observation dates: {first} .. {last}");
  }
  let years: Vec<String> = s.years_present.iter().map(i32::to_string).collect();
  let _ = writeln!(out, "years present: {}", years.join(", "));
  let _ = writeln!(out, "indicators:");
  for i in &s.indicators {
    let span = match (i.first_date, i.last_date) {
      (Some(f), Some(l)) => format!("{f} .. {l}"),
      _ => "undated".to_string(),
    };
    let _ = writeln!(out, "  {:<24} {:>4}  {span}", i.indicator_code, i.observations);
  }
  out
}

pub fn coverage(report: &CoverageReport) -> String {
  let mut out = String::new();
  for (code, years) in &report.temporal_coverage {
    let years: Vec<String> = years.iter().map(i32::to_string).collect();
    let _ = writeln!(out, "{code:<24} {}", years.join(" "));
  }
  let links = &report.links;
  let _ = writeln!(
    out,
    "impact links: {} parent ids, {} events, valid: {}",
    links.parent_ids.len(),
    links.event_ids.len(),
    links.parent_id_links_valid,
  );
  if !links.orphan_parent_ids.is_empty() {
    let _ = writeln!(out, "orphan parent ids: {}", links.orphan_parent_ids.join(", "));
  }
  out
}

pub fn coverage_diff(diff: &CoverageDiff) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "records by type (before -> after):");
  let kinds = diff
    .record_types_before
    .keys()
    .chain(diff.record_types_after.keys())
    .collect::<std::collections::BTreeSet<_>>();
  for kind in kinds {
    let before = diff.record_types_before.get(kind).copied().unwrap_or(0);
    let after = diff.record_types_after.get(kind).copied().unwrap_or(0);
    let _ = writeln!(out, "  {:<12} {before} -> {after}", kind.to_string());
  }
  if !diff.indicators_added.is_empty() {
    let _ = writeln!(out, "indicators added: {}", diff.indicators_added.join(", "));
  }
  for (code, years) in &diff.years_added {
    let years: Vec<String> = years.iter().map(i32::to_string).collect();
    let _ = writeln!(out, "years added for {code}: {}", years.join(", "));
  }
  let _ = writeln!(out, "parent_id links valid: {}", diff.parent_id_links_valid);
  out
}
