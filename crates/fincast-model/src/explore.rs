//! Read-only summaries of a record set: what is in it, which years each
//! indicator covers, whether every impact link resolves, and where targets
//! sit.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use fincast_core::{RecordSet, RecordType};
use serde::{Deserialize, Serialize};

// ─── Indicators ──────────────────────────────────────────────────────────────

/// Distinct indicator codes with at least one observation, sorted.
pub fn indicator_codes(records: &RecordSet) -> Vec<String> {
  records
    .observations()
    .map(|o| o.indicator_code.clone())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// Observation coverage of a single indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCoverage {
  pub indicator_code: String,
  pub indicator:      Option<String>,
  pub pillar:         Option<String>,
  pub observations:   usize,
  pub first_date:     Option<NaiveDate>,
  pub last_date:      Option<NaiveDate>,
}

/// What a record set contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSummary {
  pub record_types:      BTreeMap<RecordType, usize>,
  /// Observation counts by pillar / source type / confidence; rows with the
  /// field empty are not counted.
  pub pillars:           BTreeMap<String, usize>,
  pub source_types:      BTreeMap<String, usize>,
  pub confidence:        BTreeMap<String, usize>,
  pub first_observation: Option<NaiveDate>,
  pub last_observation:  Option<NaiveDate>,
  pub years_present:     Vec<i32>,
  pub indicators:        Vec<IndicatorCoverage>,
}

pub fn explore(records: &RecordSet) -> ExplorationSummary {
  let mut summary = ExplorationSummary {
    record_types: records.count_by_type(),
    ..Default::default()
  };
  let mut years = BTreeSet::new();
  let mut by_code: BTreeMap<&str, IndicatorCoverage> = BTreeMap::new();

  for o in records.observations() {
    for (field, counts) in [
      (&o.pillar, &mut summary.pillars),
      (&o.source_type, &mut summary.source_types),
      (&o.confidence, &mut summary.confidence),
    ] {
      if let Some(v) = field {
        *counts.entry(v.clone()).or_insert(0) += 1;
      }
    }

    let cov = by_code
      .entry(o.indicator_code.as_str())
      .or_insert_with(|| IndicatorCoverage {
        indicator_code: o.indicator_code.clone(),
        indicator:      o.indicator.clone(),
        pillar:         o.pillar.clone(),
        observations:   0,
        first_date:     None,
        last_date:      None,
      });
    cov.observations += 1;

    if let Some(d) = o.observation_date {
      years.insert(d.year());
      cov.first_date = Some(cov.first_date.map_or(d, |f| f.min(d)));
      cov.last_date = Some(cov.last_date.map_or(d, |l| l.max(d)));
      summary.first_observation = Some(summary.first_observation.map_or(d, |f| f.min(d)));
      summary.last_observation = Some(summary.last_observation.map_or(d, |l| l.max(d)));
    }
  }

  summary.years_present = years.into_iter().collect();
  summary.indicators = by_code.into_values().collect();
  summary
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub record_id: String,
  pub date:      Option<NaiveDate>,
  pub category:  Option<String>,
  pub name:      Option<String>,
  pub status:    Option<String>,
}

/// Events in date order; undated events come last, in input order.
pub fn events_timeline(records: &RecordSet) -> Vec<TimelineEntry> {
  let mut entries: Vec<TimelineEntry> = records
    .events()
    .map(|e| TimelineEntry {
      record_id: e.record_id.clone(),
      date:      e.observation_date,
      category:  e.category.clone(),
      name:      e.indicator.clone(),
      status:    e.value_text.clone(),
    })
    .collect();
  entries.sort_by_key(|e| (e.date.is_none(), e.date));
  entries
}

/// Display labels (event names) keyed by event id, for the association grid.
pub fn event_labels(records: &RecordSet) -> std::collections::HashMap<String, String> {
  records
    .events()
    .filter_map(|e| Some((e.record_id.clone(), e.indicator.clone()?)))
    .collect()
}

// ─── Targets ─────────────────────────────────────────────────────────────────

/// The target value set for `indicator_code` in `year`, if any. With several
/// targets in the same year the first one wins.
pub fn target_value(records: &RecordSet, indicator_code: &str, year: i32) -> Option<f64> {
  records
    .targets()
    .find(|t| t.indicator_code == indicator_code && t.observation_date.year() == year)
    .map(|t| t.value_numeric)
}

// ─── Coverage and link integrity ─────────────────────────────────────────────

/// Whether every impact link points at a known event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkIntegrity {
  pub event_ids:             Vec<String>,
  pub parent_ids:            Vec<String>,
  /// Parent ids that match no event.
  pub orphan_parent_ids:     Vec<String>,
  pub parent_id_links_valid: bool,
}

/// Per-indicator temporal coverage plus link integrity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
  pub record_types:      BTreeMap<RecordType, usize>,
  /// Years with at least one dated observation, per indicator.
  pub temporal_coverage: BTreeMap<String, Vec<i32>>,
  pub links:             LinkIntegrity,
}

pub fn coverage_report(records: &RecordSet) -> CoverageReport {
  let mut coverage: BTreeMap<String, BTreeSet<i32>> = BTreeMap::new();
  for o in records.observations() {
    if let Some(d) = o.observation_date {
      coverage
        .entry(o.indicator_code.clone())
        .or_default()
        .insert(d.year());
    }
  }

  let event_ids: BTreeSet<String> = records.events().map(|e| e.record_id.clone()).collect();
  let parent_ids: BTreeSet<String> =
    records.impact_links().map(|l| l.parent_id.clone()).collect();
  let orphan_parent_ids: Vec<String> = parent_ids.difference(&event_ids).cloned().collect();

  CoverageReport {
    record_types:      records.count_by_type(),
    temporal_coverage: coverage
      .into_iter()
      .map(|(code, years)| (code, years.into_iter().collect()))
      .collect(),
    links:             LinkIntegrity {
      parent_id_links_valid: orphan_parent_ids.is_empty(),
      event_ids: event_ids.into_iter().collect(),
      parent_ids: parent_ids.into_iter().collect(),
      orphan_parent_ids,
    },
  }
}

/// What changed between two record sets (e.g. before and after merging an
/// extra source).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageDiff {
  pub record_types_before:   BTreeMap<RecordType, usize>,
  pub record_types_after:    BTreeMap<RecordType, usize>,
  /// Indicators observed after but not before.
  pub indicators_added:      Vec<String>,
  /// For indicators observed in both: years covered only after.
  pub years_added:           BTreeMap<String, Vec<i32>>,
  /// Link integrity of the `after` set.
  pub parent_id_links_valid: bool,
}

pub fn compare_coverage(before: &RecordSet, after: &RecordSet) -> CoverageDiff {
  let before_cov = coverage_report(before);
  let after_cov = coverage_report(after);

  let mut indicators_added = Vec::new();
  let mut years_added = BTreeMap::new();
  for (code, years) in &after_cov.temporal_coverage {
    match before_cov.temporal_coverage.get(code) {
      None => indicators_added.push(code.clone()),
      Some(old) => {
        let new: Vec<i32> = years.iter().copied().filter(|y| !old.contains(y)).collect();
        if !new.is_empty() {
          years_added.insert(code.clone(), new);
        }
      }
    }
  }

  CoverageDiff {
    record_types_before: before_cov.record_types,
    record_types_after: after_cov.record_types,
    indicators_added,
    years_added,
    parent_id_links_valid: after_cov.links.parent_id_links_valid,
  }
}
