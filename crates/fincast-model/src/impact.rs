//! Impact matrix: impact links joined to the events they belong to.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use fincast_core::{
  RecordSet,
  months,
  record::{Event, ImpactDirection},
};
use serde::{Deserialize, Serialize};

/// Column names of the impact matrix, in order. Stable regardless of input.
pub const IMPACT_MATRIX_COLUMNS: [&str; 6] = [
  "event_id",
  "event_date",
  "related_indicator",
  "impact_estimate",
  "lag_months",
  "impact_direction",
];

/// One usable (event, indicator) link with the event date resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRow {
  pub event_id:          String,
  pub event_date:        NaiveDate,
  pub related_indicator: String,
  /// Magnitude; `None` when the link carried no estimate (counts as zero).
  pub impact_estimate:   Option<f64>,
  pub lag_months:        u32,
  pub impact_direction:  ImpactDirection,
}

impl ImpactRow {
  /// `event_date + lag_months`; `None` only if out of chrono's range.
  pub fn effective_date(&self) -> Option<NaiveDate> {
    months::add_months(self.event_date, self.lag_months)
  }

  pub fn effective_year(&self) -> Option<i32> {
    self.effective_date().map(|d| d.year())
  }

  /// `+|estimate|` for increases, `-|estimate|` for decreases.
  pub fn signed_estimate(&self) -> f64 {
    self
      .impact_direction
      .signed(self.impact_estimate.unwrap_or(0.0))
  }
}

/// Flat table of resolved impact links. Derived on every call, never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactMatrix {
  rows: Vec<ImpactRow>,
}

impl ImpactMatrix {
  pub fn new(rows: Vec<ImpactRow>) -> Self { Self { rows } }

  pub fn columns() -> &'static [&'static str] { &IMPACT_MATRIX_COLUMNS }

  pub fn rows(&self) -> &[ImpactRow] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn for_indicator<'a>(
    &'a self,
    indicator_code: &'a str,
  ) -> impl Iterator<Item = &'a ImpactRow> + 'a {
    self
      .rows
      .iter()
      .filter(move |r| r.related_indicator == indicator_code)
  }
}

/// Join every impact link to its parent event.
///
/// Links whose parent is missing from `records`, or whose parent has no
/// usable date, are dropped with a warning: links may legitimately refer to
/// events outside the loaded window. Links with an empty indicator are
/// dropped too. With no events or no links the result is an empty matrix.
pub fn build_impact_matrix(records: &RecordSet) -> ImpactMatrix {
  let mut events: HashMap<&str, Vec<&Event>> = HashMap::new();
  for e in records.events() {
    events.entry(e.record_id.as_str()).or_default().push(e);
  }

  let mut rows = Vec::new();
  let mut orphaned = 0usize;
  let mut undated = 0usize;
  let mut unindexed = 0usize;

  for link in records.impact_links() {
    if link.related_indicator.trim().is_empty() {
      unindexed += 1;
      continue;
    }
    let Some(parents) = events.get(link.parent_id.as_str()) else {
      orphaned += 1;
      tracing::warn!(
        parent_id = %link.parent_id,
        indicator = %link.related_indicator,
        "impact link references no known event; dropped"
      );
      continue;
    };
    // A duplicated event id joins once per event row.
    for event in parents {
      let Some(event_date) = event.observation_date else {
        undated += 1;
        tracing::warn!(
          event_id = %event.record_id,
          "event has no usable date; its impact link is dropped"
        );
        continue;
      };
      rows.push(ImpactRow {
        event_id: event.record_id.clone(),
        event_date,
        related_indicator: link.related_indicator.clone(),
        impact_estimate: link.impact_estimate,
        lag_months: link.lag_months,
        impact_direction: link.impact_direction,
      });
    }
  }

  if unindexed > 0 {
    tracing::warn!(unindexed, "dropped impact links without an indicator");
  }
  tracing::debug!(rows = rows.len(), orphaned, undated, "built impact matrix");
  ImpactMatrix::new(rows)
}
