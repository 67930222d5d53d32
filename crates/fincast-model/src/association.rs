//! Event × indicator association grid, pivoted from the impact matrix.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::impact::ImpactMatrix;

/// How multiple links between the same (event, indicator) pair combine.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Aggregate {
  #[default]
  Sum,
  Max,
}

/// A row of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRow {
  pub event_id: String,
  /// Display label; the event id when no label was supplied.
  pub label:    String,
  /// One cell per column of [`AssociationMatrix::indicators`]; `None` where
  /// the event has no link to that indicator.
  pub effects:  Vec<Option<f64>>,
}

/// Events as rows, indicators as columns, signed effects as cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationMatrix {
  pub indicators: Vec<String>,
  pub rows:       Vec<AssociationRow>,
}

impl AssociationMatrix {
  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// The cell for (`event_id`, `indicator`); `None` for "no data".
  pub fn get(&self, event_id: &str, indicator: &str) -> Option<f64> {
    let col = self.indicators.iter().position(|i| i == indicator)?;
    self
      .rows
      .iter()
      .find(|r| r.event_id == event_id)
      .and_then(|r| r.effects[col])
  }
}

/// Pivot `matrix` into an event × indicator grid of signed effects.
///
/// - `labels` maps event ids to display labels.
/// - `indicator_codes` fixes the column set and order; columns for codes
///   with no links are all `None`, links to codes not listed are left out.
///   Without it the columns are every linked indicator, sorted.
/// - Rows are sorted by label, then event id.
pub fn build_event_indicator_association_matrix(
  matrix: &ImpactMatrix,
  labels: Option<&HashMap<String, String>>,
  indicator_codes: Option<&[String]>,
  aggregate: Aggregate,
) -> AssociationMatrix {
  let indicators: Vec<String> = match indicator_codes {
    Some(codes) => codes.to_vec(),
    None => matrix
      .rows()
      .iter()
      .map(|r| r.related_indicator.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect(),
  };
  let column: HashMap<&str, usize> = indicators
    .iter()
    .enumerate()
    .map(|(i, c)| (c.as_str(), i))
    .collect();

  let mut cells: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
  for row in matrix.rows() {
    let Some(&col) = column.get(row.related_indicator.as_str()) else {
      continue;
    };
    let effects = cells
      .entry(row.event_id.as_str())
      .or_insert_with(|| vec![None; indicators.len()]);
    let value = row.signed_estimate();
    effects[col] = Some(match (effects[col], aggregate) {
      (None, _) => value,
      (Some(acc), Aggregate::Sum) => acc + value,
      (Some(acc), Aggregate::Max) => acc.max(value),
    });
  }

  let mut rows: Vec<AssociationRow> = cells
    .into_iter()
    .map(|(event_id, effects)| AssociationRow {
      event_id: event_id.to_owned(),
      label: labels
        .and_then(|l| l.get(event_id))
        .cloned()
        .unwrap_or_else(|| event_id.to_owned()),
      effects,
    })
    .collect();
  rows.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.event_id.cmp(&b.event_id)));

  AssociationMatrix { indicators, rows }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use fincast_core::record::ImpactDirection;

  use super::*;
  use crate::impact::ImpactRow;

  fn row(event: &str, indicator: &str, est: f64, dir: ImpactDirection) -> ImpactRow {
    ImpactRow {
      event_id:          event.into(),
      event_date:        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
      related_indicator: indicator.into(),
      impact_estimate:   Some(est),
      lag_months:        0,
      impact_direction:  dir,
    }
  }

  fn sample() -> ImpactMatrix {
    ImpactMatrix::new(vec![
      row("e1", "ACC", 10.0, ImpactDirection::Increase),
      row("e1", "USG", 5.0, ImpactDirection::Increase),
      row("e2", "ACC", 2.0, ImpactDirection::Decrease),
    ])
  }

  #[test]
  fn pivots_signed_effects() {
    let grid = build_event_indicator_association_matrix(&sample(), None, None, Aggregate::Sum);
    assert_eq!(grid.indicators, vec!["ACC", "USG"]);
    assert_eq!(grid.get("e1", "ACC"), Some(10.0));
    assert_eq!(grid.get("e1", "USG"), Some(5.0));
    assert_eq!(grid.get("e2", "ACC"), Some(-2.0));
    assert_eq!(grid.get("e2", "USG"), None);
  }

  #[test]
  fn caller_columns_fix_order_and_mark_missing() {
    let cols = vec!["USG".to_string(), "ACC".to_string(), "GAP".to_string()];
    let grid =
      build_event_indicator_association_matrix(&sample(), None, Some(&cols), Aggregate::Sum);
    assert_eq!(grid.indicators, cols);
    let e1 = grid.rows.iter().find(|r| r.event_id == "e1").unwrap();
    assert_eq!(e1.effects, vec![Some(5.0), Some(10.0), None]);
  }

  #[test]
  fn duplicate_pairs_aggregate() {
    let m = ImpactMatrix::new(vec![
      row("e1", "ACC", 4.0, ImpactDirection::Increase),
      row("e1", "ACC", 6.0, ImpactDirection::Increase),
      row("e1", "ACC", 3.0, ImpactDirection::Decrease),
    ]);
    let sum = build_event_indicator_association_matrix(&m, None, None, Aggregate::Sum);
    assert_eq!(sum.get("e1", "ACC"), Some(7.0));
    let max = build_event_indicator_association_matrix(&m, None, None, Aggregate::Max);
    assert_eq!(max.get("e1", "ACC"), Some(6.0));
  }

  #[test]
  fn labels_replace_ids_and_order_rows() {
    let labels: HashMap<String, String> = [
      ("e1".to_string(), "Telebirr launch".to_string()),
      ("e2".to_string(), "Fayda digital ID".to_string()),
    ]
    .into();
    let grid =
      build_event_indicator_association_matrix(&sample(), Some(&labels), None, Aggregate::Sum);
    let order: Vec<_> = grid.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(order, vec!["Fayda digital ID", "Telebirr launch"]);
  }

  #[test]
  fn aggregate_parses_case_insensitively() {
    assert_eq!("MAX".parse::<Aggregate>().unwrap(), Aggregate::Max);
    assert!("mean".parse::<Aggregate>().is_err());
  }
}
