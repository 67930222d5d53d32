//! Event effect application.
//!
//! An effect only counts in the calendar year it lands in
//! (`event_date + lag_months`). Effects landing in the same year are summed;
//! nothing carries forward into later years and nothing compounds.

use crate::impact::ImpactMatrix;

/// Signed sum of the estimates of every `indicator_code` link whose
/// effective date falls in `year`.
pub fn event_delta(year: i32, matrix: &ImpactMatrix, indicator_code: &str) -> f64 {
  matrix
    .for_indicator(indicator_code)
    .filter(|row| row.effective_year() == Some(year))
    .map(|row| row.signed_estimate())
    .sum()
}

/// Adjust `base_value` by the event effects landing in `year`.
///
/// With `unit_is_percentage` the summed delta is in percentage points and is
/// added; otherwise it is a percent change: `base * (1 + delta / 100)`.
/// A non-finite base is returned unchanged.
pub fn apply_event_impacts(
  base_value: f64,
  year: i32,
  matrix: &ImpactMatrix,
  indicator_code: &str,
  unit_is_percentage: bool,
) -> f64 {
  if !base_value.is_finite() {
    tracing::debug!(
      indicator = indicator_code,
      year,
      "base value is not finite; event effects not applied"
    );
    return base_value;
  }

  let delta = event_delta(year, matrix, indicator_code);
  if delta == 0.0 {
    return base_value;
  }

  if unit_is_percentage {
    base_value + delta
  } else {
    base_value * (1.0 + delta / 100.0)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use fincast_core::record::ImpactDirection;

  use super::*;
  use crate::impact::ImpactRow;

  fn row(
    indicator: &str,
    (y, m, d): (i32, u32, u32),
    lag: u32,
    est: f64,
    dir: ImpactDirection,
  ) -> ImpactRow {
    ImpactRow {
      event_id:          format!("EVT_{y}_{m}"),
      event_date:        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
      related_indicator: indicator.into(),
      impact_estimate:   Some(est),
      lag_months:        lag,
      impact_direction:  dir,
    }
  }

  fn matrix(rows: Vec<ImpactRow>) -> ImpactMatrix { ImpactMatrix::new(rows) }

  #[test]
  fn increase_adds_in_landing_year_only() {
    let m = matrix(vec![row(
      "ACC_OWNERSHIP",
      (2022, 1, 1),
      0,
      3.0,
      ImpactDirection::Increase,
    )]);
    assert_eq!(apply_event_impacts(50.0, 2022, &m, "ACC_OWNERSHIP", true), 53.0);
    assert_eq!(apply_event_impacts(50.0, 2023, &m, "ACC_OWNERSHIP", true), 50.0);
  }

  #[test]
  fn decrease_subtracts() {
    let m = matrix(vec![row(
      "ACC_OWNERSHIP",
      (2022, 1, 1),
      0,
      2.0,
      ImpactDirection::Decrease,
    )]);
    assert_eq!(apply_event_impacts(50.0, 2022, &m, "ACC_OWNERSHIP", true), 48.0);
  }

  #[test]
  fn same_year_effects_are_additive() {
    let m = matrix(vec![
      row("ACC_OWNERSHIP", (2022, 2, 1), 0, 3.0, ImpactDirection::Increase),
      row("ACC_OWNERSHIP", (2021, 11, 1), 3, 2.0, ImpactDirection::Decrease),
    ]);
    assert_eq!(event_delta(2022, &m, "ACC_OWNERSHIP"), 1.0);
    assert_eq!(apply_event_impacts(50.0, 2022, &m, "ACC_OWNERSHIP", true), 51.0);
  }

  #[test]
  fn lag_moves_effect_to_later_year() {
    let m = matrix(vec![row(
      "USG_DIGITAL_PAY",
      (2024, 6, 1),
      12,
      5.0,
      ImpactDirection::Increase,
    )]);
    assert_eq!(apply_event_impacts(30.0, 2024, &m, "USG_DIGITAL_PAY", true), 30.0);
    assert_eq!(apply_event_impacts(30.0, 2025, &m, "USG_DIGITAL_PAY", true), 35.0);
    assert_eq!(apply_event_impacts(30.0, 2026, &m, "USG_DIGITAL_PAY", true), 30.0);
  }

  #[test]
  fn other_indicators_are_ignored() {
    let m = matrix(vec![row(
      "OTHER_IND",
      (2022, 1, 1),
      0,
      5.0,
      ImpactDirection::Increase,
    )]);
    assert_eq!(apply_event_impacts(50.0, 2022, &m, "ACC_OWNERSHIP", true), 50.0);
    assert_eq!(apply_event_impacts(50.0, 2022, &ImpactMatrix::default(), "ACC_OWNERSHIP", true), 50.0);
  }

  #[test]
  fn non_percentage_units_scale_the_base() {
    let m = matrix(vec![row(
      "USG_AGENT_DENSITY",
      (2022, 1, 1),
      0,
      10.0,
      ImpactDirection::Increase,
    )]);
    let out = apply_event_impacts(200.0, 2022, &m, "USG_AGENT_DENSITY", false);
    assert!((out - 220.0).abs() < 1e-9);
  }

  #[test]
  fn non_finite_base_is_returned_as_is() {
    let m = matrix(vec![row(
      "ACC_OWNERSHIP",
      (2025, 1, 1),
      0,
      5.0,
      ImpactDirection::Increase,
    )]);
    assert!(apply_event_impacts(f64::NAN, 2025, &m, "ACC_OWNERSHIP", true).is_nan());
    assert_eq!(
      apply_event_impacts(f64::INFINITY, 2025, &m, "ACC_OWNERSHIP", true),
      f64::INFINITY
    );
  }
}
