//! Trend extrapolation of an annual series, with optional prediction
//! intervals.

use std::collections::BTreeMap;

use fincast_core::{Error, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{series::TimeSeries, stats::LinearFit};

/// How years beyond the history are extrapolated.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TrendMethod {
  /// Least-squares line of value on year.
  #[default]
  Linear,
  /// Flat continuation of the last observed year.
  Last,
}

/// A point estimate with its interval. Bounds are NaN when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendEstimate {
  pub year:  i32,
  pub point: f64,
  pub lower: f64,
  pub upper: f64,
}

/// The annual history of one indicator, prepared for extrapolation.
struct Trend {
  annual:    BTreeMap<i32, f64>,
  last_year: i32,
  last:      f64,
  fit:       Option<LinearFit>,
}

impl Trend {
  /// `None` for an empty series.
  fn new(series: &TimeSeries) -> Option<Self> {
    let annual = series.annual();
    let (&last_year, &last) = annual.iter().next_back()?;
    let xs: Vec<f64> = annual.keys().map(|&y| f64::from(y)).collect();
    let ys: Vec<f64> = annual.values().copied().collect();
    let fit = LinearFit::fit(&xs, &ys);
    if let Some(f) = &fit {
      tracing::debug!(
        slope = f.slope,
        intercept = f.intercept,
        years = f.n,
        "fitted linear trend"
      );
    }
    Some(Self { annual, last_year, last, fit })
  }

  fn point(&self, year: i32, method: TrendMethod) -> f64 {
    if year <= self.last_year {
      // Observed years report the observation; gaps inside (or before) the
      // history take the last known value.
      return self.annual.get(&year).copied().unwrap_or(self.last);
    }
    match (method, &self.fit) {
      (TrendMethod::Linear, Some(fit)) => fit.predict(f64::from(year)),
      // A single year of history has no slope; continue it flat.
      (TrendMethod::Linear, None) | (TrendMethod::Last, _) => self.last,
    }
  }
}

/// Point forecasts for `target_years`, in the order given.
///
/// An empty series yields NaN for every year.
pub fn forecast_trend(
  series: &TimeSeries,
  target_years: &[i32],
  method: TrendMethod,
) -> Vec<(i32, f64)> {
  let trend = Trend::new(series);
  target_years
    .iter()
    .map(|&y| {
      let point = trend.as_ref().map_or(f64::NAN, |t| t.point(y, method));
      (y, point)
    })
    .collect()
}

/// Point forecasts with two-sided prediction intervals at `confidence`.
///
/// - Years up to the last observed year have zero-width bounds.
/// - Later years take the least-squares prediction interval, centred on the
///   point estimate of `method`; it widens with distance from the history.
/// - With fewer than two years of history the bounds are NaN. Two years are
///   not enough either: a line through two points fits them exactly, leaves
///   no residual degrees of freedom and has no spread to scale the
///   interval by, so later years need at least three years of history for
///   finite bounds.
///
/// Fails with [`Error::InvalidInput`] unless `0 < confidence < 1`.
pub fn forecast_trend_with_ci(
  series: &TimeSeries,
  target_years: &[i32],
  method: TrendMethod,
  confidence: f64,
) -> Result<Vec<TrendEstimate>> {
  if !(confidence > 0.0 && confidence < 1.0) {
    return Err(Error::InvalidInput(format!(
      "confidence must be strictly between 0 and 1, got {confidence}"
    )));
  }

  let trend = Trend::new(series);
  Ok(
    target_years
      .iter()
      .map(|&year| {
        let Some(trend) = &trend else {
          return TrendEstimate {
            year,
            point: f64::NAN,
            lower: f64::NAN,
            upper: f64::NAN,
          };
        };
        let point = trend.point(year, method);
        let (lower, upper) = match &trend.fit {
          None => (f64::NAN, f64::NAN),
          Some(_) if year <= trend.last_year => (point, point),
          Some(fit) => match fit.prediction_half_width(f64::from(year), confidence) {
            Some(half) => (point - half, point + half),
            None => (f64::NAN, f64::NAN),
          },
        };
        TrendEstimate { year, point, lower, upper }
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn series(points: &[(i32, f64)]) -> TimeSeries {
    TimeSeries::from_points(
      points
        .iter()
        .map(|&(y, v)| (NaiveDate::from_ymd_opt(y, 12, 31).unwrap(), v)),
    )
  }

  fn findex() -> TimeSeries {
    series(&[(2011, 14.0), (2014, 22.0), (2017, 35.0), (2021, 46.0), (2024, 49.0)])
  }

  #[test]
  fn empty_history_is_nan_everywhere() {
    let out = forecast_trend(&TimeSeries::default(), &[2025, 2026], TrendMethod::Linear);
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|(_, v)| v.is_nan()));

    let ci =
      forecast_trend_with_ci(&TimeSeries::default(), &[2025], TrendMethod::Linear, 0.95)
        .unwrap();
    assert!(ci[0].point.is_nan() && ci[0].lower.is_nan() && ci[0].upper.is_nan());
  }

  #[test]
  fn historical_years_return_observations_and_gaps_flat_fill() {
    let out = forecast_trend(&findex(), &[2014, 2015, 2024], TrendMethod::Linear);
    assert_eq!(out, vec![(2014, 22.0), (2015, 49.0), (2024, 49.0)]);
  }

  #[test]
  fn last_method_is_flat() {
    let out = forecast_trend(&findex(), &[2025, 2030], TrendMethod::Last);
    assert_eq!(out, vec![(2025, 49.0), (2030, 49.0)]);
  }

  #[test]
  fn linear_method_extrapolates_the_fit() {
    let s = series(&[(2020, 10.0), (2021, 12.0), (2022, 14.0)]);
    let out = forecast_trend(&s, &[2023, 2025], TrendMethod::Linear);
    assert!((out[0].1 - 16.0).abs() < 1e-9);
    assert!((out[1].1 - 20.0).abs() < 1e-9);
  }

  #[test]
  fn single_year_linear_continues_flat() {
    let s = series(&[(2020, 40.0)]);
    let out = forecast_trend(&s, &[2025], TrendMethod::Linear);
    assert_eq!(out, vec![(2025, 40.0)]);
  }

  #[test]
  fn same_year_observations_are_averaged_before_fitting() {
    let s = TimeSeries::from_points([
      (NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(), 8.0),
      (NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(), 12.0),
      (NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(), 12.0),
    ]);
    let out = forecast_trend(&s, &[2020, 2022], TrendMethod::Linear);
    assert_eq!(out[0], (2020, 10.0));
    assert!((out[1].1 - 14.0).abs() < 1e-9);
  }

  #[test]
  fn ci_bounds_zero_width_in_history_and_widen_after() {
    let out = forecast_trend_with_ci(
      &findex(),
      &[2021, 2025, 2026, 2027],
      TrendMethod::Linear,
      0.95,
    )
    .unwrap();

    assert_eq!(out[0].point, 46.0);
    assert_eq!(out[0].lower, 46.0);
    assert_eq!(out[0].upper, 46.0);

    let widths: Vec<f64> = out[1..].iter().map(|e| e.upper - e.lower).collect();
    assert!(widths[0] > 0.0);
    assert!(widths[1] > widths[0] && widths[2] > widths[1]);
    for e in &out[1..] {
      assert!(e.lower < e.point && e.point < e.upper);
    }
  }

  #[test]
  fn ci_bounds_nan_without_enough_history() {
    let one = series(&[(2021, 46.0)]);
    let out = forecast_trend_with_ci(&one, &[2021, 2025], TrendMethod::Linear, 0.95).unwrap();
    assert_eq!(out[1].point, 46.0);
    assert!(out.iter().all(|e| e.lower.is_nan() && e.upper.is_nan()));

    let two = series(&[(2017, 35.0), (2021, 46.0)]);
    let out = forecast_trend_with_ci(&two, &[2021, 2025], TrendMethod::Linear, 0.95).unwrap();
    assert_eq!((out[0].lower, out[0].upper), (46.0, 46.0));
    assert!(out[1].lower.is_nan());
  }

  #[test]
  fn ci_rejects_bad_confidence() {
    for c in [0.0, 1.0, -0.5, f64::NAN] {
      let err = forecast_trend_with_ci(&findex(), &[2025], TrendMethod::Linear, c).unwrap_err();
      assert!(matches!(err, Error::InvalidInput(_)));
    }
  }

  #[test]
  fn method_parses_from_text() {
    assert_eq!("linear".parse::<TrendMethod>().unwrap(), TrendMethod::Linear);
    assert_eq!("Last".parse::<TrendMethod>().unwrap(), TrendMethod::Last);
    assert!("growth".parse::<TrendMethod>().is_err());
  }
}
