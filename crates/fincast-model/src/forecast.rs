//! Forecast composition: trend baseline, event adjustments, scenarios and
//! trend uncertainty, one row per target year.
//!
//! Two uncertainty axes are kept apart. `ci_lower`/`ci_upper` describe the
//! trend fit only; the scenario columns scale the event delta only and never
//! touch the trend baseline.

use fincast_core::{Error, RecordSet, Result};
use serde::{Deserialize, Serialize};

use crate::{
  effects,
  impact::{ImpactMatrix, build_impact_matrix},
  series::{SeriesFilter, TimeSeries, extract_series},
  trend::{TrendMethod, forecast_trend, forecast_trend_with_ci},
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Multipliers applied to the event delta for the outer scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMultipliers {
  pub optimistic:  f64,
  pub pessimistic: f64,
}

impl Default for ScenarioMultipliers {
  fn default() -> Self {
    Self {
      optimistic:  1.2,
      pessimistic: 0.6,
    }
  }
}

/// Inclusive range of acceptable target years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
  pub min: i32,
  pub max: i32,
}

impl Default for YearBounds {
  fn default() -> Self { Self { min: 1900, max: 2100 } }
}

impl YearBounds {
  pub fn contains(&self, year: i32) -> bool { (self.min..=self.max).contains(&year) }
}

/// Everything [`forecast_indicator`] needs besides the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOptions {
  pub target_years:       Vec<i32>,
  pub trend_method:       TrendMethod,
  pub apply_events:       bool,
  pub scenarios:          ScenarioMultipliers,
  /// Prediction-interval level; `None` leaves the CI columns empty.
  pub confidence:         Option<f64>,
  /// Impact estimates are percentage points (added) rather than percent
  /// changes (scaled).
  pub unit_is_percentage: bool,
  pub filter:             SeriesFilter,
  pub year_bounds:        YearBounds,
}

impl Default for ForecastOptions {
  fn default() -> Self {
    Self {
      target_years:       vec![2025, 2026, 2027],
      trend_method:       TrendMethod::default(),
      apply_events:       true,
      scenarios:          ScenarioMultipliers::default(),
      confidence:         Some(0.95),
      unit_is_percentage: true,
      filter:             SeriesFilter::default(),
      year_bounds:        YearBounds::default(),
    }
  }
}

impl ForecastOptions {
  fn validate(&self) -> Result<()> {
    if self.target_years.is_empty() {
      return Err(Error::InvalidInput(
        "target_years must be a non-empty list of years".into(),
      ));
    }
    let invalid: Vec<i32> = self
      .target_years
      .iter()
      .copied()
      .filter(|y| !self.year_bounds.contains(*y))
      .collect();
    if !invalid.is_empty() {
      return Err(Error::InvalidInput(format!(
        "target_years must lie within {}..={}; invalid: {invalid:?}",
        self.year_bounds.min, self.year_bounds.max
      )));
    }
    if let Some(c) = self.confidence
      && !(c > 0.0 && c < 1.0)
    {
      return Err(Error::InvalidInput(format!(
        "confidence must be strictly between 0 and 1, got {c}"
      )));
    }
    let ScenarioMultipliers { optimistic, pessimistic } = self.scenarios;
    if !optimistic.is_finite() || !pessimistic.is_finite() {
      return Err(Error::InvalidInput(format!(
        "scenario multipliers must be finite, got optimistic={optimistic}, \
         pessimistic={pessimistic}"
      )));
    }
    Ok(())
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One target year of a forecast. NaN marks an undefined value (no history);
/// it serialises as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
  pub year:                 i32,
  /// Trend only.
  pub value_baseline:       f64,
  /// Baseline plus the event effects landing this year.
  pub value_adjusted:       f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ci_lower:             Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ci_upper:             Option<f64>,
  pub scenario_optimistic:  f64,
  pub scenario_base:        f64,
  pub scenario_pessimistic: f64,
}

impl ForecastRow {
  /// Distance still to cover to reach `target` (positive means short of it).
  pub fn gap_to(&self, target: f64) -> f64 { target - self.value_adjusted }
}

/// Forecast rows for one indicator, in the order the years were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
  pub indicator_code: String,
  /// Indicator whose observations formed the history. Differs from
  /// `indicator_code` only when a fallback series was used.
  pub history_code:   String,
  /// Number of distinct observation dates in the history.
  pub history_points: usize,
  pub trend_method:   TrendMethod,
  pub rows:           Vec<ForecastRow>,
}

impl ForecastTable {
  pub fn row(&self, year: i32) -> Option<&ForecastRow> {
    self.rows.iter().find(|r| r.year == year)
  }
}

// ─── Composition ─────────────────────────────────────────────────────────────

/// Forecast `indicator_code` for `options.target_years`.
///
/// Fails with [`Error::InvalidInput`] when `records` is empty, the indicator
/// code is blank, or the options are out of range. An indicator without
/// history is not an error: its rows are NaN.
pub fn forecast_indicator(
  records: &RecordSet,
  indicator_code: &str,
  options: &ForecastOptions,
) -> Result<ForecastTable> {
  validate_request(records, indicator_code, options)?;
  let series = extract_series(records, indicator_code, &options.filter);
  let matrix = options.apply_events.then(|| build_impact_matrix(records));
  compose(indicator_code, indicator_code, &series, matrix.as_ref(), options)
}

fn validate_request(
  records: &RecordSet,
  indicator_code: &str,
  options: &ForecastOptions,
) -> Result<()> {
  if records.is_empty() {
    return Err(Error::InvalidInput(
      "records is empty; a forecast needs at least one record".into(),
    ));
  }
  if indicator_code.trim().is_empty() {
    return Err(Error::InvalidInput("indicator_code must not be blank".into()));
  }
  options.validate()
}

fn compose(
  indicator_code: &str,
  history_code: &str,
  series: &TimeSeries,
  matrix: Option<&ImpactMatrix>,
  options: &ForecastOptions,
) -> Result<ForecastTable> {
  let years = &options.target_years;

  let trend: Vec<(f64, Option<(f64, f64)>)> = match options.confidence {
    Some(c) => forecast_trend_with_ci(series, years, options.trend_method, c)?
      .into_iter()
      .map(|e| (e.point, Some((e.lower, e.upper))))
      .collect(),
    None => forecast_trend(series, years, options.trend_method)
      .into_iter()
      .map(|(_, p)| (p, None))
      .collect(),
  };

  let ScenarioMultipliers { optimistic, pessimistic } = options.scenarios;
  let rows = years
    .iter()
    .zip(trend)
    .map(|(&year, (baseline, ci))| {
      let delta = match matrix {
        Some(m) if options.unit_is_percentage => {
          effects::apply_event_impacts(0.0, year, m, indicator_code, true)
        }
        Some(m) => {
          effects::apply_event_impacts(baseline, year, m, indicator_code, false) - baseline
        }
        None => 0.0,
      };
      let adjusted = baseline + delta;
      ForecastRow {
        year,
        value_baseline: baseline,
        value_adjusted: adjusted,
        ci_lower: ci.map(|(lo, _)| lo),
        ci_upper: ci.map(|(_, hi)| hi),
        scenario_optimistic: baseline + optimistic * delta,
        scenario_base: adjusted,
        scenario_pessimistic: baseline + pessimistic * delta,
      }
    })
    .collect();

  Ok(ForecastTable {
    indicator_code: indicator_code.to_owned(),
    history_code: history_code.to_owned(),
    history_points: series.len(),
    trend_method: options.trend_method,
    rows,
  })
}

// ─── Access / usage pair ─────────────────────────────────────────────────────

/// Indicator codes for the paired access/usage forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessUsageCodes {
  pub access:         String,
  pub usage:          String,
  /// History used for usage when `usage` has no observations.
  pub usage_fallback: Option<String>,
}

impl Default for AccessUsageCodes {
  fn default() -> Self {
    Self {
      access:         "ACC_OWNERSHIP".into(),
      usage:          "USG_DIGITAL_PAY".into(),
      usage_fallback: Some("USG_ACTIVE_RATE".into()),
    }
  }
}

impl AccessUsageCodes {
  /// Replace the usage indicator. The default fallback series only stands
  /// in for the default usage indicator, so any other code drops it; set
  /// `usage_fallback` afterwards to give the new code one.
  pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
    self.usage = usage.into();
    if self.usage != Self::default().usage {
      self.usage_fallback = None;
    }
    self
  }
}

/// Forecast account ownership (national, all genders) and digital payment
/// adoption (national) together.
///
/// When the usage indicator has no history, the fallback indicator's history
/// is used instead; event effects are still those linked to the usage code.
/// `options.filter` is ignored in favour of the per-pillar filters.
pub fn forecast_access_usage(
  records: &RecordSet,
  codes: &AccessUsageCodes,
  options: &ForecastOptions,
) -> Result<(ForecastTable, ForecastTable)> {
  validate_request(records, &codes.access, options)?;
  validate_request(records, &codes.usage, options)?;

  let matrix = options.apply_events.then(|| build_impact_matrix(records));

  let access_hist = extract_series(records, &codes.access, &SeriesFilter::national_all());
  let access = compose(&codes.access, &codes.access, &access_hist, matrix.as_ref(), options)?;

  let mut usage_code = codes.usage.as_str();
  let mut usage_hist = extract_series(records, usage_code, &SeriesFilter::national());
  if usage_hist.is_empty()
    && let Some(fallback) = codes.usage_fallback.as_deref()
  {
    tracing::info!(
      usage = %codes.usage,
      fallback,
      "usage indicator has no history; using fallback series"
    );
    usage_hist = extract_series(records, fallback, &SeriesFilter::national());
    usage_code = fallback;
  }
  let usage = compose(&codes.usage, usage_code, &usage_hist, matrix.as_ref(), options)?;

  Ok((access, usage))
}
