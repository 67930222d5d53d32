//! Handlers for series and forecast endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/series/{code}` | Optional `location`, `gender` |
//! | `GET`  | `/forecast/{code}` | See [`ForecastParams`] |
//! | `GET`  | `/access-usage` | [`ForecastParams`] plus `access`, `usage`, `usage_fallback` |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use fincast_core::{RecordSet, store::RecordStore};
use fincast_model::{
  AccessUsageCodes,
  ForecastDefaults,
  ForecastOptions,
  ForecastTable,
  SeriesFilter,
  TrendMethod,
  explore::target_value,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Series ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SeriesParams {
  pub location: Option<String>,
  pub gender:   Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesPoint {
  pub date:  NaiveDate,
  pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
  pub indicator_code: String,
  pub points:         Vec<SeriesPoint>,
  /// One value per year (mean of that year's points).
  pub annual:         BTreeMap<i32, f64>,
}

/// `GET /series/{code}[?location=...][&gender=...]`
pub async fn series<S>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
  Query(params): Query<SeriesParams>,
) -> Result<Json<SeriesResponse>, ApiError>
where
  S: RecordStore,
{
  let records = state.snapshot().await?;
  let filter = SeriesFilter {
    location: params.location,
    gender:   params.gender,
  };
  let series = fincast_model::extract_series(&records, &code, &filter);
  Ok(Json(SeriesResponse {
    points: series
      .points()
      .iter()
      .map(|&(date, value)| SeriesPoint { date, value })
      .collect(),
    annual: series.annual(),
    indicator_code: code,
  }))
}

// ─── Forecast ────────────────────────────────────────────────────────────────

fn yes() -> bool { true }

/// Query parameters shared by the forecast endpoints. Anything left out
/// falls back to the server's configured [`ForecastDefaults`].
#[derive(Debug, Deserialize)]
pub struct ForecastParams {
  /// Comma-separated target years, e.g. `2025,2026,2027`.
  pub years:      Option<String>,
  /// `linear` or `last`.
  pub method:     Option<String>,
  pub confidence: Option<f64>,
  /// `false` drops the trend interval columns.
  #[serde(default = "yes")]
  pub ci:         bool,
  /// `false` forecasts the trend alone.
  #[serde(default = "yes")]
  pub events:     bool,
  /// `false` treats impact estimates as percent changes of the baseline.
  #[serde(default = "yes")]
  pub percentage: bool,
  pub location:   Option<String>,
  pub gender:     Option<String>,
}

impl ForecastParams {
  fn options(&self, defaults: &ForecastDefaults) -> Result<ForecastOptions, ApiError> {
    let mut options = defaults.options();
    if let Some(years) = &self.years {
      options.target_years = parse_years(years)?;
    }
    if let Some(method) = &self.method {
      options.trend_method = method
        .parse::<TrendMethod>()
        .map_err(|_| ApiError::BadRequest(format!("unknown trend method {method:?}")))?;
    }
    if let Some(c) = self.confidence {
      options.confidence = Some(c);
    }
    if !self.ci {
      options.confidence = None;
    }
    options.apply_events = self.events;
    options.unit_is_percentage = self.percentage;
    options.filter = SeriesFilter {
      location: self.location.clone(),
      gender:   self.gender.clone(),
    };
    Ok(options)
  }
}

fn parse_years(s: &str) -> Result<Vec<i32>, ApiError> {
  s.split(',')
    .map(str::trim)
    .filter(|y| !y.is_empty())
    .map(|y| {
      y.parse::<i32>()
        .map_err(|_| ApiError::BadRequest(format!("year {y:?} is not an integer")))
    })
    .collect()
}

/// Target value and remaining gap for one forecast year.
#[derive(Debug, Serialize)]
pub struct TargetGap {
  pub target: f64,
  /// `target - value_adjusted`; positive means the forecast falls short.
  pub gap:    f64,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
  #[serde(flatten)]
  pub table:   ForecastTable,
  /// Keyed by year; only years with a target record appear.
  pub targets: BTreeMap<i32, TargetGap>,
}

impl ForecastResponse {
  fn new(records: &RecordSet, table: ForecastTable) -> Self {
    let targets = table
      .rows
      .iter()
      .filter_map(|row| {
        let target = target_value(records, &table.indicator_code, row.year)?;
        Some((row.year, TargetGap { target, gap: row.gap_to(target) }))
      })
      .collect();
    Self { table, targets }
  }
}

/// `GET /forecast/{code}[?years=...][&method=...][&confidence=...][&ci=...][&events=...]`
pub async fn forecast_one<S>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
  Query(params): Query<ForecastParams>,
) -> Result<Json<ForecastResponse>, ApiError>
where
  S: RecordStore,
{
  let options = params.options(&state.defaults)?;
  let records = state.snapshot().await?;
  let table = fincast_model::forecast_indicator(&records, &code, &options)?;
  Ok(Json(ForecastResponse::new(&records, table)))
}

// ─── Access / usage ──────────────────────────────────────────────────────────

/// Indicator overrides for `/access-usage`; read from the same query string
/// as its [`ForecastParams`]. A `usage` other than the default drops the
/// default fallback; an empty `usage_fallback` disables it outright.
#[derive(Debug, Deserialize, Default)]
pub struct AccessUsageParams {
  pub access:         Option<String>,
  pub usage:          Option<String>,
  pub usage_fallback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessUsageResponse {
  pub access: ForecastResponse,
  pub usage:  ForecastResponse,
}

/// `GET /access-usage[?access=...][&usage=...][&years=...]`
pub async fn access_usage<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<AccessUsageParams>,
  Query(forecast): Query<ForecastParams>,
) -> Result<Json<AccessUsageResponse>, ApiError>
where
  S: RecordStore,
{
  let options = forecast.options(&state.defaults)?;
  let mut codes = AccessUsageCodes::default();
  if let Some(a) = params.access {
    codes.access = a;
  }
  if let Some(u) = params.usage {
    codes = codes.with_usage(u);
  }
  if let Some(f) = params.usage_fallback {
    codes.usage_fallback = Some(f).filter(|f| !f.is_empty());
  }

  let records = state.snapshot().await?;
  let (access, usage) = fincast_model::forecast_access_usage(&records, &codes, &options)?;
  Ok(Json(AccessUsageResponse {
    access: ForecastResponse::new(&records, access),
    usage:  ForecastResponse::new(&records, usage),
  }))
}
