//! Forecast defaults as they appear in configuration files.

use serde::{Deserialize, Serialize};

use crate::{
  forecast::{ForecastOptions, ScenarioMultipliers, YearBounds},
  trend::TrendMethod,
};

/// The `[forecast]` section shared by the server and the CLI config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastDefaults {
  pub min_year:     i32,
  pub max_year:     i32,
  pub trend_method: TrendMethod,
  pub confidence:   f64,
  pub optimistic:   f64,
  pub pessimistic:  f64,
  pub target_years: Vec<i32>,
}

impl Default for ForecastDefaults {
  fn default() -> Self {
    let options = ForecastOptions::default();
    Self {
      min_year:     options.year_bounds.min,
      max_year:     options.year_bounds.max,
      trend_method: options.trend_method,
      confidence:   options.confidence.unwrap_or(0.95),
      optimistic:   options.scenarios.optimistic,
      pessimistic:  options.scenarios.pessimistic,
      target_years: options.target_years,
    }
  }
}

impl ForecastDefaults {
  /// Options seeded from these defaults; callers override per request.
  pub fn options(&self) -> ForecastOptions {
    ForecastOptions {
      target_years: self.target_years.clone(),
      trend_method: self.trend_method,
      scenarios: ScenarioMultipliers {
        optimistic:  self.optimistic,
        pessimistic: self.pessimistic,
      },
      confidence: Some(self.confidence),
      year_bounds: YearBounds {
        min: self.min_year,
        max: self.max_year,
      },
      ..ForecastOptions::default()
    }
  }
}
