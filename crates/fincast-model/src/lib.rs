//! Forecasting over a snapshot of unified-schema records.
//!
//! Everything here is a pure function of a [`fincast_core::RecordSet`]:
//! series extraction, the impact matrix, event effects, trend extrapolation
//! and the composed forecast table. Nothing is cached between calls.

pub mod association;
pub mod defaults;
pub mod effects;
pub mod explore;
pub mod forecast;
pub mod impact;
pub mod series;
pub mod stats;
pub mod trend;

pub use association::{Aggregate, AssociationMatrix, build_event_indicator_association_matrix};
pub use defaults::ForecastDefaults;
pub use effects::apply_event_impacts;
pub use forecast::{
  AccessUsageCodes,
  ForecastOptions,
  ForecastRow,
  ForecastTable,
  forecast_access_usage,
  forecast_indicator,
};
pub use impact::{ImpactMatrix, build_impact_matrix};
pub use series::{SeriesFilter, TimeSeries, extract_series};
pub use trend::{TrendMethod, forecast_trend, forecast_trend_with_ci};
