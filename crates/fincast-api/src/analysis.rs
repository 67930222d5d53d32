//! Read-only analysis endpoints over a record snapshot.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/indicators` | Observed indicator codes |
//! | `GET`  | `/events` | Event timeline, date order |
//! | `GET`  | `/impact-matrix` | Optional `indicator` |
//! | `GET`  | `/associations` | Optional `indicators` (comma-separated), `aggregate` |
//! | `GET`  | `/explore` | Dataset summary |
//! | `GET`  | `/coverage` | Temporal coverage and link integrity |

use axum::{
  Json,
  extract::{Query, State},
};
use fincast_core::store::RecordStore;
use fincast_model::{
  Aggregate,
  AssociationMatrix,
  ImpactMatrix,
  build_event_indicator_association_matrix,
  build_impact_matrix,
  explore::{
    CoverageReport,
    ExplorationSummary,
    TimelineEntry,
    coverage_report,
    event_labels,
    events_timeline,
    indicator_codes,
  },
  impact::ImpactRow,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// `GET /indicators`
pub async fn indicators<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: RecordStore,
{
  let records = state.snapshot().await?;
  Ok(Json(indicator_codes(&records)))
}

/// `GET /events`
pub async fn events<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError>
where
  S: RecordStore,
{
  let records = state.snapshot().await?;
  Ok(Json(events_timeline(&records)))
}

// ─── Impact matrix ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ImpactParams {
  /// Restrict rows to links on this indicator.
  pub indicator: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImpactMatrixResponse {
  pub columns: &'static [&'static str],
  pub rows:    Vec<ImpactRow>,
}

/// `GET /impact-matrix[?indicator=...]`
pub async fn impact_matrix<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ImpactParams>,
) -> Result<Json<ImpactMatrixResponse>, ApiError>
where
  S: RecordStore,
{
  let records = state.snapshot().await?;
  let matrix = build_impact_matrix(&records);
  let rows = match &params.indicator {
    Some(code) => matrix.for_indicator(code).cloned().collect(),
    None => matrix.rows().to_vec(),
  };
  Ok(Json(ImpactMatrixResponse {
    columns: ImpactMatrix::columns(),
    rows,
  }))
}

// ─── Associations ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct AssociationParams {
  /// Comma-separated indicator codes fixing the column set and order.
  pub indicators: Option<String>,
  /// `sum` (default) or `max`.
  pub aggregate:  Option<String>,
}

/// `GET /associations[?indicators=...][&aggregate=...]`
///
/// Rows are labelled with event names where the event has one.
pub async fn associations<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<AssociationParams>,
) -> Result<Json<AssociationMatrix>, ApiError>
where
  S: RecordStore,
{
  let aggregate = match &params.aggregate {
    Some(a) => a
      .parse::<Aggregate>()
      .map_err(|_| ApiError::BadRequest(format!("unknown aggregate {a:?}")))?,
    None => Aggregate::default(),
  };
  let columns: Option<Vec<String>> = params.indicators.as_deref().map(|s| {
    s.split(',')
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .map(str::to_owned)
      .collect()
  });

  let records = state.snapshot().await?;
  let labels = event_labels(&records);
  let grid = build_event_indicator_association_matrix(
    &build_impact_matrix(&records),
    Some(&labels),
    columns.as_deref(),
    aggregate,
  );
  Ok(Json(grid))
}

// ─── Overview ────────────────────────────────────────────────────────────────

/// `GET /explore`
pub async fn explore<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<ExplorationSummary>, ApiError>
where
  S: RecordStore,
{
  let records = state.snapshot().await?;
  Ok(Json(fincast_model::explore::explore(&records)))
}

/// `GET /coverage`
pub async fn coverage<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<CoverageReport>, ApiError>
where
  S: RecordStore,
{
  let records = state.snapshot().await?;
  Ok(Json(coverage_report(&records)))
}
