//! Handlers for `/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | Optional `record_type`, `indicator_code`, `dated_from`, `dated_until`, `limit`, `offset` |
//! | `POST` | `/records` | Body: JSON array of unified-schema rows; returns 201 + import report |
//! | `GET`  | `/records/counts` | Stored records per `record_type` |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use fincast_core::{
  Record,
  RecordType,
  store::{RecordQuery, RecordStore},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub record_type:    Option<RecordType>,
  pub indicator_code: Option<String>,
  pub dated_from:     Option<NaiveDate>,
  pub dated_until:    Option<NaiveDate>,
  pub limit:          Option<usize>,
  pub offset:         Option<usize>,
}

/// `GET /records[?record_type=...][&indicator_code=...][&dated_from=...][&limit=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
{
  let query = RecordQuery {
    record_type:    params.record_type,
    indicator_code: params.indicator_code,
    dated_from:     params.dated_from,
    dated_until:    params.dated_until,
    limit:          params.limit,
    offset:         params.offset,
  };
  let records = state
    .store
    .list_records(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RejectedRow {
  pub row:   usize,
  pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
  pub inserted: usize,
  pub rejected: Vec<RejectedRow>,
}

/// `POST /records`; the body is a JSON array of rows.
///
/// Valid rows are stored even when others are rejected; the report lists
/// each rejected row with its reason.
pub async fn import<S>(
  State(state): State<AppState<S>>,
  Json(rows): Json<Vec<Value>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let mut records = Vec::new();
  let mut rejected = Vec::new();
  for (i, result) in fincast_ingest::parse_rows(&rows).into_iter().enumerate() {
    match result {
      Ok(r) => records.push(r),
      Err(e) => rejected.push(RejectedRow {
        row:   i + 1,
        error: e.to_string(),
      }),
    }
  }

  let inserted = state
    .store
    .insert_records(records)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(inserted, rejected = rejected.len(), "imported records");

  Ok((StatusCode::CREATED, Json(ImportReport { inserted, rejected })))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// `GET /records/counts`
pub async fn counts<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<BTreeMap<RecordType, usize>>, ApiError>
where
  S: RecordStore,
{
  let counts = state.store.count_by_type().await.map_err(ApiError::store)?;
  Ok(Json(counts))
}
