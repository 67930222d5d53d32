//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `fincast-store-sqlite`). Higher layers (`fincast-api`, `fincast-cli`)
//! depend on this abstraction, not on any concrete backend. Forecasting never
//! talks to a store directly: callers take a [`RecordSet`] snapshot first.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;

use crate::{
  record::{Record, RecordType},
  snapshot::RecordSet,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::list_records`].
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
  /// Restrict to one kind of record.
  pub record_type:    Option<RecordType>,
  /// Matches `indicator_code` on observations and targets and
  /// `related_indicator` on impact links.
  pub indicator_code: Option<String>,
  /// Inclusive lower bound on `observation_date`. Undated records never
  /// match a date bound.
  pub dated_from:     Option<NaiveDate>,
  /// Inclusive upper bound on `observation_date`.
  pub dated_until:    Option<NaiveDate>,
  pub limit:          Option<usize>,
  pub offset:         Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a backend holding unified-schema records.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `records`, returning how many rows were written.
  ///
  /// Records carrying a `record_id` replace any stored record with the same
  /// id, so re-importing a file is idempotent.
  fn insert_records(
    &self,
    records: Vec<Record>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Load every record, in insertion order, as an immutable snapshot.
  fn snapshot(
    &self,
  ) -> impl Future<Output = Result<RecordSet, Self::Error>> + Send + '_;

  /// Records matching `query`, in insertion order.
  fn list_records<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Number of stored records of each kind.
  fn count_by_type(
    &self,
  ) -> impl Future<Output = Result<BTreeMap<RecordType, usize>, Self::Error>>
  + Send
  + '_;
}
