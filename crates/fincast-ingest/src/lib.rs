//! Unified-schema row codec for fincast.
//!
//! Converts between loosely-typed JSON rows (one per spreadsheet line, with
//! inapplicable columns empty) and validated [`fincast_core::Record`]s. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use fincast_ingest::parse_many;
//!
//! let input = r#"[{"record_type": "event", "record_id": "EVT_0001",
//!                  "observation_date": "2021-05-11", "category": "product_launch"}]"#;
//! for (i, row) in parse_many(input).into_iter().enumerate() {
//!   match row {
//!     Ok(record) => println!("{i}: {}", record.discriminant()),
//!     Err(e) => eprintln!("{e}"),
//!   }
//! }
//! ```

pub mod error;
mod parse;
mod serialize;

pub use error::{Error, Result};
use fincast_core::Record;
use serde_json::{Map, Value};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse a single row object. `row` is its 1-based position, quoted in
/// error messages.
pub fn parse_row(row: usize, value: &Value) -> Result<Record> {
  parse::parse_row(row, value)
}

/// Parse already-split rows. Each row is parsed independently; a malformed
/// row yields `Err(…)` in the corresponding position without aborting the
/// rest.
pub fn parse_rows(rows: &[Value]) -> Vec<Result<Record>> {
  rows
    .iter()
    .enumerate()
    .map(|(i, v)| parse::parse_row(i + 1, v))
    .collect()
}

/// Parse a JSON array of rows, or newline-delimited JSON with one row per
/// line, one result per row.
pub fn parse_many(input: &str) -> Vec<Result<Record>> {
  let mut results = Vec::new();
  for (i, row) in parse::split_rows(input).into_iter().enumerate() {
    results.push(row.and_then(|v| parse::parse_row(i + 1, &v)));
  }

  let failed = results.iter().filter(|r| r.is_err()).count();
  tracing::debug!(rows = results.len(), failed, "parsed unified-schema rows");
  results
}

/// Flatten `records` into unified-schema rows.
pub fn serialize_records(records: &[Record]) -> Result<Vec<Map<String, Value>>> {
  records.iter().map(serialize::to_row).collect()
}

/// Flatten `records` and render them as a pretty-printed JSON array.
pub fn to_json_string(records: &[Record]) -> Result<String> {
  Ok(serde_json::to_string_pretty(&serialize_records(records)?)?)
}

// ─── Round-trip test ─────────────────────────────────────────────────────────
