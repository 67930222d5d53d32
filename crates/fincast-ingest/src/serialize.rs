//! Export of records back to flat unified-schema rows.

use fincast_core::Record;
use serde_json::{Map, Value};

use crate::error::Result;

/// One flat row: `record_type` plus the payload's non-empty columns. Dates
/// are written as `YYYY-MM-DD`, so the row parses back to the same record.
pub(crate) fn to_row(record: &Record) -> Result<Map<String, Value>> {
  let mut row = Map::new();
  row.insert("record_type".into(), Value::from(record.discriminant()));
  if let Value::Object(payload) = record.to_json()? {
    row.extend(payload.into_iter().filter(|(_, v)| !v.is_null()));
  }
  Ok(row)
}
