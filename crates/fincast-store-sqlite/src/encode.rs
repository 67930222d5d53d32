//! Encoding and decoding helpers between records and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` so they sort and compare as text.
//! Timestamps are RFC 3339. Payloads are compact JSON without the type tag.

use chrono::{DateTime, NaiveDate, Utc};
use fincast_core::Record;

use crate::Result;

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Records ─────────────────────────────────────────────────────────────────

/// Column values for one `records` row, ready to bind.
pub struct EncodedRecord {
  pub record_id:        Option<String>,
  pub record_type:      &'static str,
  pub indicator_code:   Option<String>,
  pub observation_date: Option<String>,
  pub payload_json:     String,
}

pub fn encode_record(record: &Record) -> Result<EncodedRecord> {
  Ok(EncodedRecord {
    record_id:        record.record_id().map(str::to_owned),
    record_type:      record.discriminant(),
    indicator_code:   record.indicator_code().map(str::to_owned),
    observation_date: record.observation_date().map(encode_date),
    payload_json:     record.to_json()?.to_string(),
  })
}

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub record_type:  String,
  pub payload_json: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<Record> {
    let payload: serde_json::Value = serde_json::from_str(&self.payload_json)?;
    Ok(Record::from_parts(&self.record_type, payload)?)
  }
}
