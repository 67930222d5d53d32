//! Unified-schema row parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ split_rows()     → Vec<Value>   (JSON array or one object per line)
//!          └─ parse_row() → Record       (type dispatch, required columns)
//!               └─ Cells   → coerced text / dates / numbers
//!
//! Required columns fail the row. Optional cells that cannot be coerced are
//! treated as empty and reported with a warning.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use fincast_core::{
  Record,
  RecordType,
  record::{Event, ImpactDirection, ImpactLink, Observation, Target},
};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ─── Row splitting ───────────────────────────────────────────────────────────

/// Split `input` into rows. A document starting with `[` is one JSON array;
/// anything else is read as newline-delimited JSON, skipping blank lines.
/// A line that is not valid JSON yields `Err` in its position.
pub(crate) fn split_rows(input: &str) -> Vec<Result<Value>> {
  let trimmed = input.trim_start();
  if trimmed.starts_with('[') {
    return match serde_json::from_str::<Vec<Value>>(trimmed) {
      Ok(rows) => rows.into_iter().map(Ok).collect(),
      Err(e) => vec![Err(Error::Json(e))],
    };
  }
  input
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(|l| serde_json::from_str(l).map_err(Error::from))
    .collect()
}

// ─── Cell coercion ───────────────────────────────────────────────────────────

/// Accessors over one row object. Every getter treats JSON `null`, a missing
/// key and an all-whitespace string alike, as an empty cell.
struct Cells<'a> {
  row: usize,
  obj: &'a Map<String, Value>,
}

impl<'a> Cells<'a> {
  fn raw(&self, column: &str) -> Option<&'a Value> {
    match self.obj.get(column) {
      None | Some(Value::Null) => None,
      Some(Value::String(s)) if s.trim().is_empty() => None,
      Some(v) => Some(v),
    }
  }

  fn text(&self, column: &str) -> Option<String> {
    match self.raw(column)? {
      Value::String(s) => Some(s.trim().to_owned()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      other => Some(other.to_string()),
    }
  }

  fn require_text(&self, column: &'static str) -> Result<String> {
    self.text(column).ok_or(Error::MissingColumns {
      row:     self.row,
      columns: vec![column],
    })
  }

  /// Optional date; unparseable values are dropped with a warning.
  fn date(&self, column: &'static str) -> Option<NaiveDate> {
    let value = self.raw(column)?;
    let parsed = value.as_str().and_then(coerce_date);
    if parsed.is_none() {
      tracing::warn!(row = self.row, column, %value, "unparseable date treated as empty");
    }
    parsed
  }

  fn require_date(&self, column: &'static str) -> Result<NaiveDate> {
    let value = self.raw(column).ok_or(Error::MissingColumns {
      row:     self.row,
      columns: vec![column],
    })?;
    value
      .as_str()
      .and_then(coerce_date)
      .ok_or_else(|| self.invalid(column, value, "a calendar date"))
  }

  /// Optional number; unparseable values are dropped with a warning.
  fn number(&self, column: &'static str) -> Option<f64> {
    let value = self.raw(column)?;
    let parsed = coerce_number(value);
    if parsed.is_none() {
      tracing::warn!(row = self.row, column, %value, "non-numeric value treated as empty");
    }
    parsed
  }

  fn require_number(&self, column: &'static str) -> Result<f64> {
    let value = self.raw(column).ok_or(Error::MissingColumns {
      row:     self.row,
      columns: vec![column],
    })?;
    coerce_number(value).ok_or_else(|| self.invalid(column, value, "a finite number"))
  }

  /// Whole months, zero when empty. Negative or fractional lags fail.
  fn lag_months(&self, column: &'static str) -> Result<u32> {
    let Some(value) = self.raw(column) else {
      return Ok(0);
    };
    match coerce_number(value) {
      Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(n as u32),
      _ => Err(self.invalid(column, value, "a whole number of months >= 0")),
    }
  }

  fn invalid(&self, column: &'static str, value: &Value, expected: &'static str) -> Error {
    Error::InvalidValue {
      row: self.row,
      column,
      value: value.to_string(),
      expected,
    }
  }
}

/// Parse a date cell. Accepts `YYYY-MM-DD`, RFC 3339 timestamps and
/// `YYYY-MM-DD HH:MM:SS` (or with a `T` separator); the time part is
/// discarded.
pub(crate) fn coerce_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(d);
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.date_naive());
  }
  ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|dt| dt.date())
}

/// Numbers pass through; strings are trimmed, stripped of thousands
/// separators and parsed. Non-finite results are rejected.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
  let n = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

// ─── Row parsing ─────────────────────────────────────────────────────────────

/// Parse one row. `row` is its 1-based position, used in error messages.
pub(crate) fn parse_row(row: usize, value: &Value) -> Result<Record> {
  let obj = value.as_object().ok_or(Error::NotAnObject { row })?;
  let cells = Cells { row, obj };

  let kind = cells.require_text("record_type")?;
  let record_type: RecordType =
    kind
      .to_ascii_lowercase()
      .parse()
      .map_err(|_| Error::UnknownRecordType {
        row,
        value: kind.clone(),
      })?;

  let record = match record_type {
    RecordType::Observation => Observation {
      record_id:        cells.text("record_id"),
      indicator_code:   cells.require_text("indicator_code")?,
      indicator:        cells.text("indicator"),
      pillar:           cells.text("pillar"),
      observation_date: cells.date("observation_date"),
      value_numeric:    cells.number("value_numeric"),
      unit:             cells.text("unit"),
      location:         cells.text("location"),
      gender:           cells.text("gender"),
      source_name:      cells.text("source_name"),
      source_type:      cells.text("source_type"),
      confidence:       cells.text("confidence"),
    }
    .into(),
    RecordType::Event => Event {
      record_id:        cells.require_text("record_id")?,
      observation_date: cells.date("observation_date"),
      category:         cells.text("category"),
      indicator:        cells.text("indicator"),
      value_text:       cells.text("value_text"),
    }
    .into(),
    RecordType::Target => Target {
      record_id:        cells.text("record_id"),
      indicator_code:   cells.require_text("indicator_code")?,
      observation_date: cells.require_date("observation_date")?,
      value_numeric:    cells.require_number("value_numeric")?,
    }
    .into(),
    RecordType::ImpactLink => {
      let missing: Vec<&'static str> = ["parent_id", "related_indicator"]
        .into_iter()
        .filter(|c| !obj.contains_key(*c) || obj[*c].is_null())
        .collect();
      if !missing.is_empty() {
        return Err(Error::MissingColumns { row, columns: missing });
      }
      ImpactLink {
        record_id:         cells.text("record_id"),
        parent_id:         cells.require_text("parent_id")?,
        related_indicator: cells.text("related_indicator").unwrap_or_default(),
        impact_estimate:   cells.number("impact_estimate"),
        impact_direction:  cells
          .text("impact_direction")
          .map(|d| ImpactDirection::from_label(&d))
          .unwrap_or_default(),
        lag_months:        cells.lag_months("lag_months")?,
        pillar:            cells.text("pillar"),
        relationship_type: cells.text("relationship_type"),
        impact_magnitude:  cells.text("impact_magnitude"),
        evidence_basis:    cells.text("evidence_basis"),
      }
      .into()
    }
  };
  Ok(record)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn dates_accept_common_layouts() {
    assert_eq!(coerce_date("2021-05-11"), Some(date(2021, 5, 11)));
    assert_eq!(coerce_date(" 2021-05-11 "), Some(date(2021, 5, 11)));
    assert_eq!(coerce_date("2021-05-11T08:30:00Z"), Some(date(2021, 5, 11)));
    assert_eq!(coerce_date("2021-05-11T23:30:00+03:00"), Some(date(2021, 5, 11)));
    assert_eq!(coerce_date("2021-05-11 08:30:00"), Some(date(2021, 5, 11)));
    assert_eq!(coerce_date("2021-02-30"), None);
    assert_eq!(coerce_date("May 2021"), None);
  }

  #[test]
  fn numbers_accept_strings_and_separators() {
    assert_eq!(coerce_number(&json!(46)), Some(46.0));
    assert_eq!(coerce_number(&json!("49.5")), Some(49.5));
    assert_eq!(coerce_number(&json!(" 1,250 ")), Some(1250.0));
    assert_eq!(coerce_number(&json!("n/a")), None);
    assert_eq!(coerce_number(&json!("NaN")), None);
    assert_eq!(coerce_number(&json!(true)), None);
  }

  #[test]
  fn observation_with_bad_date_keeps_the_row() {
    let row = json!({
      "record_type": "observation",
      "indicator_code": "ACC_OWNERSHIP",
      "observation_date": "sometime",
      "value_numeric": "46",
      "location": "national",
    });
    let Record::Observation(o) = parse_row(1, &row).unwrap() else {
      panic!("expected observation");
    };
    assert_eq!(o.observation_date, None);
    assert_eq!(o.value_numeric, Some(46.0));
    assert_eq!(o.location.as_deref(), Some("national"));
  }

  #[test]
  fn record_type_is_required_and_checked() {
    let err = parse_row(3, &json!({"indicator_code": "X"})).unwrap_err();
    assert!(matches!(err, Error::MissingColumns { row: 3, ref columns } if columns == &["record_type"]));
    assert!(err.to_string().contains("missing required columns"));

    let err = parse_row(4, &json!({"record_type": "survey"})).unwrap_err();
    assert!(matches!(err, Error::UnknownRecordType { row: 4, .. }));

    let ok = parse_row(5, &json!({"record_type": "EVENT", "record_id": "EVT_1"}));
    assert!(matches!(ok, Ok(Record::Event(_))));
  }

  #[test]
  fn impact_link_requires_its_keys() {
    let err = parse_row(1, &json!({"record_type": "impact_link", "lag_months": 3})).unwrap_err();
    let Error::MissingColumns { columns, .. } = err else {
      panic!("expected MissingColumns");
    };
    assert_eq!(columns, vec!["parent_id", "related_indicator"]);
  }

  #[test]
  fn impact_link_coerces_lag_and_direction() {
    let row = json!({
      "record_type": "impact_link",
      "parent_id": "EVT_1",
      "related_indicator": "ACC_OWNERSHIP",
      "impact_estimate": "3.5",
      "impact_direction": "Decrease",
      "lag_months": "12",
    });
    let Record::ImpactLink(l) = parse_row(1, &row).unwrap() else {
      panic!("expected impact link");
    };
    assert_eq!(l.lag_months, 12);
    assert_eq!(l.impact_direction, ImpactDirection::Decrease);
    assert_eq!(l.signed_estimate(), -3.5);

    let blank_lag = json!({
      "record_type": "impact_link",
      "parent_id": "EVT_1",
      "related_indicator": "ACC_OWNERSHIP",
    });
    let Record::ImpactLink(l) = parse_row(1, &blank_lag).unwrap() else {
      panic!("expected impact link");
    };
    assert_eq!(l.lag_months, 0);
    assert_eq!(l.impact_estimate, None);
    assert_eq!(l.impact_direction, ImpactDirection::Increase);
  }

  #[test]
  fn negative_or_fractional_lag_fails() {
    for lag in [json!(-1), json!(2.5), json!("soon")] {
      let row = json!({
        "record_type": "impact_link",
        "parent_id": "EVT_1",
        "related_indicator": "ACC_OWNERSHIP",
        "lag_months": lag,
      });
      let err = parse_row(7, &row).unwrap_err();
      assert!(matches!(err, Error::InvalidValue { row: 7, column: "lag_months", .. }));
    }
  }

  #[test]
  fn target_needs_a_real_date_and_value() {
    let row = json!({
      "record_type": "target",
      "indicator_code": "ACC_OWNERSHIP",
      "observation_date": "not a date",
      "value_numeric": 70,
    });
    let err = parse_row(1, &row).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { column: "observation_date", .. }));
  }

  #[test]
  fn ndjson_lines_split_independently() {
    let input = "{\"a\":1}\n\n not json\n{\"b\":2}\n";
    let rows = split_rows(input);
    assert_eq!(rows.len(), 3);
    assert!(rows[0].is_ok());
    assert!(rows[1].is_err());
    assert!(rows[2].is_ok());
  }
}
