//! Record types: the rows of the unified inclusion dataset.
//!
//! The source table mixes four kinds of row in one sheet and leaves whichever
//! columns do not apply empty. Here each kind has its own payload struct and
//! the kind is the enum variant, so consumers never have to ask whether a
//! column exists. Rows are validated once, at the ingestion boundary
//! (`fincast-ingest`), and are immutable afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::Result;

// ─── Discriminants ───────────────────────────────────────────────────────────

/// The `record_type` discriminant of a unified-schema row.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordType {
  Observation,
  Event,
  Target,
  ImpactLink,
}

/// Which way an event pushes an indicator.
///
/// The estimate on an impact link is a magnitude; the sign comes from here
/// alone.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Hash,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImpactDirection {
  #[default]
  Increase,
  Decrease,
}

impl ImpactDirection {
  /// Lenient parse used for spreadsheet cells: only `decrease` (any case,
  /// surrounding whitespace ignored) is a decrease; everything else,
  /// including unknown labels, counts as an increase.
  pub fn from_label(label: &str) -> Self {
    if label.trim().eq_ignore_ascii_case("decrease") {
      Self::Decrease
    } else {
      Self::Increase
    }
  }

  /// `+1.0` or `-1.0`.
  pub fn sign(self) -> f64 {
    match self {
      Self::Increase => 1.0,
      Self::Decrease => -1.0,
    }
  }

  /// Apply this direction to a magnitude: `+|m|` or `-|m|`.
  pub fn signed(self, magnitude: f64) -> f64 { self.sign() * magnitude.abs() }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// One measured value of one indicator at one point in time.
///
/// `observation_date` and `value_numeric` are kept optional: rows missing
/// either are still valid records but are skipped by series extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  pub record_id:        Option<String>,
  pub indicator_code:   String,
  /// Human-readable indicator name, e.g. "Account Ownership Rate".
  pub indicator:        Option<String>,
  /// `ACCESS`, `USAGE`, ...
  pub pillar:           Option<String>,
  pub observation_date: Option<NaiveDate>,
  pub value_numeric:    Option<f64>,
  pub unit:             Option<String>,
  pub location:         Option<String>,
  pub gender:           Option<String>,
  pub source_name:      Option<String>,
  pub source_type:      Option<String>,
  pub confidence:       Option<String>,
}

impl Observation {
  /// Minimal observation with every optional field empty.
  pub fn new(
    indicator_code: impl Into<String>,
    observation_date: NaiveDate,
    value_numeric: f64,
  ) -> Self {
    Self {
      record_id:        None,
      indicator_code:   indicator_code.into(),
      indicator:        None,
      pillar:           None,
      observation_date: Some(observation_date),
      value_numeric:    Some(value_numeric),
      unit:             None,
      location:         None,
      gender:           None,
      source_name:      None,
      source_type:      None,
      confidence:       None,
    }
  }
}

/// A dated policy, product launch or milestone. Carries no indicator value;
/// its effect on indicators is described by [`ImpactLink`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub record_id:        String,
  /// When the event occurred. `None` when the source cell was empty or
  /// unparseable; links to such an event are dropped when the impact matrix
  /// is built.
  pub observation_date: Option<NaiveDate>,
  pub category:         Option<String>,
  /// Event name.
  pub indicator:        Option<String>,
  /// Free-text status, e.g. "launched", "planned".
  pub value_text:       Option<String>,
}

impl Event {
  pub fn new(record_id: impl Into<String>, observation_date: NaiveDate) -> Self {
    Self {
      record_id:        record_id.into(),
      observation_date: Some(observation_date),
      category:         None,
      indicator:        None,
      value_text:       None,
    }
  }
}

/// A modelled effect of one event on one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactLink {
  pub record_id:         Option<String>,
  /// `record_id` of the parent [`Event`].
  pub parent_id:         String,
  pub related_indicator: String,
  /// Magnitude of the effect in indicator units. An empty cell counts as 0.
  pub impact_estimate:   Option<f64>,
  #[serde(default)]
  pub impact_direction:  ImpactDirection,
  /// Months between the event and the effect materialising.
  #[serde(default)]
  pub lag_months:        u32,
  pub pillar:            Option<String>,
  pub relationship_type: Option<String>,
  /// Qualitative label such as `low` / `medium` / `high`.
  pub impact_magnitude:  Option<String>,
  pub evidence_basis:    Option<String>,
}

impl ImpactLink {
  pub fn new(
    parent_id: impl Into<String>,
    related_indicator: impl Into<String>,
    impact_estimate: f64,
    impact_direction: ImpactDirection,
    lag_months: u32,
  ) -> Self {
    Self {
      record_id: None,
      parent_id: parent_id.into(),
      related_indicator: related_indicator.into(),
      impact_estimate: Some(impact_estimate),
      impact_direction,
      lag_months,
      pillar: None,
      relationship_type: None,
      impact_magnitude: None,
      evidence_basis: None,
    }
  }

  /// The signed effect of this link (empty estimate counts as zero).
  pub fn signed_estimate(&self) -> f64 {
    self
      .impact_direction
      .signed(self.impact_estimate.unwrap_or(0.0))
  }
}

/// A policy target for an indicator. Used as a reference threshold only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
  pub record_id:        Option<String>,
  pub indicator_code:   String,
  /// The date by which the target should be reached.
  pub observation_date: NaiveDate,
  pub value_numeric:    f64,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A row of the unified dataset. The variant name serves as the
/// `record_type` discriminant stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", content = "data", rename_all = "snake_case")]
pub enum Record {
  Observation(Observation),
  Event(Event),
  Target(Target),
  ImpactLink(ImpactLink),
}

impl Record {
  pub fn record_type(&self) -> RecordType {
    match self {
      Self::Observation(_) => RecordType::Observation,
      Self::Event(_) => RecordType::Event,
      Self::Target(_) => RecordType::Target,
      Self::ImpactLink(_) => RecordType::ImpactLink,
    }
  }

  /// The discriminant string stored in the `record_type` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str { self.record_type().into() }

  pub fn record_id(&self) -> Option<&str> {
    match self {
      Self::Observation(o) => o.record_id.as_deref(),
      Self::Event(e) => Some(e.record_id.as_str()),
      Self::Target(t) => t.record_id.as_deref(),
      Self::ImpactLink(l) => l.record_id.as_deref(),
    }
  }

  /// The indicator this record is about: `indicator_code` for observations
  /// and targets, `related_indicator` for impact links, none for events.
  pub fn indicator_code(&self) -> Option<&str> {
    match self {
      Self::Observation(o) => Some(o.indicator_code.as_str()),
      Self::Target(t) => Some(t.indicator_code.as_str()),
      Self::ImpactLink(l) => Some(l.related_indicator.as_str()),
      Self::Event(_) => None,
    }
  }

  pub fn observation_date(&self) -> Option<NaiveDate> {
    match self {
      Self::Observation(o) => o.observation_date,
      Self::Event(e) => e.observation_date,
      Self::Target(t) => Some(t.observation_date),
      Self::ImpactLink(_) => None,
    }
  }

  /// Serialise the inner payload (without the type tag) for the
  /// `payload_json` database column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    // The full serialised form is `{"record_type": "...", "data": <payload>}`.
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Deserialise from the discriminant string and JSON payload stored in the
  /// database.
  pub fn from_parts(discriminant: &str, data: serde_json::Value) -> Result<Self> {
    let _: RecordType = discriminant
      .parse()
      .map_err(|_| crate::Error::UnknownRecordType(discriminant.to_owned()))?;
    let wrapped =
      serde_json::json!({ "record_type": discriminant, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }
}

impl From<Observation> for Record {
  fn from(v: Observation) -> Self { Self::Observation(v) }
}

impl From<Event> for Record {
  fn from(v: Event) -> Self { Self::Event(v) }
}

impl From<Target> for Record {
  fn from(v: Target) -> Self { Self::Target(v) }
}

impl From<ImpactLink> for Record {
  fn from(v: ImpactLink) -> Self { Self::ImpactLink(v) }
}
