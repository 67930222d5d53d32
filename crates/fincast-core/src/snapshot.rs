//! [`RecordSet`], an immutable, caller-owned snapshot of the record store.
//!
//! Every forecasting operation takes a `&RecordSet`; nothing is cached
//! between calls. Loading (and any caching) belongs to the store layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{Event, ImpactLink, Observation, Record, RecordType, Target};

/// An immutable collection of records loaded for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
  records: Vec<Record>,
}

impl RecordSet {
  pub fn new(records: Vec<Record>) -> Self { Self { records } }

  pub fn records(&self) -> &[Record] { &self.records }

  pub fn into_records(self) -> Vec<Record> { self.records }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn observations(&self) -> impl Iterator<Item = &Observation> {
    self.records.iter().filter_map(|r| match r {
      Record::Observation(o) => Some(o),
      _ => None,
    })
  }

  pub fn events(&self) -> impl Iterator<Item = &Event> {
    self.records.iter().filter_map(|r| match r {
      Record::Event(e) => Some(e),
      _ => None,
    })
  }

  pub fn impact_links(&self) -> impl Iterator<Item = &ImpactLink> {
    self.records.iter().filter_map(|r| match r {
      Record::ImpactLink(l) => Some(l),
      _ => None,
    })
  }

  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.records.iter().filter_map(|r| match r {
      Record::Target(t) => Some(t),
      _ => None,
    })
  }

  /// Number of records of each kind present. Kinds with no records are
  /// absent from the map.
  pub fn count_by_type(&self) -> BTreeMap<RecordType, usize> {
    let mut counts = BTreeMap::new();
    for r in &self.records {
      *counts.entry(r.record_type()).or_insert(0) += 1;
    }
    counts
  }
}

impl From<Vec<Record>> for RecordSet {
  fn from(records: Vec<Record>) -> Self { Self::new(records) }
}

impl FromIterator<Record> for RecordSet {
  fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::record::ImpactDirection;

  #[test]
  fn views_split_by_kind() {
    let d = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let set: RecordSet = vec![
      Record::from(Observation::new("ACC_OWNERSHIP", d, 40.0)),
      Record::from(Observation::new("USG_DIGITAL_PAY", d, 20.0)),
      Record::from(Event::new("EVT_1", d)),
      Record::from(ImpactLink::new(
        "EVT_1",
        "ACC_OWNERSHIP",
        2.0,
        ImpactDirection::Increase,
        0,
      )),
    ]
    .into();

    assert_eq!(set.len(), 4);
    assert_eq!(set.observations().count(), 2);
    assert_eq!(set.events().count(), 1);
    assert_eq!(set.impact_links().count(), 1);
    assert_eq!(set.targets().count(), 0);

    let counts = set.count_by_type();
    assert_eq!(counts.get(&RecordType::Observation), Some(&2));
    assert_eq!(counts.get(&RecordType::Target), None);
  }
}
