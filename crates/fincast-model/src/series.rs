//! Series extraction: observation records to a per-indicator time series.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use fincast_core::{RecordSet, record::Observation};
use serde::{Deserialize, Serialize};

/// Equality filters applied to observations before extraction. `None` means
/// "any"; `Some(v)` only keeps observations whose field equals `v`, so rows
/// with an empty field never match a set filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFilter {
  pub location: Option<String>,
  pub gender:   Option<String>,
}

impl SeriesFilter {
  /// National, all-gender observations.
  pub fn national_all() -> Self {
    Self {
      location: Some("national".into()),
      gender:   Some("all".into()),
    }
  }

  /// National observations, any gender.
  pub fn national() -> Self {
    Self {
      location: Some("national".into()),
      gender:   None,
    }
  }

  pub fn matches(&self, obs: &Observation) -> bool {
    field_matches(self.location.as_deref(), obs.location.as_deref())
      && field_matches(self.gender.as_deref(), obs.gender.as_deref())
  }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
  match wanted {
    None => true,
    Some(w) => actual == Some(w),
  }
}

/// A date-indexed series, ascending, at most one value per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
  points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
  /// Build from arbitrary points: sorts by date and averages duplicates.
  pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, value) in points {
      let slot = by_date.entry(date).or_insert((0.0, 0));
      slot.0 += value;
      slot.1 += 1;
    }
    Self {
      points: by_date
        .into_iter()
        .map(|(d, (sum, n))| (d, sum / n as f64))
        .collect(),
    }
  }

  pub fn points(&self) -> &[(NaiveDate, f64)] { &self.points }

  pub fn len(&self) -> usize { self.points.len() }

  pub fn is_empty(&self) -> bool { self.points.is_empty() }

  pub fn first(&self) -> Option<(NaiveDate, f64)> { self.points.first().copied() }

  pub fn last(&self) -> Option<(NaiveDate, f64)> { self.points.last().copied() }

  /// Collapse to one value per calendar year (mean of that year's points).
  pub fn annual(&self) -> BTreeMap<i32, f64> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (date, value) in &self.points {
      let slot = by_year.entry(date.year()).or_insert((0.0, 0));
      slot.0 += value;
      slot.1 += 1;
    }
    by_year
      .into_iter()
      .map(|(y, (sum, n))| (y, sum / n as f64))
      .collect()
  }
}

/// Extract the time series of `indicator_code` from `records`.
///
/// Keeps observations of that indicator that pass `filter`; rows without a
/// date or a finite value are skipped. Same-date values are averaged. An
/// indicator with no usable rows yields an empty series, which callers treat
/// as "no history".
pub fn extract_series(
  records: &RecordSet,
  indicator_code: &str,
  filter: &SeriesFilter,
) -> TimeSeries {
  let mut skipped = 0usize;
  let points: Vec<_> = records
    .observations()
    .filter(|o| o.indicator_code == indicator_code && filter.matches(o))
    .filter_map(|o| match (o.observation_date, o.value_numeric) {
      (Some(d), Some(v)) if v.is_finite() => Some((d, v)),
      _ => {
        skipped += 1;
        None
      }
    })
    .collect();

  if skipped > 0 {
    tracing::warn!(
      indicator = indicator_code,
      skipped,
      "skipped observations without a date or numeric value"
    );
  }

  let series = TimeSeries::from_points(points);
  tracing::debug!(indicator = indicator_code, points = series.len(), "extracted series");
  series
}

#[cfg(test)]
mod tests {
  use fincast_core::record::{Event, Record};

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn obs(code: &str, d: NaiveDate, v: f64, location: &str, gender: &str) -> Record {
    let mut o = Observation::new(code, d, v);
    o.location = Some(location.into());
    o.gender = Some(gender.into());
    o.into()
  }

  #[test]
  fn filters_by_indicator_and_fields() {
    let set: RecordSet = vec![
      obs("ACC_OWNERSHIP", date(2017, 12, 31), 35.0, "national", "all"),
      obs("ACC_OWNERSHIP", date(2021, 12, 31), 46.0, "national", "all"),
      obs("ACC_OWNERSHIP", date(2021, 12, 31), 56.0, "national", "male"),
      obs("ACC_OWNERSHIP", date(2021, 12, 31), 60.0, "urban", "all"),
      obs("USG_DIGITAL_PAY", date(2021, 12, 31), 18.0, "national", "all"),
      Event::new("EVT_1", date(2021, 5, 1)).into(),
    ]
    .into();

    let series = extract_series(&set, "ACC_OWNERSHIP", &SeriesFilter::national_all());
    assert_eq!(
      series.points(),
      &[(date(2017, 12, 31), 35.0), (date(2021, 12, 31), 46.0)]
    );

    let unfiltered = extract_series(&set, "ACC_OWNERSHIP", &SeriesFilter::default());
    assert_eq!(unfiltered.len(), 2);
    // 46, 56 and 60 share a date and are averaged.
    assert_eq!(unfiltered.last(), Some((date(2021, 12, 31), 54.0)));
  }

  #[test]
  fn drops_rows_missing_date_or_value() {
    let mut no_date = Observation::new("ACC_OWNERSHIP", date(2020, 1, 1), 1.0);
    no_date.observation_date = None;
    let mut no_value = Observation::new("ACC_OWNERSHIP", date(2020, 1, 1), 1.0);
    no_value.value_numeric = None;
    let mut nan_value = Observation::new("ACC_OWNERSHIP", date(2020, 1, 1), 1.0);
    nan_value.value_numeric = Some(f64::NAN);

    let set: RecordSet = vec![
      no_date.into(),
      no_value.into(),
      nan_value.into(),
      Observation::new("ACC_OWNERSHIP", date(2014, 12, 31), 22.0).into(),
    ]
    .into();

    let series = extract_series(&set, "ACC_OWNERSHIP", &SeriesFilter::default());
    assert_eq!(series.points(), &[(date(2014, 12, 31), 22.0)]);
  }

  #[test]
  fn unknown_indicator_is_empty_not_error() {
    let set: RecordSet =
      vec![Observation::new("ACC_OWNERSHIP", date(2014, 12, 31), 22.0).into()].into();
    assert!(extract_series(&set, "ACC_MM_ACCOUNT", &SeriesFilter::default()).is_empty());
  }

  #[test]
  fn annual_averages_within_year() {
    let series = TimeSeries::from_points([
      (date(2023, 3, 31), 10.0),
      (date(2023, 9, 30), 20.0),
      (date(2024, 6, 30), 40.0),
    ]);
    let annual = series.annual();
    assert_eq!(annual.get(&2023), Some(&15.0));
    assert_eq!(annual.get(&2024), Some(&40.0));
  }
}
