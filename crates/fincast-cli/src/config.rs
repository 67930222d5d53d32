//! The optional TOML config file and how it merges with flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fincast_model::{AccessUsageCodes, ForecastDefaults};
use serde::Deserialize;

/// Shape of the optional TOML config file.
///
/// ```toml
/// store_path = "~/.local/share/fincast/records.db"
/// access = "ACC_OWNERSHIP"
/// usage = "USG_DIGITAL_PAY"
///
/// [forecast]
/// target_years = [2025, 2026, 2027]
/// trend_method = "linear"
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
  pub store_path:     Option<PathBuf>,
  pub access:         Option<String>,
  pub usage:          Option<String>,
  pub usage_fallback: Option<String>,
  pub forecast:       ForecastDefaults,
}

impl ConfigFile {
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }

  /// Flag value, else the file's, else `fincast.db`.
  pub fn store_path(&self, flag: Option<PathBuf>) -> PathBuf {
    flag
      .or_else(|| self.store_path.clone())
      .map(|p| expand_tilde(&p))
      .unwrap_or_else(|| PathBuf::from("fincast.db"))
  }

  pub fn access_usage_codes(&self) -> AccessUsageCodes {
    let mut codes = AccessUsageCodes::default();
    if let Some(a) = &self.access {
      codes.access = a.clone();
    }
    if let Some(u) = &self.usage {
      codes = codes.with_usage(u.clone());
    }
    if let Some(f) = &self.usage_fallback {
      codes.usage_fallback = Some(f.clone()).filter(|f| !f.is_empty());
    }
    codes
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use fincast_model::TrendMethod;

  use super::*;

  #[test]
  fn partial_file_keeps_defaults() {
    let cfg: ConfigFile = toml::from_str(
      r#"
      usage_fallback = ""
      [forecast]
      trend_method = "last"
      target_years = [2030]
      "#,
    )
    .unwrap();
    assert_eq!(cfg.forecast.trend_method, TrendMethod::Last);
    assert_eq!(cfg.forecast.target_years, vec![2030]);
    assert_eq!(cfg.forecast.confidence, 0.95);

    let codes = cfg.access_usage_codes();
    assert_eq!(codes.access, "ACC_OWNERSHIP");
    assert_eq!(codes.usage_fallback, None);
  }

  #[test]
  fn other_usage_code_needs_its_own_fallback() {
    let cfg: ConfigFile = toml::from_str(r#"usage = "USG_MOBILE_MONEY""#).unwrap();
    assert_eq!(cfg.access_usage_codes().usage_fallback, None);

    let cfg: ConfigFile = toml::from_str(
      r#"
      usage = "USG_MOBILE_MONEY"
      usage_fallback = "USG_ACTIVE_RATE"
      "#,
    )
    .unwrap();
    let codes = cfg.access_usage_codes();
    assert_eq!(codes.usage, "USG_MOBILE_MONEY");
    assert_eq!(codes.usage_fallback.as_deref(), Some("USG_ACTIVE_RATE"));
  }

  #[test]
  fn flag_overrides_file_store_path() {
    let cfg = ConfigFile {
      store_path: Some(PathBuf::from("from-file.db")),
      ..Default::default()
    };
    assert_eq!(cfg.store_path(None), PathBuf::from("from-file.db"));
    assert_eq!(cfg.store_path(Some("flag.db".into())), PathBuf::from("flag.db"));
    assert_eq!(ConfigFile::default().store_path(None), PathBuf::from("fincast.db"));
  }
}
