//! Runtime server configuration.

use std::path::PathBuf;

use fincast_model::ForecastDefaults;
use serde::Deserialize;

/// Deserialised from `config.toml` layered with `FINCAST_*` environment
/// variables (`FINCAST_PORT`, `FINCAST_FORECAST__MAX_YEAR`, ...).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub forecast:   ForecastDefaults,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("fincast.db"),
      forecast:   ForecastDefaults::default(),
    }
  }
}
