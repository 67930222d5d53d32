//! JSON REST API for fincast.
//!
//! Exposes an axum [`Router`] backed by any [`fincast_core::store::RecordStore`].
//! Every analysis request takes a fresh snapshot of the store and computes
//! its result from that snapshot; nothing is cached between requests.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fincast_api::api_router(state))
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod forecast;
pub mod records;

use std::sync::Arc;

use axum::{Router, routing::get};
use fincast_core::{RecordSet, store::RecordStore};
use fincast_model::ForecastDefaults;

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store:    Arc<S>,
  pub defaults: Arc<ForecastDefaults>,
}

impl<S: RecordStore> AppState<S> {
  pub fn new(store: S, defaults: ForecastDefaults) -> Self {
    Self {
      store:    Arc::new(store),
      defaults: Arc::new(defaults),
    }
  }

  /// The immutable record set a request computes against.
  pub(crate) async fn snapshot(&self) -> Result<RecordSet, ApiError> {
    self.store.snapshot().await.map_err(ApiError::store)
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: RecordStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Records
    .route("/records", get(records::list::<S>).post(records::import::<S>))
    .route("/records/counts", get(records::counts::<S>))
    // Series and forecasts
    .route("/indicators", get(analysis::indicators::<S>))
    .route("/series/{code}", get(forecast::series::<S>))
    .route("/forecast/{code}", get(forecast::forecast_one::<S>))
    .route("/access-usage", get(forecast::access_usage::<S>))
    // Events and impacts
    .route("/events", get(analysis::events::<S>))
    .route("/impact-matrix", get(analysis::impact_matrix::<S>))
    .route("/associations", get(analysis::associations::<S>))
    // Data overview
    .route("/explore", get(analysis::explore::<S>))
    .route("/coverage", get(analysis::coverage::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
