//! Core types and trait definitions for the fincast inclusion forecaster.
//!
//! Free of HTTP and database dependencies; every other crate builds on it.

pub mod error;
pub mod months;
pub mod record;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
pub use record::{Record, RecordType};
pub use snapshot::RecordSet;
