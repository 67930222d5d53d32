//! fincast-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP under `/api`.
//!
//! # Seeding the store
//!
//! ```
//! cargo run -p fincast-api --bin fincast-server -- --import unified.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use fincast_api::{AppState, ServerConfig};
use fincast_core::store::RecordStore as _;
use fincast_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "fincast forecasting API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load unified-schema rows (JSON array or one object per line) into the
  /// store before serving.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("FINCAST")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = &cli.import {
    import_file(&store, path).await?;
  }

  let state = AppState::new(store, server_cfg.forecast.clone());
  let app = Router::new()
    .nest("/api", fincast_api::api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Parse `path` and store every valid row; invalid rows are logged and
/// skipped.
async fn import_file(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let input = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read {path:?}"))?;

  let mut records = Vec::new();
  for result in fincast_ingest::parse_many(&input) {
    match result {
      Ok(r) => records.push(r),
      Err(e) => tracing::warn!("skipping row: {e}"),
    }
  }

  let inserted = store
    .insert_records(records)
    .await
    .context("failed to store imported records")?;
  tracing::info!(inserted, file = %path.display(), "imported records");
  Ok(())
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
