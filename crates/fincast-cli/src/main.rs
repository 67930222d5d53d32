//! `fincast`: command-line reports over a fincast record store.
//!
//! # Usage
//!
//! ```
//! fincast import unified.json events.ndjson
//! fincast forecast ACC_OWNERSHIP --years 2025,2026,2027 --method linear
//! fincast --json access-usage
//! fincast verify --baseline unified_v1.json
//! ```

mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use commands::{Context, ForecastArgs};
use config::ConfigFile;
use fincast_model::Aggregate;
use fincast_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fincast", about = "Financial inclusion forecasts from a fincast store")]
struct Args {
  /// Path to a TOML config file (store path, indicator codes, forecast
  /// defaults).
  #[arg(short, long, value_name = "FILE", env = "FINCAST_CONFIG", global = true)]
  config: Option<PathBuf>,

  /// SQLite store to read and write (default: fincast.db).
  #[arg(long, value_name = "FILE", env = "FINCAST_STORE", global = true)]
  store: Option<PathBuf>,

  /// Print JSON instead of text tables.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load unified-schema files (JSON array or one object per line).
  Import {
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },
  /// Write every stored record as unified-schema JSON.
  Export {
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
  },
  /// Summarise the stored records.
  Explore,
  /// Observed indicator codes.
  Indicators,
  /// Event timeline.
  Events,
  /// Check coverage and impact-link integrity.
  Verify {
    /// Earlier dataset to report additions against.
    #[arg(long, value_name = "FILE")]
    baseline: Option<PathBuf>,
  },
  /// Forecast one indicator.
  Forecast {
    code: String,
    #[command(flatten)]
    args: ForecastArgs,
  },
  /// Forecast account ownership and digital payment usage together.
  AccessUsage {
    #[command(flatten)]
    args: ForecastArgs,
  },
  /// Event impacts joined to their events.
  Impacts {
    #[arg(long)]
    indicator: Option<String>,
  },
  /// Event × indicator grid of signed effects.
  Associations {
    /// Column indicator codes, comma-separated.
    #[arg(long, value_delimiter = ',')]
    indicators: Vec<String>,
    /// `sum` or `max`.
    #[arg(long, default_value_t = Aggregate::Sum)]
    aggregate: Aggregate,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr so reports on stdout stay clean.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let config = ConfigFile::load(args.config.as_deref())?;

  // CLI flags override config file, which overrides defaults.
  let store_path = config.store_path(args.store);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {}", store_path.display()))?;

  let ctx = Context {
    store,
    config,
    json: args.json,
  };

  match &args.command {
    Command::Import { files } => commands::import(&ctx, files).await,
    Command::Export { out } => commands::export(&ctx, out.as_deref()).await,
    Command::Explore => commands::explore(&ctx).await,
    Command::Indicators => commands::indicators(&ctx).await,
    Command::Events => commands::events(&ctx).await,
    Command::Verify { baseline } => commands::verify(&ctx, baseline.as_deref()).await,
    Command::Forecast { code, args } => commands::forecast(&ctx, code, args).await,
    Command::AccessUsage { args } => commands::access_usage(&ctx, args).await,
    Command::Impacts { indicator } => commands::impacts(&ctx, indicator.as_deref()).await,
    Command::Associations {
      indicators,
      aggregate,
    } => commands::associations(&ctx, indicators, *aggregate).await,
  }
}
