//! # Chart Catalog CLI (`catalog`)
//!
//! Loads Helm chart repositories and serves them, augmented, over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! catalog --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog catalogs` | List the configured catalogs |
//! | `catalog load [catalog]` | Load one or all catalogs and print a report |
//! | `catalog show <catalog> <name>` | Print an augmented package as JSON |
//! | `catalog serve` | Load every catalog and start the HTTP API |
//!
//! Logs go to stderr. `--log-level` sets the default filter; `RUST_LOG`
//! overrides it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chart_catalog::{commands, config, server};

/// Chart catalog: loads Helm chart repositories and serves them over HTTP.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/catalog.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "catalog", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    /// Default log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured catalogs without fetching anything.
    Catalogs,

    /// Load catalogs and print charts, versions and skipped records.
    ///
    /// Exits non-zero if any catalog index cannot be loaded.
    Load {
        /// Catalog id. Loads every catalog when omitted.
        catalog: Option<String>,
    },

    /// Print a package with its `onyxia` block as JSON.
    Show {
        /// Catalog id.
        catalog: String,

        /// Package or chart name (case-insensitive).
        name: String,

        /// Print this chart version instead of the catalog's package.
        #[arg(long)]
        version: Option<String>,
    },

    /// Load every catalog and start the HTTP server.
    Serve,
}

fn initialize_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chart_catalog={0},catalog={0}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    let cfg = config::load_config(&cli.config)?;

    // Fetching uses a blocking HTTP client; keep it off the async workers.
    match cli.command {
        Commands::Catalogs => {
            commands::list_catalogs(&cfg)?;
        }
        Commands::Load { catalog } => {
            tokio::task::spawn_blocking(move || commands::run_load(&cfg, catalog.as_deref()))
                .await??;
        }
        Commands::Show {
            catalog,
            name,
            version,
        } => {
            tokio::task::spawn_blocking(move || {
                commands::run_show(&cfg, &catalog, &name, version.as_deref())
            })
            .await??;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
