// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HiBro.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! HiBro: browse Home Assistant recorder history as a chart dashboard.

mod server;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hibro_charts::DashboardConfig;
use hibro_history::SqliteHistoryStore;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::server::AppState;

#[derive(Debug, Parser)]
#[command(name = "hibro")]
#[command(author, version, about = "HiBro: Home Assistant History Browser")]
#[command(
    long_about = "Serves a dashboard of charts built from the Home Assistant recorder database.\n\
    \nExamples:\n  \
    hibro                                   # Serve on 127.0.0.1:8456\n  \
    hibro --config-file my.toml --port 9000\n  \
    hibro --render > dashboard.json         # Print the dashboard once and exit"
)]
struct Cli {
    /// Dashboard configuration (TOML)
    #[arg(long, default_value = "hibro-config.toml")]
    config_file: PathBuf,

    /// Port to listen on
    #[arg(long, default_value_t = 8456)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Print the dashboard JSON to stdout and exit instead of serving
    #[arg(long)]
    render: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG, defaults to info
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();

    let config = DashboardConfig::from_file(&cli.config_file).with_context(|| {
        format!("Failed to load configuration from {}", cli.config_file.display())
    })?;
    let tz = config.timezone();
    let store = SqliteHistoryStore::open(&config.database).with_context(|| {
        format!("Failed to open history database {}", config.database.display())
    })?;

    info!("Starting HiBro: {}", config.title);
    info!("   Database: {}", config.database.display());
    info!("   Timezone: {}", tz.name());
    info!("   Charts: {}", config.charts.len());

    let state = AppState::new(config, store, tz);

    if cli.render {
        let dashboard = server::render_dashboard(&state)
            .await
            .context("Dashboard worker failed")?;
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &dashboard)?;
        writeln!(stdout)?;
        return Ok(());
    }

    server::serve(state, &cli.bind, cli.port).await
}
