//! ==============================================================================
//! main.rs - show host entry point
//! ==============================================================================
//!
//! purpose:
//!     the one process every screen in the attraction talks to. the admin
//!     console flips values, camera viewers / screensavers / quizzes poll them.
//!
//! responsibilities:
//!     - parse cli overrides and load show.toml
//!     - initialize logging
//!     - build the shared state (loads persisted stats and scores)
//!     - optionally run the battery simulation ticker
//!     - serve the http api
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                    show host (this file)                     │
//!     │  ┌───────────────────┐          ┌─────────────────────────┐  │
//!     │  │ web server        │          │ battery ticker          │  │
//!     │  │ (port 3001)       │          │ (50ms, optional)        │  │
//!     │  └─────────┬─────────┘          └────────────┬────────────┘  │
//!     │            └───────────────┬─────────────────┘               │
//!     │                      ┌─────┴─────┐                           │
//!     │                      │ AppState  │ <- state.rs               │
//!     │                      └─────┬─────┘                           │
//!     └────────────────────────────┼─────────────────────────────────┘
//!                                  │ GET /api/status every 500ms
//!                ┌─────────────────┼─────────────────┐
//!                ▼                 ▼                 ▼
//!          admin console     camera viewers     quiz tablets
//!
//! ==============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use show_host::{api, config::HostConfig, logging, state::run_battery_ticker, AppState};

#[derive(Parser, Debug)]
#[command(name = "show-host", version, about = "Show state server for the attraction")]
struct Cli {
    /// Path to show.toml (default: config/show.toml, then ../config/show.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (also read from PORT)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // step 1: load configuration
    let (mut config, origin) = match &cli.config {
        Some(path) => {
            let config = HostConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            (config, show_host::config::ConfigOrigin::File(path.clone()))
        }
        None => HostConfig::load_or_default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // step 2: logging
    logging::init(&config.logging.level, cli.verbose);
    origin.log();
    config.log_summary();

    // step 3: shared state
    let state = AppState::new(&config);

    // step 4: battery simulation in background
    if config.battery.simulate {
        let tick = Duration::from_millis(config.battery.tick_ms);
        tokio::spawn(run_battery_ticker(state.clone(), tick));
        tracing::info!(tick_ms = config.battery.tick_ms, "battery simulation running");
    }

    // step 5: web server
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("show host live at http://{addr}");

    let app = api::router(state, &config.media);
    api::serve(listener, app).await
}

