//! hchecker daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   prober tasks (external)           ┌──────────────────────────────────────────┐
//!   ────────────────────────────────▶ │            HealthCoordinator             │
//!   lock / report / unlock            │                                          │
//!                                     │  locking ──▶ mapping ──▶ health/reporter │
//!                                     │     │           │              │         │
//!                                     │     ▼           ▼              ▼         │
//!                                     │  ┌────────────────────────────────────┐  │
//!                                     │  │   store (Redis: hchecker, dead:*,  │  │
//!                                     │  │   frontend:*, hchecker_ping)       │  │
//!                                     │  └────────────────────────────────────┘  │
//!                                     │     ▲                          ▲         │
//!   proxy PUBLISH dead ──────────────▶│  events/listener        health/heartbeat │
//!                                     └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use hchecker::config::validation::validate_config;
use hchecker::config::{load_config, CheckerConfig, ConfigError};
use hchecker::lifecycle::{signals, Shutdown};
use hchecker::observability::{logging, metrics};
use hchecker::{EvictionEvent, HealthCoordinator, RedisStore};

#[derive(Parser)]
#[command(name = "hchecker")]
#[command(about = "Backend health-check coordinator for a multi-process reverse proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process identity (overrides `process.id`).
    #[arg(long)]
    process_id: Option<String>,

    /// Log level (overrides `observability.log_level`).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CheckerConfig::default(),
    };
    if let Some(id) = cli.process_id {
        config.process.id = id;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!("hchecker v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<std::net::SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let identity = config.process.identity();
    tracing::info!(
        process_id = %identity,
        store = %config.store.address,
        channel = %config.listener.channel,
        "Configuration loaded"
    );

    let store = RedisStore::connect(&config.store).await.map_err(|e| {
        tracing::error!(error = %e, "Cannot reach coordination store");
        e
    })?;
    let coordinator = HealthCoordinator::start(Arc::new(store), identity, config.clone()).await?;

    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.heartbeat.enabled {
        tasks.push(tokio::spawn(coordinator.heartbeat().run(shutdown.subscribe())));
    }

    if config.listener.enabled {
        tasks.push(coordinator.listen(
            |line| match line.parse::<EvictionEvent>() {
                Ok(event) => tracing::info!(
                    frontend = %event.frontend_key,
                    backend = %event.backend_url,
                    position = event.backend_id,
                    total = event.backend_count,
                    "Proxy reported dead backend"
                ),
                Err(e) => tracing::warn!(raw = %line, error = %e, "Ignoring malformed eviction message"),
            },
            shutdown.subscribe(),
        ));
    }

    signals::wait_for_termination().await;
    tracing::info!(tasks = shutdown.receiver_count(), "Shutting down");
    shutdown.trigger();

    for task in tasks {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
