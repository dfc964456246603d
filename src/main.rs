//! parlord - Parlor Daemon.
//!
//! Binary entry point: logging, configuration, metrics endpoint, gateway.

use parlord::config::Config;
use parlord::network::Gateway;
use parlord::{http, metrics};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration: explicit path argument, else ./config.toml, else
    // built-in defaults.
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).map_err(|e| {
            error!(path = %path, error = %e, "Failed to load config");
            e
        })?,
        None if std::path::Path::new("config.toml").exists() => {
            Config::load("config.toml").map_err(|e| {
                error!(path = "config.toml", error = %e, "Failed to load config");
                e
            })?
        }
        None => {
            info!("No config file found - using built-in defaults");
            Config::default()
        }
    };

    info!(
        server = %config.server.name,
        listen = %config.server.listen,
        workers = config.limits.workers,
        max_sessions = config.limits.max_sessions,
        max_rooms = config.limits.max_rooms,
        "Starting parlord"
    );

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Metrics initialized");
    }

    let gateway = Gateway::bind(config).await?;
    let handle = gateway.handle();

    // Ctrl-C triggers a drain: stop accepting, close sessions, release
    // every registry entry and admission slot before exit.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received - shutting down");
            handle.shutdown();
        }
    });

    gateway.run().await?;
    Ok(())
}
