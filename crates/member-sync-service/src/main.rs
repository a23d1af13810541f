//! # Member Sync Service
//!
//! Binary entry point for the member-sync HTTP service.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes structured logging
//! - Builds the Ghost and payment provider clients the configuration allows
//! - Starts the HTTP server from member-sync-api

use anyhow::Context;
use member_sync_api::{start_server, AppState, LoggingConfig, ServiceConfig, ServiceError};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE_CRATES: &[&str] = &[
    "member_sync_service",
    "member_sync_api",
    "member_sync_core",
    "ghost_admin_client",
    "tower_http",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration is loaded before logging so the format and level can
    // come from it; load errors go to stderr through anyhow.
    let config = ServiceConfig::load().context("Failed to load service configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;

    info!("Starting member-sync service");

    if let Err(e) = config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    let missing = config.bridge.missing_keys();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "Some settings are not configured; endpoints needing them will answer missing_configuration"
        );
    }
    info!(bridge = ?config.bridge, "Bridge configuration loaded");

    let state = AppState::from_config(config);

    info!(
        host = %state.config.server.host,
        port = state.config.server.port,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(state).await {
        error!("Server failed: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `logging.level` applies to the
/// service crates.
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(&logging.level))
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    Ok(())
}

fn default_directives(level: &str) -> String {
    SERVICE_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}
