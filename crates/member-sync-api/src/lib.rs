//! # Member Sync HTTP Service
//!
//! HTTP surface of the payment-to-membership bridge.
//!
//! This service provides:
//! - The webhook endpoint (`/webhook`, `/api/fungies-webhook`) that verifies
//!   payment provider notifications and reconciles the subscriber label
//! - A configuration probe on `GET` of the same paths
//! - Checkout session creation and payment status polling
//! - A liveness endpoint (`/health`)

pub mod checkout;
pub mod config;
pub mod errors;
pub mod responses;
pub mod webhook;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    response::Json,
    routing::{get, post, MethodRouter},
    Router,
};
use ghost_admin_client::{AdminKey, GhostAdminClient};
use member_sync_core::{FungiesClient, FungiesCredentials, MemberDirectory};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub use crate::config::{BridgeSettings, LoggingConfig, ServerConfig, ServiceConfig};
pub use errors::{BridgeError, ConfigError, ServiceError};
pub use responses::{ConfiguredFlags, HealthResponse, ProbeResponse, WebhookReply};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Member store used for label reconciliation; absent when the admin
    /// key or site URL is not configured.
    pub directory: Option<Arc<dyn MemberDirectory>>,

    /// Checkout client; absent when the provider keys are not configured.
    pub payments: Option<Arc<FungiesClient>>,
}

impl AppState {
    /// Create application state from prebuilt parts
    pub fn new(
        config: ServiceConfig,
        directory: Option<Arc<dyn MemberDirectory>>,
        payments: Option<Arc<FungiesClient>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            directory,
            payments,
        }
    }

    /// Build the outbound clients the configuration allows for.
    ///
    /// Missing or malformed settings leave the matching client unset; the
    /// request that needs it then fails with `missing_configuration`.
    pub fn from_config(config: ServiceConfig) -> Self {
        let directory = build_directory(&config.bridge);
        let payments = build_payments(&config.bridge);
        Self::new(config, directory, payments)
    }

    /// Bridge settings shortcut
    pub fn bridge(&self) -> &BridgeSettings {
        &self.config.bridge
    }

    /// The member directory, or the setting that prevents building one.
    pub fn member_directory(&self) -> Result<Arc<dyn MemberDirectory>, BridgeError> {
        if let Some(directory) = &self.directory {
            return Ok(Arc::clone(directory));
        }

        let bridge = self.bridge();
        let key_usable = bridge
            .ghost_admin_api_key
            .as_deref()
            .map(|raw| AdminKey::parse(raw).is_ok())
            .unwrap_or(false);

        let key = if key_usable {
            BridgeSettings::GHOST_API_URL
        } else {
            BridgeSettings::GHOST_ADMIN_API_KEY
        };
        Err(BridgeError::MissingConfiguration { key })
    }

    /// The checkout client, or the setting that prevents building one.
    pub fn payments_client(&self) -> Result<Arc<FungiesClient>, BridgeError> {
        if let Some(payments) = &self.payments {
            return Ok(Arc::clone(payments));
        }

        let bridge = self.bridge();
        let key = if bridge.public_key.is_none() {
            BridgeSettings::FUNGIES_PUBLIC_KEY
        } else if bridge.secret_key.is_none() {
            BridgeSettings::FUNGIES_SECRET_KEY
        } else {
            BridgeSettings::FUNGIES_API_URL
        };
        Err(BridgeError::MissingConfiguration { key })
    }
}

fn build_directory(bridge: &BridgeSettings) -> Option<Arc<dyn MemberDirectory>> {
    let raw_key = bridge.ghost_admin_api_key.as_deref()?;
    let site_url = bridge.ghost_api_url.as_deref()?;

    let key = match AdminKey::parse(raw_key) {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "Ghost admin API key is unusable; reconciliation disabled");
            return None;
        }
    };

    match GhostAdminClient::new(site_url, key) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "Ghost admin client could not be created; reconciliation disabled");
            None
        }
    }
}

fn build_payments(bridge: &BridgeSettings) -> Option<Arc<FungiesClient>> {
    let public_key = bridge.public_key.as_deref()?;
    let secret_key = bridge.secret_key.as_deref()?;

    match FungiesClient::new(
        bridge.api_url(),
        FungiesCredentials::new(public_key, secret_key),
    ) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "Checkout client could not be created; checkout disabled");
            None
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route(webhook::WEBHOOK_PATH, webhook_methods())
        .route(webhook::WEBHOOK_API_PATH, webhook_methods());

    let create_payment_routes = Router::new()
        .route(
            checkout::CREATE_PAYMENT_PATH,
            post(checkout::handle_create_payment)
                .options(checkout::handle_preflight)
                .fallback(handle_method_not_allowed),
        )
        .layer(cors_layer(Method::POST));

    let payment_status_routes = Router::new()
        .route(
            checkout::PAYMENT_STATUS_PATH,
            get(checkout::handle_payment_status)
                .options(checkout::handle_preflight)
                .fallback(handle_method_not_allowed),
        )
        .layer(cors_layer(Method::GET));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .merge(webhook_routes)
        .merge(create_payment_routes)
        .merge(payment_status_routes)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn webhook_methods() -> MethodRouter<AppState> {
    post(webhook::handle_webhook)
        .get(webhook::handle_probe)
        .fallback(handle_method_not_allowed)
}

fn cors_layer(method: Method) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([method, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Liveness endpoint
pub async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Any method a route does not serve
pub async fn handle_method_not_allowed() -> BridgeError {
    BridgeError::MethodNotAllowed
}

// ============================================================================
// Server
// ============================================================================

/// Start HTTP server and serve until SIGINT or SIGTERM
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let server = state.config.server.clone();
    let app = create_router(state);

    let address = format!("{}:{}", server.host, server.port);
    let addr: SocketAddr = address.parse().map_err(|e| ServiceError::BindFailed {
        address: address.clone(),
        message: format!("invalid address: {}", e),
    })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.to_string(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
