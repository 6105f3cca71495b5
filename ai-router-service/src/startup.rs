//! Server construction and lifecycle.
//!
//! Builds the HTTP server that fronts the AI service registry: the dispatch
//! endpoint, usage log queries, stats and operational probes.

use axum::{
    middleware::from_fn,
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::RouterConfig;
use crate::handlers::{
    dispatch_request, get_service_stats, health_check, list_service_logs, metrics_endpoint,
    readiness_check,
};
use crate::services::{RouterDb, ServiceRegistry};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RouterConfig,
    pub db: RouterDb,
    pub registry: Arc<ServiceRegistry>,
}

/// A built server: bound listener plus the state it will serve with.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect the log store, build the registry and bind the listener.
    pub async fn build(config: RouterConfig) -> Result<Self, AppError> {
        let db = RouterDb::connect(
            &config.mongodb.uri,
            &config.mongodb.database,
            Duration::from_millis(config.mongodb.server_selection_timeout_ms),
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to the usage log database: {}", e);
            e
        })?;

        // Log queries work without indexes, so an unreachable database at
        // boot is not fatal.
        if let Err(e) = db.initialize_indexes().await {
            tracing::warn!(
                "Failed to initialize service log indexes (continuing): {}",
                e
            );
        }

        let registry = Arc::new(ServiceRegistry::with_default_services(
            Duration::from_millis(config.handler_timeout_ms),
        ));
        tracing::info!(
            services = ?registry.service_names(),
            "AI service registry initialized"
        );

        let state = AppState {
            config: config.clone(),
            db,
            registry,
        };

        // Port 0 selects an ephemeral port, which the tests use
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("AI router service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Port the listener ended up bound to.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Handle to the usage log store.
    pub fn db(&self) -> &RouterDb {
        &self.state.db
    }

    /// Serve requests until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.http_listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Build the service router with middleware layers applied.
pub fn build_router(state: AppState) -> Router {
    // The dispatch route accepts any method: the handler itself answers
    // non-POST requests with 405 and records the usage log entry.
    Router::new()
        .route("/run", any(dispatch_request))
        .route("/run/", any(dispatch_request))
        .route("/stats", get(get_service_stats))
        .route("/logs", get(list_service_logs))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost layer, so the request id is on the request before the
        // trace span reads it
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
