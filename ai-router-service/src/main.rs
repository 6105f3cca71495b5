use ai_router_service::config::RouterConfig;
use ai_router_service::services::init_metrics;
use ai_router_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // No tracing yet, so configuration failures go to stderr
    let config = RouterConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Initialize tracing
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing(
        "ai-router-service",
        &config.common.log_level,
        otlp_endpoint.as_deref(),
    );

    // Initialize metrics
    init_metrics();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
