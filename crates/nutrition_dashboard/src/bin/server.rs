use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use metrics_exporter_prometheus::PrometheusBuilder;
use nutrition_dashboard::{AppState, LoggingFetcher, ServerConfig, router};
use nutrition_engine::http_client::ReqwestNutritionClient;
use nutrition_engine::retry::{RetryPolicy, RetryingFetcher};
use nutrition_engine::{ClientConfig, DayFetcher, EngineConfig, RecommendationSource};
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let server_config = ServerConfig::from_env()?;

    // `NUTRITION_LOG_LEVEL`, falling back to `RUST_LOG`, default `info`.
    let env_filter = tracing_subscriber::EnvFilter::try_new(&server_config.log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    info!(log_filter = %server_config.log_filter, "nutrition-dashboard: log filter");

    let handle = PrometheusBuilder::new().install_recorder()?;

    let engine_config = EngineConfig::from_env()?;
    let client_config = match ClientConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "missing backend settings; aborting startup");
            std::process::exit(1);
        }
    };
    info!(
        base_url = %client_config.base_url,
        max_retries = client_config.max_retries,
        "nutrition backend"
    );

    let client = ReqwestNutritionClient::from_config(&client_config)?;
    let backend = Arc::new(LoggingFetcher::new(RetryingFetcher::new(
        client,
        RetryPolicy::with_max_retries(client_config.max_retries),
    )));
    let days: Arc<dyn DayFetcher> = backend.clone();
    let recommendations: Arc<dyn RecommendationSource> = backend;
    let state = Arc::new(AppState::new(days, recommendations, &engine_config, handle));

    let app = router(state)
        .layer(DefaultBodyLimit::max(server_config.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            server_config.request_timeout,
        ));

    let addr = server_config.address;
    info!(%addr, max_body_bytes = server_config.max_body_size, "starting HTTP server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service());
    if let Err(e) = server
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to install ctrl+c handler: {e}");
            }
        })
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
