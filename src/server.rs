// HTTP server: router assembly, CORS and graceful shutdown

use crate::clock::SystemClock;
use crate::config::GatewayConfig;
use crate::credential::{ClientCredentials, CredentialCache};
use crate::gateway::GatewayService;
use crate::routes::{airports_handler, flights_handler, health_handler, AppState};
use crate::upstream::{AmadeusClient, UpstreamClient};
use anyhow::Context;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub fn build_router(gateway: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/api/flights", get(flights_handler))
        .route("/api/airports", get(airports_handler))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

// Wires the production collaborators together
pub fn build_gateway(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let upstream: Arc<dyn UpstreamClient> = Arc::new(
        AmadeusClient::from_config(config).context("failed to build provider client")?,
    );
    let credentials = Arc::new(CredentialCache::new(
        upstream.clone(),
        ClientCredentials::new(config.client_id.clone(), config.client_secret.clone()),
        Arc::new(SystemClock),
    ));
    Ok(Arc::new(GatewayService::new(credentials, upstream)))
}

pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    info!("Initializing gateway...");
    let gateway = build_gateway(&config)?;
    let app = build_router(gateway, &config.allowed_origins);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!("Backend server running on http://localhost:{}", config.port);
    info!("Flight search endpoint: http://localhost:{}/api/flights", config.port);
    info!("Airport search endpoint: http://localhost:{}/api/airports", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
