use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use fraud_scoring_service::config::Config;
use fraud_scoring_service::state::AppState;
use fraud_scoring_service::{handlers, middleware as fraud_middleware};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = Config::from_env()?;
    info!(port = config.port, "starting fraud-scoring-service");

    let state = AppState::bootstrap(config.clone()).await?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            state
                .config
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, "x-api-key".parse().unwrap()]);

    let app = Router::new()
        .route("/api/v1/fraud/score", post(handlers::score_endpoint))
        .route("/health", get(handlers::health))
        .route("/health/ready", get(handlers::health_ready))
        .route("/metrics", get(handlers::metrics_endpoint))
        .with_state(state)
        .layer(axum::middleware::from_fn(fraud_middleware::security_headers))
        .layer(cors);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "fraud-scoring-service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.api_graceful_shutdown_timeout_secs))
        .await?;

    Ok(())
}

async fn shutdown_signal(grace_period_secs: u64) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(grace_period_secs, "shutdown signal received, draining in-flight requests");

    // Resolving now lets axum stop accepting new connections and start
    // waiting for in-flight ones to finish. Bound that wait by the
    // configured grace period: if the drain is still running once it
    // elapses, force the process down rather than hanging indefinitely.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(grace_period_secs)).await;
        warn!(grace_period_secs, "graceful shutdown grace period elapsed, forcing exit");
        std::process::exit(0);
    });
}
