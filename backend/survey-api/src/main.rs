use std::sync::Arc;
use std::time::Duration;
use survey_capture_api::{config::Config, create_router, services::AppState, telemetry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // OpenTelemetry is only wired in when an endpoint is configured
    let provider = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => Some(telemetry::init_provider(endpoint)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey_capture_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(provider.as_ref().map(telemetry::layer))
        .init();

    tracing::info!("Starting survey capture API");
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let bind_addr = config.bind_addr.clone();
    let sweep_every = Duration::from_secs(config.sweep_interval_secs);

    let app_state = Arc::new(AppState::new(config).await?);
    let sweeper = app_state.sessions.spawn_expiry_sweeper(sweep_every);

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    telemetry::shutdown(provider);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
