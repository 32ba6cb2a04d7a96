use commanddeck_api::api::{self, AppState};
use commanddeck_api::config::RelayConfig;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::from_env()?;

    // One registry for the whole process, shared by every endpoint
    let state = AppState::new(config.send_timeout);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer());

    let addr = config.bind_addr();
    tracing::info!("CommandDeck relay starting...");
    tracing::info!("WebSocket endpoint: ws://{}/ws", addr);
    tracing::info!("Event injection: POST http://{}/event", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CommandDeck relay shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
