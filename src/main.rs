use anyhow::Result;
use tokio::sync::broadcast;

use matrix_pushgw::config::Settings;
use matrix_pushgw::server::{create_app, serve, AppState};
use matrix_pushgw::shutdown::shutdown_signal_handler;
use matrix_pushgw::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    let _telemetry = init_telemetry(&settings.otel, &settings.logging)?;
    tracing::info!("Starting Matrix Push Gateway...");

    settings.validate()?;
    tracing::info!(
        push_server_url = %settings.push.server_url,
        plain_port = settings.server.port,
        tls_port = settings.tls.port,
        "Configuration loaded"
    );

    // Create application state
    let state = AppState::new(settings.clone())?;
    let app = create_app(state);

    // Signal handling
    let (shutdown_tx, _) = broadcast::channel(1);
    tokio::spawn(shutdown_signal_handler(shutdown_tx.clone()));

    // Run listeners until shutdown
    serve(app, &settings, &shutdown_tx).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
