//! Device Enrolment Service
//!
//! REST API for pairing-gated device enrolment on the venue-control network

use anyhow::{Context, Result};
use enrolment_service::{create_router, AppState, Config, EnrolmentService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enrolment_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .ensure_directories()
        .context("Failed to prepare broker directories")?;

    info!("Starting Device Enrolment Service");
    info!("Certificate store: {}", config.devices_dir.display());
    info!("Staging area: {}", config.staging_dir.display());
    info!("Signing helper: {}", config.signing_helper.display());
    info!(
        "Pairing window: {}s, signing timeout: {}s",
        config.pairing_window.as_secs(),
        config.signing_timeout.as_secs()
    );

    // Create application state
    let state = AppState {
        service: EnrolmentService::new(&config),
        pairing_pin: config.pairing_pin.clone(),
    };

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Device Enrolment Service running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
