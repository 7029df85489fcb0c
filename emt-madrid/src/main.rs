use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use emt_madrid::sensor::{PlatformConfig, setup_platform};
use emt_madrid::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Read EMT_CONFIG or the individual EMT_* variables
    let config = match PlatformConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    info!(stop = %config.stop, "setting up EMT Madrid sensors");
    let sensors = match setup_platform(&config).await {
        Ok(sensors) => sensors,
        Err(e) => {
            error!(error = %e, "sensor setup failed");
            std::process::exit(1);
        }
    };
    if sensors.is_empty() {
        warn!("no sensors were created; check credentials, stop id and lines");
    }

    let state = AppState::new(sensors);

    // Poll arrivals on a fixed schedule
    let poll_state = state.clone();
    let scan_interval = config.scan_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(scan_interval);
        interval.tick().await; // First tick is immediate; setup already polled
        loop {
            interval.tick().await;
            let failures = poll_state.refresh().await;
            if failures > 0 {
                warn!(failures, "some sensors failed to update; retrying next cycle");
            }
        }
    });

    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.listen, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %config.listen, "EMT Madrid sensors listening");
    info!("  GET /health              - Health check");
    info!("  GET /sensors             - All sensor states");
    info!("  GET /sensors/:entity_id  - One sensor state");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
