//! Sensor platform setup and polling.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::emt::{EmtClient, EmtError, Session};

use super::config::{ConfigError, PlatformConfig};
use super::entity::{BusLineSensor, SharedClient, sensor_name};

/// Errors that abort platform setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The API could not be reached or returned garbage
    #[error(transparent)]
    Emt(#[from] EmtError),
}

/// Build the client for the configured stop and one sensor per line.
///
/// Logs in, fetches the stop's lines once and creates a sensor for every
/// configured line the stop serves (all lines when none are configured).
/// Lines the stop does not serve are skipped with an error log. Rejected
/// credentials yield an empty sensor list rather than an error.
pub async fn setup_platform(config: &PlatformConfig) -> Result<Vec<BusLineSensor>, SetupError> {
    config.validate()?;

    let stop_id = config.stop;
    let mut client = EmtClient::new(config.emt_config(), stop_id)?;
    client.authenticate().await?;
    client.update_stop_info(stop_id).await?;

    if client.session() == &Session::Rejected {
        warn!(stop = %stop_id, "no sensors created: login was rejected");
        return Ok(Vec::new());
    }

    let stop = client.get_stop_info();
    let stop_name = stop
        .name()
        .map_or_else(|| stop_id.to_string(), str::to_string);
    let requested: Vec<String> = if config.lines.is_empty() {
        stop.lines().keys().cloned().collect()
    } else {
        config.lines.clone()
    };

    let mut lines = Vec::with_capacity(requested.len());
    for line in requested {
        if client.line(&line).is_some() {
            lines.push(line);
        } else {
            error!(
                line = %line,
                stop = %stop_id,
                "Sensor setup failed. Line not serviced at this stop"
            );
        }
    }

    let shared: SharedClient = Arc::new(Mutex::new(client));
    let mut sensors = Vec::with_capacity(lines.len());
    for line in lines {
        let name = sensor_name(&line, &stop_name);
        let sensor =
            BusLineSensor::new(Arc::clone(&shared), stop_id, line, name, &config.icon).await?;
        sensors.push(sensor);
    }

    info!(stop = %stop_id, sensors = sensors.len(), "sensor platform ready");
    Ok(sensors)
}

/// Update every sensor once. Failures are logged and counted; the sensor
/// keeps its previous state until the next cycle.
pub async fn update_all(sensors: &mut [BusLineSensor]) -> usize {
    let mut failures = 0;
    for sensor in sensors.iter_mut() {
        if let Err(e) = sensor.update().await {
            warn!(entity_id = sensor.entity_id(), error = %e, "sensor update failed");
            failures += 1;
        }
    }
    failures
}
