//! Sensor entities exposing bus arrivals to the host.
//!
//! One [`BusLineSensor`] exists per (stop, line) pair. All sensors of a stop
//! share a single [`EmtClient`](crate::emt::EmtClient) and each poll refreshes
//! the arrivals of the whole stop before reading its own line.

mod config;
mod entity;
mod platform;

pub use config::{ConfigError, DEFAULT_ICON, PlatformConfig};
pub use entity::{
    ATTRIBUTION, BusLineSensor, EntityState, STATE_UNKNOWN, SensorAttributes, SharedClient,
    UNIT_OF_MEASUREMENT, entity_id_for, sensor_name, slugify,
};
pub use platform::{SetupError, setup_platform, update_all};
