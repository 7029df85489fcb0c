//! Data transfer objects for web responses.

use serde::Serialize;

use crate::sensor::EntityState;

/// Response listing all sensors.
#[derive(Debug, Serialize)]
pub struct SensorListResponse {
    pub sensors: Vec<EntityState>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
