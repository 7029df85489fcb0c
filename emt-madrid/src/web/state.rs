//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::sensor::{BusLineSensor, EntityState, update_all};

/// Shared application state.
///
/// The sensors are only touched by the poll loop. Request handlers read the
/// published states, which are swapped in once a refresh has finished, so
/// reads never wait on the upstream API.
#[derive(Clone)]
pub struct AppState {
    sensors: Arc<Mutex<Vec<BusLineSensor>>>,
    published: Arc<RwLock<Vec<EntityState>>>,
}

impl AppState {
    /// Create a new app state, publishing the sensors' current states.
    pub fn new(sensors: Vec<BusLineSensor>) -> Self {
        let published = sensors.iter().map(BusLineSensor::entity_state).collect();
        Self {
            sensors: Arc::new(Mutex::new(sensors)),
            published: Arc::new(RwLock::new(published)),
        }
    }

    /// Poll every sensor once and publish the result. Returns the number of
    /// failed updates.
    pub async fn refresh(&self) -> usize {
        let mut sensors = self.sensors.lock().await;
        let failures = update_all(&mut sensors).await;
        let states: Vec<EntityState> = sensors.iter().map(BusLineSensor::entity_state).collect();
        drop(sensors);

        let mut guard = self.published.write().await;
        *guard = states;

        failures
    }

    /// Published state of every sensor.
    pub async fn states(&self) -> Vec<EntityState> {
        self.published.read().await.clone()
    }

    /// Published state of one sensor.
    pub async fn state(&self, entity_id: &str) -> Option<EntityState> {
        let published = self.published.read().await;
        published.iter().find(|s| s.entity_id == entity_id).cloned()
    }

    /// Number of published sensors.
    pub async fn len(&self) -> usize {
        self.published.read().await.len()
    }
}
