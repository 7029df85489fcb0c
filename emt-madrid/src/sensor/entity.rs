//! Bus line sensor entity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::StopId;
use crate::emt::{EmtClient, EmtError};

/// Attribution reported by every sensor.
pub const ATTRIBUTION: &str = "Data provided by EMT Madrid MobilityLabs";

/// Unit of the sensor state.
pub const UNIT_OF_MEASUREMENT: &str = "min";

/// State reported while no arrival is known.
pub const STATE_UNKNOWN: &str = "unknown";

/// Client shared by all sensors of one stop.
pub type SharedClient = Arc<Mutex<EmtClient>>;

/// Attributes published alongside the state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAttributes {
    pub next_bus: Option<u32>,
    pub line: String,
    pub distance: Option<i64>,
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub max_frequency: Option<u32>,
    pub min_frequency: Option<u32>,
    pub stop_id: u32,
    pub stop_name: Option<String>,
    pub stop_address: Option<String>,
    pub attribution: &'static str,
    pub unit_of_measurement: &'static str,
    pub icon: String,
}

/// Serializable view of a sensor, as published to the host.
#[derive(Debug, Clone, Serialize)]
pub struct EntityState {
    pub entity_id: String,
    pub name: String,
    /// Minutes to the next bus, or `"unknown"`.
    pub state: String,
    pub attributes: SensorAttributes,
    pub last_updated: DateTime<Utc>,
}

/// Sensor for one bus line at one stop.
///
/// The state is the number of minutes until the next bus. Every call to
/// [`update`](Self::update) polls the arrivals endpoint through the shared
/// client and republishes the line's data.
pub struct BusLineSensor {
    client: SharedClient,
    stop_id: StopId,
    line: String,
    name: String,
    entity_id: String,
    icon: String,
    state: Option<u32>,
    attributes: SensorAttributes,
    last_updated: DateTime<Utc>,
}

impl BusLineSensor {
    /// Create a sensor and populate it with a first arrivals poll.
    pub async fn new(
        client: SharedClient,
        stop_id: StopId,
        line: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Self, EmtError> {
        let line = line.into();
        let name = name.into();
        let icon = icon.into();

        let mut sensor = Self {
            entity_id: entity_id_for(&name),
            attributes: empty_attributes(&line, stop_id, &icon),
            client,
            stop_id,
            line,
            name,
            icon,
            state: None,
            last_updated: Utc::now(),
        };
        sensor.update().await?;
        Ok(sensor)
    }

    /// Poll arrivals and republish this line's data.
    pub async fn update(&mut self) -> Result<(), EmtError> {
        let shared = Arc::clone(&self.client);
        let mut client = shared.lock().await;
        client.update_arrival_times(self.stop_id).await?;
        self.publish(&client);
        Ok(())
    }

    /// Read the client's snapshot without polling.
    fn publish(&mut self, client: &EmtClient) {
        let (next, following) = client.get_arrival_time(&self.line);
        let info = client.get_line_info(&self.line);
        let stop = client.get_stop_info();

        self.state = next;
        self.attributes = SensorAttributes {
            next_bus: following,
            line: self.line.clone(),
            distance: info.next_distance(),
            destination: info.destination,
            origin: info.origin,
            start_time: info.start_time,
            end_time: info.end_time,
            max_frequency: info.max_freq,
            min_frequency: info.min_freq,
            stop_id: self.stop_id.get(),
            stop_name: stop.name().map(str::to_string),
            stop_address: stop.address().map(str::to_string),
            attribution: ATTRIBUTION,
            unit_of_measurement: UNIT_OF_MEASUREMENT,
            icon: self.icon.clone(),
        };
        self.last_updated = Utc::now();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn unit_of_measurement(&self) -> &'static str {
        UNIT_OF_MEASUREMENT
    }

    /// Minutes until the next bus, if one is known.
    pub fn state(&self) -> Option<u32> {
        self.state
    }

    pub fn attributes(&self) -> &SensorAttributes {
        &self.attributes
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Snapshot of the sensor for publication.
    pub fn entity_state(&self) -> EntityState {
        EntityState {
            entity_id: self.entity_id.clone(),
            name: self.name.clone(),
            state: self
                .state
                .map_or_else(|| STATE_UNKNOWN.to_string(), |m| m.to_string()),
            attributes: self.attributes.clone(),
            last_updated: self.last_updated,
        }
    }
}

impl std::fmt::Debug for BusLineSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusLineSensor")
            .field("entity_id", &self.entity_id)
            .field("stop_id", &self.stop_id)
            .field("line", &self.line)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn empty_attributes(line: &str, stop_id: StopId, icon: &str) -> SensorAttributes {
    SensorAttributes {
        next_bus: None,
        line: line.to_string(),
        distance: None,
        destination: None,
        origin: None,
        start_time: None,
        end_time: None,
        max_frequency: None,
        min_frequency: None,
        stop_id: stop_id.get(),
        stop_name: None,
        stop_address: None,
        attribution: ATTRIBUTION,
        unit_of_measurement: UNIT_OF_MEASUREMENT,
        icon: icon.to_string(),
    }
}

/// Display name of the sensor for `line` at a stop.
pub fn sensor_name(line: &str, stop_name: &str) -> String {
    format!("Bus {line} - {stop_name}")
}

/// Entity id derived from a display name: `sensor.` plus its slug.
pub fn entity_id_for(name: &str) -> String {
    format!("sensor.{}", slugify(name))
}

/// Lowercase ASCII slug with `_` separators.
///
/// Spanish accented letters are folded to their base letter so that
/// "Cibeles-Casa de América" becomes `cibeles_casa_de_america`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ª' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'º' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slug_of_stop_names() {
        assert_eq!(
            slugify("Bus 27 - Cibeles-Casa de América"),
            "bus_27_cibeles_casa_de_america"
        );
        assert_eq!(slugify("Bus N26 - Alonso Martínez"), "bus_n26_alonso_martinez");
        assert_eq!(slugify("Pº de la Castellana"), "po_de_la_castellana");
        assert_eq!(slugify("  Año  Nuevo!! "), "ano_nuevo");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn entity_ids_follow_names() {
        let name = sensor_name("27", "Cibeles-Casa de América");
        assert_eq!(name, "Bus 27 - Cibeles-Casa de América");
        assert_eq!(entity_id_for(&name), "sensor.bus_27_cibeles_casa_de_america");
    }

    #[test]
    fn empty_attributes_carry_fixed_fields() {
        let attrs = empty_attributes("27", StopId::new(72).unwrap(), "mdi:bus");
        assert_eq!(attrs.line, "27");
        assert_eq!(attrs.stop_id, 72);
        assert_eq!(attrs.attribution, ATTRIBUTION);
        assert_eq!(attrs.unit_of_measurement, "min");
        assert_eq!(attrs.next_bus, None);
        assert_eq!(attrs.distance, None);
    }

    #[test]
    fn attributes_serialize_with_host_names() {
        let attrs = empty_attributes("5", StopId::new(72).unwrap(), "mdi:bus");
        let json = serde_json::to_value(&attrs).unwrap();

        for key in [
            "next_bus",
            "line",
            "distance",
            "destination",
            "origin",
            "start_time",
            "end_time",
            "max_frequency",
            "min_frequency",
            "stop_id",
            "stop_name",
            "stop_address",
            "attribution",
            "unit_of_measurement",
            "icon",
        ] {
            assert!(json.get(key).is_some(), "missing attribute {key}");
        }
        assert!(json["next_bus"].is_null());
    }

    proptest! {
        #[test]
        fn slugs_are_clean(text in ".{0,40}") {
            let slug = slugify(&text);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!slug.starts_with('_'));
            prop_assert!(!slug.ends_with('_'));
            prop_assert!(!slug.contains("__"));
        }
    }
}
