//! EMT MobilityLabs response DTOs.
//!
//! Every endpoint wraps its payload in the same envelope:
//! `{"code": "00", "description": ..., "data": [...]}`. Only `code` and
//! `data` are kept; `description` is a string or a list of per-language
//! messages depending on the endpoint and is ignored. The envelope is
//! decoded first so the status code can be inspected; `data` is only decoded
//! into one of the typed payloads below once the code says it is meaningful.

use std::str::FromStr;

use serde::Deserialize;

/// Common response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Two-digit status code ("00", "01", "80", ...).
    #[serde(default)]
    pub code: String,

    /// Endpoint-specific payload, usually a one-element array.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payload of `GET /v1/mobilitylabs/user/login/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
}

/// GeoJSON point.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// `[longitude, latitude]`.
    pub coordinates: Vec<f64>,
}

/// Payload of `GET /v1/transport/busemtmad/stops/{id}/detail/`.
#[derive(Debug, Clone, Deserialize)]
pub struct StopDetailData {
    pub stops: Vec<DetailedStop>,
}

/// A stop in the detail response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStop {
    pub name: String,
    pub postal_address: String,
    pub geometry: Geometry,
    pub data_line: Vec<DetailedLine>,
}

/// A line in the detail response, with schedule information.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedLine {
    /// Public label, e.g. "27" or "N26" (the `line` field is a zero-padded
    /// internal code and is not used).
    pub label: String,
    pub direction: String,
    pub header_a: String,
    pub header_b: String,
    pub max_freq: Numeric<u32>,
    pub min_freq: Numeric<u32>,
    pub start_time: String,
    pub stop_time: String,
    pub day_type: String,
}

/// Payload of `GET /v2/transport/busemtmad/stops/arroundstop/{id}/0/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AroundStopData {
    pub stop_name: String,
    pub address: String,
    pub geometry: Geometry,
    pub lines: Vec<BasicLine>,
}

/// A line in the around-stop response. No schedule information.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicLine {
    pub label: String,
    pub to: String,
    pub name_a: String,
    pub name_b: String,
}

/// Payload of `POST /v2/transport/busemtmad/stops/{id}/arrives/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrivalsData {
    #[serde(rename = "Arrive", default)]
    pub arrive: Vec<ArriveItem>,
}

/// A single bus approaching the stop.
#[derive(Debug, Clone, Deserialize)]
pub struct ArriveItem {
    pub line: Option<String>,

    /// Seconds until arrival.
    #[serde(rename = "estimateArrive")]
    pub estimate_arrive: Option<i64>,

    /// Meters between the bus and the stop.
    #[serde(rename = "DistanceBus")]
    pub distance_bus: Option<i64>,
}

/// A number the API sometimes sends as a JSON string (`"33"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric<T> {
    Value(T),
    Text(String),
}

impl<T: FromStr> Numeric<T> {
    pub fn into_inner(self) -> Result<T, T::Err> {
        match self {
            Numeric::Value(v) => Ok(v),
            Numeric::Text(s) => s.trim().parse(),
        }
    }
}
