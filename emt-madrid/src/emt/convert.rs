//! Conversion from EMT response envelopes to domain types.
//!
//! Each function here is pure: it inspects a decoded [`Envelope`] and returns
//! an outcome describing what the client should do with its snapshot. No I/O
//! happens in this module.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{
    ArrivalEstimate, Coordinates, LineRecord, StopDetails, arrival_minutes, resolve_direction,
};

use super::error::EmtError;
use super::types::{
    AroundStopData, ArrivalsData, BasicLine, DetailedLine, Envelope, Geometry, LoginData, Numeric,
    StopDetailData,
};

/// Status codes carried in the response envelope.
pub mod codes {
    /// Login accepted.
    pub const LOGIN_OK: &str = "01";
    /// Token rejected. On the arrivals endpoint this means the stop is disabled.
    pub const TOKEN_REJECTED: &str = "80";
    /// Detail endpoint degraded, use the around-stop endpoint instead.
    pub const DETAIL_DEGRADED: &str = "81";
    /// Stop disabled or nonexistent.
    pub const STOP_DISABLED: &str = "90";
    /// Daily request quota exhausted.
    pub const RATE_LIMITED: &str = "98";
}

/// Result of a login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted.
    Token(String),
    /// Credentials rejected with the given code.
    Rejected { code: String },
}

/// Result of a stop-info request.
#[derive(Debug, Clone, PartialEq)]
pub enum StopInfoOutcome {
    /// The stop is disabled or does not exist.
    Disabled,
    /// The access token was refused.
    TokenInvalid,
    /// The daily quota is exhausted.
    RateLimited,
    /// The detail endpoint is degraded; ask the around-stop endpoint.
    DegradedFallback,
    /// Stop metadata to apply to the snapshot.
    FullSuccess(StopDetails),
}

/// Result of an arrivals request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrivalsOutcome {
    /// The stop is disabled or does not exist.
    StopDisabled,
    /// Estimates to apply to the snapshot.
    Estimates(Vec<ArrivalEstimate>),
}

/// A line description that carries its direction as a flag plus two
/// terminal names. Implemented by both stop-info schemas so a single
/// resolution routine serves them.
pub trait DirectionalLine {
    fn label(&self) -> &str;
    fn direction(&self) -> &str;
    fn side_a(&self) -> &str;
    fn side_b(&self) -> &str;

    /// A record with destination and origin resolved from the direction flag.
    fn directional_record(&self) -> LineRecord {
        let (destination, origin) =
            resolve_direction(self.direction(), self.side_a(), self.side_b());
        LineRecord::new(destination, origin)
    }
}

impl DirectionalLine for DetailedLine {
    fn label(&self) -> &str {
        &self.label
    }
    fn direction(&self) -> &str {
        &self.direction
    }
    fn side_a(&self) -> &str {
        &self.header_a
    }
    fn side_b(&self) -> &str {
        &self.header_b
    }
}

impl DirectionalLine for BasicLine {
    fn label(&self) -> &str {
        &self.label
    }
    fn direction(&self) -> &str {
        &self.to
    }
    fn side_a(&self) -> &str {
        &self.name_a
    }
    fn side_b(&self) -> &str {
        &self.name_b
    }
}

/// Interpret a login response.
pub fn login_outcome(envelope: Envelope) -> Result<LoginOutcome, EmtError> {
    if envelope.code != codes::LOGIN_OK {
        return Ok(LoginOutcome::Rejected {
            code: envelope.code,
        });
    }

    let data: LoginData = first_item(envelope.data, "token")?;
    Ok(LoginOutcome::Token(data.access_token))
}

/// Interpret a response from the stop detail endpoint.
pub fn stop_detail_outcome(envelope: Envelope) -> Result<StopInfoOutcome, EmtError> {
    if let Some(outcome) = soft_stop_outcome(&envelope.code) {
        return Ok(outcome);
    }
    if envelope.code == codes::DETAIL_DEGRADED {
        return Ok(StopInfoOutcome::DegradedFallback);
    }
    parse_detailed_stop(envelope.data).map(StopInfoOutcome::FullSuccess)
}

/// Interpret a response from the around-stop fallback endpoint.
///
/// The fallback never degrades further, so `DegradedFallback` is not
/// returned from here.
pub fn around_stop_outcome(envelope: Envelope) -> Result<StopInfoOutcome, EmtError> {
    if let Some(outcome) = soft_stop_outcome(&envelope.code) {
        return Ok(outcome);
    }
    parse_around_stop(envelope.data).map(StopInfoOutcome::FullSuccess)
}

/// Interpret a response from the arrivals endpoint.
pub fn arrivals_outcome(envelope: Envelope) -> Result<ArrivalsOutcome, EmtError> {
    if envelope.code == codes::TOKEN_REJECTED {
        return Ok(ArrivalsOutcome::StopDisabled);
    }

    let data: ArrivalsData = first_item(envelope.data, "arrival times")?;
    let estimates = data
        .arrive
        .into_iter()
        .filter_map(|item| {
            let line = item.line?;
            match item.estimate_arrive {
                Some(secs) => Some(ArrivalEstimate {
                    line,
                    minutes: arrival_minutes(secs),
                    distance: item.distance_bus,
                }),
                None => {
                    warn!(line = %line, "skipping arrival without an estimate");
                    None
                }
            }
        })
        .collect();

    Ok(ArrivalsOutcome::Estimates(estimates))
}

fn soft_stop_outcome(code: &str) -> Option<StopInfoOutcome> {
    match code {
        codes::STOP_DISABLED => Some(StopInfoOutcome::Disabled),
        codes::TOKEN_REJECTED => Some(StopInfoOutcome::TokenInvalid),
        codes::RATE_LIMITED => Some(StopInfoOutcome::RateLimited),
        _ => None,
    }
}

/// Parse the rich schema: `data[0].stops[0]` with schedule per line.
fn parse_detailed_stop(data: serde_json::Value) -> Result<StopDetails, EmtError> {
    const CONTEXT: &str = "bus stop information";

    let detail: StopDetailData = first_item(data, CONTEXT)?;
    let stop = detail
        .stops
        .into_iter()
        .next()
        .ok_or_else(|| EmtError::malformed(CONTEXT, "empty stops list"))?;

    let mut lines = BTreeMap::new();
    for line in stop.data_line {
        let directional = line.directional_record();
        let record = LineRecord {
            max_freq: Some(frequency(line.max_freq, "maxFreq")?),
            min_freq: Some(frequency(line.min_freq, "minFreq")?),
            start_time: Some(line.start_time),
            end_time: Some(line.stop_time),
            day_type: Some(line.day_type),
            ..directional
        };
        lines.insert(line.label, record);
    }

    Ok(StopDetails {
        name: stop.name,
        coordinates: coordinates(&stop.geometry, CONTEXT)?,
        address: stop.postal_address,
        lines,
    })
}

/// Parse the reduced schema: `data[0]` with only directional line info.
fn parse_around_stop(data: serde_json::Value) -> Result<StopDetails, EmtError> {
    const CONTEXT: &str = "bus stop information";

    let stop: AroundStopData = first_item(data, CONTEXT)?;
    let lines = stop
        .lines
        .iter()
        .map(|line| (line.label().to_string(), line.directional_record()))
        .collect();

    Ok(StopDetails {
        name: stop.stop_name,
        coordinates: coordinates(&stop.geometry, CONTEXT)?,
        address: stop.address,
        lines,
    })
}

/// Decode the first element of the `data` array.
fn first_item<T: DeserializeOwned>(
    data: serde_json::Value,
    context: &'static str,
) -> Result<T, EmtError> {
    let serde_json::Value::Array(items) = data else {
        return Err(EmtError::malformed(context, "data is not an array"));
    };
    let first = items
        .into_iter()
        .next()
        .ok_or_else(|| EmtError::malformed(context, "empty data array"))?;
    serde_json::from_value(first).map_err(|e| EmtError::malformed(context, e.to_string()))
}

fn coordinates(geometry: &Geometry, context: &'static str) -> Result<Coordinates, EmtError> {
    match geometry.coordinates.as_slice() {
        [longitude, latitude, ..] => Ok(Coordinates {
            longitude: *longitude,
            latitude: *latitude,
        }),
        _ => Err(EmtError::malformed(context, "coordinates need two values")),
    }
}

fn frequency(value: Numeric<u32>, field: &str) -> Result<u32, EmtError> {
    value
        .into_inner()
        .map_err(|e| EmtError::malformed("bus stop information", format!("{field}: {e}")))
}
