//! EMT Madrid MobilityLabs client.
//!
//! This module provides an HTTP client for the EMT Madrid OpenAPI, which
//! publishes real-time bus arrival estimates for every stop in the city.
//!
//! Key characteristics of the API:
//! - Every call except login needs an `accessToken` header obtained from
//!   the login endpoint
//! - Responses always carry a two-digit `code`; non-error conditions such
//!   as a disabled stop or an exhausted quota still return HTTP 200
//! - Arrival estimates are in seconds; we report whole minutes capped at 45

mod client;
mod convert;
mod error;
mod types;

pub use client::{EmtClient, EmtConfig, Session};
pub use convert::{ArrivalsOutcome, DirectionalLine, LoginOutcome, StopInfoOutcome, codes};
pub use error::EmtError;
pub use types::{
    AroundStopData, ArriveItem, ArrivalsData, BasicLine, DetailedLine, DetailedStop, Envelope,
    Geometry, LoginData, Numeric, StopDetailData,
};
