//! EMT Madrid bus arrival sensors.
//!
//! Polls the EMT Madrid MobilityLabs API and exposes, for every bus line at
//! a stop, a sensor whose state is the number of minutes until the next bus.

pub mod domain;
pub mod emt;
pub mod sensor;
pub mod web;
