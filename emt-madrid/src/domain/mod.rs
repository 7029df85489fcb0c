//! Domain types for the EMT Madrid integration.
//!
//! These types hold validated stop and line data independent of the wire
//! format. The API client owns a [`StopSnapshot`]; everything else reads it.

mod line;
mod snapshot;
mod stop;

pub use line::{
    ArrivalEstimate, LineInfo, LineRecord, MAX_ARRIVAL_MINUTES, arrival_minutes,
    resolve_direction,
};
pub use snapshot::{Coordinates, StopDetails, StopSnapshot};
pub use stop::{InvalidStopId, StopId};
