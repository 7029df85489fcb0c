//! Web layer exposing sensor states.
//!
//! Provides a small JSON API so the entities can be read by a home
//! automation host or a dashboard.

mod dto;
mod routes;
mod state;

pub use dto::{ErrorResponse, SensorListResponse};
pub use routes::create_router;
pub use state::AppState;
