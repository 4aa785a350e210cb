//! Web layer for the NexTrip demo server.
//!
//! Republishes the cached NexTrip client as JSON endpoints.

mod dto;
mod error;
mod extract;
mod routes;
mod state;


pub use dto::*;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
