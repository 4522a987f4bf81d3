//! Web layer for the rest-area service.
//!
//! Provides HTTP endpoints for finding rest areas along a route and
//! inspecting the loaded reference data.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
