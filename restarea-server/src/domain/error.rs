//! Domain error types.
//!
//! These errors represent invalid caller input. Missing or unusable
//! reference data never produces an error; it degrades results instead.

/// Errors for a route that cannot be used as a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The polyline has no points
    #[error("route must contain at least one point")]
    Empty,

    /// A polyline vertex is not a usable coordinate
    #[error("route point {index} is not a valid coordinate ({lat}, {lng})")]
    InvalidPoint { index: usize, lat: f64, lng: f64 },
}
