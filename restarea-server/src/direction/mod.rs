//! Carriageway direction resolution.
//!
//! A rest area on a divided highway serves one carriageway. This module
//! decides, per candidate, whether it sits on the carriageway the route
//! travels on. Interchange order gives an authoritative answer when enough
//! interchanges line the route; otherwise named heuristic signals are
//! combined into a confidence score.

mod context;
mod resolver;
pub mod signals;

pub use context::{RouteContext, route_direction_from_weights};
pub use resolver::{DirectionAssessment, DirectionConfig, DirectionResolver};
pub use signals::Signal;
