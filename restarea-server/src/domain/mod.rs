//! Domain types for rest-area resolution.
//!
//! Plain data shared by every stage: coordinates, carriageway directions,
//! interchange entries and rest-area candidates.

mod coord;
mod direction;
mod error;
mod highway;
mod interchange;
mod rest_area;

pub use coord::Coordinate;
pub use direction::{Carriageway, Direction};
pub use error::RouteError;
pub use highway::{highway_base_name, normalize_highway_name, same_highway};
pub use interchange::Interchange;
pub use rest_area::RestAreaCandidate;
