//! Interchange catalog entries.

use serde::{Deserialize, Serialize};

use super::{Carriageway, Coordinate};

/// One carriageway-specific entry for a physical interchange.
///
/// Every physical interchange appears twice in a catalog, once per
/// carriageway. `weight` orders the entries of one carriageway in the
/// direction of travel: it increases along a DOWN carriageway and decreases
/// along an UP carriageway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interchange {
    /// `"{unit_code}_{UP|DOWN}"`.
    pub id: String,
    pub unit_code: String,
    pub name: String,
    pub highway_name: String,
    pub highway_code: String,
    pub direction: Carriageway,
    pub weight: u32,
    /// Distance from the highway origin, in km.
    pub distance_from_start: f64,
    pub coordinates: Coordinate,
    pub prev_unit: Option<String>,
    pub next_unit: Option<String>,
}

impl Interchange {
    pub fn make_id(unit_code: &str, direction: Carriageway) -> String {
        format!("{}_{}", unit_code, direction.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_format() {
        assert_eq!(Interchange::make_id("101", Carriageway::Up), "101_UP");
        assert_eq!(Interchange::make_id("101", Carriageway::Down), "101_DOWN");
    }
}
