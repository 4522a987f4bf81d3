//! Rest-area candidates.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A rest area that may be recommended along a route.
///
/// `direction_label` is the free-text direction field of the source feed
/// (e.g. `"하행"`, `"서울방향"`, `"양방향"`); it is interpreted by the
/// direction resolver, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestAreaCandidate {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinate,
    #[serde(default)]
    pub highway_name: Option<String>,
    #[serde(default)]
    pub highway_code: Option<String>,
    #[serde(default)]
    pub direction_label: Option<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl RestAreaCandidate {
    /// Create a candidate with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates,
            highway_name: None,
            highway_code: None,
            direction_label: None,
            facilities: Vec::new(),
        }
    }

    pub fn with_highway(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.highway_code = Some(code.into());
        self.highway_name = Some(name.into());
        self
    }

    pub fn with_direction_label(mut self, label: impl Into<String>) -> Self {
        self.direction_label = Some(label.into());
        self
    }

    /// The destination hint embedded in the name, if any.
    ///
    /// Rest areas are commonly named `"망향(부산)"`: the parenthesised part
    /// names the city the carriageway heads towards.
    pub fn destination_hint(&self) -> Option<&str> {
        let open = self.name.find('(')?;
        let rest = &self.name[open + '('.len_utf8()..];
        let close = rest.find(')')?;
        let hint = rest[..close].trim();
        (!hint.is_empty()).then_some(hint)
    }
}
