//! Heuristic lookup tables for direction and highway matching.
//!
//! The tables are plain data: destination cities, highway families,
//! highway-name aliases and direction-label keywords. They are checked once
//! at startup by [`DirectionTables::new`]; the resolver code only ever sees
//! a validated set.

use std::collections::{HashMap, HashSet};

use crate::domain::{Coordinate, Direction, highway_base_name};

/// Destination cities that appear in rest-area names, with a representative location.
pub const CITIES: &[(&str, f64, f64)] = &[
    // Capital region and the northern end of the main corridors
    ("서울", 37.5665, 126.9780),
    ("인천", 37.4563, 126.7052),
    ("수원", 37.2636, 127.0286),
    ("성남", 37.4200, 127.1265),
    ("평택", 36.9921, 127.1129),
    ("천안", 36.8151, 127.1139),
    ("청주", 36.6424, 127.4890),
    ("대전", 36.3504, 127.3845),
    ("춘천", 37.8813, 127.7298),
    // South-east
    ("부산", 35.1796, 129.0756),
    ("대구", 35.8714, 128.6014),
    ("울산", 35.5384, 129.3114),
    ("창원", 35.2280, 128.6811),
    ("양산", 35.3350, 129.0373),
    ("경주", 35.8562, 129.2247),
    ("마산", 35.1982, 128.5720),
    ("진주", 35.1800, 128.1076),
    ("포항", 36.0190, 129.3435),
    ("통영", 34.8544, 128.4331),
    // East coast
    ("강릉", 37.7519, 128.8761),
    ("원주", 37.3422, 127.9202),
    ("양양", 38.0754, 128.6190),
    ("속초", 38.2070, 128.5918),
    ("동해", 37.5247, 129.1143),
    // South-west
    ("목포", 34.8118, 126.3922),
    ("광주", 35.1595, 126.8526),
    ("여수", 34.7604, 127.6622),
    ("순천", 34.9506, 127.4872),
    ("전주", 35.8242, 127.1480),
    ("당진", 36.8898, 126.6459),
];

/// Predominant axis of a highway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

/// Bearing convention of a highway family.
#[derive(Debug, Clone, PartialEq)]
pub struct HighwayFamily {
    /// Base name, e.g. `"경부"`.
    pub base_name: &'static str,
    /// Feed route code, when known.
    pub code: Option<&'static str>,
    pub axis: Axis,
    /// Compass heading of travel on the UP carriageway.
    pub up_heading: f64,
}

/// Highway families with a dominant axis.
///
/// UP is the carriageway towards Seoul, matching the label vocabulary
/// (`상행`, `북`, `서울` → UP).
pub const FAMILIES: &[HighwayFamily] = &[
    HighwayFamily { base_name: "경부", code: Some("0010"), axis: Axis::NorthSouth, up_heading: 0.0 },
    HighwayFamily { base_name: "중앙", code: Some("0550"), axis: Axis::NorthSouth, up_heading: 0.0 },
    HighwayFamily { base_name: "중부", code: Some("0350"), axis: Axis::NorthSouth, up_heading: 0.0 },
    HighwayFamily { base_name: "서해안", code: Some("0150"), axis: Axis::NorthSouth, up_heading: 0.0 },
    HighwayFamily { base_name: "호남", code: Some("0250"), axis: Axis::NorthSouth, up_heading: 0.0 },
    HighwayFamily { base_name: "영동", code: Some("0500"), axis: Axis::EastWest, up_heading: 270.0 },
    HighwayFamily { base_name: "서울양양", code: Some("0600"), axis: Axis::EastWest, up_heading: 270.0 },
];

/// Highway-name aliases: a name containing the keyword also refers to the base name.
pub const ALIASES: &[(&str, &str)] = &[
    ("영동", "영동"),
    ("중앙", "중앙"),
    ("동서", "서울양양"),
    ("서울외곽", "수도권제1순환"),
    ("외곽순환", "수도권제1순환"),
];

/// Label substrings meaning "serves both carriageways". Checked first.
pub const BOTH_KEYWORDS: &[&str] = &["양방향", "상하행", "통합", "both"];

/// Labels that mean "both" only when they are the whole label.
pub const BOTH_EXACT: &[&str] = &["양"];

pub const UP_KEYWORDS: &[&str] = &["상행", "북", "서울", "up"];

pub const DOWN_KEYWORDS: &[&str] = &["하행", "남", "부산", "down"];

/// Problems found while validating tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("table entry has an empty name")]
    EmptyName,

    #[error("city {name} has an invalid coordinate")]
    InvalidCity { name: String },

    #[error("city {name} is listed more than once")]
    DuplicateCity { name: String },

    #[error("highway family {name} has heading {heading} outside [0, 360)")]
    InvalidHeading { name: String, heading: f64 },

    #[error("direction keyword {keyword:?} maps to more than one direction")]
    AmbiguousKeyword { keyword: String },
}

/// Highway alias keywords.
#[derive(Debug, Clone, Default)]
pub struct HighwayAliases {
    entries: Vec<(String, String)>,
}

impl HighwayAliases {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Every base name `name` may refer to, including its own.
    pub fn expand(&self, name: &str) -> Vec<String> {
        let mut out = vec![highway_base_name(name)];
        for (keyword, base) in &self.entries {
            if name.contains(keyword.as_str()) && !out.contains(base) {
                out.push(base.clone());
            }
        }
        out.retain(|n| !n.is_empty());
        out
    }
}

/// Validated heuristic tables.
#[derive(Debug, Clone)]
pub struct DirectionTables {
    cities: HashMap<String, Coordinate>,
    families: Vec<HighwayFamily>,
    aliases: HighwayAliases,
    both_exact: Vec<String>,
    both: Vec<String>,
    up: Vec<String>,
    down: Vec<String>,
}

impl DirectionTables {
    /// The built-in Korean expressway tables.
    pub fn korea() -> Result<Self, TableError> {
        Self::new(
            CITIES,
            FAMILIES,
            ALIASES,
            [BOTH_EXACT, BOTH_KEYWORDS, UP_KEYWORDS, DOWN_KEYWORDS],
        )
    }

    /// Build and validate a set of tables.
    ///
    /// `keywords` is `[both_exact, both, up, down]`.
    pub fn new(
        cities: &[(&str, f64, f64)],
        families: &[HighwayFamily],
        aliases: &[(&str, &str)],
        keywords: [&[&str]; 4],
    ) -> Result<Self, TableError> {
        let mut city_map = HashMap::new();
        for (name, lat, lng) in cities {
            let name = name.trim();
            if name.is_empty() {
                return Err(TableError::EmptyName);
            }
            let coord = Coordinate::new(*lat, *lng);
            if !coord.is_valid() {
                return Err(TableError::InvalidCity {
                    name: name.to_string(),
                });
            }
            if city_map.insert(name.to_string(), coord).is_some() {
                return Err(TableError::DuplicateCity {
                    name: name.to_string(),
                });
            }
        }

        for family in families {
            if family.base_name.trim().is_empty() {
                return Err(TableError::EmptyName);
            }
            if !(0.0..360.0).contains(&family.up_heading) {
                return Err(TableError::InvalidHeading {
                    name: family.base_name.to_string(),
                    heading: family.up_heading,
                });
            }
        }

        if aliases
            .iter()
            .any(|(k, v)| k.trim().is_empty() || v.trim().is_empty())
        {
            return Err(TableError::EmptyName);
        }

        let [both_exact, both, up, down] = keywords.map(|list| {
            list.iter()
                .map(|k| k.trim().to_lowercase())
                .collect::<Vec<_>>()
        });
        let mut seen = HashSet::new();
        for keyword in both_exact.iter().chain(&both).chain(&up).chain(&down) {
            if keyword.is_empty() {
                return Err(TableError::EmptyName);
            }
            if !seen.insert(keyword.clone()) {
                return Err(TableError::AmbiguousKeyword {
                    keyword: keyword.clone(),
                });
            }
        }

        Ok(Self {
            cities: city_map,
            families: families.to_vec(),
            aliases: HighwayAliases::new(aliases),
            both_exact,
            both,
            up,
            down,
        })
    }

    /// Location of a destination city.
    ///
    /// Accepts decorated hints such as `"부산방향"` or `"서울 방면"`.
    pub fn city(&self, hint: &str) -> Option<Coordinate> {
        let hint = hint.trim();
        if let Some(c) = self.cities.get(hint) {
            return Some(*c);
        }
        let stripped = hint
            .trim_end_matches("방향")
            .trim_end_matches("방면")
            .trim();
        self.cities.get(stripped).copied()
    }

    /// The family convention for a highway, looked up by code, then by name.
    pub fn family(&self, code: Option<&str>, name: Option<&str>) -> Option<&HighwayFamily> {
        if let Some(code) = code
            && let Some(f) = self.families.iter().find(|f| f.code == Some(code))
        {
            return Some(f);
        }
        let names = self.aliases.expand(name?);
        self.families
            .iter()
            .find(|f| names.iter().any(|n| n.as_str() == f.base_name))
    }

    pub fn aliases(&self) -> &HighwayAliases {
        &self.aliases
    }

    /// Map a free-text direction label to a direction.
    ///
    /// Both-direction keywords win over single-direction ones, so
    /// `"상하행"` is BOTH even though it contains `"하행"`. When
    /// `include_both` is false a BOTH label is not trusted and maps to
    /// UNKNOWN.
    pub fn normalize_label(&self, label: &str, include_both: bool) -> Direction {
        let compact: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Direction::Unknown;
        }

        let is_both = self.both_exact.iter().any(|k| *k == compact)
            || self.both.iter().any(|k| compact.contains(k.as_str()));
        if is_both {
            return if include_both {
                Direction::Both
            } else {
                Direction::Unknown
            };
        }
        if self.up.iter().any(|k| compact.contains(k.as_str())) {
            return Direction::Up;
        }
        if self.down.iter().any(|k| compact.contains(k.as_str())) {
            return Direction::Down;
        }
        Direction::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> DirectionTables {
        DirectionTables::korea().unwrap()
    }

    #[test]
    fn builtin_tables_are_valid() {
        let t = tables();
        assert!(t.city("부산").is_some());
        assert!(t.city("서울").is_some());
    }

    #[test]
    fn normalizes_labels() {
        let t = tables();
        assert_eq!(t.normalize_label("상행", true), Direction::Up);
        assert_eq!(t.normalize_label("서울방향", true), Direction::Up);
        assert_eq!(t.normalize_label("북측", true), Direction::Up);
        assert_eq!(t.normalize_label("하행", true), Direction::Down);
        assert_eq!(t.normalize_label("부산방향", true), Direction::Down);
        assert_eq!(t.normalize_label("양방향", true), Direction::Both);
        assert_eq!(t.normalize_label("양", true), Direction::Both);
        assert_eq!(t.normalize_label("상하행", true), Direction::Both);
        assert_eq!(t.normalize_label(" 양 방향 ", true), Direction::Both);
        assert_eq!(t.normalize_label("UP", true), Direction::Up);
        assert_eq!(t.normalize_label("강릉방향", true), Direction::Unknown);
        assert_eq!(t.normalize_label("", true), Direction::Unknown);
    }

    #[test]
    fn both_label_untrusted_when_disabled() {
        let t = tables();
        assert_eq!(t.normalize_label("양방향", false), Direction::Unknown);
        assert_eq!(t.normalize_label("하행", false), Direction::Down);
    }

    #[test]
    fn city_lookup_strips_direction_suffix() {
        let t = tables();
        assert_eq!(t.city("부산방향"), t.city("부산"));
        assert_eq!(t.city("강릉 방면"), t.city("강릉"));
        assert!(t.city("평양").is_none());
    }

    #[test]
    fn family_by_code_or_name() {
        let t = tables();
        assert_eq!(t.family(Some("0010"), None).unwrap().base_name, "경부");
        assert_eq!(t.family(None, Some("영동고속도로")).unwrap().axis, Axis::EastWest);
        assert_eq!(t.family(Some("9999"), Some("중앙선")).unwrap().base_name, "중앙");
        assert!(t.family(None, Some("남해선")).is_none());
        assert!(t.family(None, None).is_none());
    }

    #[test]
    fn aliases_expand_names() {
        let t = tables();
        assert_eq!(t.aliases().expand("경부고속도로"), vec!["경부".to_string()]);
        let expanded = t.aliases().expand("동서고속도로");
        assert!(expanded.contains(&"서울양양".to_string()));
        let expanded = t.aliases().expand("신영동선");
        assert!(expanded.contains(&"영동".to_string()));
    }

    #[test]
    fn rejects_invalid_city() {
        let err = DirectionTables::new(
            &[("서울", 0.0, 0.0)],
            FAMILIES,
            ALIASES,
            [BOTH_EXACT, BOTH_KEYWORDS, UP_KEYWORDS, DOWN_KEYWORDS],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TableError::InvalidCity {
                name: "서울".to_string()
            }
        );
    }

    #[test]
    fn rejects_duplicate_city() {
        let err = DirectionTables::new(
            &[("서울", 37.5, 127.0), ("서울", 37.6, 127.0)],
            FAMILIES,
            ALIASES,
            [BOTH_EXACT, BOTH_KEYWORDS, UP_KEYWORDS, DOWN_KEYWORDS],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::DuplicateCity { .. }));
    }

    #[test]
    fn rejects_ambiguous_keywords() {
        let err = DirectionTables::new(
            CITIES,
            FAMILIES,
            ALIASES,
            [BOTH_EXACT, BOTH_KEYWORDS, &["상행", "서울"], &["서울"]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TableError::AmbiguousKeyword {
                keyword: "서울".to_string()
            }
        );
    }

    #[test]
    fn rejects_bad_heading() {
        let families = [HighwayFamily {
            base_name: "경부",
            code: None,
            axis: Axis::NorthSouth,
            up_heading: 360.0,
        }];
        let err = DirectionTables::new(
            CITIES,
            &families,
            ALIASES,
            [BOTH_EXACT, BOTH_KEYWORDS, UP_KEYWORDS, DOWN_KEYWORDS],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::InvalidHeading { .. }));
    }
}
