//! The set of highways a candidate must be on to pass highway matching.

use std::collections::HashSet;

use crate::domain::RestAreaCandidate;
use crate::tables::HighwayAliases;

use super::HighwayMatchResult;

/// Highways accepted by the highway-match stage.
///
/// Built from the detected highways plus any hint names supplied by the
/// routing provider. Names are compared by base name after alias expansion,
/// so `"경부고속도로"`, `"경부선"` and `"경부"` are the same highway.
#[derive(Debug, Clone, Default)]
pub struct AllowedHighways {
    codes: HashSet<String>,
    names: HashSet<String>,
    aliases: HighwayAliases,
}

impl AllowedHighways {
    pub fn new(result: &HighwayMatchResult, hints: &[String], aliases: &HighwayAliases) -> Self {
        let mut allowed = Self {
            aliases: aliases.clone(),
            ..Default::default()
        };

        for highway in &result.detected_highways {
            allowed.codes.insert(highway.highway_code.clone());
            allowed.add_name(&highway.highway_name);
        }

        for hint in hints {
            let hint = hint.trim();
            if hint.is_empty() {
                continue;
            }
            if hint.chars().all(|c| c.is_ascii_digit()) {
                allowed.codes.insert(hint.to_string());
            } else {
                allowed.add_name(hint);
            }
        }

        allowed
    }

    fn add_name(&mut self, name: &str) {
        self.names.extend(self.aliases.expand(name));
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.names.is_empty()
    }

    /// Whether a candidate lies on an allowed highway.
    ///
    /// A candidate with no highway information cannot be ruled out here and
    /// is left for the distance stage.
    pub fn allows(&self, candidate: &RestAreaCandidate) -> bool {
        let code = candidate.highway_code.as_deref().map(str::trim).unwrap_or("");
        let name = candidate.highway_name.as_deref().map(str::trim).unwrap_or("");
        if code.is_empty() && name.is_empty() {
            return true;
        }

        if !code.is_empty() && self.codes.contains(code) {
            return true;
        }
        !name.is_empty()
            && self
                .aliases
                .expand(name)
                .iter()
                .any(|n| self.names.contains(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinate;
    use crate::matcher::{DetectedHighway, HighwayMatchResult};
    use crate::tables::{ALIASES, HighwayAliases};

    fn detected(code: &str, name: &str) -> DetectedHighway {
        DetectedHighway {
            highway_name: name.to_string(),
            highway_code: code.to_string(),
            confidence: 0.9,
            coverage_percentage: 80.0,
            matched_ic_count: 5,
            average_distance_m: 400.0,
            segments: Vec::new(),
            first_route_index: 0,
            last_route_index: 10,
        }
    }

    fn candidate(code: Option<&str>, name: Option<&str>) -> RestAreaCandidate {
        let mut c = RestAreaCandidate::new("R", "휴게소", Coordinate::new(36.5, 127.5));
        c.highway_code = code.map(str::to_string);
        c.highway_name = name.map(str::to_string);
        c
    }

    fn result_with(highways: Vec<DetectedHighway>) -> HighwayMatchResult {
        HighwayMatchResult {
            detected_highways: highways,
            ..HighwayMatchResult::empty()
        }
    }

    #[test]
    fn matches_by_code_or_base_name() {
        let aliases = HighwayAliases::new(ALIASES);
        let allowed = AllowedHighways::new(&result_with(vec![detected("0010", "경부선")]), &[], &aliases);

        assert!(allowed.allows(&candidate(Some("0010"), None)));
        assert!(allowed.allows(&candidate(None, Some("경부고속도로"))));
        assert!(allowed.allows(&candidate(Some("9999"), Some("경부"))));
        assert!(!allowed.allows(&candidate(Some("0500"), Some("영동선"))));
    }

    #[test]
    fn hints_widen_the_set() {
        let aliases = HighwayAliases::new(ALIASES);
        let hints = vec!["영동고속도로".to_string(), "0550".to_string(), " ".to_string()];
        let allowed = AllowedHighways::new(&HighwayMatchResult::empty(), &hints, &aliases);

        assert!(!allowed.is_empty());
        assert!(allowed.allows(&candidate(None, Some("영동선"))));
        assert!(allowed.allows(&candidate(Some("0550"), Some("중앙선"))));
        assert!(!allowed.allows(&candidate(None, Some("경부선"))));
    }

    #[test]
    fn aliases_match_common_names() {
        let aliases = HighwayAliases::new(ALIASES);
        let hints = vec!["동서고속도로".to_string()];
        let allowed = AllowedHighways::new(&HighwayMatchResult::empty(), &hints, &aliases);
        assert!(allowed.allows(&candidate(None, Some("서울양양고속도로"))));
    }

    #[test]
    fn similar_prefixes_do_not_match() {
        let aliases = HighwayAliases::new(ALIASES);
        let allowed = AllowedHighways::new(&result_with(vec![detected("0350", "중부선")]), &[], &aliases);
        assert!(!allowed.allows(&candidate(None, Some("중부내륙선"))));
    }

    #[test]
    fn candidate_without_highway_info_passes() {
        let allowed = AllowedHighways::default();
        assert!(allowed.is_empty());
        assert!(allowed.allows(&candidate(None, None)));
        assert!(allowed.allows(&candidate(Some(" "), Some(""))));
    }
}
