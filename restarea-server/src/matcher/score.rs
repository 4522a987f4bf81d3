//! Confidence and quality scoring for detected highways.

use serde::Serialize;

/// Inputs to the per-highway confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighwayEvidence {
    /// Distinct physical interchanges matched.
    pub ic_count: usize,
    /// Mean distance of those interchanges from the route, in metres.
    pub average_distance_m: f64,
    /// Share of the route spanned, in percent.
    pub coverage_percentage: f64,
    /// Number of contiguous runs of interchanges.
    pub run_count: usize,
    /// Interchanges in the longest run.
    pub longest_run: usize,
}

/// Confidence that the route follows a highway, in `[0, 1]`.
///
/// Starts at 0.5 and adds bonuses for interchange count, proximity,
/// coverage and a single unbroken run of three or more interchanges.
pub fn highway_confidence(e: &HighwayEvidence) -> f64 {
    let mut confidence: f64 = 0.5;

    confidence += match e.ic_count {
        n if n >= 5 => 0.3,
        n if n >= 3 => 0.2,
        n if n >= 2 => 0.1,
        _ => 0.0,
    };

    if e.average_distance_m < 1000.0 {
        confidence += 0.2;
    } else if e.average_distance_m < 1500.0 {
        confidence += 0.1;
    }

    if e.coverage_percentage > 60.0 {
        confidence += 0.2;
    } else if e.coverage_percentage > 40.0 {
        confidence += 0.1;
    }

    if e.run_count == 1 && e.longest_run >= 3 {
        confidence += 0.1;
    }

    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Overall quality of a highway match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingQuality {
    High,
    Medium,
    Low,
}

/// Grade a match from its best highway and the overall route coverage.
pub fn matching_quality(
    best_confidence: f64,
    best_coverage: f64,
    route_coverage: f64,
) -> MatchingQuality {
    if best_confidence > 0.8 && best_coverage > 60.0 && route_coverage > 50.0 {
        MatchingQuality::High
    } else if best_confidence > 0.6 && best_coverage > 40.0 {
        MatchingQuality::Medium
    } else {
        MatchingQuality::Low
    }
}
