//! Highway name normalisation.
//!
//! Feeds spell the same highway several ways: `"경부고속도로"`,
//! `"경부고속국도"`, `"경부선"`, or just `"경부"`. Names are compared by
//! their base form.

const LONG_SUFFIXES: [&str; 3] = ["고속도로", "고속국도", "자동차도"];

/// Canonical catalog spelling: long suffixes replaced with `선`.
pub fn normalize_highway_name(name: &str) -> String {
    let trimmed = name.trim();
    for suffix in LONG_SUFFIXES {
        if let Some(stem) = trimmed.strip_suffix(suffix) {
            return format!("{}선", stem.trim_end());
        }
    }
    trimmed.to_string()
}

/// Name with any highway suffix removed, used for equality checks.
pub fn highway_base_name(name: &str) -> String {
    let normalized = normalize_highway_name(name);
    let base = normalized.strip_suffix('선').unwrap_or(&normalized);
    let base = base.trim_end();
    if base.is_empty() {
        normalized
    } else {
        base.to_string()
    }
}

/// True when two highway names refer to the same road.
pub fn same_highway(a: &str, b: &str) -> bool {
    let (a, b) = (highway_base_name(a), highway_base_name(b));
    !a.is_empty() && a == b
}
