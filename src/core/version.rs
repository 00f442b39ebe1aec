// src/core/version.rs

use crate::models::{ModuleName, VersionMatch};
use std::cmp::Ordering;

/// Compares two version strings segment by segment.
///
/// Segments are split on `.`, `-`, `_` and `+`. Two numeric segments compare
/// numerically, anything else compares as text. A missing segment equals `0`
/// when the other side is numeric, so `5` and `5.0` are the same version.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let split = |v: &str| -> Vec<String> {
        v.split(['.', '-', '_', '+'])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    let left = split(a);
    let right = split(b);

    for i in 0..left.len().max(right.len()) {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) => compare_segments(l, r),
            (Some(l), None) => compare_segments(l, "0"),
            (None, Some(r)) => compare_segments("0", r),
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_segments(l: &str, r: &str) -> Ordering {
    match (l.parse::<u64>(), r.parse::<u64>()) {
        (Ok(ln), Ok(rn)) => ln.cmp(&rn),
        // Numbers sort before text ("1.0" < "1.a").
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => l.cmp(r),
    }
}

/// Whether a `loaded` version satisfies a `requested` one under `policy`.
pub fn version_satisfies(policy: VersionMatch, requested: &str, loaded: &str) -> bool {
    match policy {
        VersionMatch::Equal => requested == loaded,
        VersionMatch::AtLeast => compare_versions(loaded, requested) != Ordering::Less,
        VersionMatch::AtMost => compare_versions(loaded, requested) != Ordering::Greater,
    }
}

/// Whether a loaded module entry matches a requested name.
///
/// An exact string match always wins. A bare package matches any loaded
/// version of that package; a versioned request is compared with `policy`.
pub fn module_matches(policy: VersionMatch, requested: &ModuleName, loaded: &ModuleName) -> bool {
    if requested == loaded {
        return true;
    }
    if requested.package != loaded.package {
        return false;
    }
    match (&requested.version, &loaded.version) {
        (None, _) => true,
        (Some(want), Some(have)) => version_satisfies(policy, want, have),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_segments_compare_numerically() {
        assert_eq!(compare_versions("4.10", "4.8"), Ordering::Greater);
        assert_eq!(compare_versions("4.8", "5.0"), Ordering::Less);
        assert_eq!(compare_versions("5", "5.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_text_segments_compare_lexically() {
        assert_eq!(compare_versions("1.0-beta", "1.0-alpha"), Ordering::Greater);
        assert_eq!(compare_versions("1.2", "1.a"), Ordering::Less);
    }

    #[test]
    fn test_policies() {
        assert!(version_satisfies(VersionMatch::Equal, "2.0", "2.0"));
        assert!(!version_satisfies(VersionMatch::Equal, "2.0", "2.0.0"));
        assert!(version_satisfies(VersionMatch::AtLeast, "2.0", "2.1"));
        assert!(!version_satisfies(VersionMatch::AtLeast, "2.0", "1.9"));
        assert!(version_satisfies(VersionMatch::AtMost, "2.0", "1.9"));
        assert!(version_satisfies(VersionMatch::AtMost, "2.0", "2.0"));
        assert!(!version_satisfies(VersionMatch::AtMost, "2.0", "2.0.1"));
    }

    #[test]
    fn test_module_matches_bare_package_against_any_version() {
        let loaded = ModuleName::parse("foo/1.0");
        assert!(module_matches(VersionMatch::Equal, &"foo".into(), &loaded));
        assert!(!module_matches(VersionMatch::Equal, &"bar".into(), &loaded));
    }

    #[test]
    fn test_module_matches_versioned_request() {
        let loaded = ModuleName::parse("foo/1.0");
        assert!(!module_matches(VersionMatch::Equal, &"foo/2.0".into(), &loaded));
        assert!(module_matches(VersionMatch::AtMost, &"foo/2.0".into(), &loaded));
        assert!(!module_matches(VersionMatch::AtLeast, &"foo/2.0".into(), &loaded));
        assert!(!module_matches(VersionMatch::AtLeast, &"foo/2.0".into(), &"foo".into()));
    }
}
