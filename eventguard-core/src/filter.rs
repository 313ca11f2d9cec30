//! filter.rs - Build/version applicability windows for group rules.
//!
//! A group's rules only apply to builds and rule-format versions that fall
//! inside at least one configured range. Applicability must be explicit: a
//! group with no ranges at all is not applicable anywhere.
//!
//! License: MIT OR APACHE 2.0

use std::cmp::Ordering;

use crate::descriptor::RangeDescriptor;

/// A dotted numeric build identifier, e.g. `203.6682.168`.
///
/// The last component may carry a trailing non-numeric qualifier, which is
/// ignored. A `*` or `SNAPSHOT` component compares as the maximum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNumber {
    components: Vec<u64>,
}

impl BuildNumber {
    /// Parses a build identifier, returning `None` for unparsable input.
    /// Unparsable builds always fail the applicability filter.
    pub fn parse(s: &str) -> Option<Self> {
        let raw: Vec<&str> = s.split('.').collect();
        if raw.is_empty() || raw.iter().any(|c| c.is_empty()) {
            return None;
        }
        let mut components = Vec::with_capacity(raw.len());
        let last = raw.len() - 1;
        for (i, comp) in raw.iter().enumerate() {
            if *comp == "*" || *comp == "SNAPSHOT" {
                components.push(u64::MAX);
                continue;
            }
            if let Ok(n) = comp.parse::<u64>() {
                components.push(n);
                continue;
            }
            // Trailing qualifier such as "168-EAP" is tolerated on the last
            // component only.
            if i == last {
                let digits: String = comp.chars().take_while(char::is_ascii_digit).collect();
                if digits.is_empty() {
                    return None;
                }
                components.push(digits.parse().ok()?);
            } else {
                return None;
            }
        }
        Some(Self { components })
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl Ord for BuildNumber {
    /// Component-wise comparison, padding the shorter identifier with
    /// zeros, so `183.1234.31` sorts after `183.1234` and `192.12` sorts
    /// before `192.1234`.
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for BuildNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A half-open build window: `from` inclusive, `to` exclusive. A window
/// with neither bound contains nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRange {
    from: Option<BuildNumber>,
    to: Option<BuildNumber>,
}

impl BuildRange {
    pub fn new(from: Option<BuildNumber>, to: Option<BuildNumber>) -> Self {
        Self { from, to }
    }

    fn from_descriptor(descriptor: &RangeDescriptor) -> Self {
        Self {
            from: descriptor.from.as_deref().and_then(BuildNumber::parse),
            to: descriptor.to.as_deref().and_then(BuildNumber::parse),
        }
    }

    pub fn contains(&self, build: &BuildNumber) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return false;
        }
        if self.from.as_ref().is_some_and(|from| build < from) {
            return false;
        }
        !self.to.as_ref().is_some_and(|to| build >= to)
    }
}

/// A half-open window over the integer rule-format version: `from`
/// inclusive, `to` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    from: Option<u64>,
    to: Option<u64>,
}

impl VersionRange {
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    fn from_descriptor(descriptor: &RangeDescriptor) -> Self {
        Self {
            from: descriptor.from.as_deref().and_then(|v| v.parse().ok()),
            to: descriptor.to.as_deref().and_then(|v| v.parse().ok()),
        }
    }

    pub fn contains(&self, version: u64) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return false;
        }
        if self.from.is_some_and(|from| version < from) {
            return false;
        }
        !self.to.is_some_and(|to| version >= to)
    }
}

/// Applicability filter for one group: build ranges and version ranges.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    builds: Vec<BuildRange>,
    versions: Vec<VersionRange>,
}

impl GroupFilter {
    pub fn new(builds: &[RangeDescriptor], versions: &[RangeDescriptor]) -> Self {
        Self {
            builds: builds.iter().map(BuildRange::from_descriptor).collect(),
            versions: versions.iter().map(VersionRange::from_descriptor).collect(),
        }
    }

    /// Decides whether the group's rules apply to the given rule-format
    /// version and product build. With no ranges configured the group is
    /// not applicable; a configured kind must match in at least one range,
    /// an unconfigured kind is vacuously satisfied.
    pub fn accepts(&self, group_version: &str, build: &str) -> bool {
        if self.builds.is_empty() && self.versions.is_empty() {
            return false;
        }
        if !self.builds.is_empty() {
            let Some(build) = BuildNumber::parse(build) else {
                return false;
            };
            if !self.builds.iter().any(|range| range.contains(&build)) {
                return false;
            }
        }
        if !self.versions.is_empty() {
            let Ok(version) = group_version.parse::<u64>() else {
                return false;
            };
            if !self.versions.iter().any(|range| range.contains(version)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(s: &str) -> BuildNumber {
        BuildNumber::parse(s).unwrap()
    }

    #[test]
    fn test_build_range_contains() {
        let range = BuildRange::new(Some(build("1.2")), Some(build("2.0")));
        assert!(range.contains(&build("1.2")));
        assert!(range.contains(&build("1.3")));
        assert!(!range.contains(&build("2.0")));
        assert!(!range.contains(&build("1.1")));
        assert!(!range.contains(&build("2.0.1")));

        let open_above = BuildRange::new(Some(build("1.2")), None);
        assert!(open_above.contains(&build("1.2")));
        assert!(open_above.contains(&build("1.2.1")));
        assert!(!open_above.contains(&build("1.1")));
    }

    #[test]
    fn test_empty_build_range_contains_nothing() {
        let range = BuildRange::new(None, None);
        assert!(!range.contains(&build("1.0")));
    }

    #[test]
    fn test_build_number_parse() {
        assert_eq!(build("203.6682.168").components(), &[203, 6682, 168]);
        assert_eq!(build("203.6682.168-EAP").components(), &[203, 6682, 168]);
        assert_eq!(build("203.SNAPSHOT").components(), &[203, u64::MAX]);
        assert!(BuildNumber::parse("not-a-build").is_none());
        assert!(BuildNumber::parse("").is_none());
        assert!(BuildNumber::parse("1..2").is_none());
    }

    #[test]
    fn test_version_range_bounds() {
        let range = VersionRange::new(Some(2), Some(5));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(!range.contains(1));

        assert!(!VersionRange::new(None, None).contains(3));
    }
}
