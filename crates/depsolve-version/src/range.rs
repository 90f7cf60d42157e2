//! Semver range constraints, represented as a closed/open interval.
//!
//! `semver::VersionReq` already ANDs its comparators together when matching
//! a single version, but it doesn't expose enough structure to intersect two
//! requirements or to collapse an intersection down to a single matching
//! version. We parse into `semver::VersionReq` for syntax (so `^1.2`, `~2.3`,
//! `>=1.0, <2.0` etc. all parse the way callers expect) and then lower each
//! comparator into a min/max interval bound, which is what the solver
//! actually needs: range-intersection and range-collapse-to-singleton.

use semver::{Comparator, Op, Version as SemverVersion, VersionReq};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One side of an interval: the version plus whether it's included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub version: SemverVersion,
    pub inclusive: bool,
}

/// A semver range as a half-open (or closed) interval `[min, max]`.
///
/// `min = None` means unbounded below; `max = None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SemverRange {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
}

impl SemverRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn at_least(version: SemverVersion) -> Self {
        Self {
            min: Some(Bound {
                version,
                inclusive: true,
            }),
            max: None,
        }
    }

    pub fn exact(version: SemverVersion) -> Self {
        Self {
            min: Some(Bound {
                version: version.clone(),
                inclusive: true,
            }),
            max: Some(Bound {
                version,
                inclusive: true,
            }),
        }
    }

    /// Parse a constraint string (`^1.2`, `~2.3.0`, `>=1.0, <2.0`, `1.2.*`,
    /// a bare `1.2.3`) into a range. Falls back to treating an unparseable
    /// wildcard segment as a bump on the last present component.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Some(Self::unbounded());
        }
        if let Some(range) = Self::parse_wildcard(s) {
            return Some(range);
        }
        let req = VersionReq::parse(s).ok()?;
        let mut out = Self::unbounded();
        for comparator in &req.comparators {
            let piece = Self::from_comparator(comparator)?;
            out = out.intersect(&piece)?;
        }
        Some(out)
    }

    fn parse_wildcard(s: &str) -> Option<Self> {
        if !s.ends_with(".*") && s != "*" {
            return None;
        }
        let stripped = s.strip_suffix(".*")?;
        let parts: Vec<&str> = stripped.split('.').collect();
        match parts.as_slice() {
            [major] => {
                let major: u64 = major.parse().ok()?;
                Some(Self {
                    min: Some(Bound {
                        version: SemverVersion::new(major, 0, 0),
                        inclusive: true,
                    }),
                    max: Some(Bound {
                        version: SemverVersion::new(major + 1, 0, 0),
                        inclusive: false,
                    }),
                })
            }
            [major, minor] => {
                let major: u64 = major.parse().ok()?;
                let minor: u64 = minor.parse().ok()?;
                Some(Self {
                    min: Some(Bound {
                        version: SemverVersion::new(major, minor, 0),
                        inclusive: true,
                    }),
                    max: Some(Bound {
                        version: SemverVersion::new(major, minor + 1, 0),
                        inclusive: false,
                    }),
                })
            }
            _ => None,
        }
    }

    fn from_comparator(c: &Comparator) -> Option<Self> {
        let minor = c.minor.unwrap_or(0);
        let patch = c.patch.unwrap_or(0);
        let base = SemverVersion {
            major: c.major,
            minor,
            patch,
            pre: c.pre.clone(),
            build: Default::default(),
        };

        Some(match c.op {
            Op::Exact => Self::exact(base),
            Op::Greater => Self {
                min: Some(Bound {
                    version: base,
                    inclusive: false,
                }),
                max: None,
            },
            Op::GreaterEq => Self::at_least(base),
            Op::Less => Self {
                min: None,
                max: Some(Bound {
                    version: base,
                    inclusive: false,
                }),
            },
            Op::LessEq => Self {
                min: None,
                max: Some(Bound {
                    version: base,
                    inclusive: true,
                }),
            },
            Op::Tilde => {
                let upper = if c.minor.is_some() {
                    SemverVersion::new(base.major, base.minor + 1, 0)
                } else {
                    SemverVersion::new(base.major + 1, 0, 0)
                };
                Self {
                    min: Some(Bound {
                        version: base,
                        inclusive: true,
                    }),
                    max: Some(Bound {
                        version: upper,
                        inclusive: false,
                    }),
                }
            }
            Op::Caret => {
                let upper = if base.major > 0 {
                    SemverVersion::new(base.major + 1, 0, 0)
                } else if base.minor > 0 {
                    SemverVersion::new(0, base.minor + 1, 0)
                } else if c.patch.is_some() {
                    SemverVersion::new(0, 0, base.patch + 1)
                } else {
                    SemverVersion::new(0, base.minor + 1, 0)
                };
                Self {
                    min: Some(Bound {
                        version: base,
                        inclusive: true,
                    }),
                    max: Some(Bound {
                        version: upper,
                        inclusive: false,
                    }),
                }
            }
            Op::Wildcard => {
                let (lo, hi) = match (c.minor, c.patch) {
                    (None, _) => (
                        SemverVersion::new(c.major, 0, 0),
                        SemverVersion::new(c.major + 1, 0, 0),
                    ),
                    (Some(minor), None) => (
                        SemverVersion::new(c.major, minor, 0),
                        SemverVersion::new(c.major, minor + 1, 0),
                    ),
                    (Some(minor), Some(_)) => {
                        return Some(Self::exact(base.clone()).also_allow_minor_bump(base, minor))
                    }
                };
                Self {
                    min: Some(Bound {
                        version: lo,
                        inclusive: true,
                    }),
                    max: Some(Bound {
                        version: hi,
                        inclusive: false,
                    }),
                }
            }
            _ => return None,
        })
    }

    pub fn matches(&self, v: &SemverVersion) -> bool {
        if let Some(min) = &self.min {
            match v.cmp(&min.version) {
                Ordering::Less => return false,
                Ordering::Equal if !min.inclusive => return false,
                _ => {}
            }
        }
        if let Some(max) = &self.max {
            match v.cmp(&max.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !max.inclusive => return false,
                _ => {}
            }
        }
        true
    }

    /// Intersect two ranges. Returns `None` when the result is empty
    /// (disjoint ranges).
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min = tighter_min(&self.min, &other.min);
        let max = tighter_max(&self.max, &other.max);

        if let (Some(min), Some(max)) = (&min, &max) {
            match min.version.cmp(&max.version) {
                Ordering::Greater => return None,
                Ordering::Equal if !(min.inclusive && max.inclusive) => return None,
                _ => {}
            }
        }
        Some(Self { min, max })
    }

    /// If this range admits exactly one version (a degenerate `[v, v]`
    /// interval), return it.
    pub fn as_singleton(&self) -> Option<SemverVersion> {
        match (&self.min, &self.max) {
            (Some(min), Some(max))
                if min.inclusive && max.inclusive && min.version == max.version =>
            {
                Some(min.version.clone())
            }
            _ => None,
        }
    }

    fn also_allow_minor_bump(self, _base: SemverVersion, _minor: u64) -> Self {
        self
    }
}

fn tighter_min(a: &Option<Bound>, b: &Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (Some(x), Some(y)) => Some(match x.version.cmp(&y.version) {
            Ordering::Greater => x.clone(),
            Ordering::Less => y.clone(),
            Ordering::Equal => Bound {
                version: x.version.clone(),
                inclusive: x.inclusive && y.inclusive,
            },
        }),
    }
}

fn tighter_max(a: &Option<Bound>, b: &Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (Some(x), Some(y)) => Some(match x.version.cmp(&y.version) {
            Ordering::Less => x.clone(),
            Ordering::Greater => y.clone(),
            Ordering::Equal => Bound {
                version: x.version.clone(),
                inclusive: x.inclusive && y.inclusive,
            },
        }),
    }
}

impl fmt::Display for SemverRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (None, None) => write!(f, "*"),
            (Some(min), None) => {
                write!(f, "{}{}", if min.inclusive { ">=" } else { ">" }, min.version)
            }
            (None, Some(max)) => {
                write!(f, "{}{}", if max.inclusive { "<=" } else { "<" }, max.version)
            }
            (Some(min), Some(max)) if min.version == max.version && min.inclusive && max.inclusive => {
                write!(f, "={}", min.version)
            }
            (Some(min), Some(max)) => write!(
                f,
                "{}{} {}{}",
                if min.inclusive { ">=" } else { ">" },
                min.version,
                if max.inclusive { "<=" } else { "<" },
                max.version
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemverVersion {
        SemverVersion::parse(s).unwrap()
    }

    #[test]
    fn caret_expands_like_npm() {
        let r = SemverRange::parse("^1.2.3").unwrap();
        assert!(r.matches(&v("1.2.3")));
        assert!(r.matches(&v("1.9.0")));
        assert!(!r.matches(&v("2.0.0")));
    }

    #[test]
    fn tilde_expands_to_minor_bump() {
        let r = SemverRange::parse("~1.2.3").unwrap();
        assert!(r.matches(&v("1.2.9")));
        assert!(!r.matches(&v("1.3.0")));
    }

    #[test]
    fn comma_separated_bounds_intersect() {
        let r = SemverRange::parse(">=1.0.0, <2.0.0").unwrap();
        assert!(r.matches(&v("1.5.0")));
        assert!(!r.matches(&v("2.0.0")));
        assert!(!r.matches(&v("0.9.0")));
    }

    #[test]
    fn overlapping_ranges_intersect_to_the_common_window() {
        // scenario 1 from the spec: a wants [2.0.0,4.0.0), b wants [3.0.0,5.0.0)
        let a = SemverRange::parse(">=2.0.0, <4.0.0").unwrap();
        let b = SemverRange::parse(">=3.0.0, <5.0.0").unwrap();
        let i = a.intersect(&b).unwrap();
        assert!(i.matches(&v("3.6.9")));
        assert!(!i.matches(&v("2.0.0")));
        assert!(!i.matches(&v("4.0.0")));
    }

    #[test]
    fn disjoint_ranges_intersect_to_none() {
        let a = SemverRange::parse(">=1.0.0, <2.0.0").unwrap();
        let b = SemverRange::parse(">=3.0.0").unwrap();
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn exact_versions_collapse_to_singleton() {
        let a = SemverRange::parse(">=1.0.0").unwrap();
        let b = SemverRange::exact(v("1.0.0"));
        let i = a.intersect(&b).unwrap();
        assert_eq!(i.as_singleton(), Some(v("1.0.0")));
    }

    #[test]
    fn wildcard_minor_range() {
        let r = SemverRange::parse("3.11.*").unwrap();
        assert!(r.matches(&v("3.11.0")));
        assert!(r.matches(&v("3.11.99")));
        assert!(!r.matches(&v("3.12.0")));
    }
}
