// Severity tiers and the range classifier
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed numeric interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    /// True when `other` lies entirely inside `self` (shared endpoints allowed).
    pub fn encloses(&self, other: &Range) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    /// True when `other` lies inside `self` without touching either endpoint.
    pub fn strictly_encloses(&self, other: &Range) -> bool {
        self.lo < other.lo && other.hi < self.hi
    }

    pub fn is_finite(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lo).min(self.hi)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Normal,
    Warning,
    Critical,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "normal",
            SeverityTier::Warning => "warning",
            SeverityTier::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a value against a channel's nested ranges.
///
/// Both ranges are closed, so a value sitting exactly on an edge lands in the
/// lower-severity tier. Callers are expected to have validated that `bound`
/// encloses `normal`. NaN is treated as outside every range.
pub fn classify(value: f64, normal: &Range, bound: &Range) -> SeverityTier {
    if normal.contains(value) {
        SeverityTier::Normal
    } else if bound.contains(value) {
        SeverityTier::Warning
    } else {
        SeverityTier::Critical
    }
}
