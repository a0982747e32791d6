//! Source spans as half-open byte ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, end)` range of source offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span used for nodes that carry no source location.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    #[inline]
    #[must_use]
    pub const fn is_dummy(self) -> bool {
        self.start == 0 && self.end == 0
    }

    /// Whether `pos` lies inside this span.
    #[inline]
    #[must_use]
    pub const fn contains(self, pos: u32) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Whether `other` lies entirely inside this span.
    #[inline]
    #[must_use]
    pub const fn contains_span(self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
