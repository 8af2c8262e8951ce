//! Core data structures shared by the indexer, the index and the extractor.
//!
//! - [`IndexElement`]: the recorded byte range (and line) of one element occurrence
//! - [`XmlElement`]: a decoded element together with its line
//! - [`ByteBounds`]: an optional window used to restrict retrieval

use std::fmt;

/// Byte range of a single element occurrence in the raw input.
///
/// `start` is the offset of the opening `<`, `stop` the offset just past the
/// closing `>` of the matching end tag (or of the same tag if self-closing).
/// Offsets count every raw byte, filler bytes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexElement {
    pub start: u64,
    pub stop: u64,
    /// 1-based line of `start`; `None` when line recording was disabled.
    pub line: Option<u64>,
}

impl IndexElement {
    pub fn new(start: u64, stop: u64, line: Option<u64>) -> Self {
        Self { start, stop, line }
    }

    /// Number of raw bytes covered by this element.
    pub fn len(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `other` lies entirely within this element.
    pub fn contains(&self, other: &IndexElement) -> bool {
        other.start >= self.start && other.stop <= self.stop
    }
}

impl fmt::Display for IndexElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}-{} (line {})", self.start, self.stop, line),
            None => write!(f, "{}-{}", self.start, self.stop),
        }
    }
}

/// A decoded element snippet with the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub snippet: String,
    pub line: Option<u64>,
}

/// Optional byte window restricting which elements are returned.
///
/// An element is inside the window when `element.start >= start` and
/// `element.stop <= stop`; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteBounds {
    pub start: Option<u64>,
    pub stop: Option<u64>,
}

impl ByteBounds {
    pub fn new(start: u64, stop: u64) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
        }
    }

    /// Window covering the byte range of an already indexed element.
    pub fn within(element: &IndexElement) -> Self {
        Self::new(element.start, element.stop)
    }

    pub fn from_start(start: u64) -> Self {
        Self {
            start: Some(start),
            stop: None,
        }
    }

    pub fn until(stop: u64) -> Self {
        Self {
            start: None,
            stop: Some(stop),
        }
    }

    pub fn admits(&self, element: &IndexElement) -> bool {
        self.start.map_or(true, |s| element.start >= s) && self.stop.map_or(true, |s| element.stop <= s)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.stop.is_none()
    }
}
