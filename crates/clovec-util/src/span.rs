//! Span module - Source location tracking.
//!
//! This module provides types for representing source code locations as
//! 1-based line/column pairs. A [`Span`] serializes to the flat array
//! `[start_line, start_col, end_line, end_col]`, which is the wire shape
//! consumed by downstream tooling.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A line/column position in a source file.
///
/// Both components are 1-based. The column advances by one per rune; a line
/// terminator resets it to 1 and increments the line.
///
/// # Example
///
/// ```
/// use clovec_util::span::Position;
///
/// let pos = Position::new(3, 7);
/// assert_eq!(pos.line, 3);
/// assert_eq!(pos.column, 7);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based, counted in runes).
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A source range from a start position to an exclusive end position.
///
/// The end column is one past the last rune of the spanned text.
///
/// # Serialization
///
/// A span serializes as the 4-element integer array
/// `[start_line, start_col, end_line, end_col]`:
///
/// ```
/// use clovec_util::span::{Position, Span};
///
/// let span = Span::new(Position::new(1, 1), Position::new(1, 4));
/// let json = serde_json::to_string(&span).unwrap();
/// assert_eq!(json, "[1,1,1,4]");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates an empty span at a single position.
    #[inline]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

impl Serialize for Span {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&self.start.line)?;
        seq.serialize_element(&self.start.column)?;
        seq.serialize_element(&self.end.line)?;
        seq.serialize_element(&self.end.column)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SpanVisitor;

        impl<'de> Visitor<'de> for SpanVisitor {
            type Value = Span;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 4-element array [start_line, start_col, end_line, end_col]")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Span, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut next = |idx: usize| -> Result<u32, A::Error> {
                    seq.next_element()?
                        .ok_or_else(|| de::Error::invalid_length(idx, &self))
                };
                let sl = next(0)?;
                let sc = next(1)?;
                let el = next(2)?;
                let ec = next(3)?;
                Ok(Span::new(Position::new(sl, sc), Position::new(el, ec)))
            }
        }

        deserializer.deserialize_seq(SpanVisitor)
    }
}
