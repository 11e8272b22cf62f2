//! Character cursor for traversing source code.
//!
//! This module provides the `Cursor` struct which maintains position state
//! while iterating through source code characters. It handles UTF-8 encoding
//! correctly, tracks line/column information, and supports a nesting stack of
//! marks for backtracking matchers.

use clovec_util::span::Position;

/// A saved cursor state.
#[derive(Clone, Copy, Debug)]
struct Mark {
    position: usize,
    line: u32,
    column: u32,
}

/// A cursor for traversing source code character by character.
///
/// The cursor maintains the current byte position in the source string and
/// provides methods for advancing, peeking ahead, and backtracking via a
/// mark stack. Columns advance by one per rune; `\n`, `\r`, and `\r\n` each
/// count as a single line terminator.
///
/// # Example
///
/// ```
/// use clovec_lex::cursor::Cursor;
///
/// let mut cursor = Cursor::new("def foo");
/// assert_eq!(cursor.peek(), 'd');
/// cursor.advance();
/// assert_eq!(cursor.peek(), 'e');
/// ```
pub struct Cursor<'a> {
    /// The source text being traversed.
    source: &'a str,

    /// Current byte position in the source.
    position: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (1-based, in runes).
    column: u32,

    /// Stack of saved states for backtracking. Marks nest.
    marks: Vec<Mark>,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
            marks: Vec::new(),
        }
    }

    /// Returns the character at the cursor position, or `'\0'` at the end.
    #[inline]
    pub fn peek(&self) -> char {
        if self.position >= self.source.len() {
            return '\0';
        }

        // Fast path for ASCII (most common case)
        let b = self.source.as_bytes()[self.position];
        if b < 128 {
            return b as char;
        }

        self.source[self.position..].chars().next().unwrap_or('\0')
    }

    /// Returns the character `n` runes ahead of the cursor, or `'\0'` past
    /// the end. `peek_nth(0)` is the same as `peek()`.
    ///
    /// # Example
    ///
    /// ```
    /// use clovec_lex::cursor::Cursor;
    ///
    /// let cursor = Cursor::new("abc");
    /// assert_eq!(cursor.peek_nth(0), 'a');
    /// assert_eq!(cursor.peek_nth(2), 'c');
    /// assert_eq!(cursor.peek_nth(3), '\0');
    /// ```
    pub fn peek_nth(&self, n: usize) -> char {
        self.source[self.position..].chars().nth(n).unwrap_or('\0')
    }

    /// Returns true if the cursor has not reached the end of the source.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.position < self.source.len()
    }

    /// Consumes and returns the current character, advancing the cursor.
    ///
    /// Returns `'\0'` without advancing when already at the end.
    pub fn consume(&mut self) -> char {
        let c = self.peek();
        if c != '\0' || self.has_more() {
            self.advance();
        }
        c
    }

    /// Advances the cursor by one rune, updating line and column tracking.
    ///
    /// A `\r` that is immediately followed by `\n` does not advance the line
    /// counter; the `\n` does, so the pair counts as one terminator.
    pub fn advance(&mut self) {
        if self.position >= self.source.len() {
            return;
        }

        // Fast path for ASCII (most common)
        let b = self.source.as_bytes()[self.position];
        let c = if b < 128 {
            self.position += 1;
            b as char
        } else {
            let c = self.source[self.position..].chars().next().unwrap_or('\0');
            self.position += c.len_utf8();
            c
        };

        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                if self.peek() != '\n' {
                    self.line += 1;
                    self.column = 1;
                }
                // Part of a \r\n pair: the following \n moves the line.
            }
            _ => self.column += 1,
        }
    }

    /// Advances the cursor over the next `count` bytes, rune by rune.
    ///
    /// The count must land on a UTF-8 boundary; advancement stops at the end
    /// of the source.
    pub fn advance_bytes(&mut self, count: usize) {
        let target = (self.position + count).min(self.source.len());
        while self.position < target {
            self.advance();
        }
    }

    /// Matches and consumes the expected character if present.
    ///
    /// # Example
    ///
    /// ```
    /// use clovec_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("=>");
    /// assert!(cursor.match_char('='));
    /// assert!(!cursor.match_char('='));
    /// assert_eq!(cursor.peek(), '>');
    /// ```
    pub fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the given text if the remaining source starts with it.
    pub fn try_consume_str(&mut self, text: &str) -> bool {
        if self.source[self.position..].starts_with(text) {
            self.advance_bytes(text.len());
            true
        } else {
            false
        }
    }

    /// Consumes `\r`, `\r\n`, or `\n` as a single line terminator.
    ///
    /// Returns true if a terminator was consumed.
    pub fn try_consume_newline(&mut self) -> bool {
        match self.peek() {
            '\r' => {
                self.advance();
                if self.peek() == '\n' {
                    self.advance();
                }
                true
            }
            '\n' => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Returns the current line number (1-based).
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the current column number (1-based).
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Returns the current position as a [`Position`].
    #[inline]
    pub fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Returns the current byte position in the source.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns a slice of the source from the given byte position to the
    /// current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    /// Returns the source text from the current position to the end.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Returns the full source text.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Pushes the current state onto the mark stack. Marks nest.
    ///
    /// # Example
    ///
    /// ```
    /// use clovec_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("abcdef");
    /// cursor.mark();
    /// cursor.advance_bytes(3);
    /// cursor.reset();
    /// assert_eq!(cursor.peek(), 'a');
    /// ```
    pub fn mark(&mut self) {
        self.marks.push(Mark {
            position: self.position,
            line: self.line,
            column: self.column,
        });
    }

    /// Pops the most recent mark and restores the cursor to it, including
    /// line and column state. Does nothing when no mark is set.
    pub fn reset(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.position = mark.position;
            self.line = mark.line;
            self.column = mark.column;
        }
    }

    /// Pops the most recent mark and returns the substring between the mark
    /// and the current position. The cursor itself stays where it is.
    pub fn pop_mark(&mut self) -> &'a str {
        match self.marks.pop() {
            Some(mark) => &self.source[mark.position..self.position],
            None => "",
        }
    }
}
