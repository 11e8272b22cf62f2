//! Core lexer implementation.
//!
//! This module contains the main `Lexer` struct, the driver loop that feeds
//! the matchers, and the expectation stack that gives wildcard tokens their
//! context.

use clovec_util::span::Span;
use thiserror::Error;

use crate::cursor::Cursor;
use crate::rules::RuleTable;
use crate::token::{Token, TokenType};

/// A tokenization failure.
///
/// The same information is materialized as the trailing Exception token of
/// the run, so callers can observe the halt either way.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("tokenization error at {span}: {reason}")]
pub struct LexError {
    /// Human-readable failure description.
    pub reason: String,
    /// Source text consumed by the failed match.
    pub text: String,
    /// Location of the failure.
    pub span: Span,
}

impl LexError {
    pub(crate) fn new(reason: impl Into<String>, text: impl Into<String>, span: Span) -> Self {
        Self {
            reason: reason.into(),
            text: text.into(),
            span,
        }
    }
}

/// The result of a tokenization run.
///
/// `tokens` always holds every token produced in source order. When the run
/// halted, the last token is an Exception and `error` carries the same
/// failure as a structured value.
#[derive(Debug, Clone, PartialEq)]
pub struct LexOutcome {
    /// Tokens in source order, up to and including any trailing Exception.
    pub tokens: Vec<Token>,
    /// The halting failure, if any.
    pub error: Option<LexError>,
}

impl LexOutcome {
    /// Returns true when the run halted on an Exception.
    pub fn is_halted(&self) -> bool {
        self.error.is_some()
    }
}

/// The tokenizer for Clove source code.
///
/// A lexer is created per run; it owns the cursor, the expectation stack,
/// and the output buffer, and consumes the whole input in one call to
/// [`Lexer::tokenize`]. The rule table is borrowed and never mutated.
///
/// # Example
///
/// ```
/// use clovec_lex::{Lexer, RuleTable, TokenType};
///
/// let rules = RuleTable::default_rules();
/// let outcome = Lexer::new("def foo end", &rules).tokenize();
///
/// assert!(!outcome.is_halted());
/// assert_eq!(outcome.tokens[0].kind, TokenType::Start);
/// ```
pub struct Lexer<'a> {
    /// Character cursor over the source.
    pub(crate) cursor: Cursor<'a>,

    /// Classification rules for identifier and operator lexemes.
    pub(crate) rules: &'a RuleTable,

    /// Stack of expected-follower frames, one per open construct.
    expecting_stack: Vec<Vec<String>>,

    /// Tokens produced so far.
    tokens: Vec<Token>,

    /// Whether the byte-order mark at the start of input was handled.
    bom_checked: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source.
    pub fn new(source: &'a str, rules: &'a RuleTable) -> Self {
        Self {
            cursor: Cursor::new(source),
            rules,
            expecting_stack: Vec::new(),
            tokens: Vec::new(),
            bom_checked: false,
        }
    }

    /// Consumes the whole input and returns the produced tokens.
    ///
    /// Tokenization stops at the first failure; the failure is appended to
    /// the token stream as an Exception token and also returned as the
    /// outcome's `error`.
    pub fn tokenize(mut self) -> LexOutcome {
        let mut error = None;
        while self.cursor.has_more() {
            if let Err(err) = self.next_token() {
                error = Some(err);
                break;
            }
        }
        tracing::debug!(
            tokens = self.tokens.len(),
            halted = error.is_some(),
            "tokenization finished"
        );
        LexOutcome {
            tokens: self.tokens,
            error,
        }
    }

    /// Produces the next token, if any input remains after skipping trivia.
    fn next_token(&mut self) -> Result<(), LexError> {
        let saw_newline_before = self.skip_whitespace_and_comments();
        if !self.cursor.has_more() {
            return Ok(());
        }

        let (mut token, halt) = match self.match_token() {
            Ok(token) => (token, None),
            Err(err) => {
                let token = Token::exception(err.text.clone(), err.reason.clone(), err.span);
                (token, Some(err))
            }
        };

        if saw_newline_before {
            token.ln_before = Some(true);
        }

        // Peek over the trailing trivia without committing to it; the next
        // call re-consumes it for real.
        self.cursor.mark();
        let saw_newline_after = self.skip_whitespace_and_comments();
        self.cursor.reset();
        if saw_newline_after {
            token.ln_after = Some(true);
        }

        self.manage_stack(&token);
        tracing::trace!(kind = ?token.kind, text = %token.text, "token");
        self.tokens.push(token);

        match halt {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Attempts the matchers in order: string, numeric, classifier.
    ///
    /// The classifier cannot fail to match: anything that is neither an
    /// identifier run nor a known lexeme becomes an Unclassified token.
    fn match_token(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.match_string()? {
            return Ok(token);
        }
        if let Some(token) = self.match_numeric()? {
            return Ok(token);
        }
        Ok(self.match_classified())
    }

    /// Skips whitespace and `###` line comments.
    ///
    /// Returns true if the skipped run contained a line break. A comment
    /// always counts as one, since it runs to the end of its line.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        if !self.bom_checked {
            self.bom_checked = true;
            if self.cursor.remaining().starts_with('\u{FEFF}') {
                self.cursor.advance();
            }
        }

        let mut saw_newline = false;
        loop {
            if self.cursor.remaining().starts_with("###") {
                while self.cursor.has_more() && !matches!(self.cursor.peek(), '\n' | '\r') {
                    self.cursor.advance();
                }
                saw_newline = true;
                continue;
            }

            if !self.cursor.has_more() {
                break;
            }
            let c = self.cursor.peek();
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' || c == '\r' {
                saw_newline = true;
            }
            self.cursor.advance();
        }
        saw_newline
    }

    /// Applies a token's effect on the expectation stack.
    ///
    /// Start pushes its non-empty `expecting` frame, End pops, Bridge
    /// replaces the top frame. Every other token is inert.
    fn manage_stack(&mut self, token: &Token) {
        match token.kind {
            TokenType::Start => {
                if let Some(expecting) = &token.expecting {
                    if !expecting.is_empty() {
                        self.expecting_stack.push(expecting.clone());
                    }
                }
            }
            TokenType::End => {
                self.expecting_stack.pop();
            }
            TokenType::Bridge => {
                if let Some(top) = self.expecting_stack.last_mut() {
                    *top = token.expecting.clone().unwrap_or_default();
                }
            }
            _ => {}
        }
    }

    /// The first lexeme of the current expectation frame, if any.
    pub(crate) fn currently_expected(&self) -> Option<&String> {
        self.expecting_stack.last().and_then(|frame| frame.first())
    }
}
