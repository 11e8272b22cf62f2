//! Lexer module.
//!
//! This module organizes the tokenizer into smaller, focused components:
//! - `core` - Main Lexer struct, driver loop, and expectation stack
//! - `number` - Numeric literal matching across radixes
//! - `string` - String literal matching: cooked, raw, interpolated, multi-line
//! - `classify` - Identifier/operator classification against the rule table

mod classify;
mod core;
mod number;
mod string;

pub use self::core::{LexError, LexOutcome, Lexer};
