//! clovec-lex - Lexical Analyzer for the Clove language
//!
//! This crate turns Clove source text into a stream of classified tokens.
//! Classification is context-sensitive: a rule table maps lexemes to token
//! kinds, and a wildcard glyph (`:` by default) takes on the attributes of
//! whichever keyword the surrounding construct is expecting.
//!
//! The matchers run in a fixed order over the remaining input: string
//! literals, numeric literals, then the rule-table classifier. Failures are
//! materialized as a trailing Exception token and halt the run; the tokens
//! produced before the failure stay valid.
//!
//! # Example
//!
//! ```
//! use clovec_lex::{Lexer, RuleTable, TokenType};
//!
//! let rules = RuleTable::default_rules();
//! let outcome = Lexer::new("def foo(x) x + 1 end", &rules).tokenize();
//!
//! assert_eq!(outcome.tokens.len(), 9);
//! assert_eq!(outcome.tokens[0].kind, TokenType::Start);
//! assert_eq!(outcome.tokens.last().unwrap().kind, TokenType::End);
//! ```

pub mod cursor;
mod edge_cases;
pub mod lexer;
pub mod rules;
pub mod token;
pub mod unicode;

pub use lexer::{LexError, LexOutcome, Lexer};
pub use rules::{Rule, RuleConfig, RuleError, RuleTable};
pub use token::{Arity, QuoteKind, Token, TokenType};
