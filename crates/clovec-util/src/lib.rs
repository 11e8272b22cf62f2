//! clovec-util - Foundation Types
//!
//! This crate provides the fundamental types shared by the Clove tokenizer
//! crates.
//!
//! # Modules
//!
//! - [`span`] - Source location tracking
//!
//! # Example
//!
//! ```
//! use clovec_util::span::{Position, Span};
//!
//! let span = Span::new(Position::new(1, 1), Position::new(1, 4));
//! assert_eq!(span.start.line, 1);
//! assert_eq!(span.end.column, 4);
//! ```

pub mod span;

pub use span::{Position, Span};
