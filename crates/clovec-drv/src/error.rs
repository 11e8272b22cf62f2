//! Error handling for the clovec driver.
//!
//! This module provides the driver's error type using `thiserror`. Library
//! failures are wrapped here and rendered once, at the process boundary.

use thiserror::Error;

/// Main error type for the clovec driver.
#[derive(Error, Debug)]
pub enum DrvError {
    /// IO failure while reading input or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A rules file could not be parsed.
    #[error("failed to parse rules file: {0}")]
    RulesParse(#[from] toml::de::Error),

    /// A rules file could not be rendered.
    #[error("failed to render rules: {0}")]
    RulesRender(#[from] toml::ser::Error),

    /// The composed rule set is inconsistent.
    #[error("invalid rules: {0}")]
    Rules(#[from] clovec_lex::RuleError),

    /// A token could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using DrvError.
pub type Result<T> = std::result::Result<T, DrvError>;
