//! Token model and its wire format.
//!
//! Every token is a flat record with `text`, `span`, and a single-letter
//! `type` tag, plus conditional fields that are only serialized when present.
//! The shape is stable: downstream consumers parse the emitted JSON Lines
//! directly.

use std::fmt;

use clovec_util::span::Span;
use serde::{Deserialize, Serialize};

/// Discriminant tag for a token. Serializes to a single-letter string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// Numeric literal.
    #[serde(rename = "n")]
    Numeric,
    /// String literal.
    #[serde(rename = "s")]
    Str,
    /// Multi-line (triple-quoted) string literal.
    #[serde(rename = "m")]
    MultiLine,
    /// String literal containing interpolations.
    #[serde(rename = "i")]
    Interpolated,
    /// Interpolated expression chunk (interior source text only).
    #[serde(rename = "e")]
    Expression,
    /// Form start keyword (`def`, `if`, ...).
    #[serde(rename = "S")]
    Start,
    /// Form end keyword (`end`, `endif`, ...).
    #[serde(rename = "E")]
    End,
    /// Interior keyword connecting block sections (`then`, `else`, ...).
    #[serde(rename = "B")]
    Bridge,
    /// Prefix keyword (`return`, `yield`).
    #[serde(rename = "P")]
    Prefix,
    /// Variable identifier.
    #[serde(rename = "V")]
    Variable,
    /// Operator.
    #[serde(rename = "O")]
    Operator,
    /// Opening delimiter.
    #[serde(rename = "[")]
    OpenDelim,
    /// Closing delimiter.
    #[serde(rename = "]")]
    CloseDelim,
    /// Punctuation mark (`,`, `;`).
    #[serde(rename = "M")]
    Mark,
    /// Unclassified token.
    #[serde(rename = "U")]
    Unclassified,
    /// Exception: tokenization failed here and the stream halts.
    #[serde(rename = "X")]
    Exception,
}

/// How many sub-clauses a start or bridge construct admits.
///
/// Serializes as the integer `0`, `1`, or `2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Zero,
    One,
    Many,
}

impl Default for Arity {
    fn default() -> Self {
        Arity::One
    }
}

impl Serialize for Arity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value: u8 = match self {
            Arity::Zero => 0,
            Arity::One => 1,
            Arity::Many => 2,
        };
        serializer.serialize_u8(value)
    }
}

impl<'de> Deserialize<'de> for Arity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match u8::deserialize(deserializer)? {
            0 => Ok(Arity::Zero),
            1 => Ok(Arity::One),
            2 => Ok(Arity::Many),
            other => Err(serde::de::Error::custom(format!(
                "invalid arity value {}",
                other
            ))),
        }
    }
}

/// The quote character family a string literal was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteKind {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "backtick")]
    Backtick,
    #[serde(rename = "«")]
    Guillemet,
}

impl QuoteKind {
    /// Maps an opening quote character to its kind.
    pub fn from_open(quote: char) -> Option<QuoteKind> {
        match quote {
            '\'' => Some(QuoteKind::Single),
            '"' => Some(QuoteKind::Double),
            '`' => Some(QuoteKind::Backtick),
            '«' | '»' => Some(QuoteKind::Guillemet),
            _ => None,
        }
    }
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuoteKind::Single => "single",
            QuoteKind::Double => "double",
            QuoteKind::Backtick => "backtick",
            QuoteKind::Guillemet => "«",
        };
        f.write_str(label)
    }
}

/// A single token of Clove source code.
///
/// `text` is always the exact source slice the token was matched from, and
/// `span` covers exactly that slice. All other fields are conditional on the
/// token type and are omitted from the wire format when `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Original source text of the token.
    pub text: String,

    /// Source range, `[start_line, start_col, end_line, end_col]` on the wire.
    pub span: Span,

    /// Token type tag.
    #[serde(rename = "type")]
    pub kind: TokenType,

    /// Donor keyword a wildcard token is standing in for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    // String fields
    /// Interpreted string body with escapes applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Quote family of a string token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteKind>,

    /// Content dialect tag of a raw or multi-line string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,

    /// Sub-tokens of an interpolated or multi-line string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtokens: Option<Vec<Token>>,

    // Numeric fields
    /// Textual radix prefix (`"0x"`, `"16r"`, `""` for plain decimal).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radix: Option<String>,

    /// Numeric base, 2..=36.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<u32>,

    /// Integer digits with underscores stripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mantissa: Option<String>,

    /// Fractional digits with underscores stripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<String>,

    /// Signed decimal exponent; present only when non-zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<i64>,

    /// Set for balanced ternary literals (`0t`, digit `T` meaning -1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balanced: Option<bool>,

    // Start / bridge fields
    /// Follower keywords this construct expects next.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expecting: Option<Vec<String>>,

    /// Constructs a bridge may appear inside.
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<String>>,

    /// Keywords that close this construct or delimiter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<Vec<String>>,

    /// Sub-clause arity of a start or bridge construct.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,

    // Operator fields
    /// `[prefix, infix, postfix]` precedences; zero disables a role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedence: Option<[i64; 3]>,

    // Open delimiter fields
    /// Infix precedence of an opening delimiter; omitted when 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infix: Option<i64>,

    /// Whether an opening delimiter may be used in prefix position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<bool>,

    // Exception fields
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    // Newline adjacency
    /// Set when the gap before this token contained a line break or comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ln_before: Option<bool>,

    /// Set when the gap after this token contained a line break or comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ln_after: Option<bool>,
}

impl Token {
    /// Creates a bare token of the given type with all conditional fields
    /// unset.
    pub fn new(text: impl Into<String>, kind: TokenType, span: Span) -> Self {
        Token {
            text: text.into(),
            span,
            kind,
            alias: None,
            value: None,
            quote: None,
            specifier: None,
            subtokens: None,
            radix: None,
            base: None,
            mantissa: None,
            fraction: None,
            exponent: None,
            balanced: None,
            expecting: None,
            containers: None,
            closed_by: None,
            arity: None,
            precedence: None,
            infix: None,
            prefix: None,
            reason: None,
            ln_before: None,
            ln_after: None,
        }
    }

    /// Creates a plain string token with its interpreted value.
    pub fn string(
        text: impl Into<String>,
        value: impl Into<String>,
        quote: QuoteKind,
        span: Span,
    ) -> Self {
        let mut token = Token::new(text, TokenType::Str, span);
        token.value = Some(value.into());
        token.quote = Some(quote);
        token
    }

    /// Creates an exception token carrying the failure reason.
    pub fn exception(text: impl Into<String>, reason: impl Into<String>, span: Span) -> Self {
        let mut token = Token::new(text, TokenType::Exception, span);
        token.reason = Some(reason.into());
        token
    }

    /// Stores a list field, normalizing empty lists to absent so that the
    /// wire format never carries empty arrays.
    pub(crate) fn some_if_nonempty(items: Vec<String>) -> Option<Vec<String>> {
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}
