//! Numeric literal matching.
//!
//! Two shapes are recognized, radix form first:
//!
//! ```text
//! DIGITS+ [xobtr] HEXDIGITS (_ HEXDIGITS)* ( . HEXDIGITS* (_ HEXDIGITS)* )? ( e [+-]? DIGITS+ )?
//! DIGITS+ (_ DIGITS+)*     ( . DIGITS* (_ DIGITS+)* )?                      ( e [+-]? DIGITS+ )?
//! ```
//!
//! where HEXDIGITS are `[0-9A-Z]` (upper case only; lower case letters end
//! the literal). `x`/`o`/`b`/`t` demand a leading literal `0`; `r` takes a
//! decimal base 2..=36. The scan backtracks through cursor marks, so a
//! failed radix attempt falls through to the decimal shape.

use clovec_util::span::{Position, Span};

use crate::lexer::core::{LexError, Lexer};
use crate::token::{Token, TokenType};
use crate::unicode::{is_digit_for_base, is_radix_digit};

/// Scanned components of a numeric literal, underscores still in place.
struct NumParts {
    mantissa: String,
    fraction: Option<String>,
    exponent: Option<String>,
}

impl<'a> Lexer<'a> {
    /// Attempts to match a numeric literal at the cursor.
    ///
    /// Returns `Ok(None)` when the input does not start with a digit, and
    /// `Err` when a literal matched but is invalid for its base.
    pub(crate) fn match_numeric(&mut self) -> Result<Option<Token>, LexError> {
        if !self.cursor.peek().is_ascii_digit() {
            return Ok(None);
        }

        let start_byte = self.cursor.position();
        let start = self.cursor.pos();

        if let Some((lead, marker, parts)) = self.scan_radix_form() {
            return self
                .build_radix_token(start_byte, start, lead, marker, parts)
                .map(Some);
        }

        let parts = self.scan_decimal_form();
        self.build_decimal_token(start_byte, start, parts).map(Some)
    }

    /// Scans the radix shape, or backtracks and returns None.
    fn scan_radix_form(&mut self) -> Option<(String, char, NumParts)> {
        self.cursor.mark();

        let mut lead = String::new();
        while self.cursor.peek().is_ascii_digit() {
            lead.push(self.cursor.consume());
        }

        let marker = self.cursor.peek();
        if !matches!(marker, 'x' | 'o' | 'b' | 't' | 'r') {
            self.cursor.reset();
            return None;
        }
        self.cursor.advance();

        let mantissa = match self.scan_digit_run(is_radix_digit) {
            Some(digits) => digits,
            None => {
                self.cursor.reset();
                return None;
            }
        };
        let fraction = self.scan_fraction(is_radix_digit);
        let exponent = self.scan_exponent();

        self.cursor.pop_mark();
        Some((
            lead,
            marker,
            NumParts {
                mantissa,
                fraction,
                exponent,
            },
        ))
    }

    /// Scans the decimal shape. The caller guarantees a leading digit.
    fn scan_decimal_form(&mut self) -> NumParts {
        let is_decimal = |c: char| c.is_ascii_digit();
        let mantissa = self.scan_digit_run(is_decimal).unwrap_or_default();
        let fraction = self.scan_fraction(is_decimal);
        let exponent = self.scan_exponent();
        NumParts {
            mantissa,
            fraction,
            exponent,
        }
    }

    /// Scans `DIGIT+ (_ DIGIT+)*`, keeping underscores in the result.
    fn scan_digit_run(&mut self, is_digit: fn(char) -> bool) -> Option<String> {
        let mut digits = String::new();
        while is_digit(self.cursor.peek()) {
            digits.push(self.cursor.consume());
        }
        if digits.is_empty() {
            return None;
        }
        while self.cursor.peek() == '_' && is_digit(self.cursor.peek_nth(1)) {
            digits.push(self.cursor.consume());
            while is_digit(self.cursor.peek()) {
                digits.push(self.cursor.consume());
            }
        }
        Some(digits)
    }

    /// Scans `. DIGIT* (_ DIGIT+)*` when a dot is present. The dot commits:
    /// it is part of the literal even with no digits after it.
    fn scan_fraction(&mut self, is_digit: fn(char) -> bool) -> Option<String> {
        if self.cursor.peek() != '.' {
            return None;
        }
        self.cursor.advance();

        let mut digits = String::new();
        while is_digit(self.cursor.peek()) {
            digits.push(self.cursor.consume());
        }
        while self.cursor.peek() == '_' && is_digit(self.cursor.peek_nth(1)) {
            digits.push(self.cursor.consume());
            while is_digit(self.cursor.peek()) {
                digits.push(self.cursor.consume());
            }
        }
        Some(digits)
    }

    /// Scans `e [+-]? DIGIT+`, backtracking over a bare `e` with no digits.
    fn scan_exponent(&mut self) -> Option<String> {
        if self.cursor.peek() != 'e' {
            return None;
        }
        self.cursor.mark();
        self.cursor.advance();

        let mut text = String::new();
        if matches!(self.cursor.peek(), '+' | '-') {
            text.push(self.cursor.consume());
        }
        let mut has_digits = false;
        while self.cursor.peek().is_ascii_digit() {
            text.push(self.cursor.consume());
            has_digits = true;
        }

        if !has_digits {
            self.cursor.reset();
            return None;
        }
        self.cursor.pop_mark();
        Some(text)
    }

    fn build_radix_token(
        &mut self,
        start_byte: usize,
        start: Position,
        lead: String,
        marker: char,
        parts: NumParts,
    ) -> Result<Token, LexError> {
        let span = Span::new(start, self.cursor.pos());
        let text = self.cursor.slice_from(start_byte).to_string();
        let invalid = || LexError::new("invalid literal", text.clone(), span);

        let base = match marker {
            'x' | 'o' | 'b' | 't' => {
                if lead != "0" {
                    return Err(invalid());
                }
                match marker {
                    'x' => 16,
                    'o' => 8,
                    'b' => 2,
                    _ => 3,
                }
            }
            'r' => match lead.parse::<u32>() {
                Ok(base) if (2..=36).contains(&base) => base,
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };
        let balanced = marker == 't';

        let mantissa = parts.mantissa.replace('_', "");
        let fraction = parts.fraction.map(|f| f.replace('_', ""));

        if !digits_valid(&mantissa, base, balanced) {
            return Err(invalid());
        }
        if let Some(fraction) = &fraction {
            if !digits_valid(fraction, base, balanced) {
                return Err(invalid());
            }
        }

        let exponent = match parts.exponent {
            Some(digits) => match digits.parse::<i64>() {
                Ok(value) => value,
                Err(_) => return Err(invalid()),
            },
            None => 0,
        };

        let mut token = Token::new(text, TokenType::Numeric, span);
        token.radix = Some(format!("{}{}", lead, marker));
        token.base = Some(base);
        token.mantissa = Some(mantissa);
        token.fraction = fraction.filter(|f| !f.is_empty());
        token.exponent = (exponent != 0).then_some(exponent);
        token.balanced = balanced.then_some(true);
        Ok(token)
    }

    fn build_decimal_token(
        &mut self,
        start_byte: usize,
        start: Position,
        parts: NumParts,
    ) -> Result<Token, LexError> {
        let span = Span::new(start, self.cursor.pos());
        let text = self.cursor.slice_from(start_byte).to_string();

        let exponent = match parts.exponent {
            Some(digits) => match digits.parse::<i64>() {
                Ok(value) => value,
                Err(_) => return Err(LexError::new("invalid literal", text, span)),
            },
            None => 0,
        };

        let mut token = Token::new(text, TokenType::Numeric, span);
        token.radix = Some(String::new());
        token.base = Some(10);
        token.mantissa = Some(parts.mantissa.replace('_', ""));
        token.fraction = parts
            .fraction
            .map(|f| f.replace('_', ""))
            .filter(|f| !f.is_empty());
        token.exponent = (exponent != 0).then_some(exponent);
        Ok(token)
    }
}

/// Checks every digit of a component against the base.
fn digits_valid(digits: &str, base: u32, balanced: bool) -> bool {
    digits.chars().all(|c| is_digit_for_base(c, base, balanced))
}
