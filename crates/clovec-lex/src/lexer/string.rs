//! String literal matching.
//!
//! Four layered forms share this module:
//!
//! - cooked single-line strings for `"` `'` `` ` `` `«`, with escapes and
//!   bracketed interpolations;
//! - raw strings `@tag"…"`, copied verbatim;
//! - triple-quoted multi-line blocks, indent-stripped and re-lexed line by
//!   line;
//! - interpolation interiors, read by a small pushdown automaton that tracks
//!   bracket balance and nested quotes.

use clovec_util::span::{Position, Span};

use crate::lexer::core::{LexError, Lexer};
use crate::token::{QuoteKind, Token, TokenType};
use crate::unicode::{
    closing_quote_for, is_closing_quote, is_ident_continue, is_ident_start, is_opening_quote,
};

/// Returns true when `close` is the closing bracket for `open`.
fn brackets_match(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

/// Returns the leading whitespace when the line's sole non-whitespace
/// content is exactly three `quote` characters.
fn whitespace_before_triple_quote(line: &str, quote: char) -> Option<String> {
    let mut indent = String::new();
    let mut count = 0;
    for c in line.chars() {
        if c == quote {
            count += 1;
            if count > 3 {
                return None;
            }
        } else if c.is_whitespace() {
            if count > 0 && count < 3 {
                return None;
            }
            if count == 0 {
                indent.push(c);
            }
        } else {
            return None;
        }
    }
    if count == 3 {
        Some(indent)
    } else {
        None
    }
}

impl<'a> Lexer<'a> {
    /// Attempts to match a string literal at the cursor.
    pub(crate) fn match_string(&mut self) -> Result<Option<Token>, LexError> {
        let c = self.cursor.peek();
        if c == '@' {
            return self.match_raw_tagged().map(Some);
        }
        if !is_opening_quote(c) {
            return Ok(None);
        }
        if self.peek_triple_quote(is_opening_quote).is_some() {
            return self.read_multiline(false).map(Some);
        }
        self.read_string(false, c).map(Some)
    }

    /// Matches a raw string: `@`, an optional identifier tag, then a quoted
    /// body with no escapes and no interpolation.
    fn match_raw_tagged(&mut self) -> Result<Token, LexError> {
        let start_byte = self.cursor.position();
        let start = self.cursor.pos();
        self.cursor.advance(); // '@'
        let tag = self.take_tag_text();

        let quote = self.cursor.peek();
        if !is_opening_quote(quote) {
            return Err(self.string_error("expected string after @", start_byte, start));
        }

        let mut token = if self.peek_triple_quote(is_opening_quote).is_some() {
            self.read_multiline(true)?
        } else {
            self.read_raw_string(false, quote)?
        };

        // Widen the token over the @tag so the span covers the whole lexeme.
        token.span.start = start;
        token.text = self.cursor.slice_from(start_byte).to_string();

        if let Some(existing) = &token.specifier {
            if !tag.is_empty() && existing != &tag {
                return Err(self.string_error(
                    "tag does not match code-fence specifier",
                    start_byte,
                    start,
                ));
            }
        }
        if !tag.is_empty() {
            token.specifier = Some(tag);
        }
        Ok(token)
    }

    /// Reads a cooked string body.
    ///
    /// In `unquoted` mode the body is one line of a multi-line block: there
    /// is no opening quote to consume, quote characters are literal, and the
    /// line terminator ends the body without being consumed.
    fn read_string(&mut self, unquoted: bool, default_quote: char) -> Result<Token, LexError> {
        let start_byte = self.cursor.position();
        let start = self.cursor.pos();

        let quote = if unquoted {
            default_quote
        } else {
            closing_quote_for(self.cursor.consume())
        };
        let quote_kind = QuoteKind::from_open(quote).unwrap_or(QuoteKind::Double);

        let mut value = String::new();
        let mut sub_tokens: Vec<Token> = Vec::new();
        let mut had_interpolation = false;
        let mut chunk_byte = start_byte;
        let mut chunk_start = start;

        loop {
            if !self.cursor.has_more() {
                if unquoted {
                    break;
                }
                return Err(self.string_error("unterminated string", start_byte, start));
            }
            if unquoted && matches!(self.cursor.peek(), '\n' | '\r') {
                // The caller owns the line terminator.
                break;
            }

            let before = self.cursor.pos();
            let before_byte = self.cursor.position();
            let r = self.cursor.consume();

            if !unquoted && r == quote {
                break;
            }

            if r == '\\' && self.cursor.has_more() {
                let next = self.cursor.peek();
                if matches!(next, '(' | '[' | '{') {
                    // Close the accumulated chunk, then read the interior.
                    if !value.is_empty() {
                        let text = self.cursor.source()[chunk_byte..before_byte].to_string();
                        sub_tokens.push(Token::string(
                            text,
                            std::mem::take(&mut value),
                            quote_kind,
                            Span::new(chunk_start, before),
                        ));
                    }
                    let expr = self.read_interpolation()?;
                    sub_tokens.push(expr);
                    had_interpolation = true;
                    chunk_byte = self.cursor.position();
                    chunk_start = self.cursor.pos();
                } else {
                    let expansion = self.read_escape();
                    value.push_str(&expansion);
                }
            } else if r == '\n' || r == '\r' {
                return Err(self.string_error("line break in string", start_byte, start));
            } else {
                value.push(r);
            }
        }

        let full_text = self.cursor.slice_from(start_byte).to_string();
        let span = Span::new(start, self.cursor.pos());

        if !had_interpolation {
            return Ok(Token::string(full_text, value, quote_kind, span));
        }

        if !value.is_empty() {
            let text = self.cursor.source()[chunk_byte..self.cursor.position()].to_string();
            sub_tokens.push(Token::string(
                text,
                value,
                quote_kind,
                Span::new(chunk_start, self.cursor.pos()),
            ));
        }

        let mut token = Token::new(full_text, TokenType::Interpolated, span);
        token.quote = Some(quote_kind);
        token.subtokens = Some(sub_tokens);
        Ok(token)
    }

    /// Reads a raw string body: backslashes are ordinary characters.
    fn read_raw_string(&mut self, unquoted: bool, default_quote: char) -> Result<Token, LexError> {
        let start_byte = self.cursor.position();
        let start = self.cursor.pos();

        let quote = if unquoted {
            default_quote
        } else {
            closing_quote_for(self.cursor.consume())
        };

        let mut value = String::new();
        loop {
            if !self.cursor.has_more() {
                if unquoted {
                    break;
                }
                return Err(self.string_error("unterminated raw string", start_byte, start));
            }
            if unquoted && matches!(self.cursor.peek(), '\n' | '\r') {
                break;
            }
            let r = self.cursor.consume();
            if !unquoted && r == quote {
                break;
            }
            if r == '\n' || r == '\r' {
                return Err(self.string_error("line break in raw string", start_byte, start));
            }
            value.push(r);
        }

        let text = self.cursor.slice_from(start_byte).to_string();
        let span = Span::new(start, self.cursor.pos());
        let quote_kind = QuoteKind::from_open(quote).unwrap_or(QuoteKind::Double);
        Ok(Token::string(text, value, quote_kind, span))
    }

    /// Reads an interpolation interior with a two-state pushdown automaton.
    ///
    /// The cursor sits on the opening bracket; the backslash has been
    /// consumed. The resulting `e` token carries the raw interior text,
    /// brackets excluded. Line breaks anywhere inside are an error.
    fn read_interpolation(&mut self) -> Result<Token, LexError> {
        let open_byte = self.cursor.position();
        let open_pos = self.cursor.pos();
        let opening = self.cursor.consume();
        let interior_byte = self.cursor.position();
        let interior_start = self.cursor.pos();

        let mut stack: Vec<char> = vec![opening];
        let mut in_string = false;

        loop {
            if !self.cursor.has_more() {
                return Err(self.string_error("unterminated interpolation", open_byte, open_pos));
            }
            let before = self.cursor.pos();
            let before_byte = self.cursor.position();
            let r = self.cursor.consume();

            if r == '\n' || r == '\r' {
                return Err(self.string_error("line break in interpolation", open_byte, open_pos));
            }

            if in_string {
                match r {
                    '\\' => {
                        if !self.cursor.has_more() {
                            return Err(self.string_error(
                                "unterminated interpolation",
                                open_byte,
                                open_pos,
                            ));
                        }
                        let next = self.cursor.peek();
                        if matches!(next, '(' | '[' | '{') {
                            // A nested interpolation; its text stays part of
                            // this interior.
                            self.read_interpolation()?;
                        } else {
                            self.read_escape();
                        }
                    }
                    c if Some(c) == stack.last().copied() => {
                        stack.pop();
                        in_string = false;
                    }
                    _ => {}
                }
                continue;
            }

            match r {
                '\\' => {
                    self.read_escape();
                }
                '(' | '[' | '{' => stack.push(r),
                ')' | ']' | '}' => {
                    let matched = stack
                        .last()
                        .copied()
                        .map(|open| brackets_match(open, r))
                        .unwrap_or(false);
                    if !matched {
                        return Err(self.string_error(
                            "mismatched bracket in interpolation",
                            open_byte,
                            open_pos,
                        ));
                    }
                    stack.pop();
                    if stack.is_empty() {
                        let text = self.cursor.source()[interior_byte..before_byte].to_string();
                        let span = Span::new(interior_start, before);
                        return Ok(Token::new(text, TokenType::Expression, span));
                    }
                }
                '"' | '\'' | '`' | '«' => {
                    stack.push(closing_quote_for(r));
                    in_string = true;
                }
                _ => {}
            }
        }
    }

    /// Expands one escape sequence; the backslash is already consumed.
    ///
    /// Unknown escapes are kept verbatim, backslash included. `\_` expands
    /// to nothing: it breaks up dense character runs and lets foreign
    /// identifiers be spliced into a string.
    fn read_escape(&mut self) -> String {
        let r = self.cursor.consume();
        match r {
            'b' => "\u{0008}".to_string(),
            'f' => "\u{000C}".to_string(),
            'n' => "\n".to_string(),
            'r' => "\r".to_string(),
            't' => "\t".to_string(),
            '\\' | '/' | '"' | '\'' | '`' | '»' => r.to_string(),
            'u' => self.read_unicode_escape(),
            '_' => String::new(),
            _ => format!("\\{}", r),
        }
    }

    /// Reads up to four hex digits of a `\uXXXX` escape.
    ///
    /// Short or unencodable sequences are kept verbatim and scanning resumes
    /// at the first non-hex character.
    fn read_unicode_escape(&mut self) -> String {
        let mut hex = String::new();
        while hex.len() < 4 && self.cursor.peek().is_ascii_hexdigit() {
            hex.push(self.cursor.consume());
        }
        if hex.len() == 4 {
            if let Some(c) = u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
            {
                return c.to_string();
            }
        }
        format!("\\u{}", hex)
    }

    /// Reads a triple-quoted multi-line block.
    ///
    /// The scan runs twice: a marked look-ahead locates the closing line and
    /// its indent, then the content lines are consumed for real, each lexed
    /// as a single-line body with the closing indent stripped.
    fn read_multiline(&mut self, raw: bool) -> Result<Token, LexError> {
        let start_byte = self.cursor.position();
        let start = self.cursor.pos();

        let (opening_quote, closing_indent, specifier, nlines) =
            self.find_closing_indent(start_byte, start)?;
        let closing_quote = closing_quote_for(opening_quote);
        let quote_kind = QuoteKind::from_open(opening_quote).unwrap_or(QuoteKind::Double);

        // Skip the opening line again: quotes plus specifier.
        self.read_rest_of_line();

        let mut sub_tokens = Vec::with_capacity(nlines);
        for _ in 0..nlines {
            if self.cursor.try_consume_str(&closing_indent) {
                let token = if raw {
                    self.read_raw_string(true, opening_quote)?
                } else {
                    self.read_string(true, opening_quote)?
                };
                self.cursor.try_consume_newline();
                sub_tokens.push(token);
            } else {
                // An empty line; there is no indent to strip.
                let token = Token::string("", "", quote_kind, Span::point(self.cursor.pos()));
                self.cursor.try_consume_newline();
                sub_tokens.push(token);
            }
        }

        // The closing line: optional whitespace, then the triple quotes.
        self.skip_spaces_on_line();
        match self.peek_triple_quote(is_closing_quote) {
            Some(q) if q == closing_quote => {
                self.cursor.advance();
                self.cursor.advance();
                self.cursor.advance();
            }
            _ => {
                return Err(self.string_error("missing closing triple quotes", start_byte, start));
            }
        }

        let full_text = self.cursor.slice_from(start_byte).to_string();
        let span = Span::new(start, self.cursor.pos());
        let mut token = Token::new(full_text, TokenType::MultiLine, span);
        token.quote = Some(quote_kind);
        if !specifier.is_empty() {
            token.specifier = Some(specifier);
        }
        token.subtokens = Some(sub_tokens);
        Ok(token)
    }

    /// Marked look-ahead over a multi-line block.
    ///
    /// Returns the opening quote, the closing indent, the specifier, and the
    /// number of content lines, with the cursor restored to the opening
    /// quotes.
    fn find_closing_indent(
        &mut self,
        start_byte: usize,
        start: Position,
    ) -> Result<(char, String, String, usize), LexError> {
        self.cursor.mark();

        let opening = self.cursor.peek();
        self.cursor.advance();
        self.cursor.advance();
        self.cursor.advance();
        let closing = closing_quote_for(opening);

        let specifier = match self.read_specifier_line() {
            Ok(text) => text,
            Err(reason) => {
                let err = self.string_error(&reason, start_byte, start);
                self.cursor.pop_mark();
                return Err(err);
            }
        };

        let mut lines: Vec<String> = Vec::new();
        let mut closing_indent: Option<String> = None;
        while self.cursor.has_more() {
            let line = self.read_rest_of_line();
            if let Some(indent) = whitespace_before_triple_quote(&line, closing) {
                closing_indent = Some(indent);
                break;
            }
            lines.push(line);
        }

        let closing_indent = match closing_indent {
            Some(indent) => indent,
            None => {
                let err = self.string_error("closing triple quote not found", start_byte, start);
                self.cursor.pop_mark();
                return Err(err);
            }
        };

        for line in &lines {
            if line.is_empty() {
                continue;
            }
            if !line.starts_with(&closing_indent) {
                let err = self.string_error(
                    "not indented consistently with the closing triple quote",
                    start_byte,
                    start,
                );
                self.cursor.pop_mark();
                return Err(err);
            }
        }

        let nlines = lines.len();
        self.cursor.reset();
        Ok((opening, closing_indent, specifier, nlines))
    }

    /// Reads the specifier from the rest of the opening line.
    fn read_specifier_line(&mut self) -> Result<String, String> {
        let line = self.read_rest_of_line();
        let text = line.trim();
        if text.contains(' ') {
            return Err("spaces inside code-fence specifier".to_string());
        }
        if !text.is_empty() {
            let mut chars = text.chars();
            let head_ok = chars.next().map(is_ident_start).unwrap_or(false);
            if !head_ok || !chars.all(is_ident_continue) {
                return Err("invalid code-fence specifier".to_string());
            }
        }
        Ok(text.to_string())
    }

    /// Peeks for three identical quote characters accepted by `is_quote`.
    fn peek_triple_quote(&self, is_quote: fn(char) -> bool) -> Option<char> {
        let q = self.cursor.peek();
        if is_quote(q) && self.cursor.peek_nth(1) == q && self.cursor.peek_nth(2) == q {
            Some(q)
        } else {
            None
        }
    }

    /// Reads an identifier-shaped tag, possibly empty.
    fn take_tag_text(&mut self) -> String {
        let mut text = String::new();
        if !is_ident_start(self.cursor.peek()) {
            return text;
        }
        while is_ident_continue(self.cursor.peek()) {
            text.push(self.cursor.consume());
        }
        text
    }

    /// Reads to the end of the line, consuming the terminator but not
    /// including it in the result.
    fn read_rest_of_line(&mut self) -> String {
        let mut text = String::new();
        while self.cursor.has_more() {
            let c = self.cursor.peek();
            if c == '\n' || c == '\r' {
                break;
            }
            text.push(self.cursor.consume());
        }
        self.cursor.try_consume_newline();
        text
    }

    /// Skips horizontal whitespace, stopping at any line terminator.
    fn skip_spaces_on_line(&mut self) {
        while self.cursor.has_more() {
            let c = self.cursor.peek();
            if c == '\n' || c == '\r' || !c.is_whitespace() {
                break;
            }
            self.cursor.advance();
        }
    }

    /// Builds a string-matcher failure covering the consumed source.
    fn string_error(&self, reason: &str, start_byte: usize, start: Position) -> LexError {
        LexError::new(
            reason,
            self.cursor.slice_from(start_byte).to_string(),
            Span::new(start, self.cursor.pos()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexOutcome;
    use crate::rules::RuleTable;

    fn lex(source: &str) -> LexOutcome {
        let rules = RuleTable::default_rules();
        Lexer::new(source, &rules).tokenize()
    }

    fn single(source: &str) -> Token {
        let outcome = lex(source);
        assert!(
            !outcome.is_halted(),
            "unexpected halt on {:?}: {:?}",
            source,
            outcome.error
        );
        assert_eq!(outcome.tokens.len(), 1, "expected one token for {:?}", source);
        outcome.tokens.into_iter().next().unwrap()
    }

    fn halted_reason(source: &str) -> String {
        let outcome = lex(source);
        outcome.error.expect("expected halt").reason
    }

    #[test]
    fn test_plain_strings_by_quote() {
        let token = single("\"hello\"");
        assert_eq!(token.kind, TokenType::Str);
        assert_eq!(token.text, "\"hello\"");
        assert_eq!(token.value.as_deref(), Some("hello"));
        assert_eq!(token.quote, Some(QuoteKind::Double));

        let token = single("'world'");
        assert_eq!(token.value.as_deref(), Some("world"));
        assert_eq!(token.quote, Some(QuoteKind::Single));

        let token = single("`tick`");
        assert_eq!(token.quote, Some(QuoteKind::Backtick));

        let token = single("«guillemets»");
        assert_eq!(token.value.as_deref(), Some("guillemets"));
        assert_eq!(token.quote, Some(QuoteKind::Guillemet));
    }

    #[test]
    fn test_empty_string() {
        let token = single("\"\"");
        assert_eq!(token.kind, TokenType::Str);
        assert_eq!(token.value.as_deref(), Some(""));
        assert_eq!(token.subtokens, None);
    }

    #[test]
    fn test_escape_sequences() {
        let token = single(r#""a\nb\tc\\d\"e""#);
        assert_eq!(token.value.as_deref(), Some("a\nb\tc\\d\"e"));

        let token = single(r#""\b\f\r\/""#);
        assert_eq!(token.value.as_deref(), Some("\u{8}\u{c}\r/"));
    }

    #[test]
    fn test_unknown_escape_kept_verbatim() {
        let token = single(r#""\q""#);
        assert_eq!(token.value.as_deref(), Some("\\q"));
    }

    #[test]
    fn test_underscore_escape_expands_to_nothing() {
        let token = single(r#""ab\_cd""#);
        assert_eq!(token.value.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_unicode_escape() {
        let token = single(r#""\u0041""#);
        assert_eq!(token.value.as_deref(), Some("A"));

        let token = single(r#""\u00e9!""#);
        assert_eq!(token.value.as_deref(), Some("é!"));
    }

    #[test]
    fn test_malformed_unicode_escape_kept_verbatim() {
        let token = single(r#""\u12x""#);
        assert_eq!(token.value.as_deref(), Some("\\u12x"));

        // Surrogate code points cannot be encoded.
        let token = single(r#""\uD800""#);
        assert_eq!(token.value.as_deref(), Some("\\uD800"));
    }

    #[test]
    fn test_unterminated_string_halts() {
        assert_eq!(halted_reason("\"oops"), "unterminated string");
    }

    #[test]
    fn test_newline_in_string_halts() {
        assert_eq!(halted_reason("\"line\nbreak\""), "line break in string");
    }

    #[test]
    fn test_interpolation_basic() {
        let token = single(r#""Hello, \(name)!""#);
        assert_eq!(token.kind, TokenType::Interpolated);
        assert_eq!(token.text, r#""Hello, \(name)!""#);
        assert_eq!(token.value, None);

        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].kind, TokenType::Str);
        assert_eq!(subs[0].value.as_deref(), Some("Hello, "));
        assert_eq!(subs[1].kind, TokenType::Expression);
        assert_eq!(subs[1].text, "name");
        assert_eq!(subs[2].kind, TokenType::Str);
        assert_eq!(subs[2].value.as_deref(), Some("!"));
    }

    #[test]
    fn test_interpolation_bracket_kinds() {
        for source in [r#""\(x)""#, r#""\[x]""#, r#""\{x}""#] {
            let token = single(source);
            assert_eq!(token.kind, TokenType::Interpolated, "for {:?}", source);
            let subs = token.subtokens.as_deref().unwrap();
            assert_eq!(subs.len(), 1);
            assert_eq!(subs[0].kind, TokenType::Expression);
            assert_eq!(subs[0].text, "x");
        }
    }

    #[test]
    fn test_interpolation_tracks_nested_brackets() {
        let token = single(r#""\(f(a[0], {b}))""#);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].text, "f(a[0], {b})");
    }

    #[test]
    fn test_interpolation_reenters_string_mode() {
        let token = single(r#""\(f(")"))""#);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].text, r#"f(")")"#);
    }

    #[test]
    fn test_interpolation_nested_interpolation() {
        let token = single(r#""\(f("\(y)"))""#);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].text, r#"f("\(y)")"#);
    }

    #[test]
    fn test_interpolation_errors() {
        assert_eq!(
            halted_reason(r#""\(unclosed"#),
            "unterminated interpolation"
        );
        assert_eq!(
            halted_reason(r#""\(a]b)""#),
            "mismatched bracket in interpolation"
        );
        assert_eq!(
            halted_reason("\"\\(a\nb)\""),
            "line break in interpolation"
        );
    }

    #[test]
    fn test_interpolation_span_coverage() {
        let source = r#""Hello, \(name)!""#;
        let token = single(source);
        for sub in token.subtokens.as_deref().unwrap() {
            let sc = (sub.span.start.column - 1) as usize;
            let ec = (sub.span.end.column - 1) as usize;
            let slice: String = source.chars().skip(sc).take(ec - sc).collect();
            assert_eq!(slice, sub.text);
        }
    }

    #[test]
    fn test_raw_string() {
        let token = single(r#"@"no \n escapes""#);
        assert_eq!(token.kind, TokenType::Str);
        assert_eq!(token.value.as_deref(), Some(r"no \n escapes"));
        assert_eq!(token.specifier, None);
        assert_eq!(token.text, r#"@"no \n escapes""#);
    }

    #[test]
    fn test_raw_string_with_tag() {
        let token = single(r#"@sql"select 1""#);
        assert_eq!(token.value.as_deref(), Some("select 1"));
        assert_eq!(token.specifier.as_deref(), Some("sql"));
        assert_eq!(token.span.start.column, 1);
    }

    #[test]
    fn test_stray_at_sign_halts() {
        assert_eq!(halted_reason("@ x"), "expected string after @");
    }

    #[test]
    fn test_multiline_basic() {
        let source = "\"\"\"\n  one\n  two\n  \"\"\"";
        let token = single(source);
        assert_eq!(token.kind, TokenType::MultiLine);
        assert_eq!(token.text, source);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].value.as_deref(), Some("one"));
        assert_eq!(subs[1].value.as_deref(), Some("two"));
    }

    #[test]
    fn test_multiline_strips_closing_indent_only() {
        let source = "\"\"\"\n  keep  spaces\n  \"\"\"";
        let token = single(source);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].value.as_deref(), Some("keep  spaces"));
    }

    #[test]
    fn test_multiline_with_specifier() {
        let source = "\"\"\"sql\n  select 1\n  \"\"\"";
        let token = single(source);
        assert_eq!(token.specifier.as_deref(), Some("sql"));
    }

    #[test]
    fn test_multiline_empty_lines_allowed() {
        let source = "\"\"\"\n  one\n\n  two\n  \"\"\"";
        let token = single(source);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[1].value.as_deref(), Some(""));
        assert_eq!(subs[2].value.as_deref(), Some("two"));
    }

    #[test]
    fn test_multiline_cooked_lines_support_escapes() {
        let source = "\"\"\"\n  a\\tb\n  \"\"\"";
        let token = single(source);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].value.as_deref(), Some("a\tb"));
    }

    #[test]
    fn test_multiline_raw_lines_keep_backslashes() {
        let source = "@\"\"\"\n  a\\tb\n  \"\"\"";
        let token = single(source);
        assert_eq!(token.kind, TokenType::MultiLine);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].value.as_deref(), Some("a\\tb"));
    }

    #[test]
    fn test_multiline_line_with_interpolation() {
        let source = "\"\"\"\n  a \\(x) b\n  \"\"\"";
        let token = single(source);
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].kind, TokenType::Interpolated);
        let inner = subs[0].subtokens.as_deref().unwrap();
        assert_eq!(inner[1].text, "x");
    }

    #[test]
    fn test_multiline_inconsistent_indent_halts() {
        let source = "\"\"\"\n    one\n two\n    \"\"\"";
        assert_eq!(
            halted_reason(source),
            "not indented consistently with the closing triple quote"
        );
    }

    #[test]
    fn test_multiline_missing_close_halts() {
        assert_eq!(
            halted_reason("\"\"\"\n  body\n"),
            "closing triple quote not found"
        );
    }

    #[test]
    fn test_multiline_bad_specifier_halts() {
        assert_eq!(
            halted_reason("\"\"\"a b\n x\n \"\"\""),
            "spaces inside code-fence specifier"
        );
        assert_eq!(
            halted_reason("\"\"\"1sql\n x\n \"\"\""),
            "invalid code-fence specifier"
        );
    }

    #[test]
    fn test_multiline_tag_specifier_mismatch_halts() {
        assert_eq!(
            halted_reason("@txt\"\"\"sql\n x\n \"\"\""),
            "tag does not match code-fence specifier"
        );
    }

    #[test]
    fn test_multiline_tag_agreeing_with_specifier() {
        let token = single("@sql\"\"\"sql\n x\n \"\"\"");
        assert_eq!(token.specifier.as_deref(), Some("sql"));
    }

    #[test]
    fn test_multiline_guillemets() {
        let source = "«««\n  body\n  »»»";
        let token = single(source);
        assert_eq!(token.kind, TokenType::MultiLine);
        assert_eq!(token.quote, Some(QuoteKind::Guillemet));
        let subs = token.subtokens.as_deref().unwrap();
        assert_eq!(subs[0].value.as_deref(), Some("body"));
    }

    #[test]
    fn test_whitespace_before_triple_quote() {
        assert_eq!(
            whitespace_before_triple_quote("  \"\"\"", '"'),
            Some("  ".to_string())
        );
        assert_eq!(
            whitespace_before_triple_quote("\"\"\"", '"'),
            Some(String::new())
        );
        assert_eq!(whitespace_before_triple_quote("  \"\" x", '"'), None);
        assert_eq!(whitespace_before_triple_quote("  \"\"\"\"", '"'), None);
        assert_eq!(whitespace_before_triple_quote("x \"\"\"", '"'), None);
        assert_eq!(whitespace_before_triple_quote("", '"'), None);
    }
}
