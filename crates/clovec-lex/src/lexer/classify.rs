//! Identifier and operator classification.
//!
//! The candidate lexeme at the cursor is an identifier run, a maximal
//! operator run, or a single rune, in that order. One rule-table lookup
//! classifies it; a wildcard hit defers to the expectation stack and copies
//! the attributes of whichever keyword the surrounding construct was
//! expecting.

use clovec_util::span::Span;

use crate::lexer::core::Lexer;
use crate::rules::{BridgeData, DelimData, Rule, StartData};
use crate::token::{Token, TokenType};
use crate::unicode::{is_ident_continue, is_ident_start, is_operator_char};

fn start_token(text: &str, data: &StartData, span: Span, alias: Option<String>) -> Token {
    let mut token = Token::new(text, TokenType::Start, span);
    token.expecting = Token::some_if_nonempty(data.expecting.clone());
    token.closed_by = Token::some_if_nonempty(data.closed_by.clone());
    token.arity = Some(data.arity);
    token.alias = alias;
    token
}

fn bridge_token(text: &str, data: &BridgeData, span: Span, alias: Option<String>) -> Token {
    let mut token = Token::new(text, TokenType::Bridge, span);
    token.expecting = Token::some_if_nonempty(data.expecting.clone());
    token.containers = Token::some_if_nonempty(data.containers.clone());
    token.arity = Some(data.arity);
    token.alias = alias;
    token
}

fn delimiter_token(text: &str, data: &DelimData, span: Span) -> Token {
    let mut token = Token::new(text, TokenType::OpenDelim, span);
    token.closed_by = Token::some_if_nonempty(data.closed_by.clone());
    token.infix = (data.infix != 0).then_some(data.infix);
    token.prefix = Some(data.prefix);
    token
}

impl<'a> Lexer<'a> {
    /// Classifies the candidate lexeme at the cursor. Never fails: unknown
    /// input degrades to a one-rune Unclassified token.
    pub(crate) fn match_classified(&mut self) -> Token {
        let (is_identifier, text) = self.scan_candidate();
        let rules = self.rules;

        match rules.get(text) {
            Some(rule) => {
                let rule = rule.clone();
                let start = self.cursor.pos();
                self.cursor.advance_bytes(text.len());
                let span = Span::new(start, self.cursor.pos());
                self.emit_rule_token(text, &rule, span)
            }
            None if is_identifier => {
                let start = self.cursor.pos();
                self.cursor.advance_bytes(text.len());
                let span = Span::new(start, self.cursor.pos());
                Token::new(text, TokenType::Variable, span)
            }
            None => {
                // Unknown runs shed exactly one rune.
                let rune_len = text.chars().next().map(char::len_utf8).unwrap_or(0);
                let rune = &text[..rune_len];
                let start = self.cursor.pos();
                self.cursor.advance_bytes(rune_len);
                let span = Span::new(start, self.cursor.pos());
                Token::new(rune, TokenType::Unclassified, span)
            }
        }
    }

    /// Scans the candidate lexeme without consuming it.
    fn scan_candidate(&self) -> (bool, &'a str) {
        let rest = self.cursor.remaining();
        let mut chars = rest.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return (false, ""),
        };

        if is_ident_start(first) {
            let mut len = first.len_utf8();
            for c in chars {
                if !is_ident_continue(c) {
                    break;
                }
                len += c.len_utf8();
            }
            return (true, &rest[..len]);
        }

        if is_operator_char(first) {
            let mut len = first.len_utf8();
            for c in chars {
                if !is_operator_char(c) {
                    break;
                }
                len += c.len_utf8();
            }
            return (false, &rest[..len]);
        }

        (false, &rest[..first.len_utf8()])
    }

    fn emit_rule_token(&mut self, text: &str, rule: &Rule, span: Span) -> Token {
        match rule {
            Rule::Wildcard => self.resolve_wildcard(text, span),
            Rule::Start(data) => start_token(text, data, span, None),
            Rule::End => Token::new(text, TokenType::End, span),
            Rule::Bridge(data) => bridge_token(text, data, span, None),
            Rule::Prefix => Token::new(text, TokenType::Prefix, span),
            Rule::Operator(precedence) => {
                let mut token = Token::new(text, TokenType::Operator, span);
                if *precedence != [0, 0, 0] {
                    token.precedence = Some(*precedence);
                }
                token
            }
            Rule::OpenDelim(data) => delimiter_token(text, data, span),
            Rule::CloseDelim => Token::new(text, TokenType::CloseDelim, span),
            Rule::Mark => Token::new(text, TokenType::Mark, span),
        }
    }

    /// Interprets a wildcard against the head of the expectation stack.
    ///
    /// The emitted token carries the donor keyword's full payload, so the
    /// stack behaves exactly as if the donor had been written literally; the
    /// wildcard glyph stays in `text` and the donor lands in `alias`.
    fn resolve_wildcard(&mut self, text: &str, span: Span) -> Token {
        let donor = match self.currently_expected().cloned() {
            Some(donor) => donor,
            None => return Token::new(text, TokenType::Unclassified, span),
        };

        let rules = self.rules;
        match rules.get(&donor) {
            Some(Rule::Bridge(data)) => bridge_token(text, data, span, Some(donor)),
            Some(Rule::Start(data)) => start_token(text, data, span, Some(donor)),
            _ if donor.starts_with("end") => {
                let mut token = Token::new(text, TokenType::End, span);
                token.alias = Some(donor);
                token
            }
            _ => Token::new(text, TokenType::Unclassified, span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexOutcome;
    use crate::rules::{OperatorRule, RuleConfig, RuleTable, WildcardRule};
    use crate::token::Arity;

    fn lex(source: &str) -> LexOutcome {
        let rules = RuleTable::default_rules();
        Lexer::new(source, &rules).tokenize()
    }

    #[test]
    fn test_identifier_becomes_variable() {
        let outcome = lex("snake_case2");
        assert_eq!(outcome.tokens[0].kind, TokenType::Variable);
        assert_eq!(outcome.tokens[0].text, "snake_case2");
    }

    #[test]
    fn test_keywords_are_not_variables() {
        let outcome = lex("def if then end return");
        let kinds: Vec<TokenType> = outcome.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Start,
                TokenType::Start,
                TokenType::Bridge,
                TokenType::End,
                TokenType::Prefix,
            ]
        );
    }

    #[test]
    fn test_end_variants() {
        let outcome = lex("end endif endfor endtransaction");
        assert!(outcome.tokens.iter().all(|t| t.kind == TokenType::End));
        // "endcase" is not a derived end keyword in the default table.
        let outcome = lex("endcase");
        assert_eq!(outcome.tokens[0].kind, TokenType::Variable);
    }

    #[test]
    fn test_operator_precedences() {
        let outcome = lex("+ - . ==");
        let plus = &outcome.tokens[0];
        assert_eq!(plus.kind, TokenType::Operator);
        assert_eq!(plus.precedence, Some([80, 2080, 0]));

        let minus = &outcome.tokens[1];
        assert_eq!(minus.precedence, Some([90, 2090, 0]));

        let dot = &outcome.tokens[2];
        assert_eq!(dot.precedence, Some([0, 2010, 0]));

        let eq = &outcome.tokens[3];
        assert_eq!(eq.precedence, Some([0, 2179, 0]));
    }

    #[test]
    fn test_word_operator_in() {
        let outcome = lex("for x in xs do end");
        let op = &outcome.tokens[2];
        assert_eq!(op.kind, TokenType::Operator);
        assert_eq!(op.text, "in");
        assert_eq!(op.precedence, Some([0, 3000, 0]));
    }

    #[test]
    fn test_operator_run_is_maximal() {
        // ":=" is one operator, not a wildcard followed by "=".
        let outcome = lex("x := 1");
        assert_eq!(outcome.tokens[1].kind, TokenType::Operator);
        assert_eq!(outcome.tokens[1].text, ":=");
    }

    #[test]
    fn test_unknown_operator_run_sheds_one_rune() {
        let outcome = lex("&&");
        assert_eq!(outcome.tokens[0].kind, TokenType::Unclassified);
        assert_eq!(outcome.tokens[0].text, "&");
        assert_eq!(outcome.tokens[1].kind, TokenType::Unclassified);
        assert_eq!(outcome.tokens[1].text, "&");
    }

    #[test]
    fn test_delimiters() {
        let outcome = lex("( [ { } ] )");
        assert_eq!(outcome.tokens[0].kind, TokenType::OpenDelim);
        assert_eq!(outcome.tokens[0].infix, Some(2020));
        assert_eq!(outcome.tokens[0].prefix, Some(true));
        assert_eq!(outcome.tokens[1].infix, Some(2030));
        assert_eq!(outcome.tokens[2].infix, Some(2040));
        assert_eq!(outcome.tokens[3].kind, TokenType::CloseDelim);
        assert_eq!(outcome.tokens[4].kind, TokenType::CloseDelim);
        assert_eq!(outcome.tokens[5].kind, TokenType::CloseDelim);
    }

    #[test]
    fn test_marks() {
        let outcome = lex("a, b;");
        assert_eq!(outcome.tokens[1].kind, TokenType::Mark);
        assert_eq!(outcome.tokens[1].text, ",");
        assert_eq!(outcome.tokens[3].kind, TokenType::Mark);
        assert_eq!(outcome.tokens[3].text, ";");
    }

    #[test]
    fn test_zero_precedence_operator_omits_field() {
        let config = RuleConfig {
            operator: vec![OperatorRule {
                text: "+".to_string(),
                precedence: Some([0, 0, 0]),
            }],
            ..RuleConfig::default()
        };
        let rules = RuleTable::compose(&config).unwrap();
        let outcome = Lexer::new("+", &rules).tokenize();
        assert_eq!(outcome.tokens[0].kind, TokenType::Operator);
        assert_eq!(outcome.tokens[0].precedence, None);
    }

    #[test]
    fn test_custom_multi_rune_wildcard() {
        let config = RuleConfig {
            wildcard: vec![WildcardRule {
                text: "??".to_string(),
            }],
            ..RuleConfig::default()
        };
        let rules = RuleTable::compose(&config).unwrap();
        let outcome = Lexer::new("if x ?? y endif", &rules).tokenize();
        let bridge = &outcome.tokens[2];
        assert_eq!(bridge.kind, TokenType::Bridge);
        assert_eq!(bridge.text, "??");
        assert_eq!(bridge.alias.as_deref(), Some("then"));
        assert_eq!(bridge.arity, Some(Arity::Many));
    }

    #[test]
    fn test_bridge_catch_replaces_frame_with_empty() {
        // catch has an empty expecting list, so a wildcard after it finds
        // no context.
        let outcome = lex("try x catch :");
        let last = outcome.tokens.last().unwrap();
        assert_eq!(last.kind, TokenType::Unclassified);
        assert_eq!(last.text, ":");
    }

    #[test]
    fn test_single_rune_fallback_is_unclassified() {
        let outcome = lex("§");
        assert_eq!(outcome.tokens[0].kind, TokenType::Unclassified);
        assert_eq!(outcome.tokens[0].text, "§");
    }
}
