//! Token classification rules.
//!
//! The tokenizer is rule-driven: a single lookup table maps a candidate
//! lexeme to exactly one classification. The table is built once, from the
//! default rule set overlaid with an optional [`RuleConfig`], and is immutable
//! for the lifetime of a tokenization run.
//!
//! End and close-delimiter entries are derived from the closers referenced by
//! start and bracket rules and may be shared between originators. Every other
//! lexeme must be defined by exactly one rule; a second definition is a
//! [`RuleError::Conflict`] raised before any tokenization begins.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::Arity;

/// Error raised while composing a rule table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A lexeme was defined by more than one rule.
    #[error("token '{lexeme}' is defined in both {first} and {second} rules")]
    Conflict {
        lexeme: String,
        first: String,
        second: String,
    },
}

/// Payload of a start rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartData {
    /// Follower keywords expected immediately inside the construct.
    pub expecting: Vec<String>,
    /// Keywords that close the construct.
    pub closed_by: Vec<String>,
    /// How many sub-clauses the construct admits.
    pub arity: Arity,
}

/// Payload of a bridge rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeData {
    /// Keywords that may follow this bridge.
    pub expecting: Vec<String>,
    /// Constructs this bridge may appear inside.
    pub containers: Vec<String>,
    /// How many sub-clauses the bridge admits.
    pub arity: Arity,
}

/// Payload of an open-delimiter rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimData {
    /// Lexemes that close the delimiter.
    pub closed_by: Vec<String>,
    /// Infix precedence; 0 disables infix use.
    pub infix: i64,
    /// Whether the delimiter may open a prefix form.
    pub prefix: bool,
}

/// A single classification rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Classification deferred to the expectation stack.
    Wildcard,
    /// Block-opening keyword.
    Start(StartData),
    /// Block-closing keyword, derived from start closers.
    End,
    /// Interior keyword of a block.
    Bridge(BridgeData),
    /// Prefix keyword such as `return`.
    Prefix,
    /// Operator with `[prefix, infix, postfix]` precedences.
    Operator([i64; 3]),
    /// Opening delimiter.
    OpenDelim(DelimData),
    /// Closing delimiter, derived from bracket closers.
    CloseDelim,
    /// Punctuation mark.
    Mark,
}

impl Rule {
    fn category(&self) -> &'static str {
        match self {
            Rule::Wildcard => "wildcard",
            Rule::Start(_) => "start",
            Rule::End => "end",
            Rule::Bridge(_) => "bridge",
            Rule::Prefix => "prefix",
            Rule::Operator(_) => "operator",
            Rule::OpenDelim(_) => "bracket",
            Rule::CloseDelim => "close delimiter",
            Rule::Mark => "mark",
        }
    }
}

// ---------------------------------------------------------------------------
// Rule file records
// ---------------------------------------------------------------------------

/// A bracket rule record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketRule {
    pub text: String,
    #[serde(default)]
    pub closed_by: Vec<String>,
    #[serde(default)]
    pub infix: i64,
    #[serde(default)]
    pub prefix: bool,
}

/// A prefix keyword record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub text: String,
}

/// A start keyword record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRule {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub closed_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expecting: Vec<String>,
    #[serde(default)]
    pub arity: Arity,
}

/// A bridge keyword record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRule {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expecting: Vec<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<String>,
    #[serde(default)]
    pub arity: Arity,
}

/// A wildcard record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardRule {
    pub text: String,
}

/// An operator record. When `precedence` is absent the triple is derived
/// from the operator's first glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorRule {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedence: Option<[i64; 3]>,
}

/// A punctuation mark record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkRule {
    pub text: String,
}

/// The rule-file record: one optional list per category.
///
/// A present (non-empty) category replaces the corresponding default map in
/// its entirety; an absent category leaves the defaults in place. The loader
/// in the driver crate is responsible for file syntax; this crate is
/// responsible for semantic composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bracket: Vec<BracketRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<PrefixRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start: Vec<StartRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bridge: Vec<BridgeRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wildcard: Vec<WildcardRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator: Vec<OperatorRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mark: Vec<MarkRule>,
}

// ---------------------------------------------------------------------------
// Precedence derivation
// ---------------------------------------------------------------------------

/// Base precedence of an operator's first glyph.
fn base_precedence(glyph: char) -> Option<i64> {
    let base = match glyph {
        '.' => 10,
        '(' => 20,
        '[' => 30,
        '{' => 40,
        '*' => 50,
        '/' => 60,
        '%' => 70,
        '+' => 80,
        '-' => 90,
        '<' => 100,
        '>' => 110,
        '~' => 120,
        '!' => 130,
        '&' => 140,
        '^' => 150,
        '|' => 160,
        '?' => 170,
        '=' => 180,
        ':' => 190,
        _ => return None,
    };
    Some(base)
}

/// Derives the `[prefix, infix, postfix]` precedence triple for an operator.
///
/// The first glyph selects the base precedence; a repeated first glyph
/// subtracts one. Every operator is infix-capable at `base + 2000`. Only `-`
/// and `+` are prefix-capable (unary negation and plus). Nothing is
/// postfix-capable by default. Unknown first glyphs fall back to base 1000.
pub fn derive_precedence(operator: &str) -> [i64; 3] {
    let mut chars = operator.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return [0, 0, 0],
    };

    let mut base = base_precedence(first).unwrap_or(1000);
    if chars.next() == Some(first) {
        base -= 1;
    }

    let prefix = if operator == "-" || operator == "+" {
        base
    } else {
        0
    };

    [prefix, base + 2000, 0]
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// The unified lexeme -> rule lookup used by the classifier.
#[derive(Debug, Clone)]
pub struct RuleTable {
    lookup: FxHashMap<String, Rule>,
}

impl RuleTable {
    /// Builds the default rule table.
    pub fn default_rules() -> RuleTable {
        // A conflict in the built-in tables is a programming error, not a
        // runtime condition.
        RuleTable::compose(&RuleConfig::default()).expect("default rules are conflict-free")
    }

    /// Builds a rule table from the defaults overlaid with `config`.
    ///
    /// Each non-empty category in `config` replaces the whole corresponding
    /// default category. Returns a [`RuleError::Conflict`] when the merged
    /// categories define the same lexeme twice.
    pub fn compose(config: &RuleConfig) -> Result<RuleTable, RuleError> {
        let defaults = default_config();

        fn choose<'a, T>(custom: &'a [T], default: &'a [T]) -> &'a [T] {
            if custom.is_empty() {
                default
            } else {
                custom
            }
        }

        let bracket = choose(&config.bracket, &defaults.bracket);
        let prefix = choose(&config.prefix, &defaults.prefix);
        let start = choose(&config.start, &defaults.start);
        let bridge = choose(&config.bridge, &defaults.bridge);
        let wildcard = choose(&config.wildcard, &defaults.wildcard);
        let operator = choose(&config.operator, &defaults.operator);
        let mark = choose(&config.mark, &defaults.mark);

        let mut lookup: FxHashMap<String, Rule> = FxHashMap::default();

        let add = |lookup: &mut FxHashMap<String, Rule>,
                       lexeme: &str,
                       rule: Rule|
         -> Result<(), RuleError> {
            if let Some(existing) = lookup.get(lexeme) {
                return Err(RuleError::Conflict {
                    lexeme: lexeme.to_string(),
                    first: existing.category().to_string(),
                    second: rule.category().to_string(),
                });
            }
            lookup.insert(lexeme.to_string(), rule);
            Ok(())
        };

        for rule in wildcard {
            add(&mut lookup, &rule.text, Rule::Wildcard)?;
        }
        for rule in start {
            add(
                &mut lookup,
                &rule.text,
                Rule::Start(StartData {
                    expecting: rule.expecting.clone(),
                    closed_by: rule.closed_by.clone(),
                    arity: rule.arity,
                }),
            )?;
        }
        for rule in bridge {
            add(
                &mut lookup,
                &rule.text,
                Rule::Bridge(BridgeData {
                    expecting: rule.expecting.clone(),
                    containers: rule.containers.clone(),
                    arity: rule.arity,
                }),
            )?;
        }
        for rule in prefix {
            add(&mut lookup, &rule.text, Rule::Prefix)?;
        }
        for rule in mark {
            add(&mut lookup, &rule.text, Rule::Mark)?;
        }
        for rule in operator {
            let precedence = rule
                .precedence
                .unwrap_or_else(|| derive_precedence(&rule.text));
            add(&mut lookup, &rule.text, Rule::Operator(precedence))?;
        }
        for rule in bracket {
            add(
                &mut lookup,
                &rule.text,
                Rule::OpenDelim(DelimData {
                    closed_by: rule.closed_by.clone(),
                    infix: rule.infix,
                    prefix: rule.prefix,
                }),
            )?;
        }

        // Close delimiters and end keywords are derived from the closers of
        // bracket and start rules. They may be referenced by several
        // originators, but may not shadow a lexeme of another kind.
        for rule in bracket {
            for closer in &rule.closed_by {
                match lookup.get(closer.as_str()) {
                    None => {
                        lookup.insert(closer.clone(), Rule::CloseDelim);
                    }
                    Some(Rule::CloseDelim) => {}
                    Some(existing) => {
                        return Err(RuleError::Conflict {
                            lexeme: closer.clone(),
                            first: existing.category().to_string(),
                            second: "close delimiter".to_string(),
                        });
                    }
                }
            }
        }
        for rule in start {
            for closer in &rule.closed_by {
                match lookup.get(closer.as_str()) {
                    None => {
                        lookup.insert(closer.clone(), Rule::End);
                    }
                    Some(Rule::End) => {}
                    Some(existing) => {
                        return Err(RuleError::Conflict {
                            lexeme: closer.clone(),
                            first: existing.category().to_string(),
                            second: "end".to_string(),
                        });
                    }
                }
            }
        }

        tracing::debug!(entries = lookup.len(), "rule table built");
        Ok(RuleTable { lookup })
    }

    /// Looks up the rule for a lexeme.
    #[inline]
    pub fn get(&self, lexeme: &str) -> Option<&Rule> {
        self.lookup.get(lexeme)
    }

    /// Number of lexemes in the table, derived entries included.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Returns true when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Renders the active table back into a rule-file record, sorted by
    /// lexeme for reproducible output. Derived end and close-delimiter
    /// entries are not part of the record.
    pub fn to_config(&self) -> RuleConfig {
        let mut entries: Vec<(&String, &Rule)> = self.lookup.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut config = RuleConfig::default();
        for (lexeme, rule) in entries {
            match rule {
                Rule::Wildcard => config.wildcard.push(WildcardRule {
                    text: lexeme.clone(),
                }),
                Rule::Start(data) => config.start.push(StartRule {
                    text: lexeme.clone(),
                    closed_by: data.closed_by.clone(),
                    expecting: data.expecting.clone(),
                    arity: data.arity,
                }),
                Rule::Bridge(data) => config.bridge.push(BridgeRule {
                    text: lexeme.clone(),
                    expecting: data.expecting.clone(),
                    containers: data.containers.clone(),
                    arity: data.arity,
                }),
                Rule::Prefix => config.prefix.push(PrefixRule {
                    text: lexeme.clone(),
                }),
                Rule::Operator(precedence) => config.operator.push(OperatorRule {
                    text: lexeme.clone(),
                    precedence: Some(*precedence),
                }),
                Rule::OpenDelim(data) => config.bracket.push(BracketRule {
                    text: lexeme.clone(),
                    closed_by: data.closed_by.clone(),
                    infix: data.infix,
                    prefix: data.prefix,
                }),
                Rule::End | Rule::CloseDelim => {}
                Rule::Mark => config.mark.push(MarkRule {
                    text: lexeme.clone(),
                }),
            }
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn start_rule(text: &str, expecting: &[&str], arity: Arity) -> StartRule {
    StartRule {
        text: text.to_string(),
        closed_by: vec!["end".to_string(), format!("end{}", text)],
        expecting: strings(expecting),
        arity,
    }
}

fn bridge_rule(text: &str, expecting: &[&str], containers: &[&str], arity: Arity) -> BridgeRule {
    BridgeRule {
        text: text.to_string(),
        expecting: strings(expecting),
        containers: strings(containers),
        arity,
    }
}

fn operator_rule(text: &str) -> OperatorRule {
    OperatorRule {
        text: text.to_string(),
        precedence: None,
    }
}

fn bracket_rule(text: &str, closer: &str) -> BracketRule {
    BracketRule {
        text: text.to_string(),
        closed_by: vec![closer.to_string()],
        infix: derive_precedence(text)[1],
        prefix: true,
    }
}

/// The canonical default rule set, expressed as a rule-file record.
fn default_config() -> RuleConfig {
    RuleConfig {
        bracket: vec![
            bracket_rule("(", ")"),
            bracket_rule("[", "]"),
            bracket_rule("{", "}"),
        ],
        prefix: vec![
            PrefixRule {
                text: "return".to_string(),
            },
            PrefixRule {
                text: "yield".to_string(),
            },
        ],
        start: vec![
            start_rule("def", &["=>>"], Arity::One),
            start_rule("let", &[], Arity::Many),
            start_rule("switch", &["case", "else"], Arity::One),
            start_rule("if", &["then"], Arity::One),
            start_rule("ifnot", &["then"], Arity::One),
            start_rule("fn", &["=>>"], Arity::One),
            start_rule("class", &[], Arity::One),
            start_rule("interface", &[], Arity::One),
            start_rule("for", &["do"], Arity::One),
            start_rule("try", &["catch", "else"], Arity::Many),
            start_rule("transaction", &["catch", "else"], Arity::Many),
        ],
        bridge: vec![
            bridge_rule("case", &["then"], &["switch"], Arity::One),
            bridge_rule("=>>", &["end", "enddef", "endfn"], &["def"], Arity::Many),
            bridge_rule("do", &["end", "endfor"], &["def", "for"], Arity::Many),
            bridge_rule(
                "then",
                &[
                    "case",
                    "elseif",
                    "else",
                    "end",
                    "endif",
                    "endifnot",
                    "endswitch",
                    "endcase",
                ],
                &["if", "ifnot", "switch"],
                Arity::Many,
            ),
            bridge_rule("elseif", &["then"], &["if", "ifnot"], Arity::One),
            bridge_rule("elseifnot", &["then"], &["if", "ifnot"], Arity::Many),
            bridge_rule(
                "else",
                &["end", "endif", "endifnot", "endswitch", "endcase"],
                &["if", "ifnot", "switch"],
                Arity::Many,
            ),
            bridge_rule("catch", &[], &["try"], Arity::One),
        ],
        wildcard: vec![WildcardRule {
            text: ":".to_string(),
        }],
        operator: vec![
            operator_rule("."),
            operator_rule("*"),
            operator_rule("/"),
            operator_rule("+"),
            operator_rule("-"),
            operator_rule("<"),
            operator_rule(">"),
            operator_rule("<="),
            operator_rule(">="),
            operator_rule("=="),
            operator_rule("..<"),
            operator_rule("..="),
            operator_rule(":="),
            operator_rule("<-"),
            operator_rule("<--"),
            OperatorRule {
                text: "in".to_string(),
                precedence: Some([0, 3000, 0]),
            },
        ],
        mark: vec![
            MarkRule {
                text: ",".to_string(),
            },
            MarkRule {
                text: ";".to_string(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_precedence_simple() {
        assert_eq!(derive_precedence("."), [0, 2010, 0]);
        assert_eq!(derive_precedence("*"), [0, 2050, 0]);
        assert_eq!(derive_precedence("<"), [0, 2100, 0]);
        assert_eq!(derive_precedence("="), [0, 2180, 0]);
    }

    #[test]
    fn test_derive_precedence_prefix_capable() {
        assert_eq!(derive_precedence("-"), [90, 2090, 0]);
        assert_eq!(derive_precedence("+"), [80, 2080, 0]);
    }

    #[test]
    fn test_derive_precedence_repeated_first_glyph() {
        // ".." starts with a repeated '.', so the base drops by one.
        assert_eq!(derive_precedence("..<"), [0, 2009, 0]);
        assert_eq!(derive_precedence("=="), [0, 2179, 0]);
        // "<-" does not repeat its first glyph.
        assert_eq!(derive_precedence("<-"), [0, 2100, 0]);
        assert_eq!(derive_precedence("<--"), [0, 2100, 0]);
    }

    #[test]
    fn test_derive_precedence_unknown_glyph() {
        assert_eq!(derive_precedence("$"), [0, 3000, 0]);
        assert_eq!(derive_precedence("$$"), [0, 2999, 0]);
        assert_eq!(derive_precedence(""), [0, 0, 0]);
    }

    #[test]
    fn test_default_table_contents() {
        let table = RuleTable::default_rules();

        match table.get("def") {
            Some(Rule::Start(data)) => {
                assert_eq!(data.expecting, vec!["=>>"]);
                assert_eq!(data.closed_by, vec!["end", "enddef"]);
                assert_eq!(data.arity, Arity::One);
            }
            other => panic!("expected start rule for def, got {:?}", other),
        }

        match table.get("then") {
            Some(Rule::Bridge(data)) => {
                assert_eq!(data.containers, vec!["if", "ifnot", "switch"]);
                assert_eq!(data.arity, Arity::Many);
            }
            other => panic!("expected bridge rule for then, got {:?}", other),
        }

        assert_eq!(table.get(":"), Some(&Rule::Wildcard));
        assert_eq!(table.get(","), Some(&Rule::Mark));
        assert_eq!(table.get("return"), Some(&Rule::Prefix));
        assert_eq!(table.get("in"), Some(&Rule::Operator([0, 3000, 0])));
    }

    #[test]
    fn test_default_table_derives_end_and_close_rules() {
        let table = RuleTable::default_rules();
        assert_eq!(table.get("end"), Some(&Rule::End));
        assert_eq!(table.get("endtransaction"), Some(&Rule::End));
        assert_eq!(table.get(")"), Some(&Rule::CloseDelim));
        assert_eq!(table.get("}"), Some(&Rule::CloseDelim));
        // "endcase" is only referenced by bridge followers, never derived.
        assert_eq!(table.get("endcase"), None);
    }

    #[test]
    fn test_default_delimiter_precedences() {
        let table = RuleTable::default_rules();
        match table.get("(") {
            Some(Rule::OpenDelim(data)) => {
                assert_eq!(data.closed_by, vec![")"]);
                assert_eq!(data.infix, 2020);
                assert!(data.prefix);
            }
            other => panic!("expected bracket rule, got {:?}", other),
        }
        match table.get("{") {
            Some(Rule::OpenDelim(data)) => assert_eq!(data.infix, 2040),
            other => panic!("expected bracket rule, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_category_replaces_defaults_entirely() {
        let config = RuleConfig {
            wildcard: vec![WildcardRule {
                text: "?".to_string(),
            }],
            ..RuleConfig::default()
        };
        let table = RuleTable::compose(&config).unwrap();
        assert_eq!(table.get("?"), Some(&Rule::Wildcard));
        // ":" is no longer a wildcard; it is not defined at all.
        assert_eq!(table.get(":"), None);
        // Untouched categories keep their defaults.
        assert!(matches!(table.get("def"), Some(Rule::Start(_))));
    }

    #[test]
    fn test_custom_operator_without_precedence_derives_it() {
        let config = RuleConfig {
            operator: vec![operator_rule("~>")],
            ..RuleConfig::default()
        };
        let table = RuleTable::compose(&config).unwrap();
        assert_eq!(table.get("~>"), Some(&Rule::Operator([0, 2120, 0])));
        // The operator category was replaced wholesale.
        assert_eq!(table.get("+"), None);
    }

    #[test]
    fn test_custom_operator_with_explicit_precedence_wins() {
        let config = RuleConfig {
            operator: vec![OperatorRule {
                text: "+".to_string(),
                precedence: Some([7, 8, 9]),
            }],
            ..RuleConfig::default()
        };
        let table = RuleTable::compose(&config).unwrap();
        assert_eq!(table.get("+"), Some(&Rule::Operator([7, 8, 9])));
    }

    #[test]
    fn test_conflicting_rules_are_rejected() {
        let config = RuleConfig {
            mark: vec![MarkRule {
                text: ":".to_string(),
            }],
            ..RuleConfig::default()
        };
        let err = RuleTable::compose(&config).unwrap_err();
        match err {
            RuleError::Conflict { lexeme, .. } => assert_eq!(lexeme, ":"),
        }
    }

    #[test]
    fn test_closer_shadowing_another_kind_is_rejected() {
        let config = RuleConfig {
            start: vec![StartRule {
                text: "begin".to_string(),
                closed_by: vec![",".to_string()],
                expecting: Vec::new(),
                arity: Arity::One,
            }],
            ..RuleConfig::default()
        };
        assert!(RuleTable::compose(&config).is_err());
    }

    #[test]
    fn test_shared_closers_are_allowed() {
        // Every default start keyword shares the "end" closer.
        let table = RuleTable::default_rules();
        assert_eq!(table.get("end"), Some(&Rule::End));
    }

    #[test]
    fn test_to_config_round_trips_through_compose() {
        let table = RuleTable::default_rules();
        let config = table.to_config();
        let rebuilt = RuleTable::compose(&config).unwrap();
        assert_eq!(rebuilt.len(), table.len());
        assert_eq!(rebuilt.get("def"), table.get("def"));
        assert_eq!(rebuilt.get("("), table.get("("));
        assert_eq!(rebuilt.get("+"), table.get("+"));
    }
}
