//! Edge case tests for clovec-lex
