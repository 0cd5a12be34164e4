//! Lexer tests.
//!
//! Covers: keywords and literal keywords, operators, numbers (including the
//! negative-number rule), strings and escapes, comments, indentation
//! (INDENT/DEDENT/NEWLINE layout), spans, error recovery, and the
//! 100-iteration determinism test.

use crane_lexer::{Lexer, TokenKind, ALL_KEYWORDS};
use crane_types::{ErrorCode, SourceFile, Span};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let sf = SourceFile::new("main.py", source);
    Lexer::new(&sf)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Token kinds of a single line, without the trailing Newline.
fn line_kinds(source: &str) -> Vec<TokenKind> {
    let mut k = kinds(source);
    assert_eq!(k.pop(), Some(TokenKind::Newline), "line should end with Newline");
    k
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    let sf = SourceFile::new("main.py", source);
    Lexer::new(&sf)
        .lex()
        .errors
        .errors
        .iter()
        .map(|e| e.code)
        .collect()
}

fn name(s: &str) -> TokenKind {
    TokenKind::Name(s.to_string())
}

fn num(n: f64) -> TokenKind {
    TokenKind::Number(n)
}

fn string(s: &str) -> TokenKind {
    TokenKind::Str(s.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & literal keywords
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_statement_keywords() {
    let pairs = [
        ("def", TokenKind::Def),
        ("if", TokenKind::If),
        ("elif", TokenKind::Elif),
        ("else", TokenKind::Else),
        ("for", TokenKind::For),
        ("while", TokenKind::While),
        ("return", TokenKind::Return),
        ("pass", TokenKind::Pass),
        ("break", TokenKind::Break),
        ("continue", TokenKind::Continue),
    ];
    for (src, expected) in &pairs {
        assert_eq!(line_kinds(src), vec![expected.clone()], "keyword '{src}'");
    }
}

#[test]
fn test_operator_keywords() {
    assert_eq!(
        line_kinds("a and b or not c in d"),
        vec![
            name("a"),
            TokenKind::And,
            name("b"),
            TokenKind::Or,
            TokenKind::Not,
            name("c"),
            TokenKind::In,
            name("d"),
        ]
    );
}

#[test]
fn test_literal_keywords() {
    assert_eq!(
        line_kinds("True False None"),
        vec![TokenKind::True, TokenKind::False, TokenKind::None]
    );
}

#[test]
fn test_keywords_are_case_sensitive() {
    assert_eq!(line_kinds("true"), vec![name("true")]);
    assert_eq!(line_kinds("If"), vec![name("If")]);
    assert_eq!(line_kinds("none"), vec![name("none")]);
}

#[test]
fn test_all_keywords_lex_as_keywords() {
    for kw in ALL_KEYWORDS {
        let k = line_kinds(kw);
        assert_eq!(k.len(), 1, "'{kw}'");
        assert!(k[0].is_keyword(), "'{kw}' lexed as {:?}", k[0]);
    }
}

#[test]
fn test_identifiers_with_underscores_and_digits() {
    assert_eq!(
        line_kinds("place_block _tmp x2"),
        vec![name("place_block"), name("_tmp"), name("x2")]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators & punctuation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_two_char_operators() {
    assert_eq!(
        line_kinds("// == != <= >="),
        vec![
            TokenKind::SlashSlash,
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
        ]
    );
}

#[test]
fn test_single_char_operators_and_punctuation() {
    assert_eq!(
        line_kinds("+ - * / % = < > ( ) [ ] : , ."),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Eq,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Colon,
            TokenKind::Comma,
            TokenKind::Dot,
        ]
    );
}

#[test]
fn test_operators_without_spaces() {
    assert_eq!(
        line_kinds("a//b==c"),
        vec![
            name("a"),
            TokenKind::SlashSlash,
            name("b"),
            TokenKind::EqEq,
            name("c"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_integer_and_decimal_numbers() {
    assert_eq!(line_kinds("0 42 3.5"), vec![num(0.0), num(42.0), num(3.5)]);
}

#[test]
fn test_negative_number_after_operator() {
    assert_eq!(line_kinds("x = -3"), vec![name("x"), TokenKind::Eq, num(-3.0)]);
    assert_eq!(
        line_kinds("f(-1, -2)"),
        vec![
            name("f"),
            TokenKind::LParen,
            num(-1.0),
            TokenKind::Comma,
            num(-2.0),
            TokenKind::RParen,
        ]
    );
}

#[test]
fn test_minus_after_operand_is_subtraction() {
    assert_eq!(
        line_kinds("x-1"),
        vec![name("x"), TokenKind::Minus, num(1.0)]
    );
    assert_eq!(
        line_kinds("f(2)-1"),
        vec![
            name("f"),
            TokenKind::LParen,
            num(2.0),
            TokenKind::RParen,
            TokenKind::Minus,
            num(1.0),
        ]
    );
    assert_eq!(
        line_kinds("a[0]-1"),
        vec![
            name("a"),
            TokenKind::LBracket,
            num(0.0),
            TokenKind::RBracket,
            TokenKind::Minus,
            num(1.0),
        ]
    );
}

#[test]
fn test_minus_before_name_is_operator() {
    assert_eq!(line_kinds("-x"), vec![TokenKind::Minus, name("x")]);
}

#[test]
fn test_malformed_number_is_error() {
    assert_eq!(error_codes("x = 1.2.3"), vec![ErrorCode::INVALID_NUMBER]);
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_single_and_double_quoted_strings() {
    assert_eq!(line_kinds("'hi' \"there\""), vec![string("hi"), string("there")]);
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        line_kinds(r#"'a\nb\tc\'d\"e\\f'"#),
        vec![string("a\nb\tc'd\"e\\f")]
    );
}

#[test]
fn test_other_quote_inside_string() {
    assert_eq!(line_kinds(r#""it's""#), vec![string("it's")]);
}

#[test]
fn test_hash_inside_string_is_not_comment() {
    assert_eq!(
        line_kinds("print('#1') # note"),
        vec![
            name("print"),
            TokenKind::LParen,
            string("#1"),
            TokenKind::RParen,
        ]
    );
}

#[test]
fn test_unterminated_string_is_error() {
    assert_eq!(error_codes("x = 'abc"), vec![ErrorCode::UNTERMINATED_STRING]);
}

// ─────────────────────────────────────────────────────────────────────
// Comments & blank lines
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_comment_only_and_blank_lines_produce_no_tokens() {
    assert_eq!(kinds("# just a comment\n\n   \n"), vec![]);
}

#[test]
fn test_trailing_comment_stripped() {
    assert_eq!(line_kinds("move() # go"), vec![
        name("move"),
        TokenKind::LParen,
        TokenKind::RParen,
    ]);
}

#[test]
fn test_empty_source_is_just_eof() {
    let sf = SourceFile::new("main.py", "");
    let tokens = Lexer::new(&sf).lex().tokens;
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

// ─────────────────────────────────────────────────────────────────────
// Indentation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_indent_and_dedent() {
    let src = "if x:\n    move()\nlook()";
    assert_eq!(
        kinds(src),
        vec![
            TokenKind::If,
            name("x"),
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            name("move"),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Newline,
            TokenKind::Dedent,
            name("look"),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Newline,
        ]
    );
}

#[test]
fn test_dedents_emitted_at_eof() {
    let src = "for i in x:\n  while y:\n    pass";
    let k = kinds(src);
    let tail: Vec<_> = k.iter().rev().take(3).cloned().collect();
    assert_eq!(
        tail,
        vec![TokenKind::Dedent, TokenKind::Dedent, TokenKind::Newline]
    );
}

#[test]
fn test_multiple_dedents_on_one_line() {
    let src = "if a:\n  if b:\n    pass\nmove()";
    let k = kinds(src);
    let dedents = k.iter().filter(|t| **t == TokenKind::Dedent).count();
    let indents = k.iter().filter(|t| **t == TokenKind::Indent).count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
    let pos = k.iter().position(|t| *t == name("move")).unwrap();
    assert_eq!(k[pos - 1], TokenKind::Dedent);
    assert_eq!(k[pos - 2], TokenKind::Dedent);
}

#[test]
fn test_tab_counts_as_four_spaces() {
    // A tab and four spaces sit at the same level: no extra Indent/Dedent.
    let src = "if a:\n\tmove()\n    dig()";
    let k = kinds(src);
    assert_eq!(k.iter().filter(|t| **t == TokenKind::Indent).count(), 1);
    assert!(error_codes(src).is_empty());
}

#[test]
fn test_blank_lines_inside_block_do_not_dedent() {
    let src = "if a:\n    move()\n\n    # gap\n    dig()";
    let k = kinds(src);
    assert_eq!(k.iter().filter(|t| **t == TokenKind::Dedent).count(), 1);
    assert_eq!(k.last(), Some(&TokenKind::Dedent));
}

#[test]
fn test_inconsistent_dedent_is_error() {
    let src = "if a:\n    move()\n  dig()";
    assert_eq!(error_codes(src), vec![ErrorCode::INCONSISTENT_DEDENT]);
}

// ─────────────────────────────────────────────────────────────────────
// Spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_token_spans() {
    let sf = SourceFile::new("main.py", "x = 10\n  \nplace_block('sand')");
    let tokens = Lexer::new(&sf).lex().tokens;
    assert_eq!(tokens[0].span, Span::new(1, 1, 1, 1));
    assert_eq!(tokens[2].span, Span::new(1, 5, 1, 6));
    let pb = tokens
        .iter()
        .find(|t| t.kind == name("place_block"))
        .unwrap();
    assert_eq!(pb.span, Span::new(3, 1, 3, 11));
    let s = tokens.iter().find(|t| t.kind == string("sand")).unwrap();
    assert_eq!(s.span, Span::new(3, 13, 3, 18));
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_character_is_error_and_skipped() {
    let sf = SourceFile::new("main.py", "x = 1 $ 2");
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.total_errors, 1);
    let err = &result.errors.errors[0];
    assert_eq!(err.code, ErrorCode::UNEXPECTED_CHARACTER);
    assert_eq!(err.span.start_col, 7);
    assert_eq!(err.source_line, "x = 1 $ 2");
    assert!(result.tokens.iter().any(|t| t.kind == num(2.0)));
}

#[test]
fn test_bang_suggests_not() {
    let sf = SourceFile::new("main.py", "if !x:\n    pass");
    let result = Lexer::new(&sf).lex();
    let err = &result.errors.errors[0];
    assert!(err.suggestion.as_deref().unwrap_or("").contains("not"));
}

#[test]
fn test_errors_collected_across_lines() {
    assert_eq!(error_codes("a = $\nb = ?\nc = 'x").len(), 3);
}

#[test]
fn test_error_cap() {
    let src = "@\n".repeat(40);
    let sf = SourceFile::new("main.py", &src);
    let result = Lexer::new(&sf).lex();
    assert!(result.errors.errors.len() <= crane_types::MAX_ERRORS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let src = "def f(n):\n    if n <= 1:\n        return 1\n    return n * f(n - 1)\nprint(f(5), 'done', -2)";
    let first = kinds(src);
    for _ in 0..100 {
        assert_eq!(kinds(src), first);
    }
}
