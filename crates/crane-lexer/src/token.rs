//! Token types for the crane lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the script language and
//! [`Token`], which pairs a kind with a source [`Span`].

use crane_types::Span;
use std::fmt;

/// Reserved identifiers. These cannot be used as names; the lexer emits a
/// keyword or literal token instead of [`TokenKind::Name`].
pub const ALL_KEYWORDS: &[&str] = &[
    // Statements (10)
    "def", "if", "elif", "else", "for", "while", "return", "pass", "break", "continue",
    // Operators (4)
    "and", "or", "not", "in",
    // Literals (3)
    "True", "False", "None",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// `42`, `3.5`, `-7` (see [`crate::Lexer`] for when `-` joins a number)
    Number(f64),
    /// `'hi'` or `"hi"`, escapes already resolved
    Str(String),
    /// `True`
    True,
    /// `False`
    False,
    /// `None`
    None,

    /// `count`, `place_block`
    Name(String),

    // ── Keywords ─────────────────────────────────────────────

    Def,
    If,
    Elif,
    Else,
    For,
    While,
    Return,
    Pass,
    Break,
    Continue,
    And,
    Or,
    Not,
    In,

    // ── Operators ────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    Slash,
    /// `//`
    SlashSlash,
    Percent,
    EqEq,
    BangEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    /// `=`
    Eq,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,

    // ── Layout ───────────────────────────────────────────────

    /// Indentation increased relative to the enclosing line.
    Indent,
    /// One indentation level closed.
    Dedent,
    /// End of a logical line.
    Newline,
    Eof,
}

impl TokenKind {
    /// Look up a reserved identifier. Returns `None` for user names.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "def" => TokenKind::Def,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "pass" => TokenKind::Pass,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Def
                | TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Pass
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::In
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
        )
    }

    /// Returns `true` if a token of this kind can finish an operand, in
    /// which case a following `-` is the binary minus operator.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::Name(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
                | TokenKind::RParen
                | TokenKind::RBracket
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "'{s}'"),
            TokenKind::True => f.write_str("True"),
            TokenKind::False => f.write_str("False"),
            TokenKind::None => f.write_str("None"),
            TokenKind::Name(s) => f.write_str(s),
            TokenKind::Def => f.write_str("def"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Elif => f.write_str("elif"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::For => f.write_str("for"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Pass => f.write_str("pass"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::And => f.write_str("and"),
            TokenKind::Or => f.write_str("or"),
            TokenKind::Not => f.write_str("not"),
            TokenKind::In => f.write_str("in"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::SlashSlash => f.write_str("//"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::Eq => f.write_str("="),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Indent => f.write_str("indent"),
            TokenKind::Dedent => f.write_str("dedent"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_round_trips() {
        for kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw)
                .unwrap_or_else(|| panic!("'{kw}' should be a keyword"));
            assert!(kind.is_keyword());
            assert_eq!(kind.to_string(), *kw);
        }
    }

    #[test]
    fn test_verbs_are_not_keywords() {
        for name in ["move", "look", "print", "range", "true", "none"] {
            assert_eq!(TokenKind::from_keyword(name), None);
        }
    }

    #[test]
    fn test_ends_operand() {
        assert!(TokenKind::Name("x".into()).ends_operand());
        assert!(TokenKind::RParen.ends_operand());
        assert!(!TokenKind::Eq.ends_operand());
        assert!(!TokenKind::LParen.ends_operand());
        assert!(!TokenKind::Return.ends_operand());
    }
}
