//! Line-oriented lexer with significant indentation.
//!
//! Features:
//! - One logical line per physical line (no bracket continuation)
//! - `#` comments stripped outside string literals; blank lines skipped
//! - INDENT / DEDENT from an indentation stack (a tab counts as 4 columns)
//! - Single- and double-quoted strings with `\n \t \' \" \\` escapes
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use crane_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span};
use tracing::debug;

use crate::token::{Token, TokenKind};

/// Indentation width of a tab character.
pub const TAB_WIDTH: usize = 4;

/// The crane script lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`crane_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    source_file: &'src SourceFile,
    /// Characters of the line being scanned.
    chars: Vec<char>,
    /// Current index into `chars`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Open indentation widths; the base entry is always 0.
    indent_stack: Vec<usize>,
    tokens: Vec<Token>,
    errors: ScriptErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: ScriptErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source_file,
            chars: Vec::new(),
            pos: 0,
            line: 0,
            indent_stack: vec![0],
            tokens: Vec::new(),
            errors: ScriptErrors::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        for (line_no, text) in self.source_file.lines() {
            if self.errors.is_full() {
                break;
            }
            self.lex_line(line_no, text);
        }

        let eof_span = self.eof_span();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, eof_span));
        }
        self.tokens.push(Token::new(TokenKind::Eof, eof_span));

        debug!(
            file = %self.source_file.name,
            tokens = self.tokens.len(),
            errors = self.errors.total_errors,
            "lexed source"
        );

        LexResult {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn eof_span(&self) -> Span {
        let last = self.source_file.line_count() as u32;
        let width = self
            .source_file
            .line(last)
            .map_or(0, |l| l.chars().count() as u32);
        Span::point(last.max(1), width + 1)
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Span from `start_col` (1-based) through the last consumed character.
    fn span_from(&self, start_col: u32) -> Span {
        Span::new(self.line, start_col, self.line, (self.pos as u32).max(start_col))
    }

    fn push(&mut self, kind: TokenKind, start_col: u32) {
        let span = self.span_from(start_col);
        self.tokens.push(Token::new(kind, span));
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = ScriptError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = ScriptError::new(&self.source_file.name, code, message, span, source_line)
            .with_suggestion(suggestion);
        self.errors.push_error(err);
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Lines & indentation
    // ─────────────────────────────────────────────────────────────

    fn lex_line(&mut self, line_no: u32, text: &str) {
        self.line = line_no;
        self.chars = text.chars().collect();
        self.pos = 0;

        let width = self.measure_indent();
        self.skip_whitespace();
        if matches!(self.peek(), None | Some('#')) {
            return;
        }

        self.apply_indent(width);

        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some('#') => break,
                Some(_) => self.scan_token(),
            }
        }

        let end_col = self.chars.len() as u32 + 1;
        self.tokens
            .push(Token::new(TokenKind::Newline, Span::point(self.line, end_col)));
    }

    /// Consume leading spaces and tabs, returning the indentation width.
    fn measure_indent(&mut self) -> usize {
        let mut width = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                _ => break,
            }
            self.advance();
        }
        width
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn apply_indent(&mut self, width: usize) {
        let span = Span::point(self.line, 1);
        if width > self.current_indent() {
            self.indent_stack.push(width);
            self.tokens.push(Token::new(TokenKind::Indent, span));
            return;
        }

        while width < self.current_indent() {
            self.indent_stack.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, span));
        }

        if width != self.current_indent() {
            self.emit_error_with_suggestion(
                ErrorCode::INCONSISTENT_DEDENT,
                "unindent does not match any outer indentation level",
                Span::on_line(self.line, 1, width as u32),
                "line this statement up with an enclosing block",
            );
            // Continue as if this width opened a level of its own.
            self.indent_stack.push(width);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) {
        let start_col = self.pos as u32 + 1;
        let Some(ch) = self.advance() else {
            return;
        };

        match ch {
            '"' | '\'' => self.scan_string(ch, start_col),
            '0'..='9' => self.scan_number(start_col),
            '-' if matches!(self.peek(), Some('0'..='9')) && !self.prev_ends_operand() => {
                self.scan_number(start_col)
            }
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(start_col),

            // ── Two-char operators before their one-char prefixes ──
            '/' if self.peek() == Some('/') => {
                self.advance();
                self.push(TokenKind::SlashSlash, start_col);
            }
            '=' if self.peek() == Some('=') => {
                self.advance();
                self.push(TokenKind::EqEq, start_col);
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                self.push(TokenKind::BangEq, start_col);
            }
            '<' if self.peek() == Some('=') => {
                self.advance();
                self.push(TokenKind::LessEq, start_col);
            }
            '>' if self.peek() == Some('=') => {
                self.advance();
                self.push(TokenKind::GreaterEq, start_col);
            }

            '+' => self.push(TokenKind::Plus, start_col),
            '-' => self.push(TokenKind::Minus, start_col),
            '*' => self.push(TokenKind::Star, start_col),
            '/' => self.push(TokenKind::Slash, start_col),
            '%' => self.push(TokenKind::Percent, start_col),
            '=' => self.push(TokenKind::Eq, start_col),
            '<' => self.push(TokenKind::Less, start_col),
            '>' => self.push(TokenKind::Greater, start_col),
            '(' => self.push(TokenKind::LParen, start_col),
            ')' => self.push(TokenKind::RParen, start_col),
            '[' => self.push(TokenKind::LBracket, start_col),
            ']' => self.push(TokenKind::RBracket, start_col),
            ':' => self.push(TokenKind::Colon, start_col),
            ',' => self.push(TokenKind::Comma, start_col),
            '.' => self.push(TokenKind::Dot, start_col),

            '!' => {
                let span = self.span_from(start_col);
                self.emit_error_with_suggestion(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    "unexpected character '!'",
                    span,
                    "use 'not' for negation, or '!=' for inequality",
                );
            }
            other => {
                let span = self.span_from(start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("unexpected character '{other}'"),
                    span,
                );
            }
        }
    }

    fn prev_ends_operand(&self) -> bool {
        self.tokens.last().is_some_and(|t| t.kind.ends_operand())
    }

    /// Scan a run of digits and dots. The first character (a digit or a
    /// leading `-`) is already consumed.
    fn scan_number(&mut self, start_col: u32) {
        while matches!(self.peek(), Some('0'..='9' | '.')) {
            self.advance();
        }
        let start = start_col as usize - 1;
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.parse::<f64>() {
            Ok(value) => self.push(TokenKind::Number(value), start_col),
            Err(_) => {
                let span = self.span_from(start_col);
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("invalid number literal '{text}'"),
                    span,
                );
            }
        }
    }

    fn scan_identifier(&mut self, start_col: u32) {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let start = start_col as usize - 1;
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Name(text));
        self.push(kind, start_col);
    }

    /// Scan a string literal after its opening `quote`.
    fn scan_string(&mut self, quote: char, start_col: u32) {
        let mut buf = String::new();
        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start_col);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                        format!("close the string with {quote}"),
                    );
                    return;
                }
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => buf.push('\n'),
                    Some('t') => buf.push('\t'),
                    // `\'`, `\"`, `\\` and unknown escapes keep the character.
                    Some(other) => buf.push(other),
                    None => {}
                },
                Some(c) => buf.push(c),
            }
        }
        self.push(TokenKind::Str(buf), start_col);
    }
}
