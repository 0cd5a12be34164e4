//! Core parser infrastructure: token cursor, error reporting, helpers.

use crane_lexer::token::{Token, TokenKind};
use crane_types::ast::{Ident, Program};
use crane_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span};
use tracing::debug;

/// The crane script parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: ScriptErrors,
    /// Number of enclosing `for`/`while` bodies in the current function.
    pub(crate) loop_depth: u32,
    /// Number of enclosing `def` bodies.
    pub(crate) function_depth: u32,
    /// Depth of the expression tree being built (max [`MAX_EXPR_DEPTH`]).
    pub(crate) expr_depth: u32,
}

/// Deepest expression tree accepted before reporting an error. Brackets,
/// prefix operators and each link of an operator chain add one level.
pub const MAX_EXPR_DEPTH: u32 = 64;

/// Result of parsing.
pub struct ParseResult {
    /// `Some` only when no errors were reported.
    pub program: Option<Program>,
    pub errors: ScriptErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: ScriptErrors::empty(),
            loop_depth: 0,
            function_depth: 0,
            expr_depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing. Past the end this keeps
    /// returning the final token, which the lexer guarantees is `Eof`.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().map_or(&TokenKind::Eof, |t| &t.kind)
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(1, 1),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().map_or(Span::point(1, 1), |t| t.span)
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check_exact(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Expect the end of a simple statement's line.
    pub(crate) fn expect_line_end(&mut self) -> Option<()> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Some(())
            }
            TokenKind::Eof | TokenKind::Dedent => Some(()),
            other => {
                let message = format!("expected end of line, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind, returning its span or emitting an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            let message = format!("expected '{}', got '{}'", expected, self.peek_kind());
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
            None
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Name(name) => {
                let span = self.advance();
                Some(Ident::new(name, span))
            }
            other if other.is_keyword() => {
                let span = self.current_span();
                self.error_with_suggestion(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("'{other}' is a reserved word and cannot be used as a name"),
                    span,
                    "choose a different name",
                );
                None
            }
            other => {
                let message = format!("expected a name, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let error = self.make_error(code, message, span);
        self.errors.push_error(error);
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let error = self.make_error(code, message, span).with_suggestion(suggestion);
        self.errors.push_error(error);
    }

    fn make_error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> ScriptError {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        ScriptError::new(&self.source_file.name, code, message, span, source_line)
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to the start of the next line after an error. If that line opens
    /// an indented body (the broken statement's block), the body is skipped
    /// too. Other layout tokens are left in place so block structure stays
    /// balanced.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Newline => {
                    self.advance();
                    if self.check_exact(&TokenKind::Indent) {
                        self.skip_indented_region();
                    }
                    return;
                }
                TokenKind::Indent | TokenKind::Dedent => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip from an `Indent` through its matching `Dedent`.
    fn skip_indented_region(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Program`].
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        debug!(
            file = %self.source_file.name,
            statements = program.body.len(),
            errors = self.errors.total_errors,
            "parsed program"
        );
        let program = (!self.errors.has_errors()).then_some(program);
        ParseResult {
            program,
            errors: self.errors,
        }
    }
}
