//! Statement and block parsing.

use std::rc::Rc;

use crane_lexer::token::TokenKind;
use crane_types::ast::*;
use crane_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Program & Blocks
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_program(&mut self) -> Program {
        let start = self.current_span();
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.peek_kind() {
                TokenKind::Indent => self.skip_unexpected_block(),
                // Left behind by an inconsistent dedent; already reported.
                TokenKind::Dedent => {
                    self.advance();
                }
                _ => match self.parse_statement() {
                    Some(stmt) => body.push(stmt),
                    None => self.synchronize(),
                },
            }
            self.skip_newlines();
        }
        let span = start.merge(self.previous_span());
        Program { body, span }
    }

    /// Parse `NEWLINE INDENT stmt+ DEDENT` after a compound statement's `:`.
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        if !self.eat(&TokenKind::Newline) {
            let message = format!("expected end of line after ':', got '{}'", self.peek_kind());
            self.error_with_suggestion(
                ErrorCode::UNEXPECTED_TOKEN,
                message,
                self.current_span(),
                "put the body on the following lines, indented",
            );
            return None;
        }
        if !self.check_exact(&TokenKind::Indent) {
            self.error_at_current(ErrorCode::EXPECTED_INDENTED_BLOCK, "expected an indented block");
            return None;
        }
        let start = self.advance();
        let stmts = self.parse_indented_statements();
        let span = match stmts.last() {
            Some(last) => start.merge(last.span()),
            None => start,
        };
        Some(Block { stmts, span })
    }

    /// Statements up to and including the closing `Dedent`.
    fn parse_indented_statements(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.too_many_errors() || self.at_end() {
                break;
            }
            match self.peek_kind() {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Indent => self.skip_unexpected_block(),
                _ => match self.parse_statement() {
                    Some(stmt) => stmts.push(stmt),
                    None => self.synchronize(),
                },
            }
        }
        stmts
    }

    /// Report an indented region nothing opened, then parse and discard it.
    fn skip_unexpected_block(&mut self) {
        let span = self.advance();
        self.error_at(ErrorCode::UNEXPECTED_INDENT, "unexpected indent", span);
        self.parse_indented_statements();
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Def => self.parse_def(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_loop_jump(true),
            TokenKind::Continue => self.parse_loop_jump(false),
            TokenKind::Pass => {
                let span = self.advance();
                self.expect_line_end()?;
                Some(Stmt::Pass(span))
            }
            _ => self.parse_expr_or_assign(),
        }
    }

    /// `def name(a, b,): block`
    fn parse_def(&mut self) -> Option<Stmt> {
        let start = self.advance(); // eat `def`
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let mut params: Vec<Ident> = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            let param = self.expect_identifier()?;
            if params.iter().any(|p| p.name == param.name) {
                self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("duplicate parameter '{}'", param.name),
                    param.span,
                );
            }
            params.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Colon)?;

        // A loop around the definition does not make `break` legal inside it.
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loops;
        let body = body?;

        let span = start.merge(body.span);
        Some(Stmt::FuncDef(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span,
        })))
    }

    /// `if cond: block {elif cond: block} [else: block]`
    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.advance(); // eat `if`
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::Colon)?;
        let then_block = self.parse_block()?;
        let mut end = then_block.span;

        let mut elifs = Vec::new();
        while self.check_exact(&TokenKind::Elif) {
            let elif_start = self.advance();
            let condition = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let block = self.parse_block()?;
            let span = elif_start.merge(block.span);
            end = span;
            elifs.push(ElifClause {
                condition,
                block,
                span,
            });
        }

        let else_block = if self.eat(&TokenKind::Else) {
            self.expect(&TokenKind::Colon)?;
            let block = self.parse_block()?;
            end = block.span;
            Some(block)
        } else {
            None
        };

        Some(Stmt::If(IfStmt {
            condition,
            then_block,
            elifs,
            else_block,
            span: start.merge(end),
        }))
    }

    /// `for name in expr: block`
    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.advance(); // eat `for`
        let var = self.expect_identifier()?;
        self.expect(&TokenKind::In)?;
        let iterable = self.parse_expression()?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_loop_body()?;
        let span = start.merge(body.span);
        Some(Stmt::For(ForStmt {
            var,
            iterable,
            body,
            span,
        }))
    }

    /// `while cond: block`
    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.advance(); // eat `while`
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_loop_body()?;
        let span = start.merge(body.span);
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    fn parse_loop_body(&mut self) -> Option<Block> {
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        body
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.advance(); // eat `return`
        if self.function_depth == 0 {
            self.error_at(
                ErrorCode::OUTSIDE_FUNCTION,
                "'return' outside function",
                start,
            );
        }
        let value = match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent => None,
            _ => Some(self.parse_expression()?),
        };
        let span = match &value {
            Some(v) => start.merge(v.span),
            None => start,
        };
        self.expect_line_end()?;
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `break` / `continue`
    fn parse_loop_jump(&mut self, is_break: bool) -> Option<Stmt> {
        let span = self.advance();
        if self.loop_depth == 0 {
            let word = if is_break { "break" } else { "continue" };
            self.error_at(
                ErrorCode::OUTSIDE_LOOP,
                format!("'{word}' outside loop"),
                span,
            );
        }
        self.expect_line_end()?;
        Some(if is_break {
            Stmt::Break(span)
        } else {
            Stmt::Continue(span)
        })
    }

    /// An expression statement, or an assignment when followed by `=`.
    fn parse_expr_or_assign(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        if !self.check_exact(&TokenKind::Eq) {
            let span = expr.span;
            self.expect_line_end()?;
            return Some(Stmt::Expr(ExprStmt { expr, span }));
        }

        let eq_span = self.advance(); // eat `=`
        let value = self.parse_expression()?;
        let span = expr.span.merge(value.span);
        let stmt = match expr.kind {
            ExprKind::Name(name) => Stmt::Assign(AssignStmt {
                target: Ident::new(name, expr.span),
                value,
                span,
            }),
            ExprKind::Index { object, index } => Stmt::SetIndex(SetIndexStmt {
                object: *object,
                index: *index,
                value,
                span,
            }),
            _ => {
                self.report_invalid_target(expr.span.merge(eq_span));
                return None;
            }
        };
        self.expect_line_end()?;
        Some(stmt)
    }

    fn report_invalid_target(&mut self, span: Span) {
        self.error_with_suggestion(
            ErrorCode::INVALID_ASSIGNMENT_TARGET,
            "invalid assignment target",
            span,
            "assign to a name or a list element; use '==' to compare",
        );
    }
}
