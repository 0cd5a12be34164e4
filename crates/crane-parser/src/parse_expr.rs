//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 8. `or`
//! 7. `and`
//! 6. `not` (prefix)
//! 5. `==`, `!=`, `<`, `>`, `<=`, `>=`, `in` (left-associative chain)
//! 4. `+`, `-`
//! 3. `*`, `/`, `//`, `%`
//! 2. unary `-`
//! 1. `()` (call), `[]` (index), `.` (attribute)

use crane_lexer::token::TokenKind;
use crane_types::ast::*;
use crane_types::ErrorCode;

use crate::parser::{Parser, MAX_EXPR_DEPTH};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.nested(|p| {
            p.deeper()?;
            p.parse_or()
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Nesting
    // ══════════════════════════════════════════════════════════════════════════

    /// Run `parse` and put the nesting depth back afterwards, whether or
    /// not it succeeded.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let depth = self.expr_depth;
        let result = parse(self);
        self.expr_depth = depth;
        result
    }

    /// One more level of nesting: a sub-expression, a prefix operator or
    /// another link in an operator chain. Every level becomes one more
    /// level of the tree the evaluator walks.
    fn deeper(&mut self) -> Option<()> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_TOO_DEEP,
                format!("expressions may nest at most {MAX_EXPR_DEPTH} levels deep"),
            );
            return None;
        }
        Some(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    /// `OrExpr = AndExpr { "or" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        self.nested(|p| {
            let mut left = p.parse_and()?;
            while p.eat(&TokenKind::Or) {
                p.deeper()?;
                let right = p.parse_and()?;
                left = Self::binary(left, BinOp::Or, right);
            }
            Some(left)
        })
    }

    /// `AndExpr = NotExpr { "and" NotExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        self.nested(|p| {
            let mut left = p.parse_not()?;
            while p.eat(&TokenKind::And) {
                p.deeper()?;
                let right = p.parse_not()?;
                left = Self::binary(left, BinOp::And, right);
            }
            Some(left)
        })
    }

    /// `NotExpr = "not" NotExpr | CompExpr`
    fn parse_not(&mut self) -> Option<Expr> {
        if !self.check_exact(&TokenKind::Not) {
            return self.parse_comparison();
        }
        let start = self.advance();
        let operand = self.nested(|p| {
            p.deeper()?;
            p.parse_not()
        })?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `CompExpr = AddExpr { CompOp AddExpr }`
    ///
    /// `a < b < c` groups as `(a < b) < c`.
    fn parse_comparison(&mut self) -> Option<Expr> {
        self.nested(|p| {
            let mut left = p.parse_add()?;
            while let Some(op) = p.match_comparison_op() {
                p.advance();
                p.deeper()?;
                let right = p.parse_add()?;
                left = Self::binary(left, op, right);
            }
            Some(left)
        })
    }

    fn match_comparison_op(&self) -> Option<BinOp> {
        match self.peek_kind() {
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::BangEq => Some(BinOp::NotEq),
            TokenKind::Less => Some(BinOp::Less),
            TokenKind::Greater => Some(BinOp::Greater),
            TokenKind::LessEq => Some(BinOp::LessEq),
            TokenKind::GreaterEq => Some(BinOp::GreaterEq),
            TokenKind::In => Some(BinOp::In),
            _ => None,
        }
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        self.nested(|p| {
            let mut left = p.parse_mul()?;
            loop {
                let op = match p.peek_kind() {
                    TokenKind::Plus => BinOp::Add,
                    TokenKind::Minus => BinOp::Sub,
                    _ => break,
                };
                p.advance();
                p.deeper()?;
                let right = p.parse_mul()?;
                left = Self::binary(left, op, right);
            }
            Some(left)
        })
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "//" | "%") UnaryExpr }`
    fn parse_mul(&mut self) -> Option<Expr> {
        self.nested(|p| {
            let mut left = p.parse_unary()?;
            loop {
                let op = match p.peek_kind() {
                    TokenKind::Star => BinOp::Mul,
                    TokenKind::Slash => BinOp::Div,
                    TokenKind::SlashSlash => BinOp::FloorDiv,
                    TokenKind::Percent => BinOp::Mod,
                    _ => break,
                };
                p.advance();
                p.deeper()?;
                let right = p.parse_unary()?;
                left = Self::binary(left, op, right);
            }
            Some(left)
        })
    }

    /// `UnaryExpr = "-" UnaryExpr | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        if !self.check_exact(&TokenKind::Minus) {
            return self.parse_postfix();
        }
        let start = self.advance();
        let operand = self.nested(|p| {
            p.deeper()?;
            p.parse_unary()
        })?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `PostfixExpr = Primary { "(" Args ")" | "[" Expr "]" | "." Name }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        self.nested(Self::parse_postfix_chain)
    }

    fn parse_postfix_chain(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => self.deeper()?,
                _ => break,
            }
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_comma_list(&TokenKind::RParen)?;
                    let end = self.expect(&TokenKind::RParen)?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    let span = expr.span.merge(name.span);
                    expr = Expr::new(
                        ExprKind::Attribute {
                            object: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// Comma-separated expressions up to (not including) `close`.
    /// A trailing comma is allowed.
    fn parse_comma_list(&mut self, close: &TokenKind) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check_exact(close) {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(items)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Number(n) => ExprKind::Literal(Literal::Number(n)),
            TokenKind::Str(s) => ExprKind::Literal(Literal::String(s)),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::None => ExprKind::Literal(Literal::None),
            TokenKind::Name(name) => ExprKind::Name(name),

            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_comma_list(&TokenKind::RBracket)?;
                let end = self.expect(&TokenKind::RBracket)?;
                return Some(Expr::new(ExprKind::List(items), start.merge(end)));
            }
            TokenKind::LParen => {
                self.advance();
                let mut inner = self.parse_expression()?;
                let end = self.expect(&TokenKind::RParen)?;
                inner.span = start.merge(end);
                return Some(inner);
            }

            other => {
                let message = format!("expected an expression, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, start))
    }
}
