//! Core statement and expression evaluator.

use std::rc::Rc;

use crane_types::ast::*;
use crane_types::Span;
use crane_world::{Pose, World};
use tracing::debug;

use crate::builtins::{self, compare, Method};
use crate::context::{EvalOutput, Limits, RunContext, MAX_REPEAT_LEN};
use crate::env::Environment;
use crate::error::{EvalError, EvalResult, RuntimeError};
use crate::value::{is_integral, BoundMethod, Function, Value};

/// How a statement finished.
#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Walks a parsed program, collecting printed output and crane commands.
pub struct Evaluator<'w> {
    ctx: RunContext<'w>,
    globals: Environment,
    /// Nested user function calls in progress.
    depth: usize,
    /// The statement currently executing, for error locations.
    current: Span,
}

impl<'w> Evaluator<'w> {
    /// A fresh evaluator with the built-ins installed. `world` is only read,
    /// by `look()`; `crane` is the last committed crane pose.
    pub fn new(world: &'w World, crane: Pose, limits: Limits) -> Self {
        let globals = Environment::new();
        builtins::install(&globals);
        Self {
            ctx: RunContext::new(world, crane, limits),
            globals,
            depth: 0,
            current: Span::default(),
        }
    }

    pub fn context(&self) -> &RunContext<'w> {
        &self.ctx
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Run every top-level statement in order, stopping at the first error.
    /// Output produced before an error is kept.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        debug!(statements = program.body.len(), "evaluating program");
        let globals = self.globals.clone();
        for stmt in &program.body {
            self.exec_stmt(stmt, &globals).map_err(|error| RuntimeError {
                error,
                span: self.current,
            })?;
        }
        Ok(())
    }

    /// Hand over what the run produced. Clears the globals, which frees any
    /// function that captured them.
    pub fn into_output(self) -> EvalOutput {
        self.globals.clear();
        let output = self.ctx.into_output();
        debug!(
            commands = output.commands.len(),
            warnings = output.warnings.len(),
            "evaluation finished"
        );
        output
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn exec_block(&mut self, block: &Block, env: &Environment) -> EvalResult<Flow> {
        for stmt in &block.stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> EvalResult<Flow> {
        self.current = stmt.span();
        match stmt {
            Stmt::Assign(assign) => {
                let value = self.eval_expr(&assign.value, env)?;
                env.define(&assign.target.name, value);
                Ok(Flow::Normal)
            }
            Stmt::SetIndex(set) => {
                self.exec_set_index(set, env)?;
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => self.exec_if(if_stmt, env),
            Stmt::For(for_stmt) => self.exec_for(for_stmt, env),
            Stmt::While(while_stmt) => self.exec_while(while_stmt, env),
            Stmt::FuncDef(decl) => {
                let function = Function {
                    decl: Rc::clone(decl),
                    closure: env.clone(),
                };
                env.define(&decl.name.name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Pass(_) => Ok(Flow::Normal),
            Stmt::Expr(expr_stmt) => {
                self.eval_expr(&expr_stmt.expr, env)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_set_index(&mut self, set: &SetIndexStmt, env: &Environment) -> EvalResult<()> {
        let object = self.eval_expr(&set.object, env)?;
        let index = self.eval_expr(&set.index, env)?;
        let value = self.eval_expr(&set.value, env)?;
        match &object {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let slot = resolve_index(&index, items.len())?;
                items[slot] = value;
                Ok(())
            }
            other => Err(EvalError::TypeMismatch(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }

    fn exec_if(&mut self, if_stmt: &IfStmt, env: &Environment) -> EvalResult<Flow> {
        if self.eval_expr(&if_stmt.condition, env)?.is_truthy() {
            return self.exec_block(&if_stmt.then_block, env);
        }
        for elif in &if_stmt.elifs {
            if self.eval_expr(&elif.condition, env)?.is_truthy() {
                return self.exec_block(&elif.block, env);
            }
        }
        match &if_stmt.else_block {
            Some(block) => self.exec_block(block, env),
            None => Ok(Flow::Normal),
        }
    }

    /// Walks the live list by index, so items appended inside the body are
    /// visited too. Stops quietly, with a warning, at the iteration ceiling.
    fn exec_for(&mut self, for_stmt: &ForStmt, env: &Environment) -> EvalResult<Flow> {
        let iterable = self.eval_expr(&for_stmt.iterable, env)?;
        let items = match &iterable {
            Value::List(items) => Rc::clone(items),
            other => {
                return Err(EvalError::TypeMismatch(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
        };
        let limit = self.ctx.limits().max_iterations;
        let mut index = 0;
        loop {
            let Some(item) = items.borrow().get(index).cloned() else {
                break;
            };
            if index == limit {
                self.ctx.warn(format!(
                    "line {}: loop limit of {limit} iterations reached",
                    for_stmt.span.start_line
                ));
                break;
            }
            index += 1;
            env.define(&for_stmt.var.name, item);
            match self.exec_block(&for_stmt.body, env)? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    /// Ends quietly, with a warning, once the iteration ceiling is reached.
    fn exec_while(&mut self, while_stmt: &WhileStmt, env: &Environment) -> EvalResult<Flow> {
        let limit = self.ctx.limits().max_iterations;
        let mut iterations = 0;
        while self.eval_expr(&while_stmt.condition, env)?.is_truthy() {
            if iterations == limit {
                self.ctx.warn(format!(
                    "line {}: loop limit of {limit} iterations reached",
                    while_stmt.span.start_line
                ));
                break;
            }
            iterations += 1;
            match self.exec_block(&while_stmt.body, env)? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    pub fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::None => Value::None,
            }),
            ExprKind::Name(name) => env
                .get(name)
                .ok_or_else(|| EvalError::UnboundName(name.clone())),
            ExprKind::List(elems) => {
                let mut items = Vec::with_capacity(elems.len());
                for elem in elems {
                    items.push(self.eval_expr(elem, env)?);
                }
                Ok(Value::list(items))
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                eval_unary(*op, &value)
            }
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, env),
            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg, env)?);
                }
                self.call_value(&callee, arg_values)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                eval_index(&object, &index)
            }
            ExprKind::Attribute { object, name } => {
                let object = self.eval_expr(object, env)?;
                eval_attribute(object, &name.name)
            }
        }
    }

    fn eval_binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        env: &Environment,
    ) -> EvalResult<Value> {
        // `and`/`or` short-circuit and yield the deciding operand.
        let lv = self.eval_expr(left, env)?;
        match op {
            BinOp::And if !lv.is_truthy() => return Ok(lv),
            BinOp::Or if lv.is_truthy() => return Ok(lv),
            BinOp::And | BinOp::Or => return self.eval_expr(right, env),
            _ => {}
        }
        let rv = self.eval_expr(right, env)?;
        eval_binary_values(op, &lv, &rv)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Builtin(builtin) => builtin.call(&mut self.ctx, args),
            Value::BoundMethod(bound) => bound.method.call(&bound.receiver, args),
            other => Err(EvalError::NotCallable(other.type_name())),
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>) -> EvalResult<Value> {
        let params = &function.decl.params;
        if args.len() > params.len() {
            return Err(EvalError::TypeMismatch(format!(
                "{}() takes {} argument{} but {} were given",
                function.name(),
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }
        let max_depth = self.ctx.limits().max_call_depth;
        if self.depth >= max_depth {
            return Err(EvalError::RecursionLimit(max_depth));
        }

        let local = function.closure.enclosed();
        let mut args = args.into_iter();
        for param in params {
            local.define(&param.name, args.next().unwrap_or(Value::None));
        }

        let caller = self.current;
        self.depth += 1;
        let flow = self.exec_block(&function.decl.body, &local);
        self.depth -= 1;
        // A `def` inside the body leaves the scope and its function holding
        // each other.
        local.release_if_unreachable();
        let flow = flow?;
        self.current = caller;

        Ok(match flow {
            Flow::Return(value) => value,
            _ => Value::None,
        })
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════

fn eval_unary(op: UnaryOp, value: &Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => value.as_number().map(|n| Value::Number(-n)).ok_or_else(|| {
            EvalError::TypeMismatch(format!("bad operand type for unary -: '{}'", value.type_name()))
        }),
    }
}

fn eval_binary_values(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    match op {
        BinOp::Eq => Ok(Value::Bool(lv.equals(rv))),
        BinOp::NotEq => Ok(Value::Bool(!lv.equals(rv))),
        BinOp::Less => Ok(Value::Bool(compare(lv, rv)?.is_lt())),
        BinOp::Greater => Ok(Value::Bool(compare(lv, rv)?.is_gt())),
        BinOp::LessEq => Ok(Value::Bool(compare(lv, rv)?.is_le())),
        BinOp::GreaterEq => Ok(Value::Bool(compare(lv, rv)?.is_ge())),
        BinOp::In => eval_in(lv, rv),
        BinOp::Add => eval_add(lv, rv),
        BinOp::Mul => eval_mul(lv, rv),
        BinOp::Sub | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => {
            let (a, b) = numeric_operands(op, lv, rv)?;
            eval_arith(op, a, b).map(Value::Number)
        }
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators are handled by the caller"),
    }
}

/// String concatenation wins when either side is a string.
fn eval_add(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{lv}{rv}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => {
            let (a, b) = numeric_operands(BinOp::Add, lv, rv)?;
            Ok(Value::Number(a + b))
        }
    }
}

fn eval_mul(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::Str(s), n) | (n, Value::Str(s)) if n.as_number().is_some() => {
            let times = n.as_number().unwrap_or(0.0).max(0.0);
            let len = s.len() as f64 * times.trunc();
            if !len.is_finite() || len > MAX_REPEAT_LEN as f64 {
                return Err(EvalError::InvalidArgument(format!(
                    "repeated string would be longer than {MAX_REPEAT_LEN} bytes"
                )));
            }
            Ok(Value::Str(s.repeat(times as usize)))
        }
        _ => {
            let (a, b) = numeric_operands(BinOp::Mul, lv, rv)?;
            Ok(Value::Number(a * b))
        }
    }
}

fn eval_arith(op: BinOp, a: f64, b: f64) -> EvalResult<f64> {
    match op {
        BinOp::Sub => Ok(a - b),
        BinOp::Div if b == 0.0 => Err(EvalError::ZeroDivision("division")),
        BinOp::Div => Ok(a / b),
        BinOp::FloorDiv if b == 0.0 => Err(EvalError::ZeroDivision("integer division")),
        BinOp::FloorDiv => Ok((a / b).floor()),
        BinOp::Mod if b == 0.0 => Err(EvalError::ZeroDivision("modulo")),
        // Result takes the sign of the divisor.
        BinOp::Mod => Ok(a - b * (a / b).floor()),
        _ => unreachable!("not an arithmetic operator: {op}"),
    }
}

fn numeric_operands(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<(f64, f64)> {
    match (lv.as_number(), rv.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::TypeMismatch(format!(
            "unsupported operand types for {op}: '{}' and '{}'",
            lv.type_name(),
            rv.type_name()
        ))),
    }
}

fn eval_in(needle: &Value, haystack: &Value) -> EvalResult<Value> {
    match (needle, haystack) {
        (_, Value::List(items)) => Ok(Value::Bool(items.borrow().iter().any(|v| v.equals(needle)))),
        (Value::Str(sub), Value::Str(s)) => Ok(Value::Bool(s.contains(sub.as_str()))),
        (_, Value::Str(_)) => Err(EvalError::TypeMismatch(format!(
            "'in <string>' requires string as left operand, not '{}'",
            needle.type_name()
        ))),
        _ => Err(EvalError::TypeMismatch(format!(
            "argument of type '{}' is not iterable",
            haystack.type_name()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Indexing and attributes
// ══════════════════════════════════════════════════════════════════════════

/// Turn a script index into a slot, counting negatives from the end.
fn resolve_index(index: &Value, len: usize) -> EvalResult<usize> {
    let n = match index {
        Value::Number(n) if is_integral(*n) => *n as i64,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(EvalError::TypeMismatch(format!(
                "indices must be integers, not '{}'",
                other.type_name()
            )))
        }
    };
    let slot = if n < 0 { n + len as i64 } else { n };
    if slot < 0 || slot >= len as i64 {
        return Err(EvalError::IndexOutOfRange { index: n, len });
    }
    Ok(slot as usize)
}

fn eval_index(object: &Value, index: &Value) -> EvalResult<Value> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let slot = resolve_index(index, items.len())?;
            Ok(items[slot].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let slot = resolve_index(index, chars.len())?;
            Ok(Value::Str(chars[slot].to_string()))
        }
        other => Err(EvalError::TypeMismatch(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `len`/`length` read the size; anything else must be a known method.
fn eval_attribute(object: Value, name: &str) -> EvalResult<Value> {
    match (&object, name) {
        (Value::List(items), "len" | "length") => Ok(Value::Number(items.borrow().len() as f64)),
        (Value::Str(s), "len" | "length") => Ok(Value::Number(s.chars().count() as f64)),
        _ => match Method::lookup(&object, name) {
            Some(method) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                receiver: object,
                method,
            }))),
            None => Err(EvalError::UnknownAttribute {
                type_name: object.type_name(),
                attribute: name.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(eval_arith(BinOp::FloorDiv, -7.0, 2.0).unwrap(), -4.0);
        assert_eq!(eval_arith(BinOp::Mod, -7.0, 3.0).unwrap(), 2.0);
        assert_eq!(eval_arith(BinOp::Mod, 7.0, -3.0).unwrap(), -2.0);
        assert_eq!(
            eval_arith(BinOp::Mod, 1.0, 0.0),
            Err(EvalError::ZeroDivision("modulo"))
        );
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(&Value::Number(-1.0), 3).unwrap(), 2);
        assert_eq!(
            resolve_index(&Value::Number(3.0), 3),
            Err(EvalError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(matches!(
            resolve_index(&Value::Number(0.5), 3),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_string_repeat() {
        let out = eval_mul(&Value::Number(3.0), &Value::str("ab")).unwrap();
        assert_eq!(out.to_string(), "ababab");
        let out = eval_mul(&Value::str("ab"), &Value::Number(-1.0)).unwrap();
        assert_eq!(out.to_string(), "");
    }

    #[test]
    fn test_string_repeat_too_long() {
        for times in [1e19, f64::INFINITY, (MAX_REPEAT_LEN / 2 + 1) as f64] {
            assert!(matches!(
                eval_mul(&Value::str("ab"), &Value::Number(times)),
                Err(EvalError::InvalidArgument(_))
            ));
        }
        let out = eval_mul(&Value::str(""), &Value::Number(1e19)).unwrap();
        assert_eq!(out.to_string(), "");
    }
}
