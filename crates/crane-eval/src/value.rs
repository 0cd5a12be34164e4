//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crane_types::ast::FunctionDecl;

use crate::builtins::{Builtin, Method};
use crate::env::Environment;

/// A list shared by reference. Every alias sees every mutation.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// A script value.
#[derive(Clone)]
pub enum Value {
    /// All numbers are `f64`; there is no int/float split.
    Number(f64),
    Bool(bool),
    Str(String),
    List(ListRef),
    None,
    Function(Rc<Function>),
    Builtin(Builtin),
    /// A method looked up on a value, waiting to be called.
    BoundMethod(Rc<BoundMethod>),
}

/// A user function and the environment it was defined in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Environment,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.decl.name.name
    }
}

pub struct BoundMethod {
    pub receiver: Value,
    pub method: Method,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Python-style type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(n) if is_integral(*n) => "int",
            Value::Number(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::None => "NoneType",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::BoundMethod(_) => "builtin_function_or_method",
        }
    }

    /// `0`, `""`, `[]`, `False` and `None` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::None => false,
            Value::Function(_) | Value::Builtin(_) | Value::BoundMethod(_) => true,
        }
    }

    /// Numeric view. Booleans count as `0` and `1`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Python `repr`: strings are quoted.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        write_value(&mut out, self, true, &mut Vec::new());
        out
    }

    /// Structural equality. Lists compare element-wise, callables by identity.
    ///
    /// A pair of lists met again while it is still being compared counts
    /// as equal, so self-containing lists terminate.
    pub fn equals(&self, other: &Value) -> bool {
        values_equal(self, other, &mut Vec::new())
    }
}

type ListPtr = *const RefCell<Vec<Value>>;

fn values_equal(a: &Value, b: &Value, open: &mut Vec<(ListPtr, ListPtr)>) -> bool {
    match (a, b) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::None, Value::None) => true,
        (Value::List(a), Value::List(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
            if open.contains(&pair) {
                return true;
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return false;
            }
            open.push(pair);
            let equal = a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y, open));
            open.pop();
            equal
        }
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Print form: strings bare, everything else as [`Value::repr`].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_value(&mut out, self, false, &mut Vec::new());
        f.write_str(&out)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<built-in method {}>", self.method.name())
    }
}

pub(crate) fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

/// Integral numbers print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if is_integral(n) && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// `open` holds the lists currently being written, so a list that contains
/// itself prints as `[...]`.
fn write_value(
    out: &mut String,
    value: &Value,
    quoted: bool,
    open: &mut Vec<ListPtr>,
) {
    match value {
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Str(s) if quoted => {
            out.push('\'');
            for c in s.chars() {
                match c {
                    '\'' => out.push_str("\\'"),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('\'');
        }
        Value::Str(s) => out.push_str(s),
        Value::None => out.push_str("None"),
        Value::List(items) => {
            let ptr = Rc::as_ptr(items);
            if open.contains(&ptr) {
                out.push_str("[...]");
                return;
            }
            open.push(ptr);
            out.push('[');
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, true, open);
            }
            out.push(']');
            open.pop();
        }
        Value::Function(func) => {
            out.push_str("<function ");
            out.push_str(func.name());
            out.push('>');
        }
        Value::Builtin(builtin) => {
            out.push_str("<built-in function ");
            out.push_str(builtin.name());
            out.push('>');
        }
        Value::BoundMethod(bound) => {
            out.push_str("<built-in method ");
            out.push_str(bound.method.name());
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NAN), "nan");
    }

    #[test]
    fn test_display_and_repr() {
        let v = Value::list(vec![
            Value::Number(1.0),
            Value::str("a'b"),
            Value::None,
            Value::Bool(true),
        ]);
        assert_eq!(v.to_string(), r"[1, 'a\'b', None, True]");
        assert_eq!(Value::str("hi").to_string(), "hi");
        assert_eq!(Value::str("hi").repr(), "'hi'");
    }

    #[test]
    fn test_self_containing_list_prints() {
        let v = Value::list(vec![Value::Number(1.0)]);
        if let Value::List(items) = &v {
            items.borrow_mut().push(v.clone());
        }
        assert_eq!(v.to_string(), "[1, [...]]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::None.is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::list(vec![Value::None]).is_truthy());
    }

    #[test]
    fn test_equality() {
        assert!(Value::Bool(true).equals(&Value::Number(1.0)));
        assert!(!Value::str("1").equals(&Value::Number(1.0)));
        let a = Value::list(vec![Value::Number(1.0), Value::str("x")]);
        let b = Value::list(vec![Value::Number(1.0), Value::str("x")]);
        assert!(a.equals(&b));
        assert!(!Value::Number(f64::NAN).equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_self_containing_lists_compare() {
        let cyclic = |head: f64| {
            let v = Value::list(vec![Value::Number(head)]);
            if let Value::List(items) = &v {
                items.borrow_mut().push(v.clone());
            }
            v
        };
        assert!(cyclic(1.0).equals(&cyclic(1.0)));
        assert!(!cyclic(1.0).equals(&cyclic(2.0)));
    }
}
