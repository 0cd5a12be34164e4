//! Built-in functions, value methods, and the crane command bridge.

use std::cmp::Ordering;
use std::rc::Rc;

use crane_world::{QueuedCommand, Verb, DEFAULT_SUPPLY};

use crate::context::{RunContext, MAX_RANGE_LEN};
use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::value::{format_number, Value};

/// A function installed in the root environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Range,
    Len,
    Int,
    Float,
    Str,
    Abs,
    Min,
    Max,
    Input,
    Look,
    /// Records a crane command; nothing happens to the world until replay.
    Crane(Verb),
}

impl Builtin {
    pub const ALL: [Builtin; 18] = [
        Builtin::Print,
        Builtin::Range,
        Builtin::Len,
        Builtin::Int,
        Builtin::Float,
        Builtin::Str,
        Builtin::Abs,
        Builtin::Min,
        Builtin::Max,
        Builtin::Input,
        Builtin::Look,
        Builtin::Crane(Verb::Move),
        Builtin::Crane(Verb::TurnLeft),
        Builtin::Crane(Verb::TurnRight),
        Builtin::Crane(Verb::Lift),
        Builtin::Crane(Verb::Place),
        Builtin::Crane(Verb::PlaceBlock),
        Builtin::Crane(Verb::Dig),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Str => "str",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Input => "input",
            Builtin::Look => "look",
            Builtin::Crane(verb) => verb.name(),
        }
    }

    pub fn call(self, ctx: &mut RunContext<'_>, args: Vec<Value>) -> EvalResult<Value> {
        match self {
            Builtin::Print => {
                let line = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                ctx.write_line(&line);
                Ok(Value::None)
            }
            Builtin::Range => range(&args),
            Builtin::Len => {
                let [value] = exact::<1>(self, args)?;
                match &value {
                    Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
                    Value::List(items) => Ok(Value::Number(items.borrow().len() as f64)),
                    other => Err(EvalError::TypeMismatch(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Int => {
                let [value] = exact::<1>(self, args)?;
                to_int(&value)
            }
            Builtin::Float => {
                let [value] = exact::<1>(self, args)?;
                to_float(&value)
            }
            Builtin::Str => {
                let [value] = exact::<1>(self, args)?;
                Ok(Value::Str(value.to_string()))
            }
            Builtin::Abs => {
                let [value] = exact::<1>(self, args)?;
                let n = number_arg(self, &value)?;
                Ok(Value::Number(n.abs()))
            }
            Builtin::Min => extremum(self, args, Ordering::Less),
            Builtin::Max => extremum(self, args, Ordering::Greater),
            // Standard input is not wired to scripts.
            Builtin::Input => Ok(Value::str("")),
            Builtin::Look => {
                exact::<0>(self, args)?;
                Ok(Value::Str(ctx.look()))
            }
            Builtin::Crane(Verb::PlaceBlock) => {
                let kind = match args.into_iter().next() {
                    None | Some(Value::None) => DEFAULT_SUPPLY.to_string(),
                    Some(Value::Str(s)) => s,
                    Some(other) => other.to_string(),
                };
                ctx.queue(QueuedCommand::place_block(kind));
                Ok(Value::None)
            }
            Builtin::Crane(verb) => {
                ctx.queue(QueuedCommand::new(verb));
                Ok(Value::None)
            }
        }
    }
}

/// Bind every built-in into `env`.
pub fn install(env: &Environment) {
    for builtin in Builtin::ALL {
        env.define(builtin.name(), Value::Builtin(builtin));
    }
}

// ─────────────────────────────────────────────────────────────────────
// Methods
// ─────────────────────────────────────────────────────────────────────

/// A method reachable through attribute access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Append,
    Upper,
    Lower,
    Strip,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Append => "append",
            Method::Upper => "upper",
            Method::Lower => "lower",
            Method::Strip => "strip",
        }
    }

    /// Methods defined for the receiver's type.
    pub fn lookup(receiver: &Value, name: &str) -> Option<Method> {
        match (receiver, name) {
            (Value::List(_), "append") => Some(Method::Append),
            (Value::Str(_), "upper") => Some(Method::Upper),
            (Value::Str(_), "lower") => Some(Method::Lower),
            (Value::Str(_), "strip") => Some(Method::Strip),
            _ => None,
        }
    }

    pub fn call(self, receiver: &Value, args: Vec<Value>) -> EvalResult<Value> {
        match (self, receiver) {
            (Method::Append, Value::List(items)) => {
                let [value] = exact_method::<1>(self, args)?;
                items.borrow_mut().push(value);
                Ok(Value::None)
            }
            (Method::Upper, Value::Str(s)) => {
                exact_method::<0>(self, args)?;
                Ok(Value::Str(s.to_uppercase()))
            }
            (Method::Lower, Value::Str(s)) => {
                exact_method::<0>(self, args)?;
                Ok(Value::Str(s.to_lowercase()))
            }
            (Method::Strip, Value::Str(s)) => {
                exact_method::<0>(self, args)?;
                Ok(Value::str(s.trim()))
            }
            (method, other) => Err(EvalError::UnknownAttribute {
                type_name: other.type_name(),
                attribute: method.name().to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn exact<const N: usize>(builtin: Builtin, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| arity(builtin.name(), N, given))
}

fn exact_method<const N: usize>(method: Method, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| arity(method.name(), N, given))
}

fn arity(name: &str, expected: usize, given: usize) -> EvalError {
    let plural = if expected == 1 { "" } else { "s" };
    EvalError::TypeMismatch(format!(
        "{name}() takes {expected} argument{plural} ({given} given)"
    ))
}

fn number_arg(builtin: Builtin, value: &Value) -> EvalResult<f64> {
    value.as_number().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "{}() expects a number, got '{}'",
            builtin.name(),
            value.type_name()
        ))
    })
}

fn range(args: &[Value]) -> EvalResult<Value> {
    let numbers = args
        .iter()
        .map(|v| number_arg(Builtin::Range, v))
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match numbers.as_slice() {
        [stop] => (0.0, *stop, 1.0),
        [start, stop] => (*start, *stop, 1.0),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(EvalError::TypeMismatch(format!(
                "range() takes 1 to 3 arguments ({} given)",
                args.len()
            )))
        }
    };
    if step == 0.0 {
        return Err(EvalError::InvalidArgument(
            "range() step must not be zero".to_string(),
        ));
    }
    let count = ((stop - start) / step).ceil();
    if !count.is_finite() {
        return Err(EvalError::InvalidArgument(
            "range() bounds must be finite".to_string(),
        ));
    }
    let count = count.max(0.0);
    if count > MAX_RANGE_LEN as f64 {
        return Err(EvalError::InvalidArgument(format!(
            "range() would produce more than {MAX_RANGE_LEN} elements"
        )));
    }
    let items = (0..count as usize)
        .map(|i| Value::Number(start + step * i as f64))
        .collect();
    Ok(Value::list(items))
}

fn to_int(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Str(s) => {
            let text = s.trim();
            text.parse::<i64>()
                .map(|n| Value::Number(n as f64))
                .map_err(|_| {
                    EvalError::InvalidArgument(format!(
                        "invalid literal for int(): {}",
                        value.repr()
                    ))
                })
        }
        other => match other.as_number() {
            Some(n) if n.is_finite() => Ok(Value::Number(n.trunc())),
            Some(n) => Err(EvalError::InvalidArgument(format!(
                "cannot convert {} to int",
                format_number(n)
            ))),
            None => Err(EvalError::TypeMismatch(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        },
    }
}

fn to_float(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Number).map_err(|_| {
            EvalError::InvalidArgument(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => other.as_number().map(Value::Number).ok_or_else(|| {
            EvalError::TypeMismatch(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

/// `min`/`max`: a single list argument is searched, otherwise the
/// arguments themselves are.
fn extremum(builtin: Builtin, args: Vec<Value>, keep: Ordering) -> EvalResult<Value> {
    let single_list = match args.as_slice() {
        [Value::List(items)] => Some(Rc::clone(items)),
        _ => None,
    };
    let candidates = match single_list {
        Some(items) => items.borrow().clone(),
        None => args,
    };
    let mut iter = candidates.into_iter();
    let mut best = iter.next().ok_or_else(|| {
        EvalError::InvalidArgument(format!("{}() arg is an empty sequence", builtin.name()))
    })?;
    for candidate in iter {
        if compare(&candidate, &best)? == keep {
            best = candidate;
        }
    }
    Ok(best)
}

/// Ordering for `<`, `min` and friends: numbers (booleans included) or
/// strings, never a mix.
pub fn compare(left: &Value, right: &Value) -> EvalResult<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal)),
            _ => Err(EvalError::TypeMismatch(format!(
                "cannot compare '{}' with '{}'",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(value: &Value) -> Vec<f64> {
        match value {
            Value::List(items) => items.borrow().iter().filter_map(Value::as_number).collect(),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_range_forms() {
        let n = |x: f64| Value::Number(x);
        assert_eq!(numbers(&range(&[n(3.0)]).unwrap()), vec![0.0, 1.0, 2.0]);
        assert_eq!(numbers(&range(&[n(2.0), n(5.0)]).unwrap()), vec![2.0, 3.0, 4.0]);
        assert_eq!(
            numbers(&range(&[n(5.0), n(0.0), n(-2.0)]).unwrap()),
            vec![5.0, 3.0, 1.0]
        );
        assert!(numbers(&range(&[n(5.0), n(1.0)]).unwrap()).is_empty());
    }

    #[test]
    fn test_range_rejects_zero_step_and_huge_lists() {
        let n = |x: f64| Value::Number(x);
        assert!(matches!(
            range(&[n(0.0), n(5.0), n(0.0)]),
            Err(EvalError::InvalidArgument(_))
        ));
        assert!(matches!(
            range(&[n(2_000_000.0)]),
            Err(EvalError::InvalidArgument(_))
        ));
        assert!(range(&[n(1_000_000.0)]).is_ok());
    }

    #[test]
    fn test_conversions() {
        assert!(to_int(&Value::str(" 42 ")).unwrap().equals(&Value::Number(42.0)));
        assert!(to_int(&Value::Number(-3.7)).unwrap().equals(&Value::Number(-3.0)));
        assert!(to_int(&Value::str("4.5")).is_err());
        assert!(to_float(&Value::str("4.5")).unwrap().equals(&Value::Number(4.5)));
        assert!(to_float(&Value::None).is_err());
    }

    #[test]
    fn test_extremum() {
        let list = Value::list(vec![Value::Number(3.0), Value::Number(-1.0), Value::Number(7.0)]);
        let max = extremum(Builtin::Max, vec![list.clone()], Ordering::Greater).unwrap();
        assert!(max.equals(&Value::Number(7.0)));
        let min = extremum(Builtin::Min, vec![list], Ordering::Less).unwrap();
        assert!(min.equals(&Value::Number(-1.0)));
        assert!(extremum(Builtin::Min, vec![], Ordering::Less).is_err());
        assert!(extremum(
            Builtin::Max,
            vec![Value::str("a"), Value::Number(1.0)],
            Ordering::Greater
        )
        .is_err());
    }

    #[test]
    fn test_methods() {
        let s = Value::str("  Crane ");
        let out = Method::Strip.call(&s, vec![]).unwrap();
        assert_eq!(out.to_string(), "Crane");
        assert_eq!(Method::lookup(&s, "append"), None);
        assert_eq!(Method::lookup(&Value::list(vec![]), "append"), Some(Method::Append));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Builtin::ALL.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Builtin::ALL.len());
    }
}
