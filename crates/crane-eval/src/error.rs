//! Runtime errors for the crane evaluator.

use std::fmt;

use crane_types::Span;
use thiserror::Error;

/// Evaluation failure. Any of these stops the script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UnboundName(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("'{0}' object is not callable")]
    NotCallable(&'static str),

    #[error("'{type_name}' object has no attribute '{attribute}'")]
    UnknownAttribute {
        type_name: &'static str,
        attribute: String,
    },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Division or modulo by zero.
    #[error("{0} by zero")]
    ZeroDivision(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("maximum call depth of {0} exceeded")]
    RecursionLimit(usize),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// An [`EvalError`] tied to the statement that was running when it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub error: EvalError,
    pub span: Span,
}

impl RuntimeError {
    pub fn line(&self) -> u32 {
        self.span.start_line
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line(), self.error)
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
