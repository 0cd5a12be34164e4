//! Crane tree-walking evaluator.
//!
//! Runs a parsed script against a read-only view of the world. Printed
//! output and crane commands are collected in a [`RunContext`]; the
//! commands are replayed by the crane executor after evaluation ends.

mod builtins;
mod context;
mod env;
mod error;
mod evaluator;
mod value;

pub use builtins::{compare, Builtin, Method};
pub use context::{
    EvalOutput, Limits, RunContext, MAX_CALL_DEPTH, MAX_LOOP_ITERATIONS, MAX_RANGE_LEN,
    MAX_REPEAT_LEN,
};
pub use env::Environment;
pub use error::{EvalError, EvalResult, RuntimeError};
pub use evaluator::Evaluator;
pub use value::{format_number, BoundMethod, Function, ListRef, Value};

use crane_types::ast::Program;
use crane_world::{Pose, World};

/// A finished evaluation: everything produced, plus the error that
/// stopped it early, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub output: EvalOutput,
    pub error: Option<RuntimeError>,
}

/// Evaluate `program` with a fresh global environment.
pub fn evaluate(program: &Program, world: &World, crane: Pose, limits: Limits) -> Evaluation {
    let mut evaluator = Evaluator::new(world, crane, limits);
    let error = evaluator.run(program).err();
    Evaluation {
        output: evaluator.into_output(),
        error,
    }
}
