//! Per-run state shared between the evaluator and the built-ins.

use crane_world::{look_at, simulate, Pose, QueuedCommand, World};
use tracing::{trace, warn};

/// Iteration ceiling for a single loop.
pub const MAX_LOOP_ITERATIONS: usize = 10_000;
/// Nesting ceiling for user function calls.
pub const MAX_CALL_DEPTH: usize = 200;
/// Largest list `range()` will build.
pub const MAX_RANGE_LEN: usize = 1_000_000;
/// Longest string `str * n` will build, in bytes.
pub const MAX_REPEAT_LEN: usize = 10_000_000;

/// Evaluation ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_iterations: usize,
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations: MAX_LOOP_ITERATIONS,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// Everything a script run reads and writes besides its variables.
///
/// The world is borrowed read-only and the crane is a copy of its last
/// committed pose: evaluation records crane intents but never applies them.
#[derive(Debug)]
pub struct RunContext<'w> {
    world: &'w World,
    crane: Pose,
    limits: Limits,
    stdout: String,
    commands: Vec<QueuedCommand>,
    warnings: Vec<String>,
}

/// What a finished evaluation hands to the replay stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalOutput {
    pub stdout: String,
    pub commands: Vec<QueuedCommand>,
    pub warnings: Vec<String>,
}

impl<'w> RunContext<'w> {
    pub fn new(world: &'w World, crane: Pose, limits: Limits) -> Self {
        Self {
            world,
            crane,
            limits,
            stdout: String::new(),
            commands: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn write_line(&mut self, line: &str) {
        self.stdout.push_str(line);
        self.stdout.push('\n');
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn queue(&mut self, command: QueuedCommand) {
        trace!(%command, queued = self.commands.len() + 1, "queued crane command");
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[QueuedCommand] {
        &self.commands
    }

    /// Where the crane will stand once everything queued so far has run.
    pub fn predicted_pose(&self) -> Pose {
        simulate(self.crane, &self.commands)
    }

    /// What the crane will see from its predicted pose. The world is read
    /// as it is now, before any queued block changes.
    pub fn look(&self) -> String {
        look_at(self.world, self.predicted_pose())
    }

    pub fn warn(&mut self, message: String) {
        warn!(%message, "script warning");
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_output(self) -> EvalOutput {
        EvalOutput {
            stdout: self.stdout,
            commands: self.commands,
            warnings: self.warnings,
        }
    }
}
