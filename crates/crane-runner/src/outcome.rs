//! Serializable results of a run.

use crane_types::ScriptError;
use crane_world::BlockSpec;
use serde::{Deserialize, Serialize};

/// Result of running one script.
///
/// `stdout` holds everything printed before the run ended, even when it
/// ended in an error. `error` is a single readable message from whichever
/// stage failed: lexing, parsing, evaluation or replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub stdout: String,
    pub error: Option<String>,
    /// Non-fatal notices, such as a loop cut short at its ceiling.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Every lex or syntax error, when the script did not parse.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScriptError>,
    /// Crane commands applied to the world.
    #[serde(default)]
    pub commands_applied: usize,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Whether the level's goal blocks are in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalReport {
    pub met: bool,
    /// Goals whose cell does not hold the expected block.
    pub missing: Vec<BlockSpec>,
}
