//! Replay failures.

use thiserror::Error;

use crate::crane::Verb;

/// Why a crane command could not be carried out. A failed command changes
/// nothing in the world or the crane.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CraneFailure {
    #[error("cannot {verb} at ({x}, {y}): outside the field")]
    OutOfBounds { verb: Verb, x: i32, y: i32 },

    #[error("cannot lift: the crane is already carrying {carried}")]
    AlreadyCarrying { carried: String },

    #[error("cannot {verb}: no block at ({x}, {y})")]
    NoBlock { verb: Verb, x: i32, y: i32 },
}
