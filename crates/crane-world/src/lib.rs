//! World state and crane replay.
//!
//! A [`World`] is a grid of block columns. The crane's [`CraneState`] and
//! the world are written only by the [`Executor`], which replays recorded
//! [`QueuedCommand`]s one animation step at a time.

mod crane;
mod error;
mod executor;
mod level;
mod world;

pub use crane::{
    look_at, simulate, CraneState, Direction, Pose, QueuedCommand, Verb, EMPTY, WALL,
};
pub use error::CraneFailure;
pub use executor::{
    CommandId, Completion, CompletionState, Executor, Phase, DEFAULT_STEP, STATE_HISTORY,
};
pub use level::{CraneSetup, LevelWorld, DEFAULT_GRID_SIZE, DEFAULT_SUPPLY};
pub use world::{BlockSpec, World, GROUND};
