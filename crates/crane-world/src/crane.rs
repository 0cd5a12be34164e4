//! Crane pose, command intents, and the look-ahead used while a script is
//! still being evaluated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::world::World;

/// What `look()` reports for a cell outside the grid.
pub const WALL: &str = "wall";
/// What `look()` reports for a column with no blocks.
pub const EMPTY: &str = "empty";

// ─────────────────────────────────────────────────────────────────────
// Direction
// ─────────────────────────────────────────────────────────────────────

/// Compass facing. North is `-y`, east is `+x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "S")]
    #[default]
    South,
    #[serde(rename = "W")]
    West,
}

impl Direction {
    /// Clockwise order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn turn_left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::East => "E",
            Direction::South => "S",
            Direction::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Crane state
// ─────────────────────────────────────────────────────────────────────

/// Grid position and facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
}

impl Pose {
    pub fn new(x: i32, y: i32, dir: Direction) -> Self {
        Self { x, y, dir }
    }

    /// The cell directly in front.
    pub fn ahead(self) -> (i32, i32) {
        let (dx, dy) = self.dir.delta();
        (self.x + dx, self.y + dy)
    }
}

/// The crane's committed state. Only the executor changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraneState {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub carried: Option<String>,
}

impl CraneState {
    pub fn new(pose: Pose) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            dir: pose.dir,
            carried: None,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.x, self.y, self.dir)
    }

    pub fn ahead(&self) -> (i32, i32) {
        self.pose().ahead()
    }
}

impl Default for CraneState {
    fn default() -> Self {
        Self::new(Pose::new(0, 0, Direction::default()))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────

/// A crane action a script can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Move,
    TurnLeft,
    TurnRight,
    Lift,
    Place,
    PlaceBlock,
    Dig,
}

impl Verb {
    pub const ALL: [Verb; 7] = [
        Verb::Move,
        Verb::TurnLeft,
        Verb::TurnRight,
        Verb::Lift,
        Verb::Place,
        Verb::PlaceBlock,
        Verb::Dig,
    ];

    /// The script-level function name.
    pub fn name(self) -> &'static str {
        match self {
            Verb::Move => "move",
            Verb::TurnLeft => "turn_left",
            Verb::TurnRight => "turn_right",
            Verb::Lift => "lift",
            Verb::Place => "place",
            Verb::PlaceBlock => "place_block",
            Verb::Dig => "dig",
        }
    }

    pub fn from_name(name: &str) -> Option<Verb> {
        Verb::ALL.into_iter().find(|v| v.name() == name)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded crane intent. Only `place_block` carries an argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
}

impl QueuedCommand {
    pub fn new(verb: Verb) -> Self {
        Self { verb, arg: None }
    }

    pub fn place_block(kind: impl Into<String>) -> Self {
        Self {
            verb: Verb::PlaceBlock,
            arg: Some(kind.into()),
        }
    }
}

impl fmt::Display for QueuedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}('{arg}')", self.verb),
            None => write!(f, "{}()", self.verb),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Look-ahead
// ─────────────────────────────────────────────────────────────────────

/// Pose after replaying only the moves and turns of `commands` from
/// `start`. Bounds are not checked; the executor does that on replay.
pub fn simulate(start: Pose, commands: &[QueuedCommand]) -> Pose {
    commands.iter().fold(start, |pose, cmd| match cmd.verb {
        Verb::Move => {
            let (x, y) = pose.ahead();
            Pose::new(x, y, pose.dir)
        }
        Verb::TurnLeft => Pose::new(pose.x, pose.y, pose.dir.turn_left()),
        Verb::TurnRight => Pose::new(pose.x, pose.y, pose.dir.turn_right()),
        _ => pose,
    })
}

/// What a crane at `pose` sees in the cell in front of it: [`WALL`],
/// [`EMPTY`], or the type of the column's top block.
pub fn look_at(world: &World, pose: Pose) -> String {
    let (x, y) = pose.ahead();
    if !world.in_bounds(x, y) {
        return WALL.to_string();
    }
    match world.top_block(x, y) {
        Some((_, kind)) => kind.to_string(),
        None => EMPTY.to_string(),
    }
}
