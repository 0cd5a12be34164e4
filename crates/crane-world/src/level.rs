//! Level description, in the JSON shape levels are authored in:
//!
//! ```json
//! {
//!   "size": [6, 6],
//!   "blocks": [[2, 3, 1, "sand"]],
//!   "goal": [[4, 3, 1, "sand"]],
//!   "crane": { "x": 0, "y": 3, "dir": "E", "defaultBlock": "brick" },
//!   "carried": null
//! }
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};

use crate::crane::Direction;
use crate::world::BlockSpec;

pub const DEFAULT_GRID_SIZE: i32 = 8;
/// Block type `place()` uses when nothing is carried.
pub const DEFAULT_SUPPLY: &str = "brick";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelWorld {
    #[serde(default = "default_size")]
    pub size: (i32, i32),
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
    #[serde(default)]
    pub goal: Vec<BlockSpec>,
    #[serde(default)]
    pub crane: CraneSetup,
    /// Block the crane starts out holding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carried: Option<String>,
}

/// Starting pose and supply of the crane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraneSetup {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub dir: Direction,
    #[serde(default = "default_supply")]
    pub default_block: String,
}

fn default_size() -> (i32, i32) {
    (DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE)
}

fn default_supply() -> String {
    DEFAULT_SUPPLY.to_string()
}

impl Default for LevelWorld {
    fn default() -> Self {
        Self {
            size: default_size(),
            blocks: Vec::new(),
            goal: Vec::new(),
            crane: CraneSetup::default(),
            carried: None,
        }
    }
}

impl Default for CraneSetup {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            dir: Direction::default(),
            default_block: default_supply(),
        }
    }
}

impl LevelWorld {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
