//! The voxel grid the crane works on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::level::LevelWorld;

/// Block type laid under every cell when a level is loaded.
pub const GROUND: &str = "ground";

/// A block type at a grid position, as `[x, y, z, "type"]` in level JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSpec(pub i32, pub i32, pub i32, pub String);

impl BlockSpec {
    pub fn new(x: i32, y: i32, z: i32, kind: impl Into<String>) -> Self {
        Self(x, y, z, kind.into())
    }

    pub fn position(&self) -> (i32, i32, i32) {
        (self.0, self.1, self.2)
    }

    pub fn kind(&self) -> &str {
        &self.3
    }
}

/// A `width × height` grid of block columns.
///
/// Blocks are keyed by `(x, y, z)`. Columns may have gaps; the top of a
/// column is its highest occupied `z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    width: i32,
    height: i32,
    blocks: BTreeMap<(i32, i32, i32), String>,
    goals: Vec<BlockSpec>,
}

impl World {
    /// An empty grid with no ground and no goals.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            blocks: BTreeMap::new(),
            goals: Vec::new(),
        }
    }

    /// Build a level: ground at `z = 0` under every cell, then the level's
    /// own blocks on top (overriding ground where they share a position).
    pub fn from_level(level: &LevelWorld) -> Self {
        let (width, height) = level.size;
        let mut world = Self::new(width, height);
        for x in 0..width {
            for y in 0..height {
                world.set_block(x, y, 0, GROUND);
            }
        }
        for BlockSpec(x, y, z, kind) in &level.blocks {
            world.set_block(*x, *y, *z, kind.as_str());
        }
        world.goals = level.goal.clone();
        world
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    pub fn block(&self, x: i32, y: i32, z: i32) -> Option<&str> {
        self.blocks.get(&(x, y, z)).map(String::as_str)
    }

    /// Set the block at a position. An empty type clears it.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, kind: impl Into<String>) {
        let kind = kind.into();
        if kind.is_empty() {
            self.blocks.remove(&(x, y, z));
        } else {
            self.blocks.insert((x, y, z), kind);
        }
    }

    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> Option<String> {
        self.blocks.remove(&(x, y, z))
    }

    /// Highest occupied `z` in the column, or `None` when it is empty.
    pub fn top_z(&self, x: i32, y: i32) -> Option<i32> {
        self.blocks
            .range((x, y, i32::MIN)..=(x, y, i32::MAX))
            .next_back()
            .map(|(&(_, _, z), _)| z)
    }

    /// The top block of a column with its height.
    pub fn top_block(&self, x: i32, y: i32) -> Option<(i32, &str)> {
        self.blocks
            .range((x, y, i32::MIN)..=(x, y, i32::MAX))
            .next_back()
            .map(|(&(_, _, z), kind)| (z, kind.as_str()))
    }

    /// All blocks in `(x, y, z)` order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockSpec> + '_ {
        self.blocks
            .iter()
            .map(|(&(x, y, z), kind)| BlockSpec(x, y, z, kind.clone()))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn goals(&self) -> &[BlockSpec] {
        &self.goals
    }

    pub fn add_goal(&mut self, goal: BlockSpec) {
        self.goals.push(goal);
    }

    /// Goals whose position does not hold the expected block type.
    pub fn unmet_goals(&self) -> Vec<&BlockSpec> {
        self.goals
            .iter()
            .filter(|g| self.block(g.0, g.1, g.2) != Some(g.kind()))
            .collect()
    }

    /// `true` when the level has at least one goal and all are met.
    pub fn goals_met(&self) -> bool {
        !self.goals.is_empty() && self.unmet_goals().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_z_ignores_neighbouring_columns() {
        let mut w = World::new(4, 4);
        w.set_block(1, 1, 0, "ground");
        w.set_block(1, 1, 3, "sand");
        w.set_block(1, 2, 7, "stone");
        w.set_block(2, 1, 9, "stone");
        assert_eq!(w.top_z(1, 1), Some(3));
        assert_eq!(w.top_block(1, 1), Some((3, "sand")));
        assert_eq!(w.top_z(0, 0), None);
    }

    #[test]
    fn test_negative_coordinates_do_not_leak() {
        let mut w = World::new(2, 2);
        w.set_block(0, 0, 0, "ground");
        assert_eq!(w.top_z(-1, 0), None);
        assert_eq!(w.top_z(0, -1), None);
        assert!(!w.in_bounds(-1, 0));
        assert!(!w.in_bounds(2, 0));
        assert!(w.in_bounds(1, 1));
    }

    #[test]
    fn test_empty_type_clears_block() {
        let mut w = World::new(2, 2);
        w.set_block(0, 0, 1, "brick");
        w.set_block(0, 0, 1, "");
        assert_eq!(w.block(0, 0, 1), None);
        assert_eq!(w.block_count(), 0);
    }

    #[test]
    fn test_goals() {
        let mut w = World::new(3, 3);
        assert!(!w.goals_met(), "no goals is never a win");
        w.add_goal(BlockSpec::new(1, 1, 1, "brick"));
        assert_eq!(w.unmet_goals().len(), 1);
        w.set_block(1, 1, 1, "sand");
        assert!(!w.goals_met());
        w.set_block(1, 1, 1, "brick");
        assert!(w.goals_met());
    }
}
