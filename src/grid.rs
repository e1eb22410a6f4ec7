//! Grid occupancy registry.
//!
//! The simulation plays out on a bounded integer grid where every cell holds
//! at most one occupant: a plant node, a pollution tile, or a pollution
//! source. The `GridIndex` resource is the single source of truth for
//! occupancy; entity components mirror their own position but never the
//! neighborhood.

use crate::error::ActionError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Integer cell coordinate, `0 <= x < width`, `0 <= y < height`.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell.
    pub fn distance(&self, other: GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// True when the two cells share an edge.
    pub fn is_adjacent(&self, other: GridPos) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What sits in a grid cell. Exactly one variant per occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Plant(Entity),
    Tile(Entity),
    Source(Entity),
}

impl Occupant {
    pub fn entity(&self) -> Entity {
        match *self {
            Occupant::Plant(e) | Occupant::Tile(e) | Occupant::Source(e) => e,
        }
    }
}

/// Orthogonal neighbor offsets, in the fixed order up, down, left, right.
const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];
/// Diagonal neighbor offsets: up-right, down-right, up-left, down-left.
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Spatial registry mapping grid coordinates to occupants.
#[derive(Resource, Debug, Clone)]
pub struct GridIndex {
    width: i32,
    height: i32,
    cells: HashMap<GridPos, Occupant>,
}

impl GridIndex {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: HashMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Register an occupant at a cell.
    ///
    /// Occupancy is a hard precondition: registering onto a taken cell fails
    /// with `OccupiedCell` and leaves the registry unchanged. Callers must
    /// unregister the prior occupant first.
    pub fn register(&mut self, pos: GridPos, occupant: Occupant) -> Result<(), ActionError> {
        if !self.in_bounds(pos) {
            return Err(ActionError::OutOfBounds(pos));
        }
        if self.cells.contains_key(&pos) {
            return Err(ActionError::OccupiedCell(pos));
        }
        self.cells.insert(pos, occupant);
        Ok(())
    }

    /// Remove and return the occupant of a cell, if any.
    pub fn unregister(&mut self, pos: GridPos) -> Option<Occupant> {
        self.cells.remove(&pos)
    }

    /// Occupant lookup. Out-of-bounds positions are simply empty.
    pub fn occupant(&self, pos: GridPos) -> Option<Occupant> {
        self.cells.get(&pos).copied()
    }

    pub fn is_empty(&self, pos: GridPos) -> bool {
        self.in_bounds(pos) && !self.cells.contains_key(&pos)
    }

    pub fn plant_at(&self, pos: GridPos) -> Option<Entity> {
        match self.occupant(pos) {
            Some(Occupant::Plant(e)) => Some(e),
            _ => None,
        }
    }

    pub fn tile_at(&self, pos: GridPos) -> Option<Entity> {
        match self.occupant(pos) {
            Some(Occupant::Tile(e)) => Some(e),
            _ => None,
        }
    }

    pub fn source_at(&self, pos: GridPos) -> Option<Entity> {
        match self.occupant(pos) {
            Some(Occupant::Source(e)) => Some(e),
            _ => None,
        }
    }

    /// In-bounds neighbor positions of a cell.
    ///
    /// Orthogonal neighbors come first (up, down, left, right); diagonals
    /// (up-right, down-right, up-left, down-left) are appended only when
    /// requested. Out-of-bounds candidates are silently dropped.
    pub fn neighbors(&self, pos: GridPos, include_diagonal: bool) -> Vec<GridPos> {
        let mut out = Vec::with_capacity(if include_diagonal { 8 } else { 4 });
        for (dx, dy) in ORTHOGONAL {
            let p = GridPos::new(pos.x + dx, pos.y + dy);
            if self.in_bounds(p) {
                out.push(p);
            }
        }
        if include_diagonal {
            for (dx, dy) in DIAGONAL {
                let p = GridPos::new(pos.x + dx, pos.y + dy);
                if self.in_bounds(p) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Number of occupied cells (for diagnostics and tests).
    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }
}
