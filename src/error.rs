//! Error taxonomy for player actions and cell mutations.
//!
//! Every failure here is locally recoverable: the action is rejected with no
//! partial mutation and the reason is reported to the caller. Nothing in the
//! core propagates an error past the action boundary.

use crate::grid::GridPos;
use thiserror::Error;

/// Reasons an action against the simulation can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// Position lies outside the grid. Queries return `None` instead;
    /// mutating calls reject with this.
    #[error("position {0} is outside the grid")]
    OutOfBounds(GridPos),

    /// Attempted placement onto a cell that already has an occupant.
    #[error("cell {0} is already occupied")]
    OccupiedCell(GridPos),

    /// The action costs more energy than the pool currently holds.
    #[error("not enough energy: need {required:.1}, have {available:.1}")]
    InsufficientEnergy { required: f32, available: f32 },

    /// Applying the graft would push the node past its component cap.
    #[error("graft of {requested} components exceeds capacity ({current}/{cap})")]
    CapacityExceeded {
        requested: u32,
        current: u32,
        cap: u32,
    },

    /// Target cell fails the adjacency or defeatability rules for the action.
    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),

    /// The addressed node no longer exists (destroyed or never created).
    #[error("no living node at {0}")]
    AlreadyTerminal(GridPos),
}
