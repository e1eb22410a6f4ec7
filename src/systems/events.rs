//! Position-keyed change notifications for visualization layers.
//!
//! The core never talks to a renderer. Instead every mutation that changes
//! what a cell looks like pushes an event here; the embedding layer drains
//! the buffer after each tick or player action and redraws what it cares
//! about.

use crate::grid::GridPos;
use bevy_ecs::prelude::*;
use serde::Serialize;

/// A cell whose visible state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeEvent {
    /// A plant node appeared, transitioned, mutated, or died at this cell.
    PlantChanged(GridPos),
    /// A pollution tile or source appeared, changed level, or vanished here.
    PollutionChanged(GridPos),
}

/// Accumulates change events until the caller drains them.
#[derive(Resource, Debug, Default)]
pub struct ChangeBuffer {
    events: Vec<ChangeEvent>,
}

impl ChangeBuffer {
    pub fn push_plant(&mut self, pos: GridPos) {
        self.events.push(ChangeEvent::PlantChanged(pos));
    }

    pub fn push_pollution(&mut self, pos: GridPos) {
        self.events.push(ChangeEvent::PollutionChanged(pos));
    }

    /// Take all pending events, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
