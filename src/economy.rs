//! Shared energy pool and the graft transfer buffer.
//!
//! The pool is the only mutable resource shared by every plant action; all
//! mutations go through it behind the single-threaded tick loop. The graft
//! buffer is the transient holding area between a graft removal and its
//! application to another node.

use crate::components::ComponentSet;
use crate::error::ActionError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// The simulation-wide energy pool. `0 <= current <= max` always holds.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct EnergyPool {
    current: f32,
    max: f32,
}

impl EnergyPool {
    pub fn new(max: f32, starting: f32) -> Self {
        Self {
            current: starting.clamp(0.0, max.max(0.0)),
            max: max.max(0.0),
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    /// Spend energy or fail without mutation.
    pub fn spend(&mut self, cost: f32) -> Result<(), ActionError> {
        if !self.can_afford(cost) {
            return Err(ActionError::InsufficientEnergy {
                required: cost,
                available: self.current,
            });
        }
        self.current -= cost;
        Ok(())
    }

    /// Drain upkeep, flooring at zero. Used by tick-driven costs that do not
    /// abort on shortage.
    pub fn drain(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    /// Deposit energy, clamped to the cap.
    pub fn deposit(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Adjust the cap when storage comes online or is destroyed. A shrinking
    /// cap clamps the current level down with it.
    pub fn adjust_max(&mut self, delta: f32) {
        self.max = (self.max + delta).max(0.0);
        self.current = self.current.min(self.max);
    }
}

/// Holding area for components removed from one plant, pending application to
/// another. Holds at most one triple; a new removal overwrites unapplied
/// content.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraftBuffer {
    pending: Option<ComponentSet>,
}

impl GraftBuffer {
    /// Store removed components, discarding any unapplied prior content.
    pub fn store(&mut self, set: ComponentSet) {
        if let Some(lost) = self.pending.replace(set) {
            tracing::warn!(
                leaf = lost.leaf,
                root = lost.root,
                fruit = lost.fruit,
                "graft buffer overwritten; unapplied components lost"
            );
        }
    }

    pub fn peek(&self) -> Option<ComponentSet> {
        self.pending
    }

    pub fn take(&mut self) -> Option<ComponentSet> {
        self.pending.take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}
