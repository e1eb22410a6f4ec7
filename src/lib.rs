//! Rootbound - Grid Ecology Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of a spreading plant
//! organism fighting back encroaching pollution on a square grid. Uses
//! `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod grid;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{PlantConfig, PollutionConfig, SimConfig, SourceTierConfig, StatKind};
pub use economy::{EnergyPool, GraftBuffer};
pub use error::ActionError;
pub use grid::{GridIndex, GridPos, Occupant};
pub use systems::*;
pub use world::{CellSummary, Snapshot};
