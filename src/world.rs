//! Snapshot types: serializable views of the simulation state.
//!
//! A `Snapshot` is what a visualization or UI layer consumes; it carries no
//! entity handles, only stable ids, positions, and plain values, and it
//! serializes to JSON.

use crate::components::*;
use crate::config::SimConfig;
use crate::economy::EnergyPool;
use crate::grid::GridPos;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single plant node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantSnapshot {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub phase: String,
    pub natural: ComponentSet,
    pub grafted: ComponentSet,
    pub component_cap: u32,
    pub attack_damage: f32,
    pub extraction_rate: f32,
    pub energy_storage: f32,
    pub sprout_cost: f32,
    pub maintenance_cost: f32,
    pub growth_ticks: u32,
    pub is_heart: bool,
    /// Stable id of the parent node, `None` for the heart.
    pub parent: Option<u32>,
}

/// Snapshot of a pollution tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub x: i32,
    pub y: i32,
    pub toxic: f32,
    pub acidic: f32,
    pub sludge: f32,
    pub total: f32,
    pub dominant: String,
    pub spread_speed: f32,
    pub attack_damage: f32,
    /// Shortest emission distance from a source, `None` if never stamped.
    pub hops_from_source: Option<u32>,
    pub frozen: bool,
}

/// Snapshot of a pollution source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub kind: String,
    pub tier: String,
    pub state: String,
    pub hp: f32,
    pub hp_max: f32,
    pub emission_rate: f32,
}

/// What occupies a single queried cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CellSummary {
    Empty,
    Plant(PlantSnapshot),
    Pollution(TileSnapshot),
    Source(SourceSnapshot),
}

/// Energy pool levels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub current: f32,
    pub max: f32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub energy: EnergySnapshot,
    pub plants: Vec<PlantSnapshot>,
    pub tiles: Vec<TileSnapshot>,
    pub sources: Vec<SourceSnapshot>,
}

/// Build the snapshot of one plant node.
pub(crate) fn plant_snapshot(world: &World, entity: Entity) -> Option<PlantSnapshot> {
    let id = world.get::<PlantNodeId>(entity)?;
    let pos = world.get::<GridPos>(entity)?;
    let phase = world.get::<PlantPhase>(entity)?;
    let comp = world.get::<PlantComposition>(entity)?;
    let stats = world.get::<PlantStats>(entity)?;
    let growth = world.get::<GrowthProgress>(entity)?;
    let lineage = world.get::<Lineage>(entity)?;
    let cap_bonus = world.resource::<SimConfig>().plant.component_cap_bonus;

    Some(PlantSnapshot {
        id: id.0,
        x: pos.x,
        y: pos.y,
        phase: match phase {
            PlantPhase::Bud => "Bud".to_string(),
            PlantPhase::Grown => "Grown".to_string(),
        },
        natural: comp.natural,
        grafted: comp.grafted,
        component_cap: comp.cap(cap_bonus),
        attack_damage: stats.attack_damage,
        extraction_rate: stats.extraction_rate,
        energy_storage: stats.energy_storage,
        sprout_cost: stats.sprout_cost,
        maintenance_cost: stats.maintenance_cost,
        growth_ticks: growth.ticks,
        is_heart: world.get::<Heart>(entity).is_some(),
        parent: lineage
            .parent
            .and_then(|p| world.get::<PlantNodeId>(p))
            .map(|id| id.0),
    })
}

/// Build the snapshot of one pollution tile.
pub(crate) fn tile_snapshot(world: &World, entity: Entity) -> Option<TileSnapshot> {
    let pos = world.get::<GridPos>(entity)?;
    let load = world.get::<PollutionLoad>(entity)?;
    let stats = world.get::<TileStats>(entity)?;
    let spread = world.get::<TileSpread>(entity)?;
    let freeze = world.get::<Freeze>(entity)?;

    Some(TileSnapshot {
        x: pos.x,
        y: pos.y,
        toxic: load.toxic,
        acidic: load.acidic,
        sludge: load.sludge,
        total: load.total(),
        dominant: load.dominant().name().to_string(),
        spread_speed: stats.spread_speed,
        attack_damage: stats.attack_damage,
        hops_from_source: (spread.hops != u32::MAX).then_some(spread.hops),
        frozen: freeze.is_frozen(),
    })
}

/// Build the snapshot of one pollution source.
pub(crate) fn source_snapshot(world: &World, entity: Entity) -> Option<SourceSnapshot> {
    let id = world.get::<SourceId>(entity)?;
    let pos = world.get::<GridPos>(entity)?;
    let tier = world.get::<SourceTier>(entity)?;
    let state = world.get::<SourceState>(entity)?;
    let health = world.get::<SourceHealth>(entity)?;
    let emitter = world.get::<Emitter>(entity)?;

    Some(SourceSnapshot {
        id: id.0,
        x: pos.x,
        y: pos.y,
        kind: emitter.kind.name().to_string(),
        tier: tier.name().to_string(),
        state: state.name().to_string(),
        hp: health.current,
        hp_max: health.max,
        emission_rate: emitter.current_rate,
    })
}

impl Snapshot {
    /// Create a snapshot from the ECS world. Entries are sorted by stable id
    /// (plants, sources) or position (tiles), so equal states produce equal
    /// snapshots.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut plant_query = world.query::<(Entity, &PlantNodeId)>();
        let mut plant_entities: Vec<(u32, Entity)> = plant_query
            .iter(world)
            .map(|(entity, id)| (id.0, entity))
            .collect();
        plant_entities.sort_by_key(|(id, _)| *id);
        let plants = plant_entities
            .into_iter()
            .filter_map(|(_, entity)| plant_snapshot(world, entity))
            .collect();

        let mut tile_query = world.query::<(Entity, &GridPos, &PollutionLoad)>();
        let mut tile_entities: Vec<(GridPos, Entity)> = tile_query
            .iter(world)
            .map(|(entity, pos, _)| (*pos, entity))
            .collect();
        tile_entities.sort_by_key(|(pos, _)| (pos.y, pos.x));
        let tiles = tile_entities
            .into_iter()
            .filter_map(|(_, entity)| tile_snapshot(world, entity))
            .collect();

        let mut source_query = world.query::<(Entity, &SourceId)>();
        let mut source_entities: Vec<(u32, Entity)> = source_query
            .iter(world)
            .map(|(entity, id)| (id.0, entity))
            .collect();
        source_entities.sort_by_key(|(id, _)| *id);
        let sources = source_entities
            .into_iter()
            .filter_map(|(_, entity)| source_snapshot(world, entity))
            .collect();

        let pool = world.resource::<EnergyPool>();
        Self {
            tick,
            time,
            energy: EnergySnapshot {
                current: pool.current(),
                max: pool.max(),
            },
            plants,
            tiles,
            sources,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
