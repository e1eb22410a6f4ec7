//! Extraction phase: grown plants harvesting energy out of pollution.
//!
//! First half of phase 3. Each grown node pays its upkeep, then works every
//! orthogonal neighbor it can beat: tiles lose level proportional to the
//! attack margin and yield energy, sources lose hit points the same way. A
//! tile a node extracts from is held frozen for a few ticks.

use crate::components::*;
use crate::config::SimConfig;
use crate::economy::EnergyPool;
use crate::grid::{GridIndex, GridPos, Occupant};
use crate::systems::events::ChangeBuffer;
use crate::systems::growth::collect_plants;
use crate::systems::pollution::{remove_source, remove_tile};
use bevy_ecs::prelude::*;

pub fn extraction_phase(world: &mut World) {
    let cfg = world.resource::<SimConfig>().clone();

    for entity in collect_plants(world, Some(PlantPhase::Grown)) {
        if world.get::<PlantNodeId>(entity).is_none() {
            continue;
        }
        let Some(&stats) = world.get::<PlantStats>(entity) else {
            continue;
        };
        let Some(&pos) = world.get::<GridPos>(entity) else {
            continue;
        };

        // Grown upkeep drains the pool but never blocks the node.
        world.resource_mut::<EnergyPool>().drain(stats.maintenance_cost);

        let neighbors = world.resource::<GridIndex>().neighbors(pos, false);
        for neighbor in neighbors {
            match world.resource::<GridIndex>().occupant(neighbor) {
                Some(Occupant::Tile(tile)) => {
                    extract_from_tile(world, entity, tile, &stats, &cfg);
                }
                Some(Occupant::Source(source)) => {
                    extract_from_source(world, source, &stats, &cfg);
                }
                _ => {}
            }
        }
    }
}

fn extract_from_tile(
    world: &mut World,
    plant: Entity,
    tile: Entity,
    stats: &PlantStats,
    cfg: &SimConfig,
) {
    let Some(&tile_stats) = world.get::<TileStats>(tile) else {
        return;
    };
    if stats.attack_damage <= tile_stats.attack_damage {
        return;
    }
    let Some(&load) = world.get::<PollutionLoad>(tile) else {
        return;
    };
    let Some(&tile_pos) = world.get::<GridPos>(tile) else {
        return;
    };

    let margin = stats.attack_damage - tile_stats.attack_damage;
    let multiplier = extraction_multiplier(load.dominant(), &cfg.pollution);
    let gain = load.total().min(stats.attack_damage)
        * stats.extraction_rate
        * multiplier
        * cfg.plant.extraction_gain_scale;
    world.resource_mut::<EnergyPool>().deposit(gain);

    let damage = margin * cfg.plant.extraction_damage_scale;
    let remaining = {
        let Some(mut load) = world.get_mut::<PollutionLoad>(tile) else {
            return;
        };
        load.take_damage(damage);
        *load
    };
    if let Some(mut derived) = world.get_mut::<TileStats>(tile) {
        *derived = TileStats::derive(&remaining, &cfg.pollution);
    }
    world.resource_mut::<ChangeBuffer>().push_pollution(tile_pos);

    if remaining.total() < cfg.pollution.residue_threshold {
        remove_tile(world, tile);
        return;
    }

    // Hold the worked tile frozen; a node grips at most one tile at a time.
    let previous = world
        .get::<FreezeGrip>(plant)
        .and_then(|grip| grip.0)
        .filter(|&held| held != tile);
    if let Some(previous) = previous {
        if let Some(mut freeze) = world.get_mut::<Freeze>(previous) {
            freeze.release();
        }
    }
    if let Some(mut freeze) = world.get_mut::<Freeze>(tile) {
        freeze.remaining_ticks = cfg.plant.freeze_ticks;
        freeze.held_by = Some(plant);
    }
    if let Some(mut grip) = world.get_mut::<FreezeGrip>(plant) {
        grip.0 = Some(tile);
    }
}

fn extract_from_source(world: &mut World, source: Entity, stats: &PlantStats, cfg: &SimConfig) {
    let Some(&emitter) = world.get::<Emitter>(source) else {
        return;
    };
    if stats.attack_damage <= emitter.attack_damage {
        return;
    }
    let Some(&health) = world.get::<SourceHealth>(source) else {
        return;
    };
    let Some(&source_pos) = world.get::<GridPos>(source) else {
        return;
    };

    let margin = stats.attack_damage - emitter.attack_damage;
    let multiplier = extraction_multiplier(emitter.kind, &cfg.pollution);
    let gain = health.current.min(stats.attack_damage)
        * stats.extraction_rate
        * multiplier
        * cfg.plant.extraction_gain_scale;
    world.resource_mut::<EnergyPool>().deposit(gain);

    let destroyed = {
        let Some(mut health) = world.get_mut::<SourceHealth>(source) else {
            return;
        };
        health.damage(margin * cfg.plant.extraction_damage_scale);
        health.is_destroyed()
    };
    world.resource_mut::<ChangeBuffer>().push_pollution(source_pos);

    if destroyed {
        tracing::debug!(?source_pos, "pollution source destroyed");
        remove_source(world, source);
    }
}
