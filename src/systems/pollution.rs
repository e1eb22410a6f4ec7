//! Pollution phases: source timers and emission, tile spread, and decay.
//!
//! Phase 4 advances every source's dormancy/awakening timers and fires due
//! emission pulses, then lets saturated tiles creep into empty cells. Phase 5
//! counts down tile freezes and evaporates far-flung residue. All timers are
//! plain elapsed-seconds fields advanced by the tick interval; nothing here
//! suspends.

use crate::components::*;
use crate::config::SimConfig;
use crate::grid::{GridIndex, GridPos, Occupant};
use crate::systems::events::ChangeBuffer;
use bevy_ecs::prelude::*;

/// Phase 4: source state machines, emission pulses, and tile spread.
pub fn pollution_phase(world: &mut World) {
    let cfg = world.resource::<SimConfig>().clone();
    advance_sources(world, &cfg);
    spread_tiles(world, &cfg);
}

/// Phase 5: freeze countdowns and hop-distance decay.
pub fn decay_phase(world: &mut World) {
    let cfg = world.resource::<SimConfig>().clone();
    thaw_tiles(world);
    decay_distant_tiles(world, &cfg);
}

fn collect_sources(world: &mut World) -> Vec<Entity> {
    let mut query = world.query::<(Entity, &SourceId)>();
    let mut sources: Vec<(SourceId, Entity)> = query
        .iter(world)
        .map(|(entity, id)| (*id, entity))
        .collect();
    sources.sort_by_key(|(id, _)| *id);
    sources.into_iter().map(|(_, entity)| entity).collect()
}

/// Tiles in row-major position order; positions are unique so the order is
/// total and stable.
fn collect_tiles(world: &mut World) -> Vec<Entity> {
    let mut query = world.query::<(Entity, &GridPos, &TileSpread)>();
    let mut tiles: Vec<(GridPos, Entity)> = query
        .iter(world)
        .map(|(entity, pos, _)| (*pos, entity))
        .collect();
    tiles.sort_by_key(|(pos, _)| (pos.y, pos.x));
    tiles.into_iter().map(|(_, entity)| entity).collect()
}

fn advance_sources(world: &mut World, cfg: &SimConfig) {
    let dt = cfg.tick_interval;

    for source in collect_sources(world) {
        if world.get::<SourceId>(source).is_none() {
            continue;
        }
        let Some(&state) = world.get::<SourceState>(source) else {
            continue;
        };
        let Some(&pos) = world.get::<GridPos>(source) else {
            continue;
        };
        let Some(&tier) = world.get::<SourceTier>(source) else {
            continue;
        };

        // Dormant -> Active once the dormancy timer runs out; the same tick
        // already counts toward the first pulse.
        let mut state = state;
        if state == SourceState::Dormant {
            let expired = {
                let Some(mut emitter) = world.get_mut::<Emitter>(source) else {
                    continue;
                };
                emitter.dormant_remaining -= dt;
                emitter.dormant_remaining <= 0.0
            };
            if expired {
                state = SourceState::Active;
                if let Some(mut current) = world.get_mut::<SourceState>(source) {
                    *current = SourceState::Active;
                }
                tracing::debug!(?pos, tier = tier.name(), "pollution source active");
            } else {
                continue;
            }
        }

        // Active -> Awakened after the tier's threshold of active time.
        // One-way: an awakened source never de-escalates.
        if state == SourceState::Active {
            let threshold = cfg.source_tiers.for_tier(tier).awaken_after;
            let awakened = {
                let Some(mut emitter) = world.get_mut::<Emitter>(source) else {
                    continue;
                };
                emitter.active_elapsed += dt;
                matches!(threshold, Some(limit) if emitter.active_elapsed >= limit)
            };
            if awakened {
                if let Some(mut current) = world.get_mut::<SourceState>(source) {
                    *current = SourceState::Awakened;
                }
                if let Some(mut emitter) = world.get_mut::<Emitter>(source) {
                    emitter.current_rate *= 2.0;
                }
                if let Some(mut health) = world.get_mut::<SourceHealth>(source) {
                    health.scale_max(1.5);
                }
                world.resource_mut::<ChangeBuffer>().push_pollution(pos);
                tracing::debug!(?pos, tier = tier.name(), "pollution source awakened");
            }
        } else {
            if let Some(mut emitter) = world.get_mut::<Emitter>(source) {
                emitter.active_elapsed += dt;
            }
        }

        // Fire every pulse that has come due on this source's own interval.
        if let Some(mut emitter) = world.get_mut::<Emitter>(source) {
            emitter.since_pulse += dt;
        }
        loop {
            let pulse = {
                let Some(mut emitter) = world.get_mut::<Emitter>(source) else {
                    break;
                };
                if emitter.interval <= 0.0 || emitter.since_pulse < emitter.interval {
                    None
                } else {
                    emitter.since_pulse -= emitter.interval;
                    Some((emitter.kind, emitter.current_rate))
                }
            };
            match pulse {
                Some((kind, rate)) => emit_pulse(world, pos, kind, rate, cfg),
                None => break,
            }
        }
    }
}

/// Push one pulse of pollution into every orthogonal neighbor that is empty
/// or already a tile. Emission never lands directly on a plant or another
/// source. Fresh and refreshed tiles are stamped one hop from the source.
fn emit_pulse(world: &mut World, pos: GridPos, kind: PollutionKind, rate: f32, cfg: &SimConfig) {
    let neighbors = world.resource::<GridIndex>().neighbors(pos, false);
    for target in neighbors {
        match world.resource::<GridIndex>().occupant(target) {
            None => {
                spawn_tile(world, target, PollutionLoad::single(kind, rate), 1, cfg);
            }
            Some(Occupant::Tile(tile)) => {
                let updated = {
                    let Some(mut load) = world.get_mut::<PollutionLoad>(tile) else {
                        continue;
                    };
                    load.accumulate(kind, rate);
                    *load
                };
                if let Some(mut stats) = world.get_mut::<TileStats>(tile) {
                    *stats = TileStats::derive(&updated, &cfg.pollution);
                }
                if let Some(mut spread) = world.get_mut::<TileSpread>(tile) {
                    spread.hops = spread.hops.min(1);
                }
                world.resource_mut::<ChangeBuffer>().push_pollution(target);
            }
            Some(_) => {}
        }
    }
}

/// Saturated tiles push a slice of their load into empty neighbors, one hop
/// further out than themselves.
fn spread_tiles(world: &mut World, cfg: &SimConfig) {
    for tile in collect_tiles(world) {
        if world.get::<TileSpread>(tile).is_none() {
            continue;
        }
        if world.get::<Freeze>(tile).is_some_and(|f| f.is_frozen()) {
            continue;
        }
        let Some(&load) = world.get::<PollutionLoad>(tile) else {
            continue;
        };
        let Some(&stats) = world.get::<TileStats>(tile) else {
            continue;
        };
        let Some(&spread) = world.get::<TileSpread>(tile) else {
            continue;
        };
        let Some(&pos) = world.get::<GridPos>(tile) else {
            continue;
        };

        if load.total() < cfg.pollution.spread_threshold
            || spread.hops >= cfg.pollution.max_spread_hops
        {
            continue;
        }

        let fire = {
            let Some(mut spread) = world.get_mut::<TileSpread>(tile) else {
                continue;
            };
            spread.progress += stats.spread_speed;
            if spread.progress >= 1.0 {
                spread.progress -= 1.0;
                true
            } else {
                false
            }
        };
        if !fire {
            continue;
        }

        let targets: Vec<GridPos> = {
            let grid = world.resource::<GridIndex>();
            grid.neighbors(pos, false)
                .into_iter()
                .filter(|&p| grid.is_empty(p))
                .collect()
        };
        if targets.is_empty() {
            continue;
        }

        let moved = {
            let Some(mut load) = world.get_mut::<PollutionLoad>(tile) else {
                continue;
            };
            load.split_off(cfg.pollution.spread_fraction)
        };
        let share = PollutionLoad {
            toxic: moved.toxic / targets.len() as f32,
            acidic: moved.acidic / targets.len() as f32,
            sludge: moved.sludge / targets.len() as f32,
        };
        let child_hops = spread.hops.saturating_add(1);
        for target in targets {
            spawn_tile(world, target, share, child_hops, cfg);
        }

        let remaining = world.get::<PollutionLoad>(tile).copied().unwrap_or_default();
        if let Some(mut stats) = world.get_mut::<TileStats>(tile) {
            *stats = TileStats::derive(&remaining, &cfg.pollution);
        }
        world.resource_mut::<ChangeBuffer>().push_pollution(pos);
    }
}

fn thaw_tiles(world: &mut World) {
    let mut released: Vec<(Entity, Option<Entity>)> = Vec::new();
    let mut query = world.query::<(Entity, &mut Freeze)>();
    for (tile, mut freeze) in query.iter_mut(world) {
        if freeze.remaining_ticks == 0 {
            continue;
        }
        freeze.remaining_ticks -= 1;
        if freeze.remaining_ticks == 0 {
            released.push((tile, freeze.held_by.take()));
        }
    }
    for (tile, holder) in released {
        if let Some(holder) = holder {
            if let Some(mut grip) = world.get_mut::<FreezeGrip>(holder) {
                if grip.0 == Some(tile) {
                    grip.0 = None;
                }
            }
        }
    }
}

/// Tiles far from any source slowly evaporate; residue drops off the grid.
fn decay_distant_tiles(world: &mut World, cfg: &SimConfig) {
    for tile in collect_tiles(world) {
        let Some(&spread) = world.get::<TileSpread>(tile) else {
            continue;
        };
        if spread.hops < cfg.pollution.decay_hops {
            continue;
        }
        let remaining = {
            let Some(mut load) = world.get_mut::<PollutionLoad>(tile) else {
                continue;
            };
            let loss = load.total() * cfg.pollution.hop_decay_fraction;
            load.take_damage(loss);
            *load
        };
        if remaining.total() < cfg.pollution.residue_threshold {
            remove_tile(world, tile);
        } else if let Some(mut stats) = world.get_mut::<TileStats>(tile) {
            *stats = TileStats::derive(&remaining, &cfg.pollution);
        }
    }
}

/// Create and register a pollution tile. The target cell must be empty;
/// anything else is a caller bug and the spawn is dropped.
pub(crate) fn spawn_tile(
    world: &mut World,
    pos: GridPos,
    load: PollutionLoad,
    hops: u32,
    cfg: &SimConfig,
) {
    let stats = TileStats::derive(&load, &cfg.pollution);
    let tile = world
        .spawn(TileBundle {
            pos,
            load,
            stats,
            spread: TileSpread {
                hops,
                progress: 0.0,
            },
            freeze: Freeze::default(),
        })
        .id();
    if world
        .resource_mut::<GridIndex>()
        .register(pos, Occupant::Tile(tile))
        .is_err()
    {
        world.despawn(tile);
        return;
    }
    world.resource_mut::<ChangeBuffer>().push_pollution(pos);
}

/// Remove a tile from the grid, releasing whoever held it frozen.
pub(crate) fn remove_tile(world: &mut World, tile: Entity) {
    let holder = world.get::<Freeze>(tile).and_then(|freeze| freeze.held_by);
    if let Some(holder) = holder {
        if let Some(mut grip) = world.get_mut::<FreezeGrip>(holder) {
            if grip.0 == Some(tile) {
                grip.0 = None;
            }
        }
    }
    if let Some(&pos) = world.get::<GridPos>(tile) {
        world.resource_mut::<GridIndex>().unregister(pos);
        world.resource_mut::<ChangeBuffer>().push_pollution(pos);
    }
    world.despawn(tile);
}

/// Remove a destroyed source from the grid and all tracking.
pub(crate) fn remove_source(world: &mut World, source: Entity) {
    if let Some(&pos) = world.get::<GridPos>(source) {
        world.resource_mut::<GridIndex>().unregister(pos);
        world.resource_mut::<ChangeBuffer>().push_pollution(pos);
    }
    world.despawn(source);
}
