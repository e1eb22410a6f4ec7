//! Plant growth phase and shared plant lifecycle helpers.
//!
//! Phase 1 of every tick: buds pay their maintenance cost to accumulate
//! growth, transition to Grown when done, and the freshly grown node
//! immediately tries to sprout into its orthogonal neighbors. The sprout and
//! kill helpers here are also used by the player-facing actions in `api`.

use crate::components::*;
use crate::config::SimConfig;
use crate::economy::EnergyPool;
use crate::error::ActionError;
use crate::grid::{GridIndex, GridPos, Occupant};
use crate::systems::events::ChangeBuffer;
use crate::systems::pollution::remove_tile;
use bevy_ecs::prelude::*;

/// Collect living plant entities in stable-id order, optionally filtered by
/// phase. Processing in this order keeps ticks reproducible.
pub(crate) fn collect_plants(world: &mut World, phase: Option<PlantPhase>) -> Vec<Entity> {
    let mut query = world.query::<(Entity, &PlantNodeId, &PlantPhase)>();
    let mut plants: Vec<(PlantNodeId, Entity)> = query
        .iter(world)
        .filter(|(_, _, p)| phase.map_or(true, |want| **p == want))
        .map(|(entity, id, _)| (*id, entity))
        .collect();
    plants.sort_by_key(|(id, _)| *id);
    plants.into_iter().map(|(_, entity)| entity).collect()
}

/// Advance all buds one growth tick and process Bud -> Grown transitions.
pub fn growth_phase(world: &mut World) {
    let cfg = world.resource::<SimConfig>().clone();

    for entity in collect_plants(world, Some(PlantPhase::Bud)) {
        // A cascade kill earlier in this pass may have removed the node.
        if world.get::<PlantNodeId>(entity).is_none() {
            continue;
        }
        let Some(&stats) = world.get::<PlantStats>(entity) else {
            continue;
        };
        let is_heart = world.get::<Heart>(entity).is_some();
        let required = if is_heart {
            cfg.plant.heart_growth_ticks
        } else {
            cfg.plant.full_growth_ticks
        };

        // An unaffordable growth tick defers progress to the next tick.
        if world
            .resource_mut::<EnergyPool>()
            .spend(stats.maintenance_cost)
            .is_err()
        {
            continue;
        }

        let done = {
            let Some(mut progress) = world.get_mut::<GrowthProgress>(entity) else {
                continue;
            };
            progress.ticks += 1;
            progress.ticks >= required
        };
        if done {
            become_grown(world, entity, &cfg);
        }
    }
}

/// Transition a bud to Grown: recompute stats, bring its storage online, and
/// auto-sprout into every valid orthogonal neighbor it can afford.
fn become_grown(world: &mut World, entity: Entity, cfg: &SimConfig) {
    let Some(&comp) = world.get::<PlantComposition>(entity) else {
        return;
    };
    let is_heart = world.get::<Heart>(entity).is_some();
    let stats = PlantStats::derive(&comp, is_heart, &cfg.plant);

    if let Some(mut phase) = world.get_mut::<PlantPhase>(entity) {
        *phase = PlantPhase::Grown;
    }
    if let Some(mut current) = world.get_mut::<PlantStats>(entity) {
        *current = stats;
    }
    if !is_heart || cfg.plant.heart_storage_counts {
        world
            .resource_mut::<EnergyPool>()
            .adjust_max(stats.energy_storage);
    }

    let Some(&pos) = world.get::<GridPos>(entity) else {
        return;
    };
    world.resource_mut::<ChangeBuffer>().push_plant(pos);
    tracing::debug!(?pos, storage = stats.energy_storage, "plant node grown");

    // A failed neighbor (occupied, unaffordable) aborts only that neighbor.
    let neighbors = world.resource::<GridIndex>().neighbors(pos, false);
    for target in neighbors {
        let _ = try_sprout(world, entity, target, cfg);
    }
}

/// Sprout a new bud from a grown parent into a target cell.
///
/// Validity and cost are checked before any mutation; on failure nothing has
/// changed. The child inherits the parent's current per-family totals
/// (natural plus grafted) as its own natural components.
pub(crate) fn try_sprout(
    world: &mut World,
    parent: Entity,
    target: GridPos,
    cfg: &SimConfig,
) -> Result<Entity, ActionError> {
    let Some(&parent_phase) = world.get::<PlantPhase>(parent) else {
        return Err(ActionError::InvalidTarget("sprouting parent is gone"));
    };
    if parent_phase != PlantPhase::Grown {
        return Err(ActionError::InvalidTarget("only grown nodes can sprout"));
    }
    let Some(&parent_stats) = world.get::<PlantStats>(parent) else {
        return Err(ActionError::InvalidTarget("sprouting parent is gone"));
    };
    let Some(&parent_comp) = world.get::<PlantComposition>(parent) else {
        return Err(ActionError::InvalidTarget("sprouting parent is gone"));
    };

    // Target validity: empty, or (policy permitting) a strictly weaker tile.
    let grid = world.resource::<GridIndex>();
    if !grid.in_bounds(target) {
        return Err(ActionError::OutOfBounds(target));
    }
    let tile_to_clear = match grid.occupant(target) {
        None => None,
        Some(Occupant::Tile(tile)) => {
            if !cfg.plant.sprout_clears_pollution {
                return Err(ActionError::OccupiedCell(target));
            }
            let tile_attack = world
                .get::<TileStats>(tile)
                .map(|s| s.attack_damage)
                .unwrap_or(f32::INFINITY);
            if tile_attack < parent_stats.attack_damage {
                Some(tile)
            } else {
                return Err(ActionError::InvalidTarget(
                    "pollution too strong to sprout onto",
                ));
            }
        }
        Some(_) => return Err(ActionError::OccupiedCell(target)),
    };

    world
        .resource_mut::<EnergyPool>()
        .spend(parent_stats.sprout_cost)?;

    if let Some(tile) = tile_to_clear {
        remove_tile(world, tile);
    }

    let inherited = ComponentSet::new(
        parent_comp.natural.leaf + parent_comp.grafted.leaf,
        parent_comp.natural.root + parent_comp.grafted.root,
        parent_comp.natural.fruit + parent_comp.grafted.fruit,
    );
    let composition = PlantComposition::from_natural(inherited);
    let stats = PlantStats::derive(&composition, false, &cfg.plant);
    let id = world.resource_mut::<IdCounter>().next_plant();

    let child = world
        .spawn(PlantBundle {
            id,
            pos: target,
            phase: PlantPhase::Bud,
            composition,
            stats,
            growth: GrowthProgress::default(),
            lineage: Lineage {
                parent: Some(parent),
                children: Vec::new(),
            },
            grip: FreezeGrip::default(),
        })
        .id();

    if let Err(err) = world
        .resource_mut::<GridIndex>()
        .register(target, Occupant::Plant(child))
    {
        // Cell was validated free above; roll back to keep the action atomic.
        world.despawn(child);
        world
            .resource_mut::<EnergyPool>()
            .deposit(parent_stats.sprout_cost);
        return Err(err);
    }

    if let Some(mut lineage) = world.get_mut::<Lineage>(parent) {
        lineage.children.push(child);
    }
    world.resource_mut::<ChangeBuffer>().push_plant(target);
    tracing::debug!(?target, parent_id = ?world.get::<PlantNodeId>(parent), "sprouted");
    Ok(child)
}

/// Destroy a plant node and its entire subtree, children first.
///
/// Releases any held freeze, takes grown storage back off the energy cap,
/// detaches the subtree root from its parent, and unregisters every cell.
/// No refunds here; the nip refund is the caller's business.
pub(crate) fn kill_subtree(world: &mut World, root: Entity) {
    // Detach the root from its parent's children list first.
    let parent = world
        .get::<Lineage>(root)
        .and_then(|lineage| lineage.parent);
    if let Some(parent) = parent {
        if let Some(mut lineage) = world.get_mut::<Lineage>(parent) {
            lineage.children.retain(|&child| child != root);
        }
    }
    destroy_recursive(world, root);
}

fn destroy_recursive(world: &mut World, entity: Entity) {
    let children = world
        .get::<Lineage>(entity)
        .map(|lineage| lineage.children.clone())
        .unwrap_or_default();
    for child in children {
        destroy_recursive(world, child);
    }

    // Release the freeze this node held, if the tile still exists.
    if let Some(&FreezeGrip(Some(tile))) = world.get::<FreezeGrip>(entity) {
        if let Some(mut freeze) = world.get_mut::<Freeze>(tile) {
            freeze.release();
        }
    }

    let is_heart = world.get::<Heart>(entity).is_some();
    let grown = world.get::<PlantPhase>(entity) == Some(&PlantPhase::Grown);
    if grown {
        let storage = world
            .get::<PlantStats>(entity)
            .map(|s| s.energy_storage)
            .unwrap_or(0.0);
        let counts = {
            let cfg = world.resource::<SimConfig>();
            !is_heart || cfg.plant.heart_storage_counts
        };
        if counts {
            world.resource_mut::<EnergyPool>().adjust_max(-storage);
        }
    }

    if let Some(&pos) = world.get::<GridPos>(entity) {
        world.resource_mut::<GridIndex>().unregister(pos);
        world.resource_mut::<ChangeBuffer>().push_plant(pos);
        tracing::debug!(?pos, "plant node destroyed");
    }
    world.despawn(entity);
}

/// Recompute a node's derived stats after a composition mutation, keeping the
/// energy cap in sync when a grown node's storage changes.
pub(crate) fn refresh_stats(world: &mut World, entity: Entity, cfg: &SimConfig) {
    let Some(&comp) = world.get::<PlantComposition>(entity) else {
        return;
    };
    let is_heart = world.get::<Heart>(entity).is_some();
    let new_stats = PlantStats::derive(&comp, is_heart, &cfg.plant);

    let grown = world.get::<PlantPhase>(entity) == Some(&PlantPhase::Grown);
    let old_storage = world
        .get::<PlantStats>(entity)
        .map(|s| s.energy_storage)
        .unwrap_or(0.0);

    if let Some(mut stats) = world.get_mut::<PlantStats>(entity) {
        *stats = new_stats;
    }
    if grown && (!is_heart || cfg.plant.heart_storage_counts) {
        world
            .resource_mut::<EnergyPool>()
            .adjust_max(new_stats.energy_storage - old_storage);
    }
    if let Some(&pos) = world.get::<GridPos>(entity) {
        world.resource_mut::<ChangeBuffer>().push_plant(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::GraftBuffer;
    use crate::systems::pollution::spawn_tile;

    fn test_world(config: SimConfig) -> World {
        let mut world = World::new();
        world.insert_resource(GridIndex::new(config.grid_width, config.grid_height));
        world.insert_resource(EnergyPool::new(
            config.base_max_energy,
            config.starting_energy,
        ));
        world.insert_resource(GraftBuffer::default());
        world.insert_resource(ChangeBuffer::default());
        world.insert_resource(IdCounter::default());
        world.insert_resource(config);
        world
    }

    fn spawn_node(
        world: &mut World,
        pos: GridPos,
        composition: PlantComposition,
        phase: PlantPhase,
        heart: bool,
    ) -> Entity {
        let cfg = world.resource::<SimConfig>().clone();
        let stats = PlantStats::derive(&composition, heart, &cfg.plant);
        let id = world.resource_mut::<IdCounter>().next_plant();
        let entity = world
            .spawn(PlantBundle {
                id,
                pos,
                phase,
                composition,
                stats,
                growth: GrowthProgress::default(),
                lineage: Lineage::default(),
                grip: FreezeGrip::default(),
            })
            .id();
        if heart {
            world.entity_mut(entity).insert(Heart);
        }
        world
            .resource_mut::<GridIndex>()
            .register(pos, Occupant::Plant(entity))
            .unwrap();
        entity
    }

    #[test]
    fn test_bud_defers_growth_when_pool_is_empty() {
        let config = SimConfig {
            starting_energy: 0.0,
            ..SimConfig::default()
        };
        let mut world = test_world(config);
        let bud = spawn_node(
            &mut world,
            GridPos::new(4, 4),
            PlantComposition::from_natural(ComponentSet::new(3, 3, 3)),
            PlantPhase::Bud,
            false,
        );

        growth_phase(&mut world);

        assert_eq!(world.get::<GrowthProgress>(bud).unwrap().ticks, 0);
        assert_eq!(world.get::<PlantPhase>(bud), Some(&PlantPhase::Bud));
    }

    #[test]
    fn test_heart_grows_for_free() {
        let config = SimConfig {
            starting_energy: 0.0,
            ..SimConfig::default()
        };
        let base_max = config.base_max_energy;
        let mut world = test_world(config);
        let heart = spawn_node(
            &mut world,
            GridPos::new(4, 4),
            PlantComposition::from_natural(ComponentSet::new(3, 3, 3)),
            PlantPhase::Bud,
            true,
        );

        growth_phase(&mut world);

        assert_eq!(world.get::<PlantPhase>(heart), Some(&PlantPhase::Grown));
        let storage = world.get::<PlantStats>(heart).unwrap().energy_storage;
        assert!(storage > 0.0);
        assert!((world.resource::<EnergyPool>().max() - (base_max + storage)).abs() < 1e-3);
        // No energy, so the auto-sprouts all failed quietly.
        assert_eq!(world.resource::<GridIndex>().occupied_count(), 1);
    }

    #[test]
    fn test_bud_matures_and_auto_sprouts() {
        let config = SimConfig {
            base_max_energy: 500.0,
            starting_energy: 500.0,
            plant: crate::config::PlantConfig {
                full_growth_ticks: 2,
                ..crate::config::PlantConfig::default()
            },
            ..SimConfig::default()
        };
        let mut world = test_world(config);
        let node = spawn_node(
            &mut world,
            GridPos::new(4, 4),
            PlantComposition::from_natural(ComponentSet::new(3, 3, 3)),
            PlantPhase::Bud,
            false,
        );

        growth_phase(&mut world);
        assert_eq!(world.get::<PlantPhase>(node), Some(&PlantPhase::Bud));
        growth_phase(&mut world);

        assert_eq!(world.get::<PlantPhase>(node), Some(&PlantPhase::Grown));
        let children = world.get::<Lineage>(node).unwrap().children.clone();
        assert_eq!(children.len(), 4);
        for child in children {
            assert_eq!(world.get::<PlantPhase>(child), Some(&PlantPhase::Bud));
            assert_eq!(world.get::<Lineage>(child).unwrap().parent, Some(node));
        }
    }

    #[test]
    fn test_sprout_inherits_combined_family_totals() {
        let mut world = test_world(SimConfig {
            base_max_energy: 500.0,
            starting_energy: 500.0,
            ..SimConfig::default()
        });
        let parent = spawn_node(
            &mut world,
            GridPos::new(4, 4),
            PlantComposition {
                natural: ComponentSet::new(2, 1, 0),
                grafted: ComponentSet::new(1, 0, 1),
            },
            PlantPhase::Grown,
            false,
        );
        let cfg = world.resource::<SimConfig>().clone();

        let child = try_sprout(&mut world, parent, GridPos::new(4, 5), &cfg).unwrap();

        let comp = world.get::<PlantComposition>(child).unwrap();
        assert_eq!(comp.natural, ComponentSet::new(3, 1, 1));
        assert_eq!(comp.grafted, ComponentSet::default());
        assert!(world.get::<Lineage>(parent).unwrap().children.contains(&child));
    }

    #[test]
    fn test_sprout_refuses_pollution_unless_policy_allows() {
        let mut world = test_world(SimConfig {
            base_max_energy: 500.0,
            starting_energy: 500.0,
            ..SimConfig::default()
        });
        let parent = spawn_node(
            &mut world,
            GridPos::new(4, 4),
            PlantComposition::from_natural(ComponentSet::new(3, 3, 3)),
            PlantPhase::Grown,
            false,
        );
        let cfg = world.resource::<SimConfig>().clone();
        let target = GridPos::new(4, 5);
        spawn_tile(
            &mut world,
            target,
            PollutionLoad::single(PollutionKind::Toxic, 0.5),
            2,
            &cfg,
        );

        let err = try_sprout(&mut world, parent, target, &cfg).unwrap_err();
        assert_eq!(err, ActionError::OccupiedCell(target));

        let mut cleared = cfg.clone();
        cleared.plant.sprout_clears_pollution = true;
        let child = try_sprout(&mut world, parent, target, &cleared).unwrap();
        assert_eq!(world.resource::<GridIndex>().plant_at(target), Some(child));
    }

    #[test]
    fn test_kill_subtree_cascades_and_returns_storage() {
        let mut world = test_world(SimConfig {
            base_max_energy: 500.0,
            starting_energy: 500.0,
            ..SimConfig::default()
        });
        let cfg = world.resource::<SimConfig>().clone();
        let parent = spawn_node(
            &mut world,
            GridPos::new(4, 4),
            PlantComposition::from_natural(ComponentSet::new(2, 2, 2)),
            PlantPhase::Grown,
            false,
        );
        let storage = world.get::<PlantStats>(parent).unwrap().energy_storage;
        world.resource_mut::<EnergyPool>().adjust_max(storage);
        let max_with_parent = world.resource::<EnergyPool>().max();

        let child = try_sprout(&mut world, parent, GridPos::new(4, 5), &cfg).unwrap();
        if let Some(mut phase) = world.get_mut::<PlantPhase>(child) {
            *phase = PlantPhase::Grown;
        }
        let child_storage = world.get::<PlantStats>(child).unwrap().energy_storage;
        world.resource_mut::<EnergyPool>().adjust_max(child_storage);
        let grandchild = try_sprout(&mut world, child, GridPos::new(4, 6), &cfg).unwrap();

        kill_subtree(&mut world, parent);

        for entity in [parent, child, grandchild] {
            assert!(world.get::<PlantNodeId>(entity).is_none());
        }
        assert_eq!(world.resource::<GridIndex>().occupied_count(), 0);
        assert!((world.resource::<EnergyPool>().max() - (max_with_parent - storage)).abs() < 1e-3);
    }
}
