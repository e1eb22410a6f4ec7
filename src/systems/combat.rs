//! Overwhelm checks: pollution pushing back against the plant.
//!
//! Every non-heart node is tested against its orthogonal pollution-tile
//! neighbors each tick. A bud defends with its parent's live attack stat (it
//! has no combat stat of its own until grown); a grown node defends with its
//! own. Acid-dominant pollution cuts the defense. Losing the check destroys
//! the node and its whole subtree with no refund.

use crate::components::*;
use crate::config::SimConfig;
use crate::grid::{GridIndex, GridPos};
use crate::systems::growth::{collect_plants, kill_subtree};
use bevy_ecs::prelude::*;

/// Phase 2: overwhelm checks on buds, using the parent's current stats.
pub fn bud_overwhelm_phase(world: &mut World) {
    run_overwhelm(world, PlantPhase::Bud);
}

/// Second half of phase 3: overwhelm checks on grown nodes, after extraction.
pub fn grown_overwhelm_phase(world: &mut World) {
    run_overwhelm(world, PlantPhase::Grown);
}

fn run_overwhelm(world: &mut World, phase: PlantPhase) {
    let cfg = world.resource::<SimConfig>().clone();

    for entity in collect_plants(world, Some(phase)) {
        // Earlier kills this pass may have cascaded through this node.
        if world.get::<PlantNodeId>(entity).is_none() {
            continue;
        }
        if world.get::<Heart>(entity).is_some() {
            continue;
        }
        let Some(&pos) = world.get::<GridPos>(entity) else {
            continue;
        };

        let base_attack = effective_attack(world, entity, phase);
        let neighbors = world.resource::<GridIndex>().neighbors(pos, false);

        for neighbor in neighbors {
            let Some(tile) = world.resource::<GridIndex>().tile_at(neighbor) else {
                continue;
            };
            // Frozen tiles are held inert and cannot overwhelm.
            if world.get::<Freeze>(tile).is_some_and(|f| f.is_frozen()) {
                continue;
            }
            let Some(&tile_stats) = world.get::<TileStats>(tile) else {
                continue;
            };
            let dominant = world
                .get::<PollutionLoad>(tile)
                .map(|load| load.dominant())
                .unwrap_or(PollutionKind::Toxic);

            let mut defense = base_attack;
            if dominant == PollutionKind::Acidic {
                defense *= cfg.plant.acidic_attack_penalty;
            }

            if defense <= tile_stats.attack_damage {
                tracing::debug!(
                    ?pos,
                    defense,
                    pollution_attack = tile_stats.attack_damage,
                    "plant node overwhelmed"
                );
                kill_subtree(world, entity);
                break;
            }
        }
    }
}

/// A grown node fights with its own attack; a bud borrows its parent's
/// current attack, so the defense changes as the parent does.
fn effective_attack(world: &World, entity: Entity, phase: PlantPhase) -> f32 {
    match phase {
        PlantPhase::Grown => world
            .get::<PlantStats>(entity)
            .map(|s| s.attack_damage)
            .unwrap_or(0.0),
        PlantPhase::Bud => world
            .get::<Lineage>(entity)
            .and_then(|lineage| lineage.parent)
            .and_then(|parent| world.get::<PlantStats>(parent))
            .map(|s| s.attack_damage)
            .unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::{EnergyPool, GraftBuffer};
    use crate::grid::Occupant;
    use crate::systems::events::ChangeBuffer;
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

    fn spawn_fighter(
        world: &mut World,
        pos: GridPos,
        phase: PlantPhase,
        attack: f32,
        parent: Option<Entity>,
    ) -> Entity {
        let id = world.resource_mut::<IdCounter>().next_plant();
        let entity = world
            .spawn(PlantBundle {
                id,
                pos,
                phase,
                composition: PlantComposition::default(),
                stats: PlantStats {
                    attack_damage: attack,
                    ..PlantStats::default()
                },
                growth: GrowthProgress::default(),
                lineage: Lineage {
                    parent,
                    children: Vec::new(),
                },
                grip: FreezeGrip::default(),
            })
            .id();
        if let Some(parent) = parent {
            if let Some(mut lineage) = world.get_mut::<Lineage>(parent) {
                lineage.children.push(entity);
            }
        }
        world
            .resource_mut::<GridIndex>()
            .register(pos, Occupant::Plant(entity))
            .unwrap();
        entity
    }

    fn spawn_load(world: &mut World, pos: GridPos, load: PollutionLoad) -> Entity {
        let cfg = world.resource::<SimConfig>().clone();
        spawn_tile(world, pos, load, 1, &cfg);
        world.resource::<GridIndex>().tile_at(pos).unwrap()
    }

    #[test]
    fn test_weak_grown_node_is_overwhelmed() {
        let mut world = test_world(SimConfig::default());
        let pos = GridPos::new(4, 4);
        let node = spawn_fighter(&mut world, pos, PlantPhase::Grown, 5.0, None);
        spawn_load(&mut world, GridPos::new(4, 5), PollutionLoad::single(PollutionKind::Toxic, 8.0));

        grown_overwhelm_phase(&mut world);

        assert!(world.get::<PlantNodeId>(node).is_none());
        assert!(world.resource::<GridIndex>().plant_at(pos).is_none());
    }

    #[test]
    fn test_stronger_grown_node_survives() {
        let mut world = test_world(SimConfig::default());
        let node = spawn_fighter(&mut world, GridPos::new(4, 4), PlantPhase::Grown, 10.0, None);
        spawn_load(&mut world, GridPos::new(4, 5), PollutionLoad::single(PollutionKind::Toxic, 8.0));

        grown_overwhelm_phase(&mut world);

        assert!(world.get::<PlantNodeId>(node).is_some());
    }

    #[test]
    fn test_acid_dominance_cuts_defense() {
        // Same tile attack value either way: 6 acidic at weight 1.5 equals
        // 9 toxic at weight 1.0. Only the acid-dominant tile wins, because
        // the defender's 10 drops to 6.7 against acid.
        let mut world = test_world(SimConfig::default());
        let versus_acid = spawn_fighter(&mut world, GridPos::new(2, 2), PlantPhase::Grown, 10.0, None);
        spawn_load(&mut world, GridPos::new(2, 3), PollutionLoad::single(PollutionKind::Acidic, 6.0));
        let versus_toxic = spawn_fighter(&mut world, GridPos::new(6, 6), PlantPhase::Grown, 10.0, None);
        spawn_load(&mut world, GridPos::new(6, 7), PollutionLoad::single(PollutionKind::Toxic, 9.0));

        grown_overwhelm_phase(&mut world);

        assert!(world.get::<PlantNodeId>(versus_acid).is_none());
        assert!(world.get::<PlantNodeId>(versus_toxic).is_some());
    }

    #[test]
    fn test_bud_defends_with_parent_attack() {
        let mut world = test_world(SimConfig::default());
        let parent = spawn_fighter(&mut world, GridPos::new(4, 4), PlantPhase::Grown, 10.0, None);
        let bud = spawn_fighter(&mut world, GridPos::new(4, 5), PlantPhase::Bud, 0.0, Some(parent));
        spawn_load(&mut world, GridPos::new(4, 6), PollutionLoad::single(PollutionKind::Toxic, 8.0));

        bud_overwhelm_phase(&mut world);
        assert!(world.get::<PlantNodeId>(bud).is_some());

        // A parent whose attack collapses leaves the bud defenseless.
        if let Some(mut stats) = world.get_mut::<PlantStats>(parent) {
            stats.attack_damage = 1.0;
        }
        bud_overwhelm_phase(&mut world);
        assert!(world.get::<PlantNodeId>(bud).is_none());
    }

    #[test]
    fn test_frozen_tile_cannot_overwhelm() {
        let mut world = test_world(SimConfig::default());
        let node = spawn_fighter(&mut world, GridPos::new(4, 4), PlantPhase::Grown, 1.0, None);
        let tile = spawn_load(
            &mut world,
            GridPos::new(4, 5),
            PollutionLoad::single(PollutionKind::Toxic, 50.0),
        );
        if let Some(mut freeze) = world.get_mut::<Freeze>(tile) {
            freeze.remaining_ticks = 2;
        }

        grown_overwhelm_phase(&mut world);

        assert!(world.get::<PlantNodeId>(node).is_some());
    }

    #[test]
    fn test_heart_is_never_overwhelmed() {
        let mut world = test_world(SimConfig::default());
        let pos = GridPos::new(4, 4);
        let heart = spawn_fighter(&mut world, pos, PlantPhase::Grown, 0.0, None);
        world.entity_mut(heart).insert(Heart);
        spawn_load(&mut world, GridPos::new(4, 5), PollutionLoad::single(PollutionKind::Toxic, 50.0));

        grown_overwhelm_phase(&mut world);

        assert!(world.get::<PlantNodeId>(heart).is_some());
    }

    #[test]
    fn test_overwhelm_destroys_whole_subtree() {
        let mut world = test_world(SimConfig::default());
        let parent = spawn_fighter(&mut world, GridPos::new(4, 4), PlantPhase::Grown, 5.0, None);
        let child = spawn_fighter(&mut world, GridPos::new(4, 3), PlantPhase::Bud, 0.0, Some(parent));
        spawn_load(&mut world, GridPos::new(4, 5), PollutionLoad::single(PollutionKind::Toxic, 8.0));

        grown_overwhelm_phase(&mut world);

        assert!(world.get::<PlantNodeId>(parent).is_none());
        assert!(world.get::<PlantNodeId>(child).is_none());
    }
}
