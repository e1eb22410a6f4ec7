//! Public API for the simulation.
//!
//! This module provides the main interface for any client (a renderer, a UI
//! layer, a headless test harness) to interact with the simulation.
//!
//! ## Ticks
//!
//! The simulation advances only through `advance_tick()`; callers decide the
//! real-time cadence. One tick runs the fixed phase order documented in
//! [`crate::systems`] and is fully deterministic.
//!
//! ## Player actions
//!
//! Player-intent entry points (`player_sprout`, `player_graft_remove`,
//! `player_graft_apply`, `player_prune`) execute synchronously between ticks
//! and are atomic: either the whole action succeeds and the energy is spent,
//! or it fails with an [`ActionError`] and nothing has changed.

use crate::components::*;
use crate::config::SimConfig;
use crate::economy::{EnergyPool, GraftBuffer};
use crate::error::ActionError;
use crate::grid::{GridIndex, GridPos, Occupant};
use crate::systems::events::{ChangeBuffer, ChangeEvent};
use crate::systems::growth::{kill_subtree, refresh_stats, try_sprout};
use crate::systems::*;
use crate::world::{plant_snapshot, source_snapshot, tile_snapshot, CellSummary, Snapshot};
use bevy_ecs::prelude::*;

/// The main simulation world container.
///
/// Owns the ECS world and the tick schedule, providing a clean API for:
/// - Initializing the simulation (heart, pollution sources)
/// - Advancing it tick by tick
/// - Executing player actions
/// - Extracting state snapshots and change notifications
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
}

impl SimWorld {
    /// Create a new empty simulation world with default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Self {
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

        // One total order per tick; phases never interleave.
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                growth_phase,
                bud_overwhelm_phase,
                extraction_phase,
                grown_overwhelm_phase,
                pollution_phase,
                decay_phase,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
        }
    }

    /// Run one full simulation step.
    pub fn advance_tick(&mut self) {
        self.schedule.run(&mut self.world);
        self.tick += 1;
        self.time += self.world.resource::<SimConfig>().tick_interval;
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time in seconds.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Current and maximum energy of the shared pool.
    pub fn energy(&self) -> (f32, f32) {
        let pool = self.world.resource::<EnergyPool>();
        (pool.current(), pool.max())
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// One-time placement of the heart node. It starts as a bud and comes
    /// online (storage, auto-sprouts) on its first growth tick.
    pub fn place_heart(
        &mut self,
        pos: GridPos,
        starting: ComponentSet,
    ) -> Result<PlantNodeId, ActionError> {
        let mut hearts = self.world.query_filtered::<(), With<Heart>>();
        if hearts.iter(&self.world).next().is_some() {
            return Err(ActionError::InvalidTarget("heart already placed"));
        }
        {
            let grid = self.world.resource::<GridIndex>();
            if !grid.in_bounds(pos) {
                return Err(ActionError::OutOfBounds(pos));
            }
            if grid.occupant(pos).is_some() {
                return Err(ActionError::OccupiedCell(pos));
            }
        }

        let cfg = self.world.resource::<SimConfig>().clone();
        let composition = PlantComposition::from_natural(starting);
        let stats = PlantStats::derive(&composition, true, &cfg.plant);
        let id = self.world.resource_mut::<IdCounter>().next_plant();

        let heart = self
            .world
            .spawn((
                PlantBundle {
                    id,
                    pos,
                    phase: PlantPhase::Bud,
                    composition,
                    stats,
                    growth: GrowthProgress::default(),
                    lineage: Lineage::default(),
                    grip: FreezeGrip::default(),
                },
                Heart,
            ))
            .id();
        // Cell checked free above; single-threaded, so this cannot fail.
        if let Err(err) = self
            .world
            .resource_mut::<GridIndex>()
            .register(pos, Occupant::Plant(heart))
        {
            self.world.despawn(heart);
            return Err(err);
        }
        self.world.resource_mut::<ChangeBuffer>().push_plant(pos);
        tracing::debug!(?pos, "heart placed");
        Ok(id)
    }

    /// Place a pollution source. Part of scenario setup, not the player
    /// surface; tier parameters come from the configuration tables.
    pub fn place_source(
        &mut self,
        pos: GridPos,
        kind: PollutionKind,
        tier: SourceTier,
    ) -> Result<SourceId, ActionError> {
        {
            let grid = self.world.resource::<GridIndex>();
            if !grid.in_bounds(pos) {
                return Err(ActionError::OutOfBounds(pos));
            }
            if grid.occupant(pos).is_some() {
                return Err(ActionError::OccupiedCell(pos));
            }
        }

        let cfg = self.world.resource::<SimConfig>().clone();
        let tier_cfg = cfg.source_tiers.for_tier(tier);
        let id = self.world.resource_mut::<IdCounter>().next_source();

        let source = self
            .world
            .spawn(SourceBundle {
                id,
                pos,
                tier,
                state: SourceState::Dormant,
                health: SourceHealth::new(tier_cfg.max_hp),
                emitter: Emitter {
                    kind,
                    base_rate: tier_cfg.emission_rate,
                    current_rate: tier_cfg.emission_rate,
                    interval: tier_cfg.emission_interval,
                    since_pulse: 0.0,
                    dormant_remaining: tier_cfg.dormant_duration,
                    active_elapsed: 0.0,
                    attack_damage: tier_cfg.attack_damage,
                },
            })
            .id();
        if let Err(err) = self
            .world
            .resource_mut::<GridIndex>()
            .register(pos, Occupant::Source(source))
        {
            self.world.despawn(source);
            return Err(err);
        }
        self.world.resource_mut::<ChangeBuffer>().push_pollution(pos);
        tracing::debug!(?pos, tier = tier.name(), "pollution source placed");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    /// Sprout a new bud from the grown node at `parent_pos` into the
    /// adjacent cell `target_pos`, paying the parent's sprout cost.
    pub fn player_sprout(
        &mut self,
        parent_pos: GridPos,
        target_pos: GridPos,
    ) -> Result<(), ActionError> {
        let Some(parent) = self.world.resource::<GridIndex>().plant_at(parent_pos) else {
            return Err(ActionError::AlreadyTerminal(parent_pos));
        };
        if !parent_pos.is_adjacent(target_pos) {
            return Err(ActionError::InvalidTarget(
                "sprout target must be adjacent to the parent",
            ));
        }
        let cfg = self.world.resource::<SimConfig>().clone();
        try_sprout(&mut self.world, parent, target_pos, &cfg)?;
        Ok(())
    }

    /// Remove natural components from the node at `pos` into the shared
    /// graft buffer. Requested amounts are clamped to what the node holds;
    /// the energy charge covers what is actually removed.
    pub fn player_graft_remove(
        &mut self,
        pos: GridPos,
        leaf: u32,
        root: u32,
        fruit: u32,
    ) -> Result<ComponentSet, ActionError> {
        let Some(entity) = self.world.resource::<GridIndex>().plant_at(pos) else {
            return Err(ActionError::AlreadyTerminal(pos));
        };
        let cfg = self.world.resource::<SimConfig>().clone();
        let Some(&comp) = self.world.get::<PlantComposition>(entity) else {
            return Err(ActionError::AlreadyTerminal(pos));
        };

        let removed = ComponentSet::new(leaf, root, fruit).clamped_to(&comp.natural);
        if removed.is_zero() {
            return Err(ActionError::InvalidTarget(
                "node holds none of the requested natural components",
            ));
        }
        let cost = removed.total() as f32 * cfg.plant.graft_cost_per_component;
        self.world.resource_mut::<EnergyPool>().spend(cost)?;

        if let Some(mut comp) = self.world.get_mut::<PlantComposition>(entity) {
            comp.natural.subtract(&removed);
        }
        self.world.resource_mut::<GraftBuffer>().store(removed);
        refresh_stats(&mut self.world, entity, &cfg);
        Ok(removed)
    }

    /// Apply the buffered components to the node at `pos` as grafted
    /// components. Fails whole if the buffer is empty, the node lacks
    /// capacity, or the energy charge is unaffordable; the buffer keeps its
    /// content on failure.
    pub fn player_graft_apply(&mut self, pos: GridPos) -> Result<ComponentSet, ActionError> {
        let Some(entity) = self.world.resource::<GridIndex>().plant_at(pos) else {
            return Err(ActionError::AlreadyTerminal(pos));
        };
        let cfg = self.world.resource::<SimConfig>().clone();
        let Some(pending) = self.world.resource::<GraftBuffer>().peek() else {
            return Err(ActionError::InvalidTarget("graft buffer is empty"));
        };
        let Some(&comp) = self.world.get::<PlantComposition>(entity) else {
            return Err(ActionError::AlreadyTerminal(pos));
        };

        let cap = comp.cap(cfg.plant.component_cap_bonus);
        if comp.total() + pending.total() > cap {
            return Err(ActionError::CapacityExceeded {
                requested: pending.total(),
                current: comp.total(),
                cap,
            });
        }
        let cost = pending.total() as f32 * cfg.plant.graft_cost_per_component;
        self.world.resource_mut::<EnergyPool>().spend(cost)?;

        if let Some(mut comp) = self.world.get_mut::<PlantComposition>(entity) {
            comp.grafted.add(&pending);
        }
        self.world.resource_mut::<GraftBuffer>().take();
        refresh_stats(&mut self.world, entity, &cfg);
        Ok(pending)
    }

    /// Nip the non-heart node at `pos`: a partial refund of its sprout cost,
    /// then the node and its whole subtree are destroyed.
    pub fn player_prune(&mut self, pos: GridPos) -> Result<(), ActionError> {
        let Some(entity) = self.world.resource::<GridIndex>().plant_at(pos) else {
            return Err(ActionError::AlreadyTerminal(pos));
        };
        if self.world.get::<Heart>(entity).is_some() {
            return Err(ActionError::InvalidTarget("the heart cannot be pruned"));
        }
        let cfg = self.world.resource::<SimConfig>().clone();
        let refund = self
            .world
            .get::<PlantStats>(entity)
            .map(|stats| stats.sprout_cost * cfg.plant.nip_refund_fraction)
            .unwrap_or(0.0);
        self.world.resource_mut::<EnergyPool>().deposit(refund);
        kill_subtree(&mut self.world, entity);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries and snapshots
    // ------------------------------------------------------------------

    /// Summarize the occupant of one cell. Out-of-bounds cells are empty.
    pub fn query_cell(&self, pos: GridPos) -> CellSummary {
        match self.world.resource::<GridIndex>().occupant(pos) {
            None => CellSummary::Empty,
            Some(Occupant::Plant(entity)) => plant_snapshot(&self.world, entity)
                .map(CellSummary::Plant)
                .unwrap_or(CellSummary::Empty),
            Some(Occupant::Tile(entity)) => tile_snapshot(&self.world, entity)
                .map(CellSummary::Pollution)
                .unwrap_or(CellSummary::Empty),
            Some(Occupant::Source(entity)) => source_snapshot(&self.world, entity)
                .map(CellSummary::Source)
                .unwrap_or(CellSummary::Empty),
        }
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Take all pending position-keyed change notifications. Rendering/UI
    /// layers drain this after each tick or player action.
    pub fn drain_changes(&mut self) -> Vec<ChangeEvent> {
        self.world.resource_mut::<ChangeBuffer>().drain()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn heart_components() -> ComponentSet {
        ComponentSet::new(3, 3, 3)
    }

    fn rich_config() -> SimConfig {
        SimConfig {
            grid_width: 10,
            grid_height: 10,
            base_max_energy: 500.0,
            starting_energy: 500.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_new_world() {
        let sim = SimWorld::new();
        assert_eq!(sim.current_tick(), 0);
        let (current, max) = sim.energy();
        assert_eq!(current, 40.0);
        assert_eq!(max, 50.0);
    }

    #[test]
    fn test_heart_growth_raises_energy_cap() {
        let config = SimConfig {
            grid_width: 10,
            grid_height: 10,
            ..SimConfig::default()
        };
        let base = config.base_max_energy;
        let expected = PlantStats::derive(
            &PlantComposition::from_natural(heart_components()),
            true,
            &config.plant,
        )
        .energy_storage;

        let mut sim = SimWorld::with_config(config);
        sim.place_heart(GridPos::new(0, 0), heart_components()).unwrap();
        assert_eq!(sim.energy().1, base);

        sim.advance_tick();

        let snapshot = sim.snapshot();
        let heart = snapshot.plants.iter().find(|p| p.is_heart).unwrap();
        assert_eq!(heart.phase, "Grown");
        assert!((snapshot.energy.max - (base + expected)).abs() < 1e-3);
    }

    #[test]
    fn test_second_heart_rejected() {
        let mut sim = SimWorld::with_config(rich_config());
        sim.place_heart(GridPos::new(5, 5), heart_components()).unwrap();
        let err = sim
            .place_heart(GridPos::new(2, 2), heart_components())
            .unwrap_err();
        assert_eq!(err, ActionError::InvalidTarget("heart already placed"));
    }

    #[test]
    fn test_grown_heart_auto_sprouts() {
        let mut sim = SimWorld::with_config(rich_config());
        sim.place_heart(GridPos::new(5, 5), heart_components()).unwrap();
        sim.advance_tick();

        let snapshot = sim.snapshot();
        // Heart plus four buds, one per orthogonal neighbor.
        assert_eq!(snapshot.plants.len(), 5);
        let buds = snapshot.plants.iter().filter(|p| p.phase == "Bud").count();
        assert_eq!(buds, 4);
        // Children inherit the parent's current per-family totals.
        let bud = snapshot.plants.iter().find(|p| p.phase == "Bud").unwrap();
        assert_eq!(bud.natural, heart_components());
        assert_eq!(bud.grafted, ComponentSet::default());
        assert_eq!(bud.parent, Some(0));
    }

    #[test]
    fn test_weak_source_emission_scenario() {
        let mut config = rich_config();
        config.source_tiers.weak.dormant_duration = 0.0;
        config.source_tiers.weak.emission_rate = 5.0;
        config.source_tiers.weak.emission_interval = config.tick_interval;
        let mut sim = SimWorld::with_config(config);

        sim.place_source(GridPos::new(5, 5), PollutionKind::Toxic, SourceTier::Weak)
            .unwrap();
        sim.advance_tick();

        for neighbor in [
            GridPos::new(5, 6),
            GridPos::new(5, 4),
            GridPos::new(4, 5),
            GridPos::new(6, 5),
        ] {
            match sim.query_cell(neighbor) {
                CellSummary::Pollution(tile) => {
                    assert!((tile.total - 5.0).abs() < 1e-4);
                    assert_eq!(tile.dominant, "Toxic");
                    assert_eq!(tile.hops_from_source, Some(1));
                }
                other => panic!("expected pollution at {neighbor}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_source_stays_dormant() {
        let mut sim = SimWorld::with_config(rich_config());
        sim.place_source(GridPos::new(5, 5), PollutionKind::Sludge, SourceTier::Strong)
            .unwrap();
        // Strong tier default dormancy is 60s; a few ticks change nothing.
        for _ in 0..4 {
            sim.advance_tick();
        }
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.sources[0].state, "Dormant");
        assert!(snapshot.tiles.is_empty());
    }

    #[test]
    fn test_graft_round_trip_restores_counts() {
        let mut sim = SimWorld::with_config(rich_config());
        let pos = GridPos::new(5, 5);
        sim.place_heart(pos, heart_components()).unwrap();
        sim.advance_tick();

        let before = match sim.query_cell(pos) {
            CellSummary::Plant(p) => p,
            other => panic!("expected heart, got {other:?}"),
        };

        let removed = sim.player_graft_remove(pos, 1, 0, 1).unwrap();
        assert_eq!(removed, ComponentSet::new(1, 0, 1));
        sim.player_graft_apply(pos).unwrap();

        let after = match sim.query_cell(pos) {
            CellSummary::Plant(p) => p,
            other => panic!("expected heart, got {other:?}"),
        };
        // Per-family totals restored exactly; the split between natural and
        // grafted has shifted, which is the point of grafting.
        assert_eq!(
            before.natural.leaf + before.grafted.leaf,
            after.natural.leaf + after.grafted.leaf
        );
        assert_eq!(
            before.natural.fruit + before.grafted.fruit,
            after.natural.fruit + after.grafted.fruit
        );
        assert_eq!(after.grafted, ComponentSet::new(1, 0, 1));
        // Buffer consumed.
        assert!(sim.world().resource::<GraftBuffer>().is_empty());
    }

    #[test]
    fn test_graft_apply_capacity_exceeded() {
        let mut sim = SimWorld::with_config(rich_config());
        let pos = GridPos::new(5, 5);
        sim.place_heart(pos, heart_components()).unwrap();
        sim.advance_tick();

        sim.world_mut()
            .resource_mut::<GraftBuffer>()
            .store(ComponentSet::new(100, 0, 0));

        let err = sim.player_graft_apply(pos).unwrap_err();
        assert!(matches!(err, ActionError::CapacityExceeded { requested: 100, .. }));

        // Grafted counts untouched, buffer still holds the components.
        match sim.query_cell(pos) {
            CellSummary::Plant(p) => assert_eq!(p.grafted, ComponentSet::default()),
            other => panic!("expected heart, got {other:?}"),
        }
        assert!(!sim.world().resource::<GraftBuffer>().is_empty());
    }

    #[test]
    fn test_graft_remove_insufficient_energy_is_a_no_op() {
        let mut sim = SimWorld::with_config(rich_config());
        let pos = GridPos::new(5, 5);
        sim.place_heart(pos, heart_components()).unwrap();
        sim.advance_tick();

        sim.world_mut().resource_mut::<EnergyPool>().drain(10_000.0);
        let err = sim.player_graft_remove(pos, 2, 0, 0).unwrap_err();
        assert!(matches!(err, ActionError::InsufficientEnergy { .. }));

        match sim.query_cell(pos) {
            CellSummary::Plant(p) => assert_eq!(p.natural, heart_components()),
            other => panic!("expected heart, got {other:?}"),
        }
        assert!(sim.world().resource::<GraftBuffer>().is_empty());
    }

    #[test]
    fn test_prune_destroys_subtree_leaving_no_orphans() {
        let mut sim = SimWorld::with_config(rich_config());
        sim.place_heart(GridPos::new(5, 5), heart_components()).unwrap();

        // Heart grows, children grow, grandchildren sprout.
        for _ in 0..10 {
            sim.advance_tick();
        }
        let before = sim.snapshot();
        assert!(before.plants.len() > 5, "expected grandchildren to exist");

        let child_pos = GridPos::new(5, 6);
        sim.player_prune(child_pos).unwrap();

        let after = sim.snapshot();
        assert!(after.plants.len() < before.plants.len());
        assert!(matches!(sim.query_cell(child_pos), CellSummary::Empty));
        // Every surviving parent link resolves to a surviving node.
        for plant in &after.plants {
            if let Some(parent) = plant.parent {
                assert!(
                    after.plants.iter().any(|p| p.id == parent),
                    "plant {} points at destroyed parent {}",
                    plant.id,
                    parent
                );
            }
        }
    }

    #[test]
    fn test_prune_heart_rejected() {
        let mut sim = SimWorld::with_config(rich_config());
        let pos = GridPos::new(5, 5);
        sim.place_heart(pos, heart_components()).unwrap();
        sim.advance_tick();
        let err = sim.player_prune(pos).unwrap_err();
        assert_eq!(err, ActionError::InvalidTarget("the heart cannot be pruned"));
        assert!(matches!(sim.query_cell(pos), CellSummary::Plant(_)));
    }

    #[test]
    fn test_manual_sprout() {
        let mut config = rich_config();
        // Too poor to auto-sprout at transition time.
        config.starting_energy = 5.0;
        let mut sim = SimWorld::with_config(config);
        let heart_pos = GridPos::new(5, 5);
        sim.place_heart(heart_pos, heart_components()).unwrap();
        sim.advance_tick();
        assert_eq!(sim.snapshot().plants.len(), 1);

        // Refill and sprout by hand.
        sim.world_mut().resource_mut::<EnergyPool>().deposit(100.0);
        sim.player_sprout(heart_pos, GridPos::new(5, 6)).unwrap();
        assert!(matches!(sim.query_cell(GridPos::new(5, 6)), CellSummary::Plant(_)));

        // Non-adjacent target is rejected.
        let err = sim.player_sprout(heart_pos, GridPos::new(7, 5)).unwrap_err();
        assert_eq!(
            err,
            ActionError::InvalidTarget("sprout target must be adjacent to the parent")
        );
        // Occupied target is rejected.
        let err = sim.player_sprout(heart_pos, GridPos::new(5, 6)).unwrap_err();
        assert_eq!(err, ActionError::OccupiedCell(GridPos::new(5, 6)));
    }

    #[test]
    fn test_energy_stays_within_bounds_over_time() {
        let mut sim = SimWorld::with_config(rich_config());
        sim.place_heart(GridPos::new(2, 2), heart_components()).unwrap();
        sim.place_source(GridPos::new(7, 7), PollutionKind::Toxic, SourceTier::Weak)
            .unwrap();

        for _ in 0..50 {
            sim.advance_tick();
            let (current, max) = sim.energy();
            assert!(current >= 0.0, "energy went negative: {current}");
            assert!(current <= max + 1e-3, "energy {current} above cap {max}");
        }
    }

    #[test]
    fn test_component_cap_invariant_holds() {
        let mut sim = SimWorld::with_config(rich_config());
        let pos = GridPos::new(5, 5);
        sim.place_heart(pos, heart_components()).unwrap();

        for _ in 0..8 {
            sim.advance_tick();
        }
        sim.player_graft_remove(pos, 0, 1, 0).unwrap();
        sim.player_graft_apply(pos).unwrap();

        for plant in &sim.snapshot().plants {
            let total = plant.natural.total() + plant.grafted.total();
            assert!(
                total <= plant.component_cap,
                "plant {} exceeds its cap: {total} > {}",
                plant.id,
                plant.component_cap
            );
        }
    }

    #[test]
    fn test_change_notifications() {
        let mut sim = SimWorld::with_config(rich_config());
        let pos = GridPos::new(5, 5);
        sim.place_heart(pos, heart_components()).unwrap();
        let events = sim.drain_changes();
        assert!(events.contains(&ChangeEvent::PlantChanged(pos)));

        sim.advance_tick();
        let events = sim.drain_changes();
        assert!(!events.is_empty());
        assert!(sim.drain_changes().is_empty());
    }

    #[test]
    fn test_deterministic_replay() {
        let run = || {
            let mut config = rich_config();
            config.source_tiers.weak.dormant_duration = 1.0;
            let mut sim = SimWorld::with_config(config);
            sim.place_heart(GridPos::new(3, 3), heart_components()).unwrap();
            sim.place_source(GridPos::new(7, 7), PollutionKind::Acidic, SourceTier::Weak)
                .unwrap();
            sim.place_source(GridPos::new(1, 8), PollutionKind::Sludge, SourceTier::Weak)
                .unwrap();
            for _ in 0..40 {
                sim.advance_tick();
            }
            sim.snapshot_json()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_query_cell_out_of_bounds_is_empty() {
        let sim = SimWorld::new();
        assert!(matches!(
            sim.query_cell(GridPos::new(-3, 99)),
            CellSummary::Empty
        ));
    }
}
