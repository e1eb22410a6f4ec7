//! ECS components for the Rootbound simulation.
//!
//! Components are pure data containers attached to entities. All simulation
//! logic lives in the tick-phase systems and the `SimWorld` action methods
//! that query these components.

use crate::config::{PlantConfig, PollutionConfig, StatKind};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY
// ============================================================================

/// Stable identifier for a plant node. Also fixes the per-phase processing
/// order, so a run replays identically.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlantNodeId(pub u32);

/// Stable identifier for a pollution source.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u32);

/// Allocator for stable entity identifiers.
#[derive(Resource, Debug, Default, Clone)]
pub struct IdCounter {
    next_plant: u32,
    next_source: u32,
}

impl IdCounter {
    pub fn next_plant(&mut self) -> PlantNodeId {
        let id = PlantNodeId(self.next_plant);
        self.next_plant += 1;
        id
    }

    pub fn next_source(&mut self) -> SourceId {
        let id = SourceId(self.next_source);
        self.next_source += 1;
        id
    }
}

// ============================================================================
// PLANT COMPONENTS
// ============================================================================

/// A leaf/root/fruit component count triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSet {
    pub leaf: u32,
    pub root: u32,
    pub fruit: u32,
}

impl ComponentSet {
    pub const fn new(leaf: u32, root: u32, fruit: u32) -> Self {
        Self { leaf, root, fruit }
    }

    pub fn total(&self) -> u32 {
        self.leaf + self.root + self.fruit
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Clamp each family to what another set actually holds.
    pub fn clamped_to(&self, held: &ComponentSet) -> ComponentSet {
        ComponentSet {
            leaf: self.leaf.min(held.leaf),
            root: self.root.min(held.root),
            fruit: self.fruit.min(held.fruit),
        }
    }

    pub fn add(&mut self, other: &ComponentSet) {
        self.leaf += other.leaf;
        self.root += other.root;
        self.fruit += other.fruit;
    }

    /// Subtract `other`, which must already be clamped to `self`.
    pub fn subtract(&mut self, other: &ComponentSet) {
        self.leaf -= other.leaf;
        self.root -= other.root;
        self.fruit -= other.fruit;
    }
}

/// Growth phase of a plant node.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlantPhase {
    /// Still growing; no combat or extraction capability of its own.
    Bud,
    /// Mature; contributes storage, attacks, extracts, and sprouts.
    Grown,
}

/// A node's component makeup: natural counts (exponential stat contribution,
/// inherited by children) and grafted counts (linear contribution, moved by
/// the graft buffer).
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlantComposition {
    pub natural: ComponentSet,
    pub grafted: ComponentSet,
}

impl PlantComposition {
    pub fn from_natural(natural: ComponentSet) -> Self {
        Self {
            natural,
            grafted: ComponentSet::default(),
        }
    }

    pub fn total(&self) -> u32 {
        self.natural.total() + self.grafted.total()
    }

    /// Component cap: natural total plus a fixed bonus. Since natural counts
    /// set the cap, only grafted components can consume the bonus headroom.
    pub fn cap(&self, bonus: u32) -> u32 {
        self.natural.total() + bonus
    }
}

/// Derived plant stats, recomputed after every composition mutation.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlantStats {
    pub attack_damage: f32,
    pub extraction_rate: f32,
    pub energy_storage: f32,
    pub sprout_cost: f32,
    pub maintenance_cost: f32,
}

impl PlantStats {
    /// Derive stats from a composition.
    ///
    /// Each family maps to one stat: natural counts contribute
    /// `count ^ stat_exponent * multiplier`, grafted counts contribute
    /// `count * multiplier`.
    pub fn derive(comp: &PlantComposition, is_heart: bool, cfg: &PlantConfig) -> Self {
        let mut stats = Self::default();
        let families = [
            (comp.natural.leaf, comp.grafted.leaf, cfg.leaf_stat, cfg.leaf_multiplier),
            (comp.natural.root, comp.grafted.root, cfg.root_stat, cfg.root_multiplier),
            (comp.natural.fruit, comp.grafted.fruit, cfg.fruit_stat, cfg.fruit_multiplier),
        ];
        for (natural, grafted, kind, multiplier) in families {
            let value = (natural as f32).powf(cfg.stat_exponent) * multiplier
                + grafted as f32 * multiplier;
            match kind {
                StatKind::AttackDamage => stats.attack_damage += value,
                StatKind::ExtractionRate => stats.extraction_rate += value,
                StatKind::EnergyStorage => stats.energy_storage += value,
            }
        }

        let total = comp.total() as f32;
        stats.sprout_cost = cfg.sprout_cost_base.powf(total) * cfg.sprout_cost_scalar;
        stats.maintenance_cost = if is_heart {
            0.0
        } else {
            cfg.maintenance_base.powf(total) / 2.0
        };
        stats
    }
}

/// Ticks accumulated toward the Bud -> Grown transition.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GrowthProgress {
    pub ticks: u32,
}

/// Marker for the single heart node: zero maintenance, cannot be pruned.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Heart;

/// Tree linkage. The parent link is a weak handle; the children list owns the
/// subtree for cascade destruction. A node appears in its parent's children
/// list iff its parent field points back at that parent.
#[derive(Component, Debug, Clone, Default)]
pub struct Lineage {
    pub parent: Option<Entity>,
    pub children: Vec<Entity>,
}

/// The pollution tile this plant currently holds frozen, if any.
/// Released when the plant dies.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FreezeGrip(pub Option<Entity>);

/// Bundle for spawning a complete plant node.
#[derive(Bundle)]
pub struct PlantBundle {
    pub id: PlantNodeId,
    pub pos: crate::grid::GridPos,
    pub phase: PlantPhase,
    pub composition: PlantComposition,
    pub stats: PlantStats,
    pub growth: GrowthProgress,
    pub lineage: Lineage,
    pub grip: FreezeGrip,
}

// ============================================================================
// POLLUTION COMPONENTS
// ============================================================================

/// The three pollution types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollutionKind {
    Toxic,
    Acidic,
    Sludge,
}

impl PollutionKind {
    pub fn name(&self) -> &'static str {
        match self {
            PollutionKind::Toxic => "Toxic",
            PollutionKind::Acidic => "Acidic",
            PollutionKind::Sludge => "Sludge",
        }
    }
}

/// A tile's per-type accumulations. The composition, not a single type tag,
/// defines the tile's behavior.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutionLoad {
    pub toxic: f32,
    pub acidic: f32,
    pub sludge: f32,
}

impl PollutionLoad {
    pub fn single(kind: PollutionKind, amount: f32) -> Self {
        let mut load = Self::default();
        load.accumulate(kind, amount);
        load
    }

    pub fn amount(&self, kind: PollutionKind) -> f32 {
        match kind {
            PollutionKind::Toxic => self.toxic,
            PollutionKind::Acidic => self.acidic,
            PollutionKind::Sludge => self.sludge,
        }
    }

    pub fn accumulate(&mut self, kind: PollutionKind, amount: f32) {
        match kind {
            PollutionKind::Toxic => self.toxic += amount,
            PollutionKind::Acidic => self.acidic += amount,
            PollutionKind::Sludge => self.sludge += amount,
        }
    }

    pub fn total(&self) -> f32 {
        self.toxic + self.acidic + self.sludge
    }

    /// Plurality type, tie-break Toxic > Acidic > Sludge.
    pub fn dominant(&self) -> PollutionKind {
        if self.toxic >= self.acidic && self.toxic >= self.sludge {
            PollutionKind::Toxic
        } else if self.acidic >= self.sludge {
            PollutionKind::Acidic
        } else {
            PollutionKind::Sludge
        }
    }

    /// Reduce all accumulations proportionally by `amount / total`. Damage is
    /// distributed across the composition, never targeted at one type.
    pub fn take_damage(&mut self, amount: f32) {
        let total = self.total();
        if total <= 0.0 {
            return;
        }
        let keep = 1.0 - (amount / total).clamp(0.0, 1.0);
        self.toxic *= keep;
        self.acidic *= keep;
        self.sludge *= keep;
    }

    /// Remove and return `fraction` of every accumulation.
    pub fn split_off(&mut self, fraction: f32) -> PollutionLoad {
        let fraction = fraction.clamp(0.0, 1.0);
        let moved = PollutionLoad {
            toxic: self.toxic * fraction,
            acidic: self.acidic * fraction,
            sludge: self.sludge * fraction,
        };
        self.toxic -= moved.toxic;
        self.acidic -= moved.acidic;
        self.sludge -= moved.sludge;
        moved
    }

    pub fn merge(&mut self, other: &PollutionLoad) {
        self.toxic += other.toxic;
        self.acidic += other.acidic;
        self.sludge += other.sludge;
    }
}

/// Derived tile stats, recomputed after every accumulation or damage.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TileStats {
    pub spread_speed: f32,
    pub attack_damage: f32,
}

impl TileStats {
    pub fn derive(load: &PollutionLoad, cfg: &PollutionConfig) -> Self {
        let weighted = |w: &crate::config::TypeWeights| {
            load.toxic * w.toxic + load.acidic * w.acidic + load.sludge * w.sludge
        };
        Self {
            spread_speed: weighted(&cfg.spread_weights) * cfg.base_spread_rate,
            attack_damage: weighted(&cfg.attack_weights),
        }
    }
}

/// Extraction yield multiplier against this pollution. Sludge resists
/// extraction even though it is the weakest offensively.
pub fn extraction_multiplier(dominant: PollutionKind, cfg: &PollutionConfig) -> f32 {
    match dominant {
        PollutionKind::Sludge => cfg.sludge_extraction_multiplier,
        _ => 1.0,
    }
}

/// Spread bookkeeping for a tile.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TileSpread {
    /// Shortest emission distance from a source. New tiles start "infinite"
    /// until an emission or spread pulse stamps them.
    pub hops: u32,
    /// Accumulated spread progress; a pulse fires when it reaches 1.
    pub progress: f32,
}

impl Default for TileSpread {
    fn default() -> Self {
        Self {
            hops: u32::MAX,
            progress: 0.0,
        }
    }
}

/// Freeze state of a tile. A frozen tile neither spreads nor deals
/// overwhelm damage.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Freeze {
    pub remaining_ticks: u32,
    pub held_by: Option<Entity>,
}

impl Freeze {
    pub fn is_frozen(&self) -> bool {
        self.remaining_ticks > 0
    }

    pub fn release(&mut self) {
        self.remaining_ticks = 0;
        self.held_by = None;
    }
}

/// Bundle for spawning a pollution tile.
#[derive(Bundle)]
pub struct TileBundle {
    pub pos: crate::grid::GridPos,
    pub load: PollutionLoad,
    pub stats: TileStats,
    pub spread: TileSpread,
    pub freeze: Freeze,
}

// ============================================================================
// POLLUTION SOURCE COMPONENTS
// ============================================================================

/// Strength class of a pollution source.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTier {
    Weak,
    Medium,
    Strong,
}

impl SourceTier {
    pub fn name(&self) -> &'static str {
        match self {
            SourceTier::Weak => "Weak",
            SourceTier::Medium => "Medium",
            SourceTier::Strong => "Strong",
        }
    }
}

/// Source lifecycle state. Transitions are one-way:
/// Dormant -> Active -> Awakened.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceState {
    Dormant,
    Active,
    Awakened,
}

impl SourceState {
    pub fn name(&self) -> &'static str {
        match self {
            SourceState::Dormant => "Dormant",
            SourceState::Active => "Active",
            SourceState::Awakened => "Awakened",
        }
    }
}

/// Hit points of a pollution source.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceHealth {
    pub current: f32,
    pub max: f32,
}

impl SourceHealth {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn is_destroyed(&self) -> bool {
        self.current <= 0.0
    }

    /// Awakening scaling: raise the cap and refill to it.
    pub fn scale_max(&mut self, factor: f32) {
        self.max *= factor;
        self.current = self.max;
    }
}

/// Emission behavior and timers of a source. All timers advance by the tick
/// interval inside `advance_tick`; there are no suspended execution contexts.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Emitter {
    pub kind: PollutionKind,
    pub base_rate: f32,
    pub current_rate: f32,
    /// Seconds between pulses.
    pub interval: f32,
    /// Seconds accumulated toward the next pulse.
    pub since_pulse: f32,
    /// Seconds of dormancy left before activation.
    pub dormant_remaining: f32,
    /// Seconds spent active, drives awakening.
    pub active_elapsed: f32,
    /// Attack value a plant must beat to extract from this source.
    pub attack_damage: f32,
}

/// Bundle for spawning a pollution source.
#[derive(Bundle)]
pub struct SourceBundle {
    pub id: SourceId,
    pub pos: crate::grid::GridPos,
    pub tier: SourceTier,
    pub state: SourceState,
    pub health: SourceHealth,
    pub emitter: Emitter,
}
