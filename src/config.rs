//! Simulation configuration.
//!
//! Every tunable lives here as plain serde data so an outer asset/config
//! layer can load it from JSON and hand it to `SimWorld::with_config`. The
//! core never reads files itself.

use crate::components::{PollutionKind, SourceTier};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Which derived stat a component family feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    AttackDamage,
    ExtractionRate,
    EnergyStorage,
}

/// Top-level simulation configuration.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Grid width in cells.
    pub grid_width: i32,
    /// Grid height in cells.
    pub grid_height: i32,
    /// Seconds of simulation time represented by one tick. Drives the
    /// pollution-source timers; the caller decides real-time cadence.
    pub tick_interval: f32,
    /// Energy capacity before any plant contributes storage.
    pub base_max_energy: f32,
    /// Energy in the pool at simulation start.
    pub starting_energy: f32,
    pub plant: PlantConfig,
    pub pollution: PollutionConfig,
    pub source_tiers: SourceTierTable,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 32,
            grid_height: 32,
            tick_interval: 0.5,
            base_max_energy: 50.0,
            starting_energy: 40.0,
            plant: PlantConfig::default(),
            pollution: PollutionConfig::default(),
            source_tiers: SourceTierTable::default(),
        }
    }
}

/// Plant growth, stat, and grafting tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Exponent applied to natural component counts in stat derivation.
    /// Grafted components contribute linearly instead.
    pub stat_exponent: f32,
    /// Stat fed by each component family.
    pub leaf_stat: StatKind,
    pub root_stat: StatKind,
    pub fruit_stat: StatKind,
    /// Per-family stat multipliers.
    pub leaf_multiplier: f32,
    pub root_multiplier: f32,
    pub fruit_multiplier: f32,
    /// Ticks a bud needs (each paid for) before it becomes grown.
    pub full_growth_ticks: u32,
    /// Ticks the heart needs before its first transition.
    pub heart_growth_ticks: u32,
    /// Component cap above a node's natural total.
    pub component_cap_bonus: u32,
    /// Sprout cost grows as `sprout_cost_base ^ total * sprout_cost_scalar`.
    pub sprout_cost_base: f32,
    pub sprout_cost_scalar: f32,
    /// Maintenance cost is `maintenance_base ^ total / 2`, zero for the heart.
    pub maintenance_base: f32,
    /// Energy charged per component moved by a graft operation.
    pub graft_cost_per_component: f32,
    /// Fraction of sprout cost refunded when the player nips a node.
    pub nip_refund_fraction: f32,
    /// Attack multiplier applied when defending against acidic pollution.
    pub acidic_attack_penalty: f32,
    /// Whether sprouting onto a strictly weaker pollution tile clears it.
    /// When false (default) any occupied cell refuses the sprout.
    pub sprout_clears_pollution: bool,
    /// Whether the heart's storage counts toward the energy cap.
    pub heart_storage_counts: bool,
    /// Scales energy gained per extraction.
    pub extraction_gain_scale: f32,
    /// Scales damage dealt to pollution per point of attack margin.
    pub extraction_damage_scale: f32,
    /// Ticks a tile stays frozen after a successful extraction from it.
    pub freeze_ticks: u32,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            stat_exponent: 1.4,
            leaf_stat: StatKind::AttackDamage,
            root_stat: StatKind::ExtractionRate,
            fruit_stat: StatKind::EnergyStorage,
            leaf_multiplier: 2.0,
            root_multiplier: 0.5,
            fruit_multiplier: 4.0,
            full_growth_ticks: 6,
            heart_growth_ticks: 1,
            component_cap_bonus: 4,
            sprout_cost_base: 1.25,
            sprout_cost_scalar: 2.0,
            maintenance_base: 1.12,
            graft_cost_per_component: 3.0,
            nip_refund_fraction: 0.25,
            acidic_attack_penalty: 0.67,
            sprout_clears_pollution: false,
            heart_storage_counts: true,
            extraction_gain_scale: 0.05,
            extraction_damage_scale: 0.5,
            freeze_ticks: 3,
        }
    }
}

/// Per-type weights for the pollution composition model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TypeWeights {
    pub toxic: f32,
    pub acidic: f32,
    pub sludge: f32,
}

impl TypeWeights {
    pub fn weight(&self, kind: PollutionKind) -> f32 {
        match kind {
            PollutionKind::Toxic => self.toxic,
            PollutionKind::Acidic => self.acidic,
            PollutionKind::Sludge => self.sludge,
        }
    }
}

/// Pollution tile tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutionConfig {
    /// Tiles below this total level evaporate.
    pub residue_threshold: f32,
    /// Weights feeding a tile's spread speed.
    pub spread_weights: TypeWeights,
    /// Weights feeding a tile's attack damage.
    pub attack_weights: TypeWeights,
    /// Base rate scaling the weighted spread speed.
    pub base_spread_rate: f32,
    /// Extraction yield multiplier against sludge-dominant pollution.
    pub sludge_extraction_multiplier: f32,
    /// Tiles at or above this level may spread to empty neighbors.
    pub spread_threshold: f32,
    /// Fraction of a tile's load pushed out per spread pulse.
    pub spread_fraction: f32,
    /// Tiles this many hops from a source no longer spread.
    pub max_spread_hops: u32,
    /// Tiles at or past this hop count decay each tick.
    pub decay_hops: u32,
    /// Fraction of level lost per tick by decaying tiles.
    pub hop_decay_fraction: f32,
}

impl Default for PollutionConfig {
    fn default() -> Self {
        Self {
            residue_threshold: 1.0,
            spread_weights: TypeWeights {
                toxic: 1.0,
                acidic: 0.7,
                sludge: 0.4,
            },
            attack_weights: TypeWeights {
                toxic: 1.0,
                acidic: 1.5,
                sludge: 0.8,
            },
            base_spread_rate: 0.02,
            sludge_extraction_multiplier: 0.6,
            spread_threshold: 8.0,
            spread_fraction: 0.25,
            max_spread_hops: 6,
            decay_hops: 4,
            hop_decay_fraction: 0.02,
        }
    }
}

/// Per-tier pollution source parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTierConfig {
    pub max_hp: f32,
    pub emission_rate: f32,
    /// Seconds between emission pulses.
    pub emission_interval: f32,
    /// Seconds dormant before first activation.
    pub dormant_duration: f32,
    /// Active seconds before the one-way awakening, `None` = never.
    pub awaken_after: Option<f32>,
    /// Attack value a plant must beat to extract from this source.
    pub attack_damage: f32,
}

/// Tier table for pollution sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTierTable {
    pub weak: SourceTierConfig,
    pub medium: SourceTierConfig,
    pub strong: SourceTierConfig,
}

impl SourceTierTable {
    pub fn for_tier(&self, tier: SourceTier) -> &SourceTierConfig {
        match tier {
            SourceTier::Weak => &self.weak,
            SourceTier::Medium => &self.medium,
            SourceTier::Strong => &self.strong,
        }
    }
}

impl Default for SourceTierTable {
    fn default() -> Self {
        Self {
            weak: SourceTierConfig {
                max_hp: 40.0,
                emission_rate: 2.0,
                emission_interval: 0.5,
                dormant_duration: 10.0,
                awaken_after: None,
                attack_damage: 3.0,
            },
            medium: SourceTierConfig {
                max_hp: 100.0,
                emission_rate: 4.0,
                emission_interval: 0.5,
                dormant_duration: 30.0,
                awaken_after: Some(120.0),
                attack_damage: 8.0,
            },
            strong: SourceTierConfig {
                max_hp: 250.0,
                emission_rate: 7.0,
                emission_interval: 0.5,
                dormant_duration: 60.0,
                awaken_after: Some(300.0),
                attack_damage: 15.0,
            },
        }
    }
}
