//! Tick-phase systems for the Rootbound simulation.
//!
//! Each phase is an exclusive system over the whole world; the schedule
//! chains them so every tick runs the same total order:
//!
//! 1. `growth_phase` - buds pay upkeep, advance, transition to Grown and
//!    auto-sprout.
//! 2. `bud_overwhelm_phase` - pollution pushes back against buds, which
//!    defend with their parent's live stats.
//! 3. `extraction_phase` then `grown_overwhelm_phase` - grown nodes harvest
//!    adjacent pollution, then face the same check themselves.
//! 4. `pollution_phase` - source dormancy/awakening timers, emission pulses,
//!    and tile spread.
//! 5. `decay_phase` - freeze countdowns and far-tile decay.
//!
//! Within a phase, entities are visited in stable-id (plants, sources) or
//! row-major position (tiles) order, so a run is reproducible.

pub mod combat;
pub mod events;
pub mod extraction;
pub mod growth;
pub mod pollution;

pub use combat::{bud_overwhelm_phase, grown_overwhelm_phase};
pub use events::{ChangeBuffer, ChangeEvent};
pub use extraction::extraction_phase;
pub use growth::growth_phase;
pub use pollution::{decay_phase, pollution_phase};
