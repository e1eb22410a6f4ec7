//! Basic demonstration of the Rootbound simulation.
//!
//! Run with: cargo run --example basic_demo

use rootbound_sim::{ComponentSet, GridPos, PollutionKind, SimWorld, SourceTier};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Rootbound - Grid Ecology Demo ===\n");

    let mut sim = SimWorld::new();

    // One heart in the south-west corner, two pollution sources to fight.
    sim.place_heart(GridPos::new(4, 4), ComponentSet::new(3, 3, 3))
        .unwrap();
    sim.place_source(GridPos::new(20, 20), PollutionKind::Toxic, SourceTier::Weak)
        .unwrap();
    sim.place_source(GridPos::new(8, 24), PollutionKind::Acidic, SourceTier::Medium)
        .unwrap();

    println!("Initial state:");
    print_snapshot(&mut sim);

    // 120 ticks at 0.5s each is a minute of simulation time.
    println!("\nRunning simulation for 120 ticks...\n");
    for tick in 0..120 {
        sim.advance_tick();

        if (tick + 1) % 20 == 0 {
            println!(
                "--- Tick {} (t={:.1}s) ---",
                sim.current_tick(),
                sim.current_time()
            );
            print_snapshot(&mut sim);
        }
    }

    // Final snapshot as JSON
    println!("\n=== Final State (JSON) ===\n");
    println!("{}", sim.snapshot().to_json_pretty().unwrap());
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();

    println!(
        "  Energy: {:.1} / {:.1}",
        snapshot.energy.current, snapshot.energy.max
    );

    println!("  Plant nodes ({}):", snapshot.plants.len());
    for plant in snapshot.plants.iter().take(8) {
        println!(
            "    Node {}: pos=({}, {}) [{}] atk={:.1} extract={:.1} store={:.1}{}",
            plant.id,
            plant.x,
            plant.y,
            plant.phase,
            plant.attack_damage,
            plant.extraction_rate,
            plant.energy_storage,
            if plant.is_heart { " (heart)" } else { "" }
        );
    }
    if snapshot.plants.len() > 8 {
        println!("    ... and {} more", snapshot.plants.len() - 8);
    }

    println!("  Pollution tiles: {}", snapshot.tiles.len());
    println!("  Sources:");
    for source in &snapshot.sources {
        println!(
            "    Source {}: pos=({}, {}) {} {} [{}] hp={:.0}/{:.0} rate={:.1}",
            source.id,
            source.x,
            source.y,
            source.tier,
            source.kind,
            source.state,
            source.hp,
            source.hp_max,
            source.emission_rate
        );
    }
}
