//! Basic demonstration of the Skyfire simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set RUST_LOG=debug to see waves, combos and boss phases as they happen.

use skyfire_sim::{GameWorld, MoveIntent, Snapshot, WeaponType};

const FRAME_MS: f32 = 1000.0 / 60.0;

fn main() {
    env_logger::init();
    println!("=== Skyfire - Simulation Demo ===\n");

    let mut game = GameWorld::new();
    game.enable_profiling();
    let width = game.state().width;
    let height = game.state().height;
    game.spawn_player(width / 2.0, height - 80.0, WeaponType::Vulcan);
    game.set_fire(true);

    // Sweep left and right across the bottom of the screen for 30 seconds.
    println!("Running 1800 frames (30 seconds at 60 fps)...\n");
    for frame in 0..1800u32 {
        let dx = if (frame / 120) % 2 == 0 { 1.0 } else { -1.0 };
        game.set_player_intent(MoveIntent::velocity(dx, 0.0));
        game.tick(FRAME_MS);

        let events = game.drain_events();
        for synergy in &events.synergies {
            println!("  frame {frame}: synergy {:?}", synergy.effect.synergy);
        }
        for collected in &events.powerups {
            println!("  frame {frame}: collected powerup {:?}", collected.powerup);
        }

        if (frame + 1) % 300 == 0 {
            print_snapshot(&game.snapshot());
        }
        if game.state().game_over {
            println!("\n--- Player destroyed at frame {frame} ---");
            break;
        }
    }

    if let Some(profiler) = game.disable_profiling() {
        println!("\n{}", profiler.summary());
    }

    println!("=== Final State (JSON) ===\n");
    match game.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot serialization failed: {err}"),
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "--- Tick {} (t={:.1}s) level {} score {} combo {} ---",
        snapshot.tick, snapshot.time, snapshot.level, snapshot.score, snapshot.combo
    );
    if let Some(player) = &snapshot.player {
        println!(
            "  Player: pos=({:.0}, {:.0}) hp={:.0}/{:.0} shield={} weapons={:?}",
            player.x, player.y, player.health, player.health_max, player.shield_charges, player.weapons
        );
    }
    for enemy in &snapshot.enemies {
        println!(
            "  {:?} #{}: pos=({:.0}, {:.0}) hp={:.0}/{:.0}{}",
            enemy.kind,
            enemy.id,
            enemy.x,
            enemy.y,
            enemy.health,
            enemy.health_max,
            enemy.pattern.map(|p| format!(" pattern={p:?}")).unwrap_or_default()
        );
    }
    println!(
        "  {} projectiles, {} areas, {} powerups\n",
        snapshot.projectiles.len(),
        snapshot.areas.len(),
        snapshot.powerups.len()
    );
}
