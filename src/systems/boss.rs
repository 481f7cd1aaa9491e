//! Boss phase selection and pattern-driven movement.

use crate::boss::{run_pattern, BossAi, PatternContext};
use crate::components::*;
use crate::config::GameData;
use crate::systems::movement::DeltaTime;
use crate::world::GameState;
use bevy_ecs::prelude::*;
use log::debug;

/// Select the boss phase from the current hp fraction and switch patterns on change.
pub fn boss_phase_system(data: Res<GameData>, mut bosses: Query<(Entity, &mut BossAi, &Health), Without<MarkedForDeletion>>) {
    for (entity, mut ai, health) in bosses.iter_mut() {
        let Some(profile) = data.bosses.get(ai.kind) else {
            continue;
        };
        let Some((index, phase)) = profile.phase_for(health.fraction()) else {
            continue;
        };
        if index == ai.phase && ai.pattern == phase.pattern {
            continue;
        }
        debug!(
            "{:?} {entity:?} enters phase {index} ({:?}) at {:.0}% hp",
            ai.kind,
            phase.pattern,
            health.fraction() * 100.0
        );
        ai.phase = index;
        ai.speed_modifier = phase.speed_modifier;
        ai.switch_pattern(phase.pattern);
    }
}

/// Run each boss's active pattern and publish the result as a `MoveIntent`.
pub fn boss_movement_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    state: Res<GameState>,
    players: Query<&Transform, (With<PlayerControlled>, Without<BossAi>)>,
    mut bosses: Query<(Entity, &Transform, &mut BossAi, &SpeedStat, Option<&Health>), Without<MarkedForDeletion>>,
) {
    let player = players.iter().next();

    for (entity, at, mut ai, speed, health) in bosses.iter_mut() {
        if health.is_some_and(|h| !h.is_alive()) {
            continue;
        }
        let speed_modifier = ai.speed_modifier;
        let mut ctx = PatternContext {
            elapsed: state.elapsed,
            dt: dt.0,
            boss: at,
            player,
            ai: &mut *ai,
            health,
            speed_modifier,
            speed,
            bounds: (state.width, state.height),
        };
        let result = run_pattern(&mut ctx);
        commands.entity(entity).insert(result.into_intent());
    }
}
