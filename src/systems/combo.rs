//! Kill chain and score.

use crate::config::EngineConfig;
use crate::events::{DestroyedKind, EntityDestroyedEvent};
use crate::systems::movement::DeltaTime;
use crate::world::{ComboState, GameState};
use bevy_ecs::prelude::*;
use log::debug;

/// Decay the combo window, then score this tick's kills.
///
/// Each kill scores `score_value × multiplier` with the multiplier of the chain
/// before the kill, so the first kill of a chain scores its base value.
pub fn combo_system(
    dt: Res<DeltaTime>,
    config: Res<EngineConfig>,
    mut combo: ResMut<ComboState>,
    mut state: ResMut<GameState>,
    mut destroyed: EventReader<EntityDestroyedEvent>,
) {
    if combo.chain > 0 {
        combo.timer -= dt.0;
        if combo.timer <= 0.0 {
            debug!("combo of {} dropped", combo.chain);
            combo.chain = 0;
            combo.timer = 0.0;
        }
    }

    for event in destroyed.read() {
        let DestroyedKind::Enemy { score_value, .. } = event.kind else {
            continue;
        };
        let multiplier = combo.multiplier(config.combo_max_multiplier);
        state.score += (score_value as f32 * multiplier).round() as u64;
        state.kills += 1;
        combo.chain += 1;
        combo.timer = config.combo_window;
        combo.best_chain = combo.best_chain.max(combo.chain);
    }
}
