//! Movement system - resolves single-tick move intents into positions.

use crate::components::*;
use crate::world::GameState;
use bevy_ecs::prelude::*;
use log::warn;
use std::f32::consts::{PI, TAU};

/// Milliseconds of one reference frame; projectile velocities are expressed per frame.
pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

/// Resource containing the delta time for the current tick, in seconds.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct DeltaTime(pub f32);

impl DeltaTime {
    pub fn from_millis(ms: f32) -> Self {
        Self(ms / 1000.0)
    }

    /// Number of 60 Hz reference frames this tick spans.
    pub fn frame_scale(&self) -> f32 {
        self.0 * 1000.0 / REFERENCE_FRAME_MS
    }
}

/// Shortest signed angle from `from` to `to`, in `-PI..=PI`.
fn angle_delta(from: f32, to: f32) -> f32 {
    let mut d = (to - from) % TAU;
    if d > PI {
        d -= TAU;
    } else if d < -PI {
        d += TAU;
    }
    d
}

/// System that consumes every `MoveIntent`.
///
/// `velocity` intents longer than 1 are normalized, then scaled by
/// `max_linear * dt` and any `Slowed` factor. `offset` intents are applied
/// verbatim. The intent is removed in every branch, malformed ones included.
/// Player-controlled entities are clamped into the playfield.
pub fn movement_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    state: Option<Res<GameState>>,
    mut query: Query<(
        Entity,
        &MoveIntent,
        &mut Transform,
        Option<&SpeedStat>,
        Option<&Collider>,
        Option<&Slowed>,
        Has<PlayerControlled>,
    )>,
) {
    let delta = dt.0;
    for (entity, intent, mut transform, speed, collider, slowed, is_player) in query.iter_mut() {
        commands.entity(entity).remove::<MoveIntent>();

        if !intent.is_finite() {
            warn!("dropping non-finite move intent on {entity:?}: {intent:?}");
            continue;
        }

        match intent.kind {
            MoveKind::Velocity => {
                let Some(speed) = speed else {
                    continue;
                };
                let mut dir = Velocity::new(intent.dx, intent.dy);
                if dir.magnitude() > 1.0 {
                    dir = dir.normalized();
                }
                let factor = slowed.map(|s| s.factor.clamp(0.0, 1.0)).unwrap_or(1.0);
                let step = speed.max_linear * delta * factor;
                transform.x += dir.vx * step;
                transform.y += dir.vy * step;

                if !is_player && dir.magnitude() > 0.0 {
                    let max_turn = speed.max_angular * delta;
                    let turn = angle_delta(transform.rotation, dir.heading());
                    transform.rotation += turn.clamp(-max_turn, max_turn);
                }
            }
            MoveKind::Offset => {
                transform.x += intent.dx;
                transform.y += intent.dy;
            }
            MoveKind::Unknown => {
                warn!("dropping move intent of unknown kind on {entity:?}");
                continue;
            }
        }

        if is_player {
            if let Some(state) = state.as_deref() {
                clamp_to_playfield(&mut transform, collider, state);
            }
        }
    }
}

/// Clamp a position into `[hw, width - hw] x [hh, height - hh]`.
pub fn clamp_to_playfield(transform: &mut Transform, collider: Option<&Collider>, state: &GameState) {
    let (hw, hh) = collider.map(|c| (c.half_width, c.half_height)).unwrap_or((0.0, 0.0));
    let max_x = (state.width - hw).max(hw);
    let max_y = (state.height - hh).max(hh);
    transform.x = transform.x.clamp(hw, max_x);
    transform.y = transform.y.clamp(hh, max_y);
}
