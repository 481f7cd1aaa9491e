//! Boss movement engine.
//!
//! A boss carries a [`BossAi`] whose `pattern` selects a pure handler. The
//! handler reads a [`PatternContext`] and returns a [`MovementResult`], which the
//! boss system writes as a `MoveIntent`; the regular movement system then
//! integrates it like any other intent. Handlers may update the boss's own AI
//! state (timers, phase flags) but never touch the player.
//!
//! Switching patterns is the boss phase system's job (see
//! `systems::boss::boss_phase_system`); this module only runs whichever pattern
//! is selected.

use crate::components::{Health, MoveIntent, SpeedStat, Transform};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Seconds between teleports.
const TELEPORT_INTERVAL: f32 = 2.5;
/// Seconds a diving boss hovers before the next dive.
const DIVE_WINDUP: f32 = 1.5;
/// Distance from the side walls where sweeping bosses turn around.
const SWEEP_MARGIN: f32 = 60.0;

/// Movement pattern identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossPattern {
    /// Sway left and right around the anchor.
    Hover,
    /// Cross the screen wall to wall at full speed.
    Sweep,
    /// Track the player's x while holding altitude.
    Chase,
    /// Trace a figure eight around the anchor.
    Figure8,
    /// Jump above the player on a cooldown.
    Teleport,
    /// Wind up, plunge toward the player's altitude, climb back.
    Dive,
}

/// Sub-state of the dive pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DiveState {
    Windup { remaining: f32 },
    Diving { target_y: f32 },
    Returning,
}

impl Default for DiveState {
    fn default() -> Self {
        Self::Windup { remaining: DIVE_WINDUP }
    }
}

/// Boss-local AI state.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossAi {
    pub kind: BossKind,
    pub pattern: BossPattern,
    /// Index of the active phase in the boss profile.
    pub phase: usize,
    /// Seconds spent in the current pattern.
    pub pattern_time: f32,
    /// Home position the patterns orbit around.
    pub anchor_x: f32,
    pub anchor_y: f32,
    /// +1 or -1 for sweeping bosses.
    pub sweep_direction: f32,
    pub teleport_cooldown: f32,
    pub dive: DiveState,
    /// Logic-level speed modifier of the active phase.
    pub speed_modifier: f32,
}

impl BossAi {
    pub fn new(kind: BossKind, pattern: BossPattern, anchor_x: f32, anchor_y: f32) -> Self {
        Self {
            kind,
            pattern,
            phase: 0,
            pattern_time: 0.0,
            anchor_x,
            anchor_y,
            sweep_direction: 1.0,
            teleport_cooldown: TELEPORT_INTERVAL,
            dive: DiveState::default(),
            speed_modifier: 1.0,
        }
    }

    /// Switch to another pattern, resetting pattern-local timers.
    pub fn switch_pattern(&mut self, pattern: BossPattern) {
        if self.pattern != pattern {
            self.pattern = pattern;
            self.pattern_time = 0.0;
            self.teleport_cooldown = TELEPORT_INTERVAL;
            self.dive = DiveState::default();
        }
    }
}

/// Inputs of a pattern handler.
pub struct PatternContext<'a> {
    /// Seconds since the game started.
    pub elapsed: f32,
    /// Seconds since the previous tick.
    pub dt: f32,
    pub boss: &'a Transform,
    pub player: Option<&'a Transform>,
    pub ai: &'a mut BossAi,
    pub health: Option<&'a Health>,
    /// Phase speed multiplier. Status slows are not folded in: `movement_system`
    /// scales velocity results by `Slowed`, offset results (figure eight,
    /// teleport) are positional and ignore it.
    pub speed_modifier: f32,
    pub speed: &'a SpeedStat,
    /// Playfield width and height.
    pub bounds: (f32, f32),
}

/// Output of a pattern handler, interpreted exactly like a `MoveIntent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementResult {
    Velocity { dx: f32, dy: f32 },
    Offset { dx: f32, dy: f32 },
}

impl MovementResult {
    pub const IDLE: MovementResult = MovementResult::Velocity { dx: 0.0, dy: 0.0 };

    pub fn into_intent(self) -> MoveIntent {
        match self {
            MovementResult::Velocity { dx, dy } => MoveIntent::velocity(dx, dy),
            MovementResult::Offset { dx, dy } => MoveIntent::offset(dx, dy),
        }
    }
}

pub type PatternHandler = fn(&mut PatternContext) -> MovementResult;

impl BossPattern {
    pub fn handler(self) -> PatternHandler {
        match self {
            BossPattern::Hover => hover,
            BossPattern::Sweep => sweep,
            BossPattern::Chase => chase,
            BossPattern::Figure8 => figure8,
            BossPattern::Teleport => teleport,
            BossPattern::Dive => dive,
        }
    }
}

/// Run the selected pattern and advance its clock.
pub fn run_pattern(ctx: &mut PatternContext) -> MovementResult {
    let result = (ctx.ai.pattern.handler())(ctx);
    ctx.ai.pattern_time += ctx.dt;
    result
}

/// Velocity toward a point: unit direction, eased inside `ease` pixels.
fn steer_toward(from: &Transform, x: f32, y: f32, ease: f32, modifier: f32) -> MovementResult {
    let dx = x - from.x;
    let dy = y - from.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist < 0.001 {
        return MovementResult::IDLE;
    }
    let scale = (dist / ease).min(1.0) * modifier / dist;
    MovementResult::Velocity { dx: dx * scale, dy: dy * scale }
}

fn hover(ctx: &mut PatternContext) -> MovementResult {
    let t = ctx.ai.pattern_time;
    let target_x = ctx.ai.anchor_x + (ctx.bounds.0 * 0.25) * (t * 0.8).sin();
    steer_toward(ctx.boss, target_x, ctx.ai.anchor_y, 40.0, ctx.speed_modifier)
}

fn sweep(ctx: &mut PatternContext) -> MovementResult {
    let (width, _) = ctx.bounds;
    if ctx.boss.x <= SWEEP_MARGIN {
        ctx.ai.sweep_direction = 1.0;
    } else if ctx.boss.x >= width - SWEEP_MARGIN {
        ctx.ai.sweep_direction = -1.0;
    }
    let dy = ((ctx.ai.anchor_y - ctx.boss.y) / 40.0).clamp(-1.0, 1.0);
    MovementResult::Velocity {
        dx: ctx.ai.sweep_direction * ctx.speed_modifier,
        dy: dy * ctx.speed_modifier,
    }
}

fn chase(ctx: &mut PatternContext) -> MovementResult {
    match ctx.player {
        Some(player) => steer_toward(ctx.boss, player.x, ctx.ai.anchor_y, 30.0, ctx.speed_modifier),
        None => MovementResult::IDLE,
    }
}

fn figure8_point(ai: &BossAi, bounds: (f32, f32), t: f32) -> (f32, f32) {
    let a = bounds.0 * 0.3;
    let b = bounds.1 * 0.08;
    (ai.anchor_x + a * t.sin(), ai.anchor_y + b * (2.0 * t).sin())
}

fn figure8(ctx: &mut PatternContext) -> MovementResult {
    // Angular speed derived from the linear cap so the path respects SpeedStat.
    let omega = (ctx.speed.max_linear / (ctx.bounds.0 * 0.3).max(1.0)) * ctx.speed_modifier;
    let t0 = ctx.ai.pattern_time * omega;
    let t1 = (ctx.ai.pattern_time + ctx.dt) * omega;
    let (x0, y0) = figure8_point(ctx.ai, ctx.bounds, t0);
    let (x1, y1) = figure8_point(ctx.ai, ctx.bounds, t1);
    MovementResult::Offset { dx: x1 - x0, dy: y1 - y0 }
}

fn teleport(ctx: &mut PatternContext) -> MovementResult {
    ctx.ai.teleport_cooldown -= ctx.dt * ctx.speed_modifier.max(0.0);
    if ctx.ai.teleport_cooldown > 0.0 {
        return MovementResult::IDLE;
    }
    ctx.ai.teleport_cooldown = TELEPORT_INTERVAL;
    let Some(player) = ctx.player else {
        return MovementResult::IDLE;
    };
    let x = player.x.clamp(SWEEP_MARGIN, (ctx.bounds.0 - SWEEP_MARGIN).max(SWEEP_MARGIN));
    MovementResult::Offset {
        dx: x - ctx.boss.x,
        dy: ctx.ai.anchor_y - ctx.boss.y,
    }
}

fn dive(ctx: &mut PatternContext) -> MovementResult {
    match ctx.ai.dive {
        DiveState::Windup { remaining } => {
            let remaining = remaining - ctx.dt;
            if remaining > 0.0 {
                ctx.ai.dive = DiveState::Windup { remaining };
                return steer_toward(ctx.boss, ctx.ai.anchor_x, ctx.ai.anchor_y, 30.0, ctx.speed_modifier);
            }
            let floor = ctx.bounds.1 * 0.7;
            let target_y = ctx.player.map(|p| p.y.min(floor)).unwrap_or(floor);
            ctx.ai.dive = DiveState::Diving { target_y };
            MovementResult::IDLE
        }
        DiveState::Diving { target_y } => {
            if ctx.boss.y >= target_y - 4.0 {
                ctx.ai.dive = DiveState::Returning;
                return MovementResult::IDLE;
            }
            let dx = ctx.player.map(|p| ((p.x - ctx.boss.x) / 80.0).clamp(-0.5, 0.5)).unwrap_or(0.0);
            MovementResult::Velocity {
                dx: dx * ctx.speed_modifier,
                dy: 1.5 * ctx.speed_modifier,
            }
        }
        DiveState::Returning => {
            if ctx.boss.distance_to_point(ctx.ai.anchor_x, ctx.ai.anchor_y) < 4.0 {
                ctx.ai.dive = DiveState::default();
                return MovementResult::IDLE;
            }
            steer_toward(ctx.boss, ctx.ai.anchor_x, ctx.ai.anchor_y, 10.0, ctx.speed_modifier)
        }
    }
}

// ============================================================================
// PATTERN REGISTRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Dreadnought,
    Wraith,
}

/// One phase of a boss fight: active while hp fraction is at or below `hp_fraction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossPhase {
    pub hp_fraction: f32,
    pub pattern: BossPattern,
    pub speed_modifier: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossProfile {
    pub kind: BossKind,
    pub max_hp: f32,
    pub size: f32,
    pub speed: SpeedStat,
    pub score_value: u32,
    /// `(interval, bullet_speed, damage)` of the boss gun.
    pub gun: (f32, f32, f32),
    /// Sorted by descending `hp_fraction`; the first entry must be 1.0.
    pub phases: Vec<BossPhase>,
}

impl BossProfile {
    /// Phase index for a given hp fraction: the last phase whose threshold is reached.
    pub fn phase_for(&self, hp_fraction: f32) -> Option<(usize, &BossPhase)> {
        self.phases
            .iter()
            .enumerate()
            .filter(|(_, p)| hp_fraction <= p.hp_fraction)
            .last()
    }
}

/// Boss pattern registry: static data, keyed by boss kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossRegistry {
    pub profiles: Vec<BossProfile>,
}

impl Default for BossRegistry {
    fn default() -> Self {
        let phase = |hp_fraction, pattern, speed_modifier| BossPhase { hp_fraction, pattern, speed_modifier };
        Self {
            profiles: vec![
                BossProfile {
                    kind: BossKind::Dreadnought,
                    max_hp: 1500.0,
                    size: 96.0,
                    speed: SpeedStat::new(120.0, std::f32::consts::PI),
                    score_value: 2000,
                    gun: (0.9, 4.5, 12.0),
                    phases: vec![
                        phase(1.0, BossPattern::Hover, 1.0),
                        phase(0.66, BossPattern::Sweep, 1.0),
                        phase(0.33, BossPattern::Dive, 1.3),
                    ],
                },
                BossProfile {
                    kind: BossKind::Wraith,
                    max_hp: 1100.0,
                    size: 72.0,
                    speed: SpeedStat::new(160.0, std::f32::consts::TAU),
                    score_value: 2500,
                    gun: (0.7, 5.0, 10.0),
                    phases: vec![
                        phase(1.0, BossPattern::Figure8, 1.0),
                        phase(0.6, BossPattern::Chase, 1.1),
                        phase(0.3, BossPattern::Teleport, 1.5),
                    ],
                },
            ],
        }
    }
}

impl BossRegistry {
    pub fn get(&self, kind: BossKind) -> Option<&BossProfile> {
        self.profiles.iter().find(|p| p.kind == kind)
    }

    /// Boss kinds cycle with the level.
    pub fn for_level(&self, level: u32) -> Option<&BossProfile> {
        if self.profiles.is_empty() {
            return None;
        }
        let index = (level.saturating_sub(2) as usize) % self.profiles.len();
        self.profiles.get(index)
    }

    pub fn validate(&self) -> Result<(), String> {
        for profile in &self.profiles {
            let first = profile.phases.first().ok_or_else(|| format!("{:?} has no phases", profile.kind))?;
            if first.hp_fraction < 1.0 {
                return Err(format!("{:?} first phase must start at full health", profile.kind));
            }
            if profile.phases.windows(2).any(|w| w[1].hp_fraction >= w[0].hp_fraction) {
                return Err(format!("{:?} phases must have descending thresholds", profile.kind));
            }
            if !(profile.max_hp > 0.0) {
                return Err(format!("{:?} needs positive hp", profile.kind));
            }
        }
        Ok(())
    }
}
