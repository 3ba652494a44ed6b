//! Timed effects per side
//!
//! Each side owns an [`EffectTable`] keyed by [`EffectKind`]. Catching a pickup
//! creates an entry or extends a live one; the sweep drops expired entries and
//! everything derived from effects (paddle height, ball tags, ghost
//! visibility, ball speed) is recomputed from the tables every tick.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Ball, ExplosiveTag, GhostTag, MatchState, Projectile, Side, SimEvent};
use crate::consts::*;
use crate::secs_to_ticks;
use crate::settings::ModeKind;

/// Effect kinds (also the pickup kinds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Enlarge,
    MultiBall,
    Laser,
    Slow,
    Ghost,
    Explosive,
    Reverse,
    Shrink,
}

impl EffectKind {
    pub const ALL: [EffectKind; 8] = [
        EffectKind::Enlarge,
        EffectKind::MultiBall,
        EffectKind::Laser,
        EffectKind::Slow,
        EffectKind::Ghost,
        EffectKind::Explosive,
        EffectKind::Reverse,
        EffectKind::Shrink,
    ];

    /// Kinds that make sense without an opponent
    pub const SOLO_POOL: [EffectKind; 5] = [
        EffectKind::Enlarge,
        EffectKind::MultiBall,
        EffectKind::Laser,
        EffectKind::Explosive,
        EffectKind::Shrink,
    ];

    fn index(self) -> usize {
        match self {
            EffectKind::Enlarge => 0,
            EffectKind::MultiBall => 1,
            EffectKind::Laser => 2,
            EffectKind::Slow => 3,
            EffectKind::Ghost => 4,
            EffectKind::Explosive => 5,
            EffectKind::Reverse => 6,
            EffectKind::Shrink => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Enlarge => "enlarge",
            EffectKind::MultiBall => "multi_ball",
            EffectKind::Laser => "laser",
            EffectKind::Slow => "slow",
            EffectKind::Ghost => "ghost",
            EffectKind::Explosive => "explosive",
            EffectKind::Reverse => "reverse",
            EffectKind::Shrink => "shrink",
        }
    }

    /// Base duration, also the amount a re-catch extends by
    pub fn duration_ticks(self, solo: bool) -> u64 {
        let secs = match self {
            EffectKind::Enlarge => 10.0,
            EffectKind::MultiBall => 15.0,
            EffectKind::Laser if solo => 6.0,
            EffectKind::Laser => 3.0,
            EffectKind::Slow => 7.0,
            EffectKind::Ghost => 10.0,
            EffectKind::Explosive => 10.0,
            EffectKind::Reverse => 8.0,
            EffectKind::Shrink => 12.0,
        };
        secs_to_ticks(secs)
    }

    /// Debuffs land on the catcher's opponent
    pub fn targets_opponent(self) -> bool {
        matches!(self, EffectKind::Slow | EffectKind::Reverse)
    }

    /// Side whose table receives the effect when `catcher` catches it
    pub fn target(self, catcher: Side) -> Side {
        if self.targets_opponent() {
            catcher.opponent()
        } else {
            catcher
        }
    }
}

/// A live (or not yet swept) effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub start_tick: u64,
    pub duration: u64,
    /// Last laser shot (laser only)
    pub last_shot: u64,
}

impl Effect {
    pub fn is_live(&self, now: u64) -> bool {
        now.saturating_sub(self.start_tick) < self.duration
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.duration
            .saturating_sub(now.saturating_sub(self.start_tick))
    }

    /// 1.0 when fresh, 0.0 when expired
    pub fn remaining_fraction(&self, now: u64) -> f32 {
        if self.duration == 0 {
            return 0.0;
        }
        self.remaining(now) as f32 / self.duration as f32
    }
}

/// Whether a catch created a new entry or extended a live one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Extended,
}

/// Effects for one side, one slot per kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTable {
    slots: [Option<Effect>; 8],
}

impl EffectTable {
    pub fn get(&self, kind: EffectKind) -> Option<&Effect> {
        self.slots[kind.index()].as_ref()
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> Option<&mut Effect> {
        self.slots[kind.index()].as_mut()
    }

    pub fn is_live(&self, kind: EffectKind, now: u64) -> bool {
        self.get(kind).is_some_and(|e| e.is_live(now))
    }

    /// Create the effect, or extend it by `amount` if it is still live
    pub fn apply(&mut self, kind: EffectKind, now: u64, amount: u64) -> Applied {
        let slot = &mut self.slots[kind.index()];
        match slot {
            Some(effect) if effect.is_live(now) => {
                effect.duration += amount;
                Applied::Extended
            }
            _ => {
                *slot = Some(Effect {
                    kind,
                    start_tick: now,
                    duration: amount,
                    last_shot: now,
                });
                Applied::Created
            }
        }
    }

    pub fn remove(&mut self, kind: EffectKind) -> Option<Effect> {
        self.slots[kind.index()].take()
    }

    /// Drop expired entries, returning their kinds
    pub fn sweep(&mut self, now: u64) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|e| !e.is_live(now)) {
                if let Some(effect) = slot.take() {
                    expired.push(effect.kind);
                }
            }
        }
        expired
    }

    /// Entries that are live at `now`, in kind order
    pub fn live(&self, now: u64) -> impl Iterator<Item = &Effect> + '_ {
        self.slots.iter().flatten().filter(move |e| e.is_live(now))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Apply a caught pickup for `catcher`
pub fn apply_pickup(state: &mut MatchState, kind: EffectKind, catcher: Side) {
    let now = state.time_ticks;
    let target = kind.target(catcher);
    let amount = kind.duration_ticks(state.kind == ModeKind::Solo);

    if kind == EffectKind::Shrink && state.effect_live(target, EffectKind::Enlarge) {
        // Shrink cancels a live enlarge instead of stacking
        state.effects_mut(target).remove(EffectKind::Enlarge);
        log::debug!("{} shrink cancelled enlarge", target.as_str());
    } else {
        let applied = state.effects_mut(target).apply(kind, now, amount);
        log::debug!(
            "{} caught {} -> {} ({:?})",
            catcher.as_str(),
            kind.as_str(),
            target.as_str(),
            applied
        );
    }

    match kind {
        EffectKind::MultiBall => {
            spawn_extra_ball(state, catcher);
        }
        EffectKind::Slow => {
            for ball in state.balls.iter_mut().filter(|b| b.active && b.owner == Some(target)) {
                ball.vel *= SLOW_FACTOR;
            }
        }
        EffectKind::Ghost => {
            for ball in state.balls.iter_mut().filter(|b| b.active && b.owner == Some(catcher)) {
                ball.ghost = Some(GhostTag {
                    side: catcher,
                    hidden: false,
                });
            }
        }
        EffectKind::Explosive => refresh_explosive_tags(state),
        _ => {}
    }

    update_paddle_heights(state);
    state.push_event(SimEvent::PickupCaught { kind, side: catcher });
}

/// Put one more ball in play in front of `side`'s paddle. Returns its index.
pub fn spawn_extra_ball(state: &mut MatchState, side: Side) -> usize {
    let free = state
        .balls
        .iter()
        .enumerate()
        .find(|(i, b)| !b.active && !state.countdowns.is_pending(*i))
        .map(|(i, _)| i);
    let index = match free {
        Some(i) => i,
        None => {
            state.balls.push(Ball::new(side));
            state.balls.len() - 1
        }
    };

    let paddle = state.paddle(side);
    let pos = Vec2::new(
        paddle.face_x(state.field_width) + side.outward() * (BALL_RADIUS + 2.0),
        paddle.center_y(),
    );

    // Keep clear of flat and near-vertical launches
    let angle = state.rng.random_range(20.0..60.0_f32) * PI / 180.0;
    let vy_sign = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let vel = Vec2::new(side.outward() * angle.cos(), vy_sign * angle.sin()) * BASE_BALL_SPEED;

    let ball = &mut state.balls[index];
    if index >= BASE_BALL_SLOTS {
        ball.home = side;
    }
    ball.launch(pos, vel, Some(side));
    log::debug!("Extra ball {} for {}", index, side.as_str());
    index
}

/// Explosive tag a ball should carry given its owner
pub(crate) fn explosive_side(state: &MatchState, owner: Option<Side>) -> Option<Side> {
    if state.kind == ModeKind::Solo {
        // Solo tags every ball while the player's effect is live
        return state
            .effect_live(Side::Left, EffectKind::Explosive)
            .then_some(Side::Left);
    }
    owner.filter(|side| state.effect_live(*side, EffectKind::Explosive))
}

/// Align explosive tags with live explosive effects
pub fn refresh_explosive_tags(state: &mut MatchState) {
    let tags: Vec<Option<ExplosiveTag>> = state
        .balls
        .iter()
        .map(|b| {
            if b.active {
                explosive_side(state, b.owner).map(|side| ExplosiveTag { side })
            } else {
                None
            }
        })
        .collect();
    for (ball, tag) in state.balls.iter_mut().zip(tags) {
        ball.explosive = tag;
    }
}

/// Hide ghost balls mid-flight, reveal them (for good) near the target paddle
pub fn update_ghost_visibility(state: &mut MatchState) {
    let width = state.field_width;
    let faces = [
        state.paddles[0].face_x(width),
        state.paddles[1].face_x(width),
    ];
    for ball in state.balls.iter_mut().filter(|b| b.active) {
        let Some(tag) = ball.ghost else {
            continue;
        };
        let distance = (ball.pos.x - faces[tag.side.opponent().index()]).abs();
        if distance < GHOST_INNER_DISTANCE {
            ball.ghost = None;
        } else {
            ball.ghost = Some(GhostTag {
                side: tag.side,
                hidden: distance < width * GHOST_OUTER_FRACTION,
            });
        }
    }
}

/// Undo lingering slowdowns once no slow effect is live
pub fn restore_ball_speed(state: &mut MatchState) {
    if Side::BOTH.iter().any(|s| state.effect_live(*s, EffectKind::Slow)) {
        return;
    }
    let threshold = BASE_BALL_SPEED * SPEED_RESTORE_THRESHOLD;
    for ball in state.balls.iter_mut().filter(|b| b.active) {
        let speed = ball.speed();
        if speed > 0.0 && speed < threshold {
            ball.set_speed(BASE_BALL_SPEED);
        }
    }
}

/// Paddle height from size effects. Shrink is checked first.
pub fn paddle_height(state: &MatchState, side: Side) -> f32 {
    if state.effect_live(side, EffectKind::Shrink) {
        PADDLE_HEIGHT * SHRUNK_PADDLE_FACTOR
    } else if state.effect_live(side, EffectKind::Enlarge) {
        PADDLE_HEIGHT * ENLARGED_PADDLE_FACTOR
    } else {
        PADDLE_HEIGHT
    }
}

pub fn update_paddle_heights(state: &mut MatchState) {
    for side in Side::BOTH {
        let height = paddle_height(state, side);
        state.paddle_mut(side).set_height(height);
    }
}

/// Movement multiplier for a side's paddle (human or AI)
pub fn speed_factor(state: &MatchState, side: Side) -> f32 {
    if state.effect_live(side, EffectKind::Slow) {
        SLOW_FACTOR
    } else {
        1.0
    }
}

pub fn controls_reversed(state: &MatchState, side: Side) -> bool {
    state.effect_live(side, EffectKind::Reverse)
}

/// Fire lasers for every side whose interval has elapsed
pub fn auto_fire(state: &mut MatchState) {
    let now = state.time_ticks;
    for side in Side::BOTH {
        if !state.paddle(side).present {
            continue;
        }
        let fire = match state.effects_mut(side).get_mut(EffectKind::Laser) {
            Some(effect)
                if effect.is_live(now)
                    && now.saturating_sub(effect.last_shot) >= LASER_INTERVAL_TICKS =>
            {
                effect.last_shot = now;
                true
            }
            _ => false,
        };
        if fire {
            let paddle = state.paddle(side);
            let projectile = Projectile {
                pos: Vec2::new(paddle.face_x(state.field_width), paddle.center_y()),
                vel: Vec2::new(side.outward() * PROJECTILE_SPEED, 0.0),
                owner: side,
            };
            state.projectiles.push(projectile);
            state.push_event(SimEvent::ProjectileFired { side });
        }
    }
}

/// Expiry sweep plus every effect-derived value
pub fn update_effects(state: &mut MatchState) {
    let now = state.time_ticks;
    for side in Side::BOTH {
        for kind in state.effects_mut(side).sweep(now) {
            log::debug!("{} {} expired", side.as_str(), kind.as_str());
        }
    }
    refresh_explosive_tags(state);
    update_ghost_visibility(state);
    restore_ball_speed(state);
    update_paddle_heights(state);
}
