//! Match state and core simulation types
//!
//! Everything the tick mutates lives in [`MatchState`]. Modes, the AI and the
//! countdown manager read and write it but never own entities themselves.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::countdown::CountdownManager;
use super::effects::{EffectKind, EffectTable};
use crate::consts::*;
use crate::levels::{BrickDef, BrickLayout};
use crate::settings::ModeKind;

/// A player/paddle/ownership slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Horizontal sign of travel away from this side's paddle
    pub fn outward(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Ticks are suspended, no clock advance
    Paused,
    /// Solo level summary and countdown
    LevelTransition,
    /// Match ended
    GameOver,
}

/// Ghost tag carried by a ball hit by a side with a live ghost effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhostTag {
    pub side: Side,
    /// Currently invisible to the opponent
    pub hidden: bool,
}

/// Explosive tag, mirrors the owning side's live explosive effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosiveTag {
    pub side: Side,
}

/// A ball slot. Indices are stable for the whole match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Side whose paddle touched the ball last
    pub owner: Option<Side>,
    /// Side this slot serves from in the brick duels
    pub home: Side,
    pub active: bool,
    pub ghost: Option<GhostTag>,
    pub explosive: Option<ExplosiveTag>,
}

impl Ball {
    /// An inactive slot
    pub fn new(home: Side) -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            owner: None,
            home,
            active: false,
            ghost: None,
            explosive: None,
        }
    }

    /// Put the ball in play
    pub fn launch(&mut self, pos: Vec2, vel: Vec2, owner: Option<Side>) {
        self.pos = pos;
        self.vel = vel;
        self.owner = owner;
        self.active = true;
        self.ghost = None;
        self.explosive = None;
    }

    /// Take the ball out of play
    pub fn deactivate(&mut self) {
        self.active = false;
        self.vel = Vec2::ZERO;
        self.ghost = None;
        self.explosive = None;
    }

    pub fn is_visible(&self) -> bool {
        self.active && !self.ghost.is_some_and(|g| g.hidden)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Rescale the velocity, keeping direction
    pub fn set_speed(&mut self, speed: f32) {
        let dir = self.vel.normalize_or_zero();
        if dir != Vec2::ZERO && speed.is_finite() {
            self.vel = dir * speed;
        }
    }
}

/// A player's paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    /// Top edge
    pub y: f32,
    /// Derived from size effects every tick
    pub height: f32,
    /// Smoothed vertical velocity (px/tick)
    pub velocity: f32,
    /// Tick until which the paddle ignores input (0 = not frozen)
    pub frozen_until: u64,
    /// False for the missing right paddle in solo
    pub present: bool,
}

impl Paddle {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            y: PADDLE_START_Y,
            height: PADDLE_HEIGHT,
            velocity: 0.0,
            frozen_until: 0,
            present: true,
        }
    }

    /// Back to the start position and size
    pub fn reset(&mut self) {
        self.y = PADDLE_START_Y;
        self.height = PADDLE_HEIGHT;
        self.velocity = 0.0;
        self.frozen_until = 0;
    }

    /// X of the face that balls bounce off
    pub fn face_x(&self, field_width: f32) -> f32 {
        match self.side {
            Side::Left => PADDLE_INSET,
            Side::Right => field_width - PADDLE_INSET,
        }
    }

    /// X of the rectangle's left edge
    pub fn rect_x(&self, field_width: f32) -> f32 {
        match self.side {
            Side::Left => PADDLE_INSET - PADDLE_WIDTH,
            Side::Right => field_width - PADDLE_INSET,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn is_frozen(&self, now: u64) -> bool {
        now < self.frozen_until
    }

    /// Whether a point lies on the paddle rectangle
    pub fn contains(&self, point: Vec2, field_width: f32) -> bool {
        let x = self.rect_x(field_width);
        point.x >= x
            && point.x <= x + PADDLE_WIDTH
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Keep the paddle inside the field
    pub fn clamp(&mut self) {
        let max_y = (FIELD_HEIGHT - self.height).max(0.0);
        if !self.y.is_finite() || self.y < 0.0 {
            self.y = 0.0;
            self.velocity = 0.0;
        } else if self.y > max_y {
            self.y = max_y;
            self.velocity = 0.0;
        }
    }

    /// Change height and re-clamp
    pub fn set_height(&mut self, height: f32) {
        if self.height != height {
            self.height = height;
            self.clamp();
        }
    }

    /// Accelerate toward `direction * max_speed` (direction in -1..=1)
    pub fn drive(&mut self, direction: f32, max_speed: f32) {
        let target = direction * max_speed;
        self.velocity += (target - self.velocity) * PADDLE_ACCEL;
        self.y += self.velocity;
        self.clamp();
    }

    /// Move directly by `delta`, used by the AI
    pub fn nudge(&mut self, delta: f32) {
        self.velocity = delta;
        self.y += delta;
        self.clamp();
    }
}

/// Result of hitting a brick once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickHit {
    /// Indestructible or already gone
    Deflected,
    Damaged,
    Destroyed,
}

/// A brick in play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub indestructible: bool,
    pub destroyed: bool,
}

impl Brick {
    pub fn from_def(def: &BrickDef) -> Self {
        let health = if def.indestructible { def.health.max(1) } else { def.health };
        Self {
            pos: Vec2::new(def.x, def.y),
            size: Vec2::new(def.width, def.height),
            health,
            max_health: health,
            indestructible: def.indestructible,
            destroyed: false,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// One point of damage
    pub fn take_hit(&mut self) -> BrickHit {
        if self.destroyed || self.indestructible {
            return BrickHit::Deflected;
        }
        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.destroyed = true;
            BrickHit::Destroyed
        } else {
            BrickHit::Damaged
        }
    }

    /// Destroy outright (explosions). False if the brick survives.
    pub fn demolish(&mut self) -> bool {
        if self.destroyed || self.indestructible {
            return false;
        }
        self.health = 0;
        self.destroyed = true;
        true
    }
}

/// A falling bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: EffectKind,
    pub pos: Vec2,
    /// Horizontal drift toward the side that earned it
    pub vel: Vec2,
}

/// A laser shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: Side,
}

/// Things that happened during a physics pass, drained by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    PaddleHit {
        ball: usize,
        side: Side,
    },
    BrickDamaged {
        brick: usize,
        by: Option<Side>,
    },
    BrickDestroyed {
        brick: usize,
        by: Option<Side>,
        max_health: u32,
        /// Destroyed by an explosion rather than direct damage
        explosion: bool,
    },
    AllBricksCleared,
    /// A ball left the field past `side`'s paddle
    BallCrossedBoundary {
        ball: usize,
        side: Side,
    },
    PickupCaught {
        kind: EffectKind,
        side: Side,
    },
    ProjectileFired {
        side: Side,
    },
}

/// Complete mutable match state
#[derive(Debug, Clone)]
pub struct MatchState {
    pub kind: ModeKind,
    pub field_width: f32,
    pub field_height: f32,
    /// Simulation clock, advanced once per executed tick
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Left, right
    pub scores: [u32; 2],
    /// Stable-index ball slots
    pub balls: Vec<Ball>,
    /// Left, right
    pub paddles: [Paddle; 2],
    pub bricks: Vec<Brick>,
    /// Destructible bricks still standing
    pub bricks_remaining: u32,
    /// Destructible bricks in the current layout
    pub total_bricks: u32,
    pub bricks_destroyed: u32,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    /// Left, right
    pub effects: [EffectTable; 2],
    pub countdowns: CountdownManager,
    /// Pending events for the orchestrator
    pub events: Vec<SimEvent>,
    pub rng: Pcg32,
}

impl MatchState {
    pub fn new(kind: ModeKind, field_width: f32, seed: u64) -> Self {
        let mut right = Paddle::new(Side::Right);
        right.present = kind != ModeKind::Solo;

        let mut balls = Vec::with_capacity(BASE_BALL_SLOTS);
        balls.push(Ball::new(Side::Left));
        balls.push(Ball::new(Side::Right));

        Self {
            kind,
            field_width,
            field_height: FIELD_HEIGHT,
            time_ticks: 0,
            phase: GamePhase::Playing,
            scores: [0, 0],
            balls,
            paddles: [Paddle::new(Side::Left), right],
            bricks: Vec::new(),
            bricks_remaining: 0,
            total_bricks: 0,
            bricks_destroyed: 0,
            pickups: Vec::new(),
            projectiles: Vec::new(),
            effects: [EffectTable::default(), EffectTable::default()],
            countdowns: CountdownManager::default(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        &self.paddles[side.index()]
    }

    pub fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        &mut self.paddles[side.index()]
    }

    pub fn effects(&self, side: Side) -> &EffectTable {
        &self.effects[side.index()]
    }

    pub fn effects_mut(&mut self, side: Side) -> &mut EffectTable {
        &mut self.effects[side.index()]
    }

    /// Whether `kind` is live for `side` right now
    pub fn effect_live(&self, side: Side, kind: EffectKind) -> bool {
        self.effects(side).is_live(kind, self.time_ticks)
    }

    /// Replace the bricks with a new layout
    pub fn load_bricks(&mut self, layout: &BrickLayout) {
        self.bricks = layout.bricks.iter().map(Brick::from_def).collect();
        self.total_bricks = layout.destructible_count() as u32;
        self.bricks_remaining = self.total_bricks;
        self.bricks_destroyed = 0;
    }

    pub fn active_ball_count(&self) -> usize {
        self.balls.iter().filter(|b| b.active).count()
    }

    /// Drop every pickup, projectile, effect and countdown
    pub fn clear_transients(&mut self) {
        self.pickups.clear();
        self.projectiles.clear();
        self.effects = [EffectTable::default(), EffectTable::default()];
        self.countdowns.clear();
        for paddle in &mut self.paddles {
            paddle.frozen_until = 0;
        }
    }

    /// Take every ball out of play and shrink back to the base slots
    pub fn clear_balls(&mut self) {
        self.balls.truncate(BASE_BALL_SLOTS);
        for ball in &mut self.balls {
            ball.deactivate();
            ball.owner = None;
        }
    }

    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paddle_drive_clamps() {
        let mut paddle = Paddle::new(Side::Left);
        for _ in 0..200 {
            paddle.drive(-1.0, BASE_PADDLE_SPEED);
        }
        assert_eq!(paddle.y, 0.0);
        assert_eq!(paddle.velocity, 0.0);

        for _ in 0..200 {
            paddle.drive(1.0, BASE_PADDLE_SPEED);
        }
        assert_eq!(paddle.y, FIELD_HEIGHT - PADDLE_HEIGHT);
    }

    #[test]
    fn test_paddle_accelerates_smoothly() {
        let mut paddle = Paddle::new(Side::Left);
        paddle.drive(1.0, 6.0);
        assert!((paddle.velocity - 3.0).abs() < 1e-5);
        paddle.drive(1.0, 6.0);
        assert!((paddle.velocity - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_height_change_reclamps() {
        let mut paddle = Paddle::new(Side::Right);
        paddle.y = FIELD_HEIGHT - PADDLE_HEIGHT;
        paddle.set_height(PADDLE_HEIGHT * ENLARGED_PADDLE_FACTOR);
        assert_eq!(paddle.y, FIELD_HEIGHT - paddle.height);
    }

    #[test]
    fn test_indestructible_brick_never_breaks() {
        let mut brick = Brick::from_def(&BrickDef::new(0.0, 0.0, 10.0, 10.0, 1).indestructible());
        for _ in 0..1000 {
            assert_eq!(brick.take_hit(), BrickHit::Deflected);
        }
        assert!(!brick.demolish());
        assert!(!brick.destroyed);
        assert_eq!(brick.health, 1);
    }

    #[test]
    fn test_brick_damage_then_destroy() {
        let mut brick = Brick::from_def(&BrickDef::new(0.0, 0.0, 10.0, 10.0, 2));
        assert_eq!(brick.take_hit(), BrickHit::Damaged);
        assert_eq!(brick.take_hit(), BrickHit::Destroyed);
        assert_eq!(brick.take_hit(), BrickHit::Deflected);
        assert_eq!(brick.health, 0);
    }

    #[test]
    fn test_solo_has_no_right_paddle() {
        let state = MatchState::new(ModeKind::Solo, 800.0, 1);
        assert!(!state.paddle(Side::Right).present);
        assert_eq!(state.balls.len(), BASE_BALL_SLOTS);
        assert!(state.balls.iter().all(|b| !b.active));
    }

    #[test]
    fn test_set_speed_keeps_direction() {
        let mut ball = Ball::new(Side::Left);
        ball.launch(Vec2::ZERO, Vec2::new(3.0, 4.0), None);
        ball.set_speed(10.0);
        assert!((ball.vel - Vec2::new(6.0, 8.0)).length() < 1e-4);
    }
}
