//! Computer opponent
//!
//! Re-acquires a target on a fixed reaction delay, optionally predicting where
//! the ball will cross the paddle plane, and moves toward it at a capped speed.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::effects::speed_factor;
use super::state::{Ball, MatchState, Side};
use crate::consts::*;
use crate::mirror_into_range;

/// Difficulty at which the AI can track hidden ghost balls
pub const GHOST_SIGHT_DIFFICULTY: u8 = 4;

/// Dead zone around the target, avoids jitter
const TARGET_TOLERANCE: f32 = 5.0;

/// Tunables for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Max movement per tick
    pub speed: f32,
    /// Ticks between target updates
    pub reaction_ticks: u64,
    /// Chance to aim off by up to half a paddle
    pub error_chance: f32,
    /// Chance to predict the intercept instead of chasing the ball's y
    pub prediction_accuracy: f32,
}

impl AiProfile {
    /// Profile for difficulty 1-5 (clamped)
    pub fn for_difficulty(difficulty: u8) -> Self {
        let (speed, reaction_ticks, error_chance, prediction_accuracy) =
            match difficulty.clamp(1, 5) {
                1 => (2.0, 18, 0.3, 0.3),
                2 => (3.0, 12, 0.2, 0.5),
                3 => (4.0, 9, 0.1, 0.7),
                4 => (5.0, 6, 0.05, 0.85),
                _ => (6.0, 3, 0.02, 0.95),
            };
        Self {
            speed,
            reaction_ticks,
            error_chance,
            prediction_accuracy,
        }
    }
}

/// Where a ball will cross `face_x`, folding wall bounces back into range
pub fn predict_intercept_y(pos: Vec2, vel: Vec2, face_x: f32, field_height: f32) -> f32 {
    if vel.x.abs() < f32::EPSILON {
        return pos.y;
    }
    let travel = ((face_x - pos.x).abs() - BALL_RADIUS).max(0.0);
    let t = travel / vel.x.abs();
    mirror_into_range(pos.y + vel.y * t, BALL_RADIUS, field_height - BALL_RADIUS)
}

/// AI driving one paddle
#[derive(Debug, Clone)]
pub struct AiController {
    pub side: Side,
    pub difficulty: u8,
    profile: AiProfile,
    last_update: Option<u64>,
    /// Desired paddle top
    target_y: f32,
}

impl AiController {
    pub fn new(side: Side, difficulty: u8) -> Self {
        Self {
            side,
            difficulty,
            profile: AiProfile::for_difficulty(difficulty),
            last_update: None,
            target_y: PADDLE_START_Y,
        }
    }

    pub fn profile(&self) -> &AiProfile {
        &self.profile
    }

    pub fn target_y(&self) -> f32 {
        self.target_y
    }

    /// Forget the current target
    pub fn reset(&mut self) {
        self.last_update = None;
        self.target_y = PADDLE_START_Y;
    }

    /// Re-target if the reaction delay has passed, then move one step
    pub fn update(&mut self, state: &mut MatchState) {
        let now = state.time_ticks;
        if state.paddle(self.side).is_frozen(now) {
            return;
        }

        let due = match self.last_update {
            None => true,
            Some(last) => now.saturating_sub(last) > self.profile.reaction_ticks,
        };
        if due {
            self.last_update = Some(now);
            self.target_y = self.choose_target(state);
        }

        let max_step = self.profile.speed * speed_factor(state, self.side);
        let paddle = state.paddle_mut(self.side);
        let diff = self.target_y - paddle.y;
        if diff.abs() > TARGET_TOLERANCE {
            paddle.nudge(diff.signum() * max_step.min(diff.abs()));
        } else {
            paddle.velocity = 0.0;
        }
    }

    fn choose_target(&self, state: &mut MatchState) -> f32 {
        let paddle = state.paddle(self.side);
        let face = paddle.face_x(state.field_width);
        let height = paddle.height;
        let outward = self.side.outward();
        let sees_ghosts = self.difficulty >= GHOST_SIGHT_DIFFICULTY;

        let approaching = |b: &&Ball| b.active && b.vel.x * outward < 0.0;
        let tracked = state
            .balls
            .iter()
            .filter(approaching)
            .filter(|b| sees_ghosts || b.is_visible())
            .min_by(|a, b| {
                (a.pos.x - face)
                    .abs()
                    .total_cmp(&(b.pos.x - face).abs())
            })
            .map(|b| (b.pos, b.vel));

        let field_height = state.field_height;
        let aim = match tracked {
            None => field_height / 2.0,
            Some((pos, vel)) => {
                let mut y = pos.y;
                if state.rng.random::<f32>() < self.profile.prediction_accuracy {
                    y = predict_intercept_y(pos, vel, face, field_height);
                }
                if state.rng.random::<f32>() < self.profile.error_chance {
                    y += (state.rng.random::<f32>() - 0.5) * height;
                }
                y
            }
        };
        aim - height / 2.0
    }
}
