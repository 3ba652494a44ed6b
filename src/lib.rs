//! Paddle Arena - a tick-based paddle/ball arcade simulation
//!
//! Core modules:
//! - `sim`: Simulation engine (physics, effects, AI, modes, orchestrator)
//! - `levels`: Brick layouts and the level-loading collaborator
//! - `persistence`: Key-value store contract used for settings and scores
//! - `settings`: Match configuration and validation
//! - `highscores`: Solo leaderboard

pub mod error;
pub mod highscores;
pub mod levels;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, LevelError};
pub use highscores::HighScores;
pub use levels::{AsciiLevels, BrickDef, BrickLayout, LevelSource};
pub use persistence::{KeyValueStore, MemoryStore};
pub use settings::{MatchConfig, ModeKind};
pub use sim::{Match, Snapshot, TickInput};

/// Game configuration constants
pub mod consts {
    /// Simulation rate. All durations below are in ticks.
    pub const TICK_HZ: u64 = 60;

    /// Field dimensions
    pub const FIELD_HEIGHT: f32 = 400.0;
    pub const DEFAULT_FIELD_WIDTH: f32 = 800.0;
    pub const MIN_FIELD_WIDTH: f32 = 600.0;
    pub const MAX_FIELD_WIDTH: f32 = 1600.0;

    /// Paddle defaults (left paddle spans x = 10..20, right mirrors it)
    pub const PADDLE_HEIGHT: f32 = 80.0;
    pub const PADDLE_WIDTH: f32 = 10.0;
    pub const PADDLE_INSET: f32 = 20.0;
    pub const PADDLE_START_Y: f32 = 160.0;
    pub const BASE_PADDLE_SPEED: f32 = 6.0;
    /// Fraction of the gap to the commanded velocity closed per tick
    pub const PADDLE_ACCEL: f32 = 0.5;
    pub const ENLARGED_PADDLE_FACTOR: f32 = 2.0;
    pub const SHRUNK_PADDLE_FACTOR: f32 = 0.6;
    /// Movement multiplier while a slow effect targets the side
    pub const SLOW_FACTOR: f32 = 0.5;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 6.0;
    pub const BASE_BALL_SPEED: f32 = 4.0;
    pub const START_BALL_VY: f32 = 3.0;
    /// Vertical spin range applied on paddle contact
    pub const PADDLE_SPIN: f32 = 8.0;
    /// Distance from the wall where serves start
    pub const SERVE_OFFSET: f32 = 30.0;
    /// Slots preallocated for balls (grown by multi-ball)
    pub const BASE_BALL_SLOTS: usize = 2;

    /// Competitive brick grid
    pub const BRICK_WIDTH: f32 = 20.0;
    pub const BRICK_HEIGHT: f32 = 45.0;
    pub const BRICK_PADDING: f32 = 5.0;
    pub const BRICK_ROWS: usize = 6;
    pub const BRICK_PADDLE_MARGIN: f32 = 350.0;

    /// Solo bricks are smaller so ASCII levels fit the field
    pub const SOLO_BRICK_WIDTH: f32 = 32.0;
    pub const SOLO_BRICK_HEIGHT: f32 = 16.0;
    pub const SOLO_BRICK_GAP: f32 = 2.0;
    pub const SOLO_TOP_MARGIN: f32 = 50.0;
    pub const SOLO_PADDLE_ZONE: f32 = 80.0;

    /// Bonus drop chances
    pub const BONUS_CHANCE_COMPETITIVE: f32 = 0.1;
    pub const BONUS_CHANCE_SOLO: f32 = 0.3;

    /// Pickups and projectiles
    pub const PICKUP_SPEED: f32 = 2.0;
    pub const PICKUP_RADIUS: f32 = 15.0;
    pub const PICKUP_BOUNDS_MARGIN: f32 = 20.0;
    pub const PROJECTILE_SPEED: f32 = 8.0;
    pub const PROJECTILE_LENGTH: f32 = 10.0;
    pub const LASER_INTERVAL_TICKS: u64 = 30;

    /// Explosive ball blast radius
    pub const EXPLOSION_RADIUS: f32 = 60.0;

    /// Ghost ball reappears (one-shot) once this close to the paddle it approaches
    pub const GHOST_INNER_DISTANCE: f32 = 100.0;
    /// Ghost ball is hidden while nearer than this fraction of the field width
    pub const GHOST_OUTER_FRACTION: f32 = 0.75;

    /// Countdown / respawn timing
    pub const COUNTDOWN_TICKS: u64 = TICK_HZ;
    pub const COUNTDOWN_EXTENSION_TICKS: u64 = TICK_HZ;
    /// Digits shown over a fresh countdown (3, 2, 1)
    pub const COUNTDOWN_DIGITS: u64 = 3;
    pub const COUNTDOWN_DIGIT_TICKS: u64 = COUNTDOWN_TICKS.div_ceil(COUNTDOWN_DIGITS);
    pub const FREEZE_TICKS: u64 = TICK_HZ;
    pub const WINNER_RESPAWN_DELAY_TICKS: u64 = 6;

    /// Solo level transition
    pub const LEVEL_SUMMARY_TICKS: u64 = 2 * TICK_HZ;
    pub const LEVEL_COUNTDOWN_STEPS: u64 = 3;
    pub const LEVEL_COUNTDOWN_STEP_TICKS: u64 = TICK_HZ;

    /// Balls slower than this fraction of base are restored once no slow is live
    pub const SPEED_RESTORE_THRESHOLD: f32 = 0.8;
}

/// Convert seconds to simulation ticks
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs * consts::TICK_HZ as f32).round() as u64
}

/// Mirror `value` back into `[min, max]`, as if it bounced off both ends
/// as many times as needed.
#[inline]
pub fn mirror_into_range(value: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span <= 0.0 || !value.is_finite() {
        return min.max(value.min(max));
    }
    let period = 2.0 * span;
    let t = (value - min).rem_euclid(period);
    if t > span { min + period - t } else { min + t }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_ticks() {
        assert_eq!(secs_to_ticks(1.0), 60);
        assert_eq!(secs_to_ticks(0.5), 30);
        assert_eq!(secs_to_ticks(15.0), 900);
    }

    #[test]
    fn test_mirror_into_range() {
        assert!((mirror_into_range(50.0, 0.0, 100.0) - 50.0).abs() < 1e-4);
        assert!((mirror_into_range(-20.0, 0.0, 100.0) - 20.0).abs() < 1e-4);
        assert!((mirror_into_range(130.0, 0.0, 100.0) - 70.0).abs() < 1e-4);
        // Two bounces: past the top, then back past the bottom
        assert!((mirror_into_range(230.0, 0.0, 100.0) - 30.0).abs() < 1e-4);
        assert!((mirror_into_range(-150.0, 0.0, 100.0) - 50.0).abs() < 1e-4);
    }
}
