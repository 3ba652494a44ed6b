//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, durations in ticks
//! - Seeded RNG only
//! - Stable iteration order (by slot index)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod countdown;
pub mod effects;
pub mod modes;
pub mod physics;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use ai::{AiController, AiProfile};
pub use collision::{CollisionResult, ball_box_collision, ball_paddle_collision};
pub use countdown::{Countdown, CountdownManager};
pub use effects::{Effect, EffectKind, EffectTable};
pub use modes::{Mode, Outcome, Services};
pub use snapshot::Snapshot;
pub use state::{
    Ball, Brick, GamePhase, MatchState, Paddle, Pickup, Projectile, Side, SimEvent,
};
pub use tick::{ControlInput, Match, TickInput};
