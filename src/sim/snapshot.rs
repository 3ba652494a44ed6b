//! Read-only view of a match for renderers and UI
//!
//! Built fresh on request; nothing in here feeds back into the simulation.

use glam::Vec2;
use serde::Serialize;

use super::effects::EffectKind;
use super::modes::{Mode, Outcome};
use super::state::{GamePhase, MatchState, Side};
use crate::consts::*;

#[derive(Debug, Clone, Serialize)]
pub struct BallView {
    pub pos: Vec2,
    pub radius: f32,
    /// False while hidden by a ghost effect
    pub visible: bool,
    pub owner: Option<Side>,
    pub explosive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaddleView {
    pub side: Side,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub frozen: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrickView {
    pub pos: Vec2,
    pub size: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub indestructible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub kind: EffectKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    /// Leading tip
    pub pos: Vec2,
    /// Trails behind the tip, away from the target
    pub length: f32,
    pub owner: Side,
}

/// A live effect with its progress-ring fraction
#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub remaining: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountdownView {
    pub side: Side,
    pub digit: u64,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub mode: &'static str,
    pub tick: u64,
    pub phase: GamePhase,
    pub field: Vec2,
    pub balls: Vec<BallView>,
    pub paddles: Vec<PaddleView>,
    pub bricks: Vec<BrickView>,
    pub pickups: Vec<PickupView>,
    pub projectiles: Vec<ProjectileView>,
    /// Left, right
    pub effects: [Vec<EffectView>; 2],
    pub countdowns: Vec<CountdownView>,
    pub score: String,
    pub status: Option<String>,
    pub banner: Option<String>,
    pub outcome: Option<Outcome>,
    pub outcome_text: Option<String>,
    pub final_score: Option<String>,
}

impl Snapshot {
    pub fn capture(state: &MatchState, mode: &Mode) -> Self {
        let now = state.time_ticks;

        let balls: Vec<BallView> = state
            .balls
            .iter()
            .filter(|b| b.active)
            .map(|b| BallView {
                pos: b.pos,
                radius: BALL_RADIUS,
                visible: b.is_visible(),
                owner: b.owner,
                explosive: b.explosive.is_some(),
            })
            .collect();

        let paddles: Vec<PaddleView> = state
            .paddles
            .iter()
            .filter(|p| p.present)
            .map(|p| PaddleView {
                side: p.side,
                pos: Vec2::new(p.rect_x(state.field_width), p.y),
                size: Vec2::new(PADDLE_WIDTH, p.height),
                frozen: p.is_frozen(now),
            })
            .collect();

        let bricks: Vec<BrickView> = state
            .bricks
            .iter()
            .filter(|b| !b.destroyed)
            .map(|b| BrickView {
                pos: b.pos,
                size: b.size,
                health: b.health,
                max_health: b.max_health,
                indestructible: b.indestructible,
            })
            .collect();

        let effects: [Vec<EffectView>; 2] = Side::BOTH.map(|side| {
            state
                .effects(side)
                .live(now)
                .map(|e| EffectView {
                    kind: e.kind,
                    remaining: e.remaining_fraction(now),
                })
                .collect()
        });

        let game_over = state.phase == GamePhase::GameOver;

        Self {
            mode: mode.kind().as_str(),
            tick: now,
            phase: state.phase,
            field: Vec2::new(state.field_width, state.field_height),
            balls,
            paddles,
            bricks,
            pickups: state
                .pickups
                .iter()
                .map(|p| PickupView {
                    kind: p.kind,
                    pos: p.pos,
                })
                .collect(),
            projectiles: state
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    pos: p.pos,
                    length: PROJECTILE_LENGTH,
                    owner: p.owner,
                })
                .collect(),
            effects,
            countdowns: state
                .countdowns
                .iter()
                .map(|c| CountdownView {
                    side: c.side,
                    digit: c.display_digit(now),
                })
                .collect(),
            score: mode.score_display(state),
            status: mode.status_line(),
            banner: mode.banner(now),
            outcome: mode.outcome(),
            outcome_text: mode.outcome_text(),
            final_score: game_over.then(|| mode.final_score_text(state)),
        }
    }
}
