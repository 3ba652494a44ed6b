//! Mode state machine
//!
//! One variant per game mode. The orchestrator calls the same lifecycle hooks
//! on whichever variant is live; each hook gets the match state by exclusive
//! reference and decides scoring, respawns and termination. Modes never own
//! entities.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::effects::{EffectKind, update_paddle_heights};
use super::physics::DropTable;
use super::state::{GamePhase, MatchState, Side};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::levels::{LevelSource, load_competitive, load_solo};
use crate::persistence::KeyValueStore;
use crate::settings::{MatchConfig, ModeKind};

/// Collaborators a hook may need
pub struct Services<'a> {
    pub levels: &'a dyn LevelSource,
    pub store: &'a mut dyn KeyValueStore,
}

/// How a finished match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

const COMPETITIVE_DROPS: DropTable = DropTable {
    chance: BONUS_CHANCE_COMPETITIVE,
    pool: &EffectKind::ALL,
};

const SOLO_DROPS: DropTable = DropTable {
    chance: BONUS_CHANCE_SOLO,
    pool: &EffectKind::SOLO_POOL,
};

fn random_vy(state: &mut MatchState) -> f32 {
    if state.rng.random_bool(0.5) {
        START_BALL_VY
    } else {
        -START_BALL_VY
    }
}

/// Launch `ball` from in front of `side`'s paddle, heading for the far side
fn serve(state: &mut MatchState, ball: usize, side: Side, speed: f32) {
    if ball >= state.balls.len() {
        return;
    }
    let x = match side {
        Side::Left => SERVE_OFFSET,
        Side::Right => state.field_width - SERVE_OFFSET,
    };
    let y = state.paddle(side).center_y();
    let vy = random_vy(state);
    state.balls[ball].launch(Vec2::new(x, y), Vec2::new(side.outward() * speed, vy), Some(side));
}

/// One ball per side, two while its multi-ball is live
fn single_ball_quota(state: &MatchState, side: Side, pending: usize) -> usize {
    let base = if state.effect_live(side, EffectKind::MultiBall) {
        2
    } else {
        1
    };
    base.min(pending)
}

/// PvP and PvAI: first to the target score wins
#[derive(Debug, Clone)]
pub struct VersusMode {
    pub target_score: u32,
    /// Side the AI plays, if any
    pub ai_side: Option<Side>,
    outcome: Option<Outcome>,
}

impl VersusMode {
    pub fn new(target_score: u32, ai_side: Option<Side>) -> Self {
        Self {
            target_score,
            ai_side,
            outcome: None,
        }
    }

    fn reset(&mut self, state: &mut MatchState) {
        state.clear_balls();
        // The human always serves first against the AI
        let side = if self.ai_side.is_some() || state.rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        serve(state, 0, side, BASE_BALL_SPEED);
    }

    fn handle_ball_loss(&mut self, state: &mut MatchState, ball: usize, side: Side) {
        if self.outcome.is_some() {
            return;
        }
        let scorer = side.opponent();
        state.scores[scorer.index()] += 1;
        log::debug!(
            "Ball {} lost by {}, score {} - {}",
            ball,
            side.as_str(),
            state.scores[0],
            state.scores[1]
        );

        if state.scores[scorer.index()] >= self.target_score {
            self.outcome = Some(Outcome::Winner(scorer));
            return;
        }

        // A ball still heading for the loser keeps the rally going
        let incoming = state
            .balls
            .iter()
            .any(|b| b.active && b.vel.x * side.outward() < 0.0);
        if !incoming {
            let now = state.time_ticks;
            state
                .countdowns
                .start(side, ball, now, &mut state.paddles[side.index()]);
        }
    }

    /// Back from the centre, moving away from the side that lost it
    fn respawn_ball(&self, state: &mut MatchState, ball: usize, side: Side) {
        if ball >= state.balls.len() {
            return;
        }
        let center = Vec2::new(state.field_width / 2.0, state.field_height / 2.0);
        let vy = random_vy(state);
        state.balls[ball].launch(center, Vec2::new(side.outward() * BASE_BALL_SPEED, vy), None);
    }
}

/// Brick duels: two home balls, points for bricks and for the opponent's misses
#[derive(Debug, Clone)]
pub struct BrickMode {
    pub ai_side: Option<Side>,
    outcome: Option<Outcome>,
}

impl BrickMode {
    pub fn new(ai_side: Option<Side>) -> Self {
        Self {
            ai_side,
            outcome: None,
        }
    }

    fn rebuild_bricks(state: &mut MatchState, services: &Services<'_>) {
        let layout = load_competitive(services.levels, state.field_width);
        state.load_bricks(&layout);
        log::debug!("Brick wall built with {} bricks", state.total_bricks);
    }

    fn reset(&mut self, state: &mut MatchState) {
        state.clear_balls();
        for side in Side::BOTH {
            serve(state, side.index(), side, BASE_BALL_SPEED);
        }
    }

    fn handle_ball_loss(&mut self, state: &mut MatchState, ball: usize, side: Side) {
        state.scores[side.opponent().index()] += 1;
        if ball >= BASE_BALL_SLOTS {
            log::debug!("Extra ball {} lost by {}", ball, side.as_str());
            return;
        }

        let now = state.time_ticks;
        let home = state.balls[ball].home;
        if home == side {
            state
                .countdowns
                .start(side, ball, now, &mut state.paddles[side.index()]);
        } else {
            state
                .countdowns
                .schedule(home, ball, now + WINNER_RESPAWN_DELAY_TICKS);
            log::debug!("Ball {} returns to {} shortly", ball, home.as_str());
        }
    }

    fn on_bricks_cleared(&mut self, state: &MatchState) {
        let [left, right] = state.scores;
        self.outcome = Some(match left.cmp(&right) {
            std::cmp::Ordering::Greater => Outcome::Winner(Side::Left),
            std::cmp::Ordering::Less => Outcome::Winner(Side::Right),
            std::cmp::Ordering::Equal => Outcome::Draw,
        });
        log::info!("All bricks cleared at {} - {}", left, right);
    }

    fn respawn_ball(&self, state: &mut MatchState, ball: usize) {
        if let Some(home) = state.balls.get(ball).map(|b| b.home) {
            serve(state, ball, home, BASE_BALL_SPEED);
        }
    }
}

/// Stage of the solo between-levels sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionStage {
    /// Completed level summary
    Summary,
    /// Next layout loaded, counting down to play
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub stage: TransitionStage,
    pub until: u64,
}

/// Single-player adventure through successive levels
#[derive(Debug, Clone, Serialize)]
pub struct SoloMode {
    pub level: u32,
    pub total_score: u64,
    pub level_score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub balls_lost: u32,
    pub high_score: u64,
    /// Completion bonus of the last finished level
    pub last_bonus: u64,
    transition: Option<Transition>,
}

impl SoloMode {
    pub fn new(high_score: u64) -> Self {
        Self {
            level: 1,
            total_score: 0,
            level_score: 0,
            combo: 0,
            max_combo: 0,
            balls_lost: 0,
            high_score,
            last_bonus: 0,
            transition: None,
        }
    }

    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// Ball speed for the current brick progress
    ///
    /// Base speed with every brick standing, 1.5x base with one left.
    pub fn ball_speed(state: &MatchState) -> f32 {
        let total = state.total_bricks;
        let remaining = state.bricks_remaining.min(total);
        let progress = if total <= 1 {
            0.0
        } else {
            ((total - remaining) as f32 / (total - 1) as f32).clamp(0.0, 1.0)
        };
        BASE_BALL_SPEED * (1.0 + progress * 0.5)
    }

    fn apply_ball_speed(state: &mut MatchState) {
        let speed = Self::ball_speed(state);
        for ball in state
            .balls
            .iter_mut()
            .filter(|b| b.active && b.owner != Some(Side::Right))
        {
            ball.set_speed(speed);
        }
    }

    fn load_level(&mut self, state: &mut MatchState, services: &Services<'_>) {
        let layout = load_solo(services.levels, self.level, state.field_width);
        state.load_bricks(&layout);
        self.level_score = 0;
        self.combo = 0;
        self.max_combo = 0;
        log::info!("Level {} loaded with {} bricks", self.level, state.total_bricks);
    }

    fn serve(&mut self, state: &mut MatchState, ball: usize) {
        serve(state, ball, Side::Left, BASE_BALL_SPEED);
        let speed = Self::ball_speed(state);
        if let Some(ball) = state.balls.get_mut(ball) {
            ball.set_speed(speed);
        }
    }

    fn reset(&mut self, state: &mut MatchState) {
        state.clear_balls();
        self.combo = 0;
        self.serve(state, 0);
    }

    fn update(&mut self, state: &mut MatchState, services: &mut Services<'_>) {
        let now = state.time_ticks;
        if let Some(transition) = self.transition {
            if now >= transition.until {
                self.advance_transition(state, services, transition.stage);
            }
            return;
        }

        // The far wall bounces instead of scoring
        let limit = state.field_width - BALL_RADIUS;
        for ball in state.balls.iter_mut().filter(|b| b.active) {
            if ball.pos.x >= limit && ball.vel.x > 0.0 {
                ball.pos.x = limit;
                ball.vel.x = -ball.vel.x.abs();
            }
        }
    }

    fn advance_transition(
        &mut self,
        state: &mut MatchState,
        services: &mut Services<'_>,
        stage: TransitionStage,
    ) {
        let now = state.time_ticks;
        match stage {
            TransitionStage::Summary => {
                self.level += 1;
                state.clear_transients();
                state.clear_balls();
                self.load_level(state, services);
                update_paddle_heights(state);
                // Parked on the paddle until the countdown ends
                let y = state.paddle(Side::Left).center_y();
                state.balls[0].pos = Vec2::new(SERVE_OFFSET, y);
                self.transition = Some(Transition {
                    stage: TransitionStage::Countdown,
                    until: now + LEVEL_COUNTDOWN_STEPS * LEVEL_COUNTDOWN_STEP_TICKS,
                });
            }
            TransitionStage::Countdown => {
                self.transition = None;
                state.phase = GamePhase::Playing;
                self.serve(state, 0);
                log::info!("Level {} started", self.level);
            }
        }
    }

    fn complete_level(&mut self, state: &mut MatchState, services: &mut Services<'_>) {
        if self.transition.is_some() {
            return;
        }
        let bonus = 100 * u64::from(self.level) + 10 * u64::from(self.max_combo);
        self.last_bonus = bonus;
        self.total_score += bonus;
        log::info!(
            "Level {} complete: {} points, bonus {}, total {}",
            self.level,
            self.level_score,
            bonus,
            self.total_score
        );

        if self.total_score > self.high_score {
            self.high_score = self.total_score;
            let mut scores = HighScores::load(&*services.store);
            scores.add_score(self.total_score, self.level);
            scores.save(&mut *services.store);
            log::info!("New high score {}", self.high_score);
        }

        state.clear_transients();
        for ball in &mut state.balls {
            ball.deactivate();
        }
        state.phase = GamePhase::LevelTransition;
        self.transition = Some(Transition {
            stage: TransitionStage::Summary,
            until: state.time_ticks + LEVEL_SUMMARY_TICKS,
        });
    }

    fn handle_ball_loss(
        &mut self,
        state: &mut MatchState,
        ball: usize,
        side: Side,
        services: &mut Services<'_>,
    ) {
        if side != Side::Left || self.transition.is_some() {
            return;
        }
        self.balls_lost += 1;
        self.combo = 0;
        log::debug!("Ball {} lost ({} so far)", ball, self.balls_lost);

        if state.active_ball_count() > 0 {
            return;
        }
        if state.bricks_remaining > 0 {
            let now = state.time_ticks;
            state
                .countdowns
                .start(Side::Left, ball, now, &mut state.paddles[Side::Left.index()]);
        } else {
            self.complete_level(state, services);
        }
    }

    fn on_brick_damaged(&mut self) {
        self.bump_combo();
    }

    fn on_brick_destroyed(&mut self, state: &mut MatchState, max_health: u32, explosion: bool) {
        let points = if explosion {
            10 * u64::from(max_health) + 20
        } else {
            self.bump_combo();
            10 * u64::from(max_health) + 5 * u64::from(self.combo)
        };
        self.level_score += points;
        self.total_score += points;
        Self::apply_ball_speed(state);
    }

    fn bump_combo(&mut self) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    fn banner(&self, now: u64) -> Option<String> {
        let transition = self.transition?;
        Some(match transition.stage {
            TransitionStage::Summary => {
                format!("Level {} Complete! Bonus: {}", self.level, self.last_bonus)
            }
            TransitionStage::Countdown => {
                let digit = transition
                    .until
                    .saturating_sub(now)
                    .div_ceil(LEVEL_COUNTDOWN_STEP_TICKS)
                    .max(1);
                format!("Level {} - {}", self.level, digit)
            }
        })
    }
}

/// The live mode of a match
#[derive(Debug, Clone)]
pub enum Mode {
    Pvp(VersusMode),
    PvAi(VersusMode),
    Brick(BrickMode),
    Brick2P(BrickMode),
    Solo(SoloMode),
}

impl Mode {
    /// Build the mode for a validated config
    pub fn new(config: &MatchConfig, store: &dyn KeyValueStore) -> Self {
        let ai_side = config.mode.has_ai().then_some(Side::Right);
        match config.mode {
            ModeKind::Pvp => Mode::Pvp(VersusMode::new(config.target_score, ai_side)),
            ModeKind::PvAi => Mode::PvAi(VersusMode::new(config.target_score, ai_side)),
            ModeKind::Brick => Mode::Brick(BrickMode::new(ai_side)),
            ModeKind::Brick2P => Mode::Brick2P(BrickMode::new(ai_side)),
            ModeKind::Solo => Mode::Solo(SoloMode::new(HighScores::load(store).top_score())),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Pvp(_) => ModeKind::Pvp,
            Mode::PvAi(_) => ModeKind::PvAi,
            Mode::Brick(_) => ModeKind::Brick,
            Mode::Brick2P(_) => ModeKind::Brick2P,
            Mode::Solo(_) => ModeKind::Solo,
        }
    }

    /// Side driven by the AI, if any
    pub fn ai_side(&self) -> Option<Side> {
        match self {
            Mode::Pvp(m) | Mode::PvAi(m) => m.ai_side,
            Mode::Brick(m) | Mode::Brick2P(m) => m.ai_side,
            Mode::Solo(_) => None,
        }
    }

    pub fn as_solo(&self) -> Option<&SoloMode> {
        match self {
            Mode::Solo(m) => Some(m),
            _ => None,
        }
    }

    /// Bonus drop odds for destroyed bricks
    pub fn drop_table(&self) -> DropTable {
        match self {
            Mode::Pvp(_) | Mode::PvAi(_) => DropTable::NONE,
            Mode::Brick(_) | Mode::Brick2P(_) => COMPETITIVE_DROPS,
            Mode::Solo(_) => SOLO_DROPS,
        }
    }

    /// One-time setup: bricks for the first layout, then the opening serve
    pub fn initialize(&mut self, state: &mut MatchState, services: &mut Services<'_>) {
        match self {
            Mode::Pvp(_) | Mode::PvAi(_) => {}
            Mode::Brick(_) | Mode::Brick2P(_) => BrickMode::rebuild_bricks(state, services),
            Mode::Solo(m) => m.load_level(state, services),
        }
        self.reset(state);
        log::info!("Match started: {}", self.kind().as_str());
    }

    /// Place the balls for a new life or level
    pub fn reset(&mut self, state: &mut MatchState) {
        match self {
            Mode::Pvp(m) | Mode::PvAi(m) => m.reset(state),
            Mode::Brick(m) | Mode::Brick2P(m) => m.reset(state),
            Mode::Solo(m) => m.reset(state),
        }
    }

    /// Per-tick hook, run after ball physics
    pub fn update(&mut self, state: &mut MatchState, services: &mut Services<'_>) {
        if let Mode::Solo(m) = self {
            m.update(state, services);
        }
    }

    pub fn handle_ball_loss(
        &mut self,
        state: &mut MatchState,
        ball: usize,
        side: Side,
        services: &mut Services<'_>,
    ) {
        match self {
            Mode::Pvp(m) | Mode::PvAi(m) => m.handle_ball_loss(state, ball, side),
            Mode::Brick(m) | Mode::Brick2P(m) => m.handle_ball_loss(state, ball, side),
            Mode::Solo(m) => m.handle_ball_loss(state, ball, side, services),
        }
    }

    pub fn on_brick_damaged(&mut self, _state: &mut MatchState, _by: Option<Side>) {
        if let Mode::Solo(m) = self {
            m.on_brick_damaged();
        }
    }

    pub fn on_brick_destroyed(
        &mut self,
        state: &mut MatchState,
        by: Option<Side>,
        max_health: u32,
        explosion: bool,
    ) {
        match self {
            Mode::Pvp(_) | Mode::PvAi(_) => {}
            Mode::Brick(_) | Mode::Brick2P(_) => {
                if let Some(side) = by {
                    state.scores[side.index()] += 1;
                }
            }
            Mode::Solo(m) => m.on_brick_destroyed(state, max_health, explosion),
        }
    }

    /// Extra balls in solo launch at the current level speed
    pub fn on_pickup_caught(&mut self, state: &mut MatchState, kind: EffectKind) {
        if matches!(self, Mode::Solo(_)) && kind == EffectKind::MultiBall {
            SoloMode::apply_ball_speed(state);
        }
    }

    pub fn on_bricks_cleared(&mut self, state: &mut MatchState, services: &mut Services<'_>) {
        match self {
            Mode::Pvp(_) | Mode::PvAi(_) => {}
            Mode::Brick(m) | Mode::Brick2P(m) => m.on_bricks_cleared(state),
            Mode::Solo(m) => m.complete_level(state, services),
        }
    }

    /// How many of `pending` lost balls come back when `side`'s countdown ends
    pub fn respawn_quota(&self, state: &MatchState, side: Side, pending: usize) -> usize {
        match self {
            Mode::Brick(_) | Mode::Brick2P(_) => pending,
            _ => single_ball_quota(state, side, pending),
        }
    }

    /// Put a lost ball back in play for `side`
    pub fn respawn_ball(&mut self, state: &mut MatchState, ball: usize, side: Side) {
        match self {
            Mode::Pvp(m) | Mode::PvAi(m) => m.respawn_ball(state, ball, side),
            Mode::Brick(m) | Mode::Brick2P(m) => m.respawn_ball(state, ball),
            Mode::Solo(m) => m.serve(state, ball),
        }
    }

    pub fn check_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Mode::Pvp(m) | Mode::PvAi(m) => m.outcome,
            Mode::Brick(m) | Mode::Brick2P(m) => m.outcome,
            Mode::Solo(_) => None,
        }
    }

    pub fn outcome_text(&self) -> Option<String> {
        let text = match self.outcome()? {
            Outcome::Draw => "Draw!",
            Outcome::Winner(side) if self.ai_side() == Some(side) => "AI Wins!",
            Outcome::Winner(Side::Left) => "Player 1 Wins!",
            Outcome::Winner(Side::Right) => "Player 2 Wins!",
        };
        Some(text.to_string())
    }

    pub fn final_score_text(&self, state: &MatchState) -> String {
        format!("Final Score: {} - {}", state.scores[0], state.scores[1])
    }

    pub fn score_display(&self, state: &MatchState) -> String {
        match self {
            Mode::Solo(m) => format!("Score: {} | High: {}", m.total_score, m.high_score),
            _ => format!("{} - {}", state.scores[0], state.scores[1]),
        }
    }

    pub fn status_line(&self) -> Option<String> {
        self.as_solo().map(|m| {
            format!(
                "Balls Lost: {} | Level: {} | Combo: {}",
                m.balls_lost, m.level, m.combo
            )
        })
    }

    /// Between-levels banner text
    pub fn banner(&self, now: u64) -> Option<String> {
        self.as_solo().and_then(|m| m.banner(now))
    }

    /// Play again with the same settings
    pub fn restart(&mut self, state: &mut MatchState, services: &mut Services<'_>) {
        match self {
            Mode::Pvp(m) | Mode::PvAi(m) => m.outcome = None,
            Mode::Brick(m) | Mode::Brick2P(m) => {
                m.outcome = None;
                if state.bricks_remaining == 0 {
                    BrickMode::rebuild_bricks(state, services);
                }
            }
            Mode::Solo(m) => {
                *m = SoloMode::new(m.high_score);
                m.load_level(state, services);
            }
        }
        self.reset(state);
        log::info!("Match restarted: {}", self.kind().as_str());
    }
}
