//! Fixed timestep simulation tick
//!
//! [`Match`] owns the state, the live mode and its collaborators, and
//! advances everything in a fixed order once per tick.

use super::ai::AiController;
use super::effects::{auto_fire, controls_reversed, speed_factor, update_effects};
use super::modes::{Mode, Services};
use super::physics::{
    detect_boundary_crossings, step_balls, update_pickups, update_projectiles,
};
use super::snapshot::Snapshot;
use super::state::{GamePhase, MatchState, Side, SimEvent};
use crate::consts::*;
use crate::error::ConfigError;
use crate::levels::LevelSource;
use crate::persistence::KeyValueStore;
use crate::settings::MatchConfig;

/// Pressed state of one side's controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlInput {
    pub up: bool,
    pub down: bool,
}

impl ControlInput {
    /// -1 up, +1 down, 0 for neither or both
    pub fn direction(&self) -> f32 {
        match (self.up, self.down) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub left: ControlInput,
    /// Ignored when the AI drives the right paddle
    pub right: ControlInput,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    pub fn control(&self, side: Side) -> ControlInput {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// A running match
pub struct Match {
    config: MatchConfig,
    state: MatchState,
    mode: Mode,
    ai: Option<AiController>,
    levels: Box<dyn LevelSource>,
    store: Box<dyn KeyValueStore>,
    /// Phase to go back to when unpaused
    resume_phase: GamePhase,
}

impl Match {
    /// Validate the config, then set up and serve
    pub fn new(
        config: MatchConfig,
        levels: Box<dyn LevelSource>,
        mut store: Box<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut state = MatchState::new(config.mode, config.field_width, config.seed);
        let mut mode = Mode::new(&config, store.as_ref());
        let ai = mode
            .ai_side()
            .map(|side| AiController::new(side, config.difficulty));

        let mut services = Services {
            levels: levels.as_ref(),
            store: store.as_mut(),
        };
        mode.initialize(&mut state, &mut services);
        config.save(store.as_mut());

        Ok(Self {
            config,
            state,
            mode,
            ai,
            levels,
            store,
            resume_phase: GamePhase::Playing,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, &self.mode)
    }

    /// Suspend or resume ticking. The clock does not move while paused.
    pub fn set_paused(&mut self, paused: bool) {
        match (paused, self.state.phase) {
            (true, GamePhase::Playing | GamePhase::LevelTransition) => {
                self.resume_phase = self.state.phase;
                self.state.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", self.state.time_ticks);
            }
            (false, GamePhase::Paused) => {
                self.state.phase = self.resume_phase;
                log::info!("Resumed at tick {}", self.state.time_ticks);
            }
            _ => {}
        }
    }

    /// Play again with the same settings
    pub fn restart(&mut self) {
        let state = &mut self.state;
        state.scores = [0, 0];
        state.clear_transients();
        state.clear_balls();
        state.events.clear();
        for paddle in &mut state.paddles {
            paddle.reset();
        }
        state.phase = GamePhase::Playing;
        if let Some(ai) = &mut self.ai {
            ai.reset();
        }

        let mut services = Services {
            levels: self.levels.as_ref(),
            store: self.store.as_mut(),
        };
        self.mode.restart(&mut self.state, &mut services);
    }

    /// Advance the match by one fixed timestep
    pub fn tick(&mut self, input: &TickInput) {
        if input.pause {
            let paused = self.state.phase == GamePhase::Paused;
            self.set_paused(!paused);
        }

        // Don't tick if paused or game over
        match self.state.phase {
            GamePhase::Paused | GamePhase::GameOver => return,
            _ => {}
        }

        let state = &mut self.state;
        let mode = &mut self.mode;
        let mut services = Services {
            levels: self.levels.as_ref(),
            store: self.store.as_mut(),
        };

        state.time_ticks += 1;

        if state.phase == GamePhase::LevelTransition {
            mode.update(state, &mut services);
            return;
        }

        move_paddles(state, input, self.ai.as_mut());

        let drops = mode.drop_table();
        step_balls(state, drops);
        mode.update(state, &mut services);
        detect_boundary_crossings(state);
        route_events(state, mode, &mut services);

        update_pickups(state);
        update_projectiles(state, drops);
        route_events(state, mode, &mut services);

        auto_fire(state);
        process_respawns(state, mode);
        update_effects(state);
        route_events(state, mode, &mut services);

        if mode.check_game_over() {
            state.phase = GamePhase::GameOver;
            log::info!(
                "Game over: {} ({})",
                mode.outcome_text().unwrap_or_default(),
                mode.final_score_text(state)
            );
        }
    }
}

/// Human paddles follow their controls, the AI drives its own
fn move_paddles(state: &mut MatchState, input: &TickInput, ai: Option<&mut AiController>) {
    let now = state.time_ticks;
    let ai_side = ai.as_ref().map(|a| a.side);

    for side in Side::BOTH {
        let paddle = state.paddle(side);
        if Some(side) == ai_side || !paddle.present || paddle.is_frozen(now) {
            continue;
        }
        let mut direction = input.control(side).direction();
        if controls_reversed(state, side) {
            direction = -direction;
        }
        let max_speed = BASE_PADDLE_SPEED * speed_factor(state, side);
        state.paddle_mut(side).drive(direction, max_speed);
    }

    if let Some(ai) = ai {
        ai.update(state);
    }
}

/// Hand this pass's events to the mode
///
/// Brick exhaustion is reported last so every point scored in the same pass
/// counts toward the result.
fn route_events(state: &mut MatchState, mode: &mut Mode, services: &mut Services<'_>) {
    let mut cleared = false;
    for event in std::mem::take(&mut state.events) {
        match event {
            SimEvent::BrickDamaged { by, .. } => mode.on_brick_damaged(state, by),
            SimEvent::BrickDestroyed {
                by,
                max_health,
                explosion,
                ..
            } => mode.on_brick_destroyed(state, by, max_health, explosion),
            SimEvent::AllBricksCleared => cleared = true,
            SimEvent::BallCrossedBoundary { ball, side } => {
                mode.handle_ball_loss(state, ball, side, services)
            }
            SimEvent::PickupCaught { kind, .. } => mode.on_pickup_caught(state, kind),
            SimEvent::PaddleHit { .. } | SimEvent::ProjectileFired { .. } => {}
        }
    }
    if cleared {
        mode.on_bricks_cleared(state, services);
    }
}

/// Respawn balls whose countdown or delay has run out
fn process_respawns(state: &mut MatchState, mode: &mut Mode) {
    let now = state.time_ticks;
    for countdown in state.countdowns.take_finished(now) {
        let mut pending = countdown.pending;
        pending.sort_unstable();
        pending.dedup();
        let quota = mode
            .respawn_quota(state, countdown.side, pending.len())
            .min(pending.len());
        for &ball in &pending[..quota] {
            mode.respawn_ball(state, ball, countdown.side);
        }
        log::debug!(
            "Countdown over for {}: respawned {:?}",
            countdown.side.as_str(),
            &pending[..quota]
        );
    }
    for due in state.countdowns.take_due(now) {
        mode.respawn_ball(state, due.ball, due.side);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::AsciiLevels;
    use crate::persistence::MemoryStore;
    use crate::settings::ModeKind;
    use crate::sim::effects::{EffectKind, spawn_extra_ball};
    use glam::Vec2;
    use proptest::prelude::*;

    fn new_match(mode: ModeKind, seed: u64) -> Match {
        let mut config = MatchConfig::for_mode(mode);
        config.seed = seed;
        Match::new(
            config,
            Box::new(AsciiLevels::builtin()),
            Box::new(MemoryStore::new()),
        )
        .expect("valid config")
    }

    /// Teleport every human paddle onto the nearest incoming ball
    fn track_balls(game: &mut Match) {
        let ai_side = game.mode.ai_side();
        let state = &mut game.state;
        for side in Side::BOTH {
            if Some(side) == ai_side || !state.paddle(side).present {
                continue;
            }
            let face = state.paddle(side).face_x(state.field_width);
            let target = state
                .balls
                .iter()
                .filter(|b| b.active && b.vel.x * side.outward() < 0.0)
                .min_by(|a, b| (a.pos.x - face).abs().total_cmp(&(b.pos.x - face).abs()))
                .map(|b| b.pos.y);
            if let Some(y) = target {
                let paddle = state.paddle_mut(side);
                paddle.y = y - paddle.height / 2.0;
                paddle.velocity = 0.0;
                paddle.clamp();
            }
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        let mut config = MatchConfig::for_mode(ModeKind::PvAi);
        config.difficulty = 0;
        let result = Match::new(
            config,
            Box::new(AsciiLevels::builtin()),
            Box::new(MemoryStore::new()),
        );
        assert!(matches!(result, Err(ConfigError::Difficulty(0))));
    }

    #[test]
    fn test_remembers_config() {
        let game = new_match(ModeKind::Brick2P, 4);
        assert_eq!(MatchConfig::load(game.store()).mode, ModeKind::Brick2P);
    }

    #[test]
    fn test_pvp_win_at_target() {
        let mut config = MatchConfig::for_mode(ModeKind::Pvp);
        config.target_score = 1;
        let mut game = Match::new(
            config,
            Box::new(AsciiLevels::builtin()),
            Box::new(MemoryStore::new()),
        )
        .expect("valid config");

        let ball = &mut game.state.balls[0];
        ball.pos = Vec2::new(801.0, 200.0);
        ball.vel = Vec2::new(4.0, 0.0);
        game.tick(&TickInput::default());

        assert_eq!(game.state.scores, [1, 0]);
        assert!(game.is_over());
        let snapshot = game.snapshot();
        assert_eq!(snapshot.outcome_text.as_deref(), Some("Player 1 Wins!"));
        assert_eq!(snapshot.final_score.as_deref(), Some("Final Score: 1 - 0"));

        // Nothing moves after game over
        let now = game.state.time_ticks;
        game.tick(&TickInput::default());
        assert_eq!(game.state.time_ticks, now);
    }

    #[test]
    fn test_pause_freezes_clock_and_effects() {
        let mut game = new_match(ModeKind::Pvp, 2);
        game.tick(&TickInput::default());
        let now = game.state.time_ticks;
        game.state
            .effects_mut(Side::Left)
            .apply(EffectKind::Enlarge, now, 10);

        let toggle = TickInput {
            pause: true,
            ..Default::default()
        };
        game.tick(&toggle);
        assert_eq!(game.state.phase, GamePhase::Paused);
        for _ in 0..500 {
            game.tick(&TickInput::default());
        }
        assert_eq!(game.state.time_ticks, now);

        game.tick(&toggle);
        assert_eq!(game.state.phase, GamePhase::Playing);
        assert_eq!(game.state.time_ticks, now + 1);
        let effect = game.state.effects(Side::Left).get(EffectKind::Enlarge);
        assert_eq!(effect.map(|e| e.remaining(now + 1)), Some(9));
    }

    #[test]
    fn test_set_paused_is_idempotent() {
        let mut game = new_match(ModeKind::Brick, 2);
        game.set_paused(false);
        assert_eq!(game.state.phase, GamePhase::Playing);
        game.set_paused(true);
        game.set_paused(true);
        assert_eq!(game.state.phase, GamePhase::Paused);
        game.set_paused(false);
        assert_eq!(game.state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_loss_freezes_paddle_until_respawn() {
        let mut game = new_match(ModeKind::Pvp, 9);
        let ball = &mut game.state.balls[0];
        ball.pos = Vec2::new(2.0, 10.0);
        ball.vel = Vec2::new(-4.0, 0.0);
        game.tick(&TickInput::default());
        assert_eq!(game.state.scores, [0, 1]);
        assert!(!game.state.balls[0].active);

        let up = TickInput {
            left: ControlInput {
                up: true,
                down: false,
            },
            ..Default::default()
        };
        let y = game.state.paddle(Side::Left).y;
        let mut digits: Vec<u64> = game.snapshot().countdowns.iter().map(|c| c.digit).collect();
        for _ in 0..COUNTDOWN_TICKS - 1 {
            game.tick(&up);
            digits.extend(game.snapshot().countdowns.iter().map(|c| c.digit));
        }
        assert_eq!(game.state.paddle(Side::Left).y, y);
        assert!(!game.state.balls[0].active);
        assert_eq!(game.snapshot().countdowns.len(), 1);
        digits.dedup();
        assert_eq!(digits, vec![3, 2, 1]);

        game.tick(&up);
        assert!(game.state.balls[0].active);
        assert!(game.state.paddle(Side::Left).y < y);
    }

    #[test]
    fn test_single_ball_respawns_lowest_slot_only() {
        let mut game = new_match(ModeKind::Pvp, 12);
        let state = &mut game.state;
        let now = state.time_ticks;
        state.balls[1].launch(Vec2::new(300.0, 100.0), Vec2::new(-4.0, 1.0), None);
        for ball in [1, 0] {
            state.balls[ball].deactivate();
            state
                .countdowns
                .start(Side::Left, ball, now, &mut state.paddles[Side::Left.index()]);
        }
        assert_eq!(
            state.countdowns.get(Side::Left).map(|c| c.pending.clone()),
            Some(vec![1, 0])
        );

        state.time_ticks = now + COUNTDOWN_TICKS + COUNTDOWN_EXTENSION_TICKS;
        process_respawns(state, &mut game.mode);

        let active: Vec<bool> = state.balls.iter().map(|b| b.active).collect();
        assert_eq!(active, vec![true, false]);
        assert!(state.countdowns.is_empty());
    }

    #[test]
    fn test_brick_duel_drops_lost_extra_ball() {
        let mut game = new_match(ModeKind::Brick2P, 13);
        let extra = spawn_extra_ball(&mut game.state, Side::Left);
        assert_eq!(extra, 2);
        for (ball, y) in [(0, 120.0), (extra, 280.0)] {
            let ball = &mut game.state.balls[ball];
            ball.pos = Vec2::new(-1.0, y);
            ball.vel = Vec2::new(-4.0, 0.0);
        }
        game.tick(&TickInput::default());
        assert_eq!(game.state.scores, [0, 2]);
        assert_eq!(
            game.state.countdowns.get(Side::Left).map(|c| c.pending.clone()),
            Some(vec![0])
        );

        for _ in 0..COUNTDOWN_TICKS {
            game.state.pickups.clear();
            game.tick(&TickInput::default());
        }
        assert!(game.state.balls[0].active);
        assert!(!game.state.balls[extra].active);
    }

    #[test]
    fn test_reverse_swaps_controls() {
        let mut game = new_match(ModeKind::Pvp, 3);
        let now = game.state.time_ticks;
        game.state
            .effects_mut(Side::Left)
            .apply(EffectKind::Reverse, now, 600);
        let y = game.state.paddle(Side::Left).y;
        let up = TickInput {
            left: ControlInput {
                up: true,
                down: false,
            },
            ..Default::default()
        };
        game.tick(&up);
        assert!(game.state.paddle(Side::Left).y > y);
    }

    #[test]
    fn test_same_seed_same_match() {
        for mode in [ModeKind::PvAi, ModeKind::Brick, ModeKind::Solo] {
            let mut a = new_match(mode, 77);
            let mut b = new_match(mode, 77);
            for i in 0..900u32 {
                let input = TickInput {
                    left: ControlInput {
                        up: i % 40 < 20,
                        down: i % 40 >= 20,
                    },
                    ..Default::default()
                };
                a.tick(&input);
                b.tick(&input);
            }
            let a = serde_json::to_string(&a.snapshot()).expect("serializable");
            let b = serde_json::to_string(&b.snapshot()).expect("serializable");
            assert_eq!(a, b, "{}", mode.as_str());
        }
    }

    #[test]
    fn test_brick_points_match_destroyed_bricks() {
        let mut game = new_match(ModeKind::Brick2P, 21);
        let mut losses = 0;
        for _ in 0..20_000 {
            if game.is_over() {
                break;
            }
            track_balls(&mut game);
            game.state.pickups.clear();
            let before: Vec<bool> = game.state.balls.iter().map(|b| b.active).collect();
            game.tick(&TickInput::default());
            losses += before
                .iter()
                .zip(&game.state.balls)
                .filter(|(was, ball)| **was && !ball.active)
                .count() as u32;

            let [left, right] = game.state.scores;
            assert_eq!(left + right, game.state.bricks_destroyed + losses);
        }
        assert!(game.state.bricks_destroyed > 0);
    }

    #[test]
    fn test_solo_runs_without_opponent() {
        let mut game = new_match(ModeKind::Solo, 5);
        for _ in 0..3_000 {
            track_balls(&mut game);
            game.tick(&TickInput::default());
        }
        assert!(!game.is_over());
        let snapshot = game.snapshot();
        assert_eq!(snapshot.paddles.len(), 1);
        assert!(snapshot.score.starts_with("Score: "));
        assert!(snapshot.status.is_some());
        assert!(game.mode.as_solo().is_some_and(|solo| solo.total_score > 0));
    }

    #[test]
    fn test_restart_clears_match() {
        let mut config = MatchConfig::for_mode(ModeKind::Pvp);
        config.target_score = 1;
        let mut game = Match::new(
            config,
            Box::new(AsciiLevels::builtin()),
            Box::new(MemoryStore::new()),
        )
        .expect("valid config");
        let ball = &mut game.state.balls[0];
        ball.pos = Vec2::new(-1.0, 200.0);
        ball.vel = Vec2::new(-4.0, 0.0);
        game.tick(&TickInput::default());
        assert!(game.is_over());

        game.restart();
        assert!(!game.is_over());
        assert_eq!(game.state.scores, [0, 0]);
        assert_eq!(game.state.active_ball_count(), 1);
        assert!(game.snapshot().outcome.is_none());
    }

    proptest! {
        #[test]
        fn prop_paddles_stay_in_field(
            mode in 0usize..5,
            inputs in prop::collection::vec(any::<(bool, bool, bool, bool)>(), 1..300),
        ) {
            let kinds = [
                ModeKind::Pvp,
                ModeKind::PvAi,
                ModeKind::Brick,
                ModeKind::Brick2P,
                ModeKind::Solo,
            ];
            let mut game = new_match(kinds[mode], 13);
            for (lu, ld, ru, rd) in inputs {
                game.tick(&TickInput {
                    left: ControlInput { up: lu, down: ld },
                    right: ControlInput { up: ru, down: rd },
                    pause: false,
                });
                for paddle in &game.state.paddles {
                    prop_assert!(paddle.y >= 0.0);
                    prop_assert!(paddle.y <= game.state.field_height - paddle.height);
                }
            }
        }
    }
}
