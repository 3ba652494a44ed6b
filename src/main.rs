//! Paddle Arena headless runner
//!
//! Plays a scripted match with a tracking autopilot on every human paddle and
//! prints the final snapshot as JSON.
//!
//! Usage: `paddle-arena [mode] [seconds] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use paddle_arena::consts::TICK_HZ;
    use paddle_arena::sim::Match;
    use paddle_arena::{AsciiLevels, MatchConfig, MemoryStore};

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("pvai");
    let seconds: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(60);
    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(1);

    let mut config = match MatchConfig::from_mode_name(mode) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    config.seed = seed;

    let mut game = match Match::new(
        config,
        Box::new(AsciiLevels::builtin()),
        Box::new(MemoryStore::new()),
    ) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    log::info!("Paddle Arena ({}) running for {}s", mode, seconds);
    for _ in 0..seconds * TICK_HZ {
        if game.is_over() {
            break;
        }
        let input = autopilot::input(&game);
        game.tick(&input);
    }

    match serde_json::to_string_pretty(&game.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            log::error!("Snapshot serialization failed: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless runner is native only
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use paddle_arena::sim::effects::controls_reversed;
    use paddle_arena::sim::{ControlInput, Match, Side, TickInput};

    /// Dead zone around the paddle centre
    const SLACK: f32 = 10.0;

    /// Steer every human paddle toward the nearest incoming ball
    pub fn input(game: &Match) -> TickInput {
        let state = game.state();
        let mut input = TickInput::default();

        for side in Side::BOTH {
            let paddle = state.paddle(side);
            if Some(side) == game.mode().ai_side() || !paddle.present {
                continue;
            }
            let face = paddle.face_x(state.field_width);
            let target = state
                .balls
                .iter()
                .filter(|b| b.active && b.vel.x * side.outward() < 0.0)
                .min_by(|a, b| (a.pos.x - face).abs().total_cmp(&(b.pos.x - face).abs()))
                .map_or(state.field_height / 2.0, |b| b.pos.y);

            let center = paddle.center_y();
            let mut control = ControlInput {
                up: target < center - SLACK,
                down: target > center + SLACK,
            };
            // Reversed controls get undone by swapping the keys
            if controls_reversed(state, side) {
                std::mem::swap(&mut control.up, &mut control.down);
            }
            match side {
                Side::Left => input.left = control,
                Side::Right => input.right = control,
            }
        }
        input
    }
}
