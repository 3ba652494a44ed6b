//! Per-tick movement and collision response
//!
//! Moves balls, pickups and projectiles, resolves their contacts against the
//! match state and records what happened as [`SimEvent`]s. Scoring and
//! respawn decisions are left to the mode.

use glam::Vec2;
use rand::Rng;

use super::collision::{
    ball_box_collision, ball_paddle_collision, blast_targets, circle_hits_box, point_in_box,
};
use super::effects::{EffectKind, apply_pickup, explosive_side};
use super::state::{BrickHit, ExplosiveTag, GhostTag, MatchState, Pickup, Side, SimEvent};
use crate::consts::*;

/// Bonus drop odds and the kinds that can drop
#[derive(Debug, Clone, Copy)]
pub struct DropTable {
    pub chance: f32,
    pub pool: &'static [EffectKind],
}

impl DropTable {
    pub const NONE: DropTable = DropTable {
        chance: 0.0,
        pool: &[],
    };
}

/// Move every active ball and resolve wall, brick and paddle contacts
pub fn step_balls(state: &mut MatchState, drops: DropTable) {
    let uses_bricks = state.kind.uses_bricks();
    for index in 0..state.balls.len() {
        if !state.balls[index].active {
            continue;
        }
        integrate_ball(state, index);
        // One brick per ball per tick, and a brick hit skips the paddles
        if uses_bricks && collide_bricks(state, index, drops) {
            continue;
        }
        collide_paddles(state, index);
    }
}

fn integrate_ball(state: &mut MatchState, index: usize) {
    let height = state.field_height;
    let ball = &mut state.balls[index];
    ball.pos += ball.vel;
    if ball.pos.y - BALL_RADIUS < 0.0 {
        ball.pos.y = BALL_RADIUS;
        ball.vel.y = ball.vel.y.abs();
    } else if ball.pos.y + BALL_RADIUS > height {
        ball.pos.y = height - BALL_RADIUS;
        ball.vel.y = -ball.vel.y.abs();
    }
}

fn collide_bricks(state: &mut MatchState, index: usize, drops: DropTable) -> bool {
    let (pos, vel) = (state.balls[index].pos, state.balls[index].vel);
    let contact = state
        .bricks
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.destroyed)
        .find_map(|(i, b)| {
            let result = ball_box_collision(pos, vel, BALL_RADIUS, b.pos, b.size);
            result.hit.then_some((i, result))
        });
    let Some((brick, result)) = contact else {
        return false;
    };

    let ball = &mut state.balls[index];
    ball.pos = result.position;
    ball.vel = result.velocity;
    let owner = ball.owner;
    let explosive = ball.explosive.is_some();

    if state.bricks[brick].indestructible {
        return true;
    }
    if explosive {
        explode(state, brick, result.position, owner);
    } else {
        damage_brick(state, brick, owner, drops);
    }
    true
}

fn collide_paddles(state: &mut MatchState, index: usize) {
    let width = state.field_width;
    for side in Side::BOTH {
        let paddle = state.paddle(side);
        if !paddle.present {
            continue;
        }
        let ball = &state.balls[index];
        let result = ball_paddle_collision(ball.pos, ball.vel, BALL_RADIUS, paddle, width);
        if !result.hit {
            continue;
        }

        let explosive = explosive_side(state, Some(side)).map(|side| ExplosiveTag { side });
        let ghost = state
            .effect_live(side, EffectKind::Ghost)
            .then_some(GhostTag {
                side,
                hidden: false,
            });

        let ball = &mut state.balls[index];
        ball.pos = result.position;
        ball.vel = result.velocity;
        ball.owner = Some(side);
        ball.explosive = explosive;
        ball.ghost = ghost;
        state.push_event(SimEvent::PaddleHit { ball: index, side });
        break;
    }
}

/// One point of damage to a brick, from a ball or a laser
pub fn damage_brick(state: &mut MatchState, brick: usize, by: Option<Side>, drops: DropTable) {
    match state.bricks[brick].take_hit() {
        BrickHit::Deflected => {}
        BrickHit::Damaged => state.push_event(SimEvent::BrickDamaged { brick, by }),
        BrickHit::Destroyed => {
            record_destroyed(state, brick, by, false);
            roll_bonus(state, brick, by, drops);
        }
    }
}

/// Destroy the struck brick and its unshielded neighbours
pub fn explode(state: &mut MatchState, struck: usize, impact: Vec2, by: Option<Side>) {
    let targets = blast_targets(impact, &state.bricks, struck);
    log::debug!("Explosion at {:?} takes {} bricks", impact, targets.len());
    for brick in targets {
        if state.bricks[brick].demolish() {
            record_destroyed(state, brick, by, true);
        }
    }
}

fn record_destroyed(state: &mut MatchState, brick: usize, by: Option<Side>, explosion: bool) {
    let before = state.bricks_remaining;
    state.bricks_remaining = before.saturating_sub(1);
    state.bricks_destroyed += 1;
    let max_health = state.bricks[brick].max_health;
    state.push_event(SimEvent::BrickDestroyed {
        brick,
        by,
        max_health,
        explosion,
    });
    if before > 0 && state.bricks_remaining == 0 {
        state.push_event(SimEvent::AllBricksCleared);
    }
}

fn roll_bonus(state: &mut MatchState, brick: usize, by: Option<Side>, drops: DropTable) {
    if drops.pool.is_empty() || state.rng.random::<f32>() >= drops.chance {
        return;
    }
    let kind = drops.pool[state.rng.random_range(0..drops.pool.len())];
    let toward = match by {
        Some(side) => side,
        None if state.rng.random_bool(0.5) => Side::Left,
        None => Side::Right,
    };
    let pickup = Pickup {
        kind,
        pos: state.bricks[brick].center(),
        vel: Vec2::new(-toward.outward() * PICKUP_SPEED, 0.0),
    };
    log::debug!("Bonus {} drops toward {}", kind.as_str(), toward.as_str());
    state.pickups.push(pickup);
}

/// Deactivate balls that left the field and report which side lost them
pub fn detect_boundary_crossings(state: &mut MatchState) {
    let width = state.field_width;
    let mut lost = Vec::new();
    for (index, ball) in state.balls.iter_mut().enumerate() {
        if !ball.active {
            continue;
        }
        let side = if ball.pos.x < 0.0 {
            Side::Left
        } else if ball.pos.x > width {
            Side::Right
        } else {
            continue;
        };
        ball.deactivate();
        lost.push((index, side));
    }
    for (ball, side) in lost {
        state.push_event(SimEvent::BallCrossedBoundary { ball, side });
    }
}

/// Move pickups, apply the ones a paddle touches, drop the ones that left
pub fn update_pickups(state: &mut MatchState) {
    let width = state.field_width;
    let paddles = &state.paddles;
    let mut caught = Vec::new();

    state.pickups.retain_mut(|pickup| {
        pickup.pos += pickup.vel;
        for paddle in paddles.iter().filter(|p| p.present) {
            let min = Vec2::new(paddle.rect_x(width), paddle.y);
            let size = Vec2::new(PADDLE_WIDTH, paddle.height);
            if circle_hits_box(pickup.pos, PICKUP_RADIUS, min, size) {
                caught.push((pickup.kind, paddle.side));
                return false;
            }
        }
        pickup.pos.x >= -PICKUP_BOUNDS_MARGIN && pickup.pos.x <= width + PICKUP_BOUNDS_MARGIN
    });

    for (kind, side) in caught {
        apply_pickup(state, kind, side);
    }
}

/// Move lasers; they damage the first brick they touch and die on the enemy paddle
pub fn update_projectiles(state: &mut MatchState, drops: DropTable) {
    let width = state.field_width;
    let bricks = &state.bricks;
    let paddles = &state.paddles;
    let mut hits = Vec::new();

    state.projectiles.retain_mut(|shot| {
        shot.pos += shot.vel;
        if let Some(brick) = bricks
            .iter()
            .position(|b| !b.destroyed && point_in_box(shot.pos, b.pos, b.size))
        {
            hits.push((brick, shot.owner));
            return false;
        }
        let enemy = &paddles[shot.owner.opponent().index()];
        if enemy.present && enemy.contains(shot.pos, width) {
            return false;
        }
        shot.pos.x >= 0.0 && shot.pos.x <= width
    });

    for (brick, owner) in hits {
        damage_brick(state, brick, Some(owner), drops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{BrickDef, BrickLayout};
    use crate::settings::ModeKind;
    use crate::sim::state::Projectile;

    const ALL_DROPS: DropTable = DropTable {
        chance: 1.0,
        pool: &EffectKind::ALL,
    };

    fn brick_state(defs: Vec<BrickDef>) -> MatchState {
        let mut state = MatchState::new(ModeKind::Brick2P, 800.0, 11);
        state.load_bricks(&BrickLayout::new(defs));
        state
    }

    #[test]
    fn test_wall_reflection_clamps() {
        let mut state = MatchState::new(ModeKind::Pvp, 800.0, 1);
        state.balls[0].launch(Vec2::new(400.0, 8.0), Vec2::new(4.0, -5.0), None);
        step_balls(&mut state, DropTable::NONE);
        assert_eq!(state.balls[0].pos.y, BALL_RADIUS);
        assert!(state.balls[0].vel.y > 0.0);
    }

    #[test]
    fn test_brick_damage_and_clear() {
        let mut state = brick_state(vec![BrickDef::new(400.0, 180.0, 20.0, 45.0, 2)]);
        for _ in 0..2 {
            state.balls[0].launch(Vec2::new(388.0, 200.0), Vec2::new(4.0, 0.0), Some(Side::Left));
            step_balls(&mut state, DropTable::NONE);
        }
        assert!(state.bricks[0].destroyed);
        assert_eq!(state.bricks_remaining, 0);
        assert_eq!(
            state.events,
            vec![
                SimEvent::BrickDamaged {
                    brick: 0,
                    by: Some(Side::Left)
                },
                SimEvent::BrickDestroyed {
                    brick: 0,
                    by: Some(Side::Left),
                    max_health: 2,
                    explosion: false
                },
                SimEvent::AllBricksCleared,
            ]
        );
    }

    #[test]
    fn test_indestructible_brick_survives_1000_hits() {
        let mut state = brick_state(vec![
            BrickDef::new(400.0, 180.0, 20.0, 45.0, 1).indestructible(),
            BrickDef::new(600.0, 20.0, 20.0, 20.0, 1),
        ]);
        for _ in 0..1000 {
            state.balls[0].launch(Vec2::new(388.0, 200.0), Vec2::new(4.0, 0.0), Some(Side::Left));
            step_balls(&mut state, ALL_DROPS);
            assert!(state.balls[0].vel.x < 0.0);
        }
        assert!(!state.bricks[0].destroyed);
        assert_eq!(state.bricks_remaining, 1);
        assert!(state.events.is_empty());
        assert!(state.pickups.is_empty());
    }

    #[test]
    fn test_explosive_ball_bounces_off_indestructible() {
        let mut state = brick_state(vec![
            BrickDef::new(400.0, 180.0, 20.0, 45.0, 1).indestructible(),
            BrickDef::new(425.0, 180.0, 20.0, 45.0, 1),
        ]);
        state.balls[0].launch(Vec2::new(388.0, 200.0), Vec2::new(4.0, 0.0), Some(Side::Left));
        state.balls[0].explosive = Some(ExplosiveTag { side: Side::Left });
        step_balls(&mut state, ALL_DROPS);

        assert!(state.balls[0].vel.x < 0.0);
        assert!(!state.bricks[0].destroyed);
        assert!(!state.bricks[1].destroyed);
        assert_eq!(state.bricks[1].health, 1);
        assert_eq!(state.bricks_remaining, 1);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_ball_leaves_brick_after_bounce() {
        let mut state = brick_state(vec![BrickDef::new(400.0, 180.0, 20.0, 45.0, 5)]);
        state.balls[0].launch(Vec2::new(390.0, 170.0), Vec2::new(4.0, 3.0), Some(Side::Left));
        step_balls(&mut state, DropTable::NONE);
        step_balls(&mut state, DropTable::NONE);
        let brick = &state.bricks[0];
        assert!(!circle_hits_box(state.balls[0].pos, BALL_RADIUS - 0.01, brick.pos, brick.size));
    }

    #[test]
    fn test_explosive_ball_clears_neighbours() {
        let mut state = brick_state(vec![
            BrickDef::new(400.0, 180.0, 20.0, 45.0, 3),
            BrickDef::new(425.0, 180.0, 20.0, 45.0, 3),
            BrickDef::new(700.0, 180.0, 20.0, 45.0, 3),
        ]);
        state.balls[0].launch(Vec2::new(388.0, 200.0), Vec2::new(4.0, 0.0), Some(Side::Left));
        state.balls[0].explosive = Some(ExplosiveTag { side: Side::Left });
        step_balls(&mut state, ALL_DROPS);

        assert!(state.bricks[0].destroyed && state.bricks[1].destroyed);
        assert!(!state.bricks[2].destroyed);
        assert_eq!(state.bricks_remaining, 1);
        // Explosions never drop bonuses
        assert!(state.pickups.is_empty());
        assert!(state.events.iter().all(|e| matches!(
            e,
            SimEvent::BrickDestroyed {
                explosion: true,
                ..
            }
        )));
    }

    #[test]
    fn test_paddle_hit_sets_owner() {
        let mut state = MatchState::new(ModeKind::PvAi, 800.0, 1);
        let y = state.paddle(Side::Right).center_y();
        state.balls[0].launch(Vec2::new(770.0, y), Vec2::new(4.0, 0.0), Some(Side::Left));
        step_balls(&mut state, DropTable::NONE);
        let ball = &state.balls[0];
        assert_eq!(ball.owner, Some(Side::Right));
        assert!(ball.vel.x < 0.0);
        assert_eq!(ball.pos.x, 800.0 - PADDLE_INSET - BALL_RADIUS);
        assert_eq!(
            state.events,
            vec![SimEvent::PaddleHit {
                ball: 0,
                side: Side::Right
            }]
        );
    }

    #[test]
    fn test_boundary_crossing() {
        let mut state = MatchState::new(ModeKind::Pvp, 800.0, 1);
        state.balls[0].launch(Vec2::new(801.0, 100.0), Vec2::new(4.0, 0.0), None);
        state.balls[1].launch(Vec2::new(-1.0, 100.0), Vec2::new(-4.0, 0.0), None);
        detect_boundary_crossings(&mut state);
        assert_eq!(state.active_ball_count(), 0);
        assert_eq!(
            state.events,
            vec![
                SimEvent::BallCrossedBoundary {
                    ball: 0,
                    side: Side::Right
                },
                SimEvent::BallCrossedBoundary {
                    ball: 1,
                    side: Side::Left
                },
            ]
        );
    }

    #[test]
    fn test_bonus_drifts_toward_owner() {
        let mut state = brick_state(vec![BrickDef::new(400.0, 180.0, 20.0, 45.0, 1)]);
        state.balls[0].launch(Vec2::new(432.0, 200.0), Vec2::new(-4.0, 0.0), Some(Side::Right));
        step_balls(&mut state, ALL_DROPS);
        assert_eq!(state.pickups.len(), 1);
        assert!(state.pickups[0].vel.x > 0.0);
        assert_eq!(state.pickups[0].pos, Vec2::new(410.0, 202.5));
    }

    #[test]
    fn test_left_paddle_catches_slow_for_right() {
        let mut state = brick_state(vec![BrickDef::new(400.0, 180.0, 20.0, 45.0, 1)]);
        let y = state.paddle(Side::Left).center_y();
        state.pickups.push(Pickup {
            kind: EffectKind::Slow,
            pos: Vec2::new(30.0, y),
            vel: Vec2::new(-PICKUP_SPEED, 0.0),
        });
        update_pickups(&mut state);
        assert!(state.pickups.is_empty());
        assert!(state.effect_live(Side::Right, EffectKind::Slow));
        assert!(!state.effect_live(Side::Left, EffectKind::Slow));
    }

    #[test]
    fn test_missed_pickup_is_dropped() {
        let mut state = brick_state(vec![BrickDef::new(400.0, 180.0, 20.0, 45.0, 1)]);
        state.pickups.push(Pickup {
            kind: EffectKind::Enlarge,
            pos: Vec2::new(-19.0, 5.0),
            vel: Vec2::new(-PICKUP_SPEED, 0.0),
        });
        update_pickups(&mut state);
        assert!(state.pickups.is_empty());
        assert!(state.effects(Side::Left).is_empty());
    }

    #[test]
    fn test_laser_damages_first_brick() {
        let mut state = brick_state(vec![BrickDef::new(400.0, 180.0, 20.0, 45.0, 2)]);
        state.projectiles.push(Projectile {
            pos: Vec2::new(395.0, 200.0),
            vel: Vec2::new(PROJECTILE_SPEED, 0.0),
            owner: Side::Left,
        });
        update_projectiles(&mut state, DropTable::NONE);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.bricks[0].health, 1);
        assert_eq!(
            state.events,
            vec![SimEvent::BrickDamaged {
                brick: 0,
                by: Some(Side::Left)
            }]
        );
    }

    #[test]
    fn test_enemy_paddle_absorbs_laser() {
        let mut state = MatchState::new(ModeKind::Brick2P, 800.0, 1);
        let y = state.paddle(Side::Right).center_y();
        state.projectiles.push(Projectile {
            pos: Vec2::new(775.0, y),
            vel: Vec2::new(PROJECTILE_SPEED, 0.0),
            owner: Side::Left,
        });
        update_projectiles(&mut state, DropTable::NONE);
        assert!(state.projectiles.is_empty());
    }
}
