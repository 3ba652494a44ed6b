//! Collision detection and response for axis-aligned geometry
//!
//! Pure functions: a ball against a brick box, a ball against a paddle face,
//! and the segment/box tests explosions use. Nothing here touches match state.

use glam::Vec2;

use super::state::{Brick, Paddle, Side};
use crate::consts::*;

/// Which pair of faces the ball bounced off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceAxis {
    /// Left/right face, horizontal velocity flips
    Horizontal,
    /// Top/bottom face, vertical velocity flips
    Vertical,
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    pub axis: BounceAxis,
    /// Ball center moved flush against the hit face
    pub position: Vec2,
    /// Velocity after the bounce
    pub velocity: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            axis: BounceAxis::Vertical,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }
}

/// Check a ball against a box using its next position
///
/// The box is inflated by the ball radius and the overlap must be strict, so a
/// ball resting flush against a face does not register. The bounce axis is the
/// one with the smaller overlap measured from the current center. The ball is
/// moved flush to the hit face and its velocity made to point away from it.
pub fn ball_box_collision(
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    box_min: Vec2,
    box_size: Vec2,
) -> CollisionResult {
    let next = pos + vel;
    let box_max = box_min + box_size;

    let overlaps = next.x + radius > box_min.x
        && next.x - radius < box_max.x
        && next.y + radius > box_min.y
        && next.y - radius < box_max.y;
    if !overlaps {
        return CollisionResult::miss();
    }

    let center = box_min + box_size / 2.0;
    let overlap_x = (box_size.x / 2.0 + radius) - (pos.x - center.x).abs();
    let overlap_y = (box_size.y / 2.0 + radius) - (pos.y - center.y).abs();

    if overlap_x < overlap_y {
        let from_left = pos.x < center.x;
        let x = if from_left {
            box_min.x - radius
        } else {
            box_max.x + radius
        };
        let vx = if from_left { -vel.x.abs() } else { vel.x.abs() };
        CollisionResult {
            hit: true,
            axis: BounceAxis::Horizontal,
            position: Vec2::new(x, pos.y),
            velocity: Vec2::new(vx, vel.y),
        }
    } else {
        let from_above = pos.y < center.y;
        let y = if from_above {
            box_min.y - radius
        } else {
            box_max.y + radius
        };
        let vy = if from_above { -vel.y.abs() } else { vel.y.abs() };
        CollisionResult {
            hit: true,
            axis: BounceAxis::Vertical,
            position: Vec2::new(pos.x, y),
            velocity: Vec2::new(vel.x, vy),
        }
    }
}

/// Check a ball against a paddle face
///
/// Hits when the leading edge is inside the paddle's thickness, the ball moves
/// toward the paddle and its center is within the paddle's vertical span. The
/// new vertical velocity depends only on where the ball struck.
pub fn ball_paddle_collision(
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    paddle: &Paddle,
    field_width: f32,
) -> CollisionResult {
    let face = paddle.face_x(field_width);
    let in_band = match paddle.side {
        Side::Left => {
            let edge = pos.x - radius;
            vel.x < 0.0 && edge <= face && edge > face - PADDLE_WIDTH
        }
        Side::Right => {
            let edge = pos.x + radius;
            vel.x > 0.0 && edge >= face && edge < face + PADDLE_WIDTH
        }
    };
    if !in_band || pos.y < paddle.y || pos.y > paddle.y + paddle.height {
        return CollisionResult::miss();
    }

    let ratio = (pos.y - paddle.y) / paddle.height;
    CollisionResult {
        hit: true,
        axis: BounceAxis::Horizontal,
        position: Vec2::new(face + paddle.side.outward() * radius, pos.y),
        velocity: Vec2::new(-vel.x, (ratio - 0.5) * PADDLE_SPIN),
    }
}

/// Whether a point lies inside (or on) a box
pub fn point_in_box(point: Vec2, box_min: Vec2, box_size: Vec2) -> bool {
    let box_max = box_min + box_size;
    point.x >= box_min.x && point.x <= box_max.x && point.y >= box_min.y && point.y <= box_max.y
}

/// Whether a circle touches a box
pub fn circle_hits_box(center: Vec2, radius: f32, box_min: Vec2, box_size: Vec2) -> bool {
    let closest = center.clamp(box_min, box_min + box_size);
    closest.distance_squared(center) <= radius * radius
}

/// Whether the segment `a -> b` crosses a box (slab test)
pub fn segment_hits_box(a: Vec2, b: Vec2, box_min: Vec2, box_size: Vec2) -> bool {
    let box_max = box_min + box_size;
    let d = b - a;
    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;

    for (start, delta, lo, hi) in [
        (a.x, d.x, box_min.x, box_max.x),
        (a.y, d.y, box_min.y, box_max.y),
    ] {
        if delta.abs() < f32::EPSILON {
            if start < lo || start > hi {
                return false;
            }
            continue;
        }
        let mut t0 = (lo - start) / delta;
        let mut t1 = (hi - start) / delta;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return false;
        }
    }
    true
}

/// Bricks an explosion at `impact` destroys
///
/// The struck brick plus every standing destructible brick whose center is
/// within the blast radius and not shielded by an indestructible brick.
pub fn blast_targets(impact: Vec2, bricks: &[Brick], struck: usize) -> Vec<usize> {
    let walls: Vec<&Brick> = bricks
        .iter()
        .filter(|b| b.indestructible && !b.destroyed)
        .collect();

    bricks
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.destroyed && !b.indestructible)
        .filter(|(i, b)| {
            if *i == struck {
                return true;
            }
            let center = b.center();
            center.distance(impact) <= EXPLOSION_RADIUS
                && !walls
                    .iter()
                    .any(|w| segment_hits_box(impact, center, w.pos, w.size))
        })
        .map(|(i, _)| i)
        .collect()
}
