//! Deterministic procedural layouts
//!
//! Used for the head-to-head brick modes and whenever a solo level is missing
//! or malformed. Same inputs always produce the same layout.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{BrickDef, BrickLayout};
use crate::consts::*;

/// Highest health a generated brick gets
const MAX_GENERATED_HEALTH: u32 = 10;

/// Solo pattern cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Grid,
    Diamond,
    Triangle,
    Ring,
}

impl Pattern {
    pub const CYCLE: [Pattern; 4] = [
        Pattern::Grid,
        Pattern::Diamond,
        Pattern::Triangle,
        Pattern::Ring,
    ];

    /// Pattern and difficulty tier for a 1-based level
    pub fn for_level(level: u32) -> (Pattern, u32) {
        let index = level.saturating_sub(1) as usize;
        let pattern = Self::CYCLE[index % Self::CYCLE.len()];
        let difficulty = (index / Self::CYCLE.len()) as u32 + 1;
        (pattern, difficulty)
    }
}

/// Centered grid for the head-to-head brick modes
pub fn competitive_grid(field_width: f32) -> BrickLayout {
    let available = (field_width - BRICK_PADDLE_MARGIN).max(0.0);
    let cols = ((available / (BRICK_WIDTH + BRICK_PADDING)).floor() as usize).max(1);

    let total_w = cols as f32 * (BRICK_WIDTH + BRICK_PADDING) - BRICK_PADDING;
    let total_h = BRICK_ROWS as f32 * (BRICK_HEIGHT + BRICK_PADDING) - BRICK_PADDING;
    let start_x = (field_width - total_w) / 2.0;
    let start_y = (FIELD_HEIGHT - total_h) / 2.0;

    let mut bricks = Vec::with_capacity(cols * BRICK_ROWS);
    for row in 0..BRICK_ROWS {
        for col in 0..cols {
            let x = start_x + col as f32 * (BRICK_WIDTH + BRICK_PADDING);
            let y = start_y + row as f32 * (BRICK_HEIGHT + BRICK_PADDING);
            bricks.push(BrickDef::new(x, y, BRICK_WIDTH, BRICK_HEIGHT, 1));
        }
    }
    BrickLayout::new(bricks)
}

/// Generated solo level
pub fn solo_pattern(level: u32, field_width: f32) -> BrickLayout {
    let (pattern, difficulty) = Pattern::for_level(level);
    let mut rng = Pcg32::seed_from_u64(0x5eed_0000 + level as u64);
    // Keep clear of the paddle zone, biased toward the far wall
    let center = Vec2::new(field_width - 260.0, FIELD_HEIGHT / 2.0);

    let cells = match pattern {
        Pattern::Grid => grid_cells(difficulty),
        Pattern::Diamond => diamond_cells(difficulty),
        Pattern::Triangle => triangle_cells(difficulty),
        Pattern::Ring => ring_cells(difficulty),
    };

    let bricks = cells
        .into_iter()
        .map(|cell| {
            let pos = center + cell.offset - Vec2::new(SOLO_BRICK_WIDTH, SOLO_BRICK_HEIGHT) / 2.0;
            let health = cell.health.clamp(1, MAX_GENERATED_HEALTH);
            let mut brick = BrickDef::new(pos.x, pos.y, SOLO_BRICK_WIDTH, SOLO_BRICK_HEIGHT, health);
            // Walls only from the second cycle on, and only in the core
            if difficulty > 1 && cell.core && rng.random::<f32>() < 0.15 {
                brick.indestructible = true;
            }
            brick
        })
        .collect();

    BrickLayout::new(bricks)
}

/// A brick position relative to the pattern center
struct Cell {
    offset: Vec2,
    health: u32,
    /// Innermost part of the pattern (eligible for indestructible bricks)
    core: bool,
}

fn step() -> Vec2 {
    Vec2::new(SOLO_BRICK_WIDTH + SOLO_BRICK_GAP, SOLO_BRICK_HEIGHT + SOLO_BRICK_GAP)
}

fn grid_cells(difficulty: u32) -> Vec<Cell> {
    let rows = 5 + difficulty.min(4) as i32;
    let cols = 8;
    let step = step();
    let mut cells = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let offset = Vec2::new(
                (col as f32 - (cols - 1) as f32 / 2.0) * step.x,
                (row as f32 - (rows - 1) as f32 / 2.0) * step.y,
            );
            cells.push(Cell {
                offset,
                health: 1 + (row as u32 % 3) + difficulty / 2,
                core: row == rows / 2,
            });
        }
    }
    cells
}

fn diamond_cells(difficulty: u32) -> Vec<Cell> {
    let rows = (7 + 2 * difficulty as i32).min(15);
    let half = rows / 2;
    let step = step();
    let mut cells = Vec::new();
    for row in 0..rows {
        let width = half - (row - half).abs() + 1;
        for col in 0..width {
            let offset = Vec2::new(
                (col as f32 - (width - 1) as f32 / 2.0) * step.x,
                (row - half) as f32 * step.y,
            );
            let dist = (row - half).abs() + (2 * col - (width - 1)).abs() / 2;
            cells.push(Cell {
                offset,
                health: (half - dist).max(0) as u32 / 2 + difficulty,
                core: dist == 0,
            });
        }
    }
    cells
}

fn triangle_cells(difficulty: u32) -> Vec<Cell> {
    let rows = (5 + difficulty as i32).min(9);
    let step = step();
    let mut cells = Vec::new();
    for row in 0..rows {
        let width = row + 1;
        for col in 0..width {
            let offset = Vec2::new(
                (col as f32 - (width - 1) as f32 / 2.0) * step.x,
                (row as f32 - (rows - 1) as f32 / 2.0) * step.y,
            );
            cells.push(Cell {
                offset,
                health: (rows - row) as u32 / 2 + difficulty,
                core: row == rows - 1 && col > 0 && col < width - 1,
            });
        }
    }
    cells
}

fn ring_cells(difficulty: u32) -> Vec<Cell> {
    let layers = 2 + difficulty.min(3);
    let max_radius = 120.0;
    let mut cells = Vec::new();
    for layer in 0..layers {
        let radius = max_radius * (1.0 - layer as f32 / layers as f32);
        let count = ((std::f32::consts::TAU * radius) / (SOLO_BRICK_WIDTH * 1.5)).floor() as u32;
        for i in 0..count.max(1) {
            let angle = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
            // Squash vertically so the ring keeps clear of the top/bottom walls
            let offset = Vec2::new(radius * angle.cos(), radius * 0.9 * angle.sin());
            cells.push(Cell {
                offset,
                health: layer + difficulty,
                core: layer == layers - 1,
            });
        }
    }
    cells
}
