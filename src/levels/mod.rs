//! Brick layouts and the level-loading collaborator
//!
//! The simulation only ever sees a [`BrickLayout`]. Where it comes from is up
//! to a [`LevelSource`]; anything missing or malformed is replaced by a
//! deterministic procedural layout so a match never stalls.

pub mod ascii;
pub mod fallback;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::LevelError;

pub use ascii::parse_level;

/// One brick as produced by a level loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: u32,
    #[serde(default)]
    pub indestructible: bool,
}

impl BrickDef {
    pub fn new(x: f32, y: f32, width: f32, height: f32, health: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            health,
            indestructible: false,
        }
    }

    pub fn indestructible(mut self) -> Self {
        self.indestructible = true;
        self
    }
}

/// A full set of bricks for one mode start or solo level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrickLayout {
    pub bricks: Vec<BrickDef>,
}

impl BrickLayout {
    pub fn new(bricks: Vec<BrickDef>) -> Self {
        Self { bricks }
    }

    /// Number of bricks that must be destroyed to clear the layout
    pub fn destructible_count(&self) -> usize {
        self.bricks.iter().filter(|b| !b.indestructible).count()
    }

    /// Check the layout fits the field and can be cleared
    pub fn validate(&self, field_width: f32) -> Result<(), LevelError> {
        if self.bricks.is_empty() {
            return Err(LevelError::Empty);
        }
        for (index, brick) in self.bricks.iter().enumerate() {
            let coords = [brick.x, brick.y, brick.width, brick.height];
            if coords.iter().any(|v| !v.is_finite()) {
                return Err(LevelError::BadBrick {
                    index,
                    reason: "non-finite geometry",
                });
            }
            if brick.width <= 0.0 || brick.height <= 0.0 {
                return Err(LevelError::BadBrick {
                    index,
                    reason: "non-positive size",
                });
            }
            if brick.x < 0.0
                || brick.y < 0.0
                || brick.x + brick.width > field_width
                || brick.y + brick.height > FIELD_HEIGHT
            {
                return Err(LevelError::BadBrick {
                    index,
                    reason: "outside the field",
                });
            }
            if !brick.indestructible && brick.health == 0 {
                return Err(LevelError::BadBrick {
                    index,
                    reason: "zero health",
                });
            }
        }
        if self.destructible_count() == 0 {
            return Err(LevelError::NoDestructible);
        }
        Ok(())
    }
}

/// Supplies brick layouts to the simulation
pub trait LevelSource {
    /// Layout for the head-to-head brick modes
    fn competitive_layout(&self, field_width: f32) -> Result<BrickLayout, LevelError> {
        Ok(fallback::competitive_grid(field_width))
    }

    /// Layout for a solo level (1-based)
    fn solo_layout(&self, level: u32, field_width: f32) -> Result<BrickLayout, LevelError>;
}

/// Level set written in the ASCII mini-format, keyed by level number
#[derive(Debug, Clone, Default)]
pub struct AsciiLevels {
    levels: BTreeMap<u32, String>,
}

impl AsciiLevels {
    /// Empty set (every solo level uses the procedural fallback)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a level
    pub fn with_level(mut self, level: u32, content: impl Into<String>) -> Self {
        self.levels.insert(level, content.into());
        self
    }

    /// The levels shipped with the game
    pub fn builtin() -> Self {
        ascii::BUILTIN_LEVELS
            .iter()
            .enumerate()
            .fold(Self::new(), |set, (i, content)| {
                set.with_level(i as u32 + 1, *content)
            })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl LevelSource for AsciiLevels {
    fn solo_layout(&self, level: u32, field_width: f32) -> Result<BrickLayout, LevelError> {
        let content = self.levels.get(&level).ok_or(LevelError::Missing(level))?;
        parse_level(content, field_width)
    }
}

/// Fetch the competitive layout, falling back to the standard grid
pub fn load_competitive(source: &dyn LevelSource, field_width: f32) -> BrickLayout {
    let loaded = source
        .competitive_layout(field_width)
        .and_then(|layout| layout.validate(field_width).map(|_| layout));
    match loaded {
        Ok(layout) => layout,
        Err(err) => {
            log::warn!("Competitive layout rejected ({}), using standard grid", err);
            fallback::competitive_grid(field_width)
        }
    }
}

/// Fetch a solo level, falling back to a generated pattern
pub fn load_solo(source: &dyn LevelSource, level: u32, field_width: f32) -> BrickLayout {
    let loaded = source
        .solo_layout(level, field_width)
        .and_then(|layout| layout.validate(field_width).map(|_| layout));
    match loaded {
        Ok(layout) => layout,
        Err(err) => {
            log::warn!("Level {} unavailable ({}), using generated pattern", level, err);
            fallback::solo_pattern(level, field_width)
        }
    }
}
