//! Error types surfaced by the core
//!
//! Configuration errors reject a match before it starts. Level errors are
//! recovered inside the level loader and only show up in logs.

use thiserror::Error;

/// Invalid match configuration supplied at construction time
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown game mode `{0}`")]
    UnknownMode(String),
    #[error("AI difficulty must be within 1..=5, got {0}")]
    Difficulty(u8),
    #[error("target score must be within 1..=99, got {0}")]
    TargetScore(u32),
    #[error("field width must be within {min}..={max}, got {got}")]
    FieldWidth { got: f32, min: f32, max: f32 },
}

/// Missing or malformed level content
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LevelError {
    #[error("level {0} not found")]
    Missing(u32),
    #[error("level file has no MAPPING section")]
    NoMapping,
    #[error("invalid mapping line `{0}`")]
    BadMapping(String),
    #[error("layout contains no bricks")]
    Empty,
    #[error("layout contains no destructible bricks")]
    NoDestructible,
    #[error("brick {index} is malformed: {reason}")]
    BadBrick { index: usize, reason: &'static str },
}
