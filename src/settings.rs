//! Match configuration
//!
//! Chosen on the menu and remembered between sessions through the key-value
//! store. Validated before a match is constructed.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::persistence::{KeyValueStore, load_json, save_json};

/// Game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModeKind {
    #[default]
    Pvp,
    PvAi,
    Brick,
    Brick2P,
    Solo,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Pvp => "pvp",
            ModeKind::PvAi => "pvai",
            ModeKind::Brick => "brick",
            ModeKind::Brick2P => "brick2p",
            ModeKind::Solo => "solo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pvp" => Some(ModeKind::Pvp),
            "pvai" | "ai" => Some(ModeKind::PvAi),
            "brick" => Some(ModeKind::Brick),
            "brick2p" => Some(ModeKind::Brick2P),
            "solo" | "adventure" => Some(ModeKind::Solo),
            _ => None,
        }
    }

    /// Whether the right paddle is driven by the AI
    pub fn has_ai(&self) -> bool {
        matches!(self, ModeKind::PvAi | ModeKind::Brick)
    }

    /// Whether the mode uses bricks
    pub fn uses_bricks(&self) -> bool {
        matches!(self, ModeKind::Brick | ModeKind::Brick2P | ModeKind::Solo)
    }
}

/// Match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub mode: ModeKind,
    /// AI difficulty (1-5)
    pub difficulty: u8,
    /// Points needed to win in versus modes
    pub target_score: u32,
    /// Field width in pixels (height is fixed)
    pub field_width: f32,
    /// RNG seed for serves, AI noise and bonus rolls
    #[serde(default)]
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: ModeKind::Pvp,
            difficulty: 3,
            target_score: 10,
            field_width: DEFAULT_FIELD_WIDTH,
            seed: 0,
        }
    }
}

impl MatchConfig {
    /// Create a config for a mode with default tunables
    pub fn for_mode(mode: ModeKind) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Parse a mode name into a config
    pub fn from_mode_name(name: &str) -> Result<Self, ConfigError> {
        ModeKind::from_str(name)
            .map(Self::for_mode)
            .ok_or_else(|| ConfigError::UnknownMode(name.to_string()))
    }

    /// Reject out-of-range tunables
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=5).contains(&self.difficulty) {
            return Err(ConfigError::Difficulty(self.difficulty));
        }
        if !(1..=99).contains(&self.target_score) {
            return Err(ConfigError::TargetScore(self.target_score));
        }
        if !self.field_width.is_finite()
            || self.field_width < MIN_FIELD_WIDTH
            || self.field_width > MAX_FIELD_WIDTH
        {
            return Err(ConfigError::FieldWidth {
                got: self.field_width,
                min: MIN_FIELD_WIDTH,
                max: MAX_FIELD_WIDTH,
            });
        }
        Ok(())
    }

    /// Store key for the last-used configuration
    const STORAGE_KEY: &'static str = "paddle_arena_config";

    /// Load the last-used configuration, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<MatchConfig>(store, Self::STORAGE_KEY) {
            Some(config) if config.validate().is_ok() => {
                log::info!("Loaded last-used config ({})", config.mode.as_str());
                config
            }
            _ => {
                log::info!("Using default config");
                Self::default()
            }
        }
    }

    /// Remember this configuration
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        save_json(store, Self::STORAGE_KEY, self);
        log::info!("Config saved");
    }
}
