//! Patter Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Patter crates.

use serde::{Deserialize, Serialize};

/// Default typewriter speed in characters per second
pub const DEFAULT_CHARS_PER_SEC: f64 = 40.0;

/// Playback configuration handed to a runner at construction time.
///
/// The runner keeps a copy of these values and restores them every time a
/// scene is loaded, so built-in operations only ever change the live copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Typewriter speed
    pub chars_per_sec: f64,
    /// Whether `confirm()` while emitting flushes the rest of the beat
    pub confirm_flushes: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            chars_per_sec: DEFAULT_CHARS_PER_SEC,
            confirm_flushes: true,
        }
    }
}

impl RunnerConfig {
    /// Parse a config from JSON; missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Milliseconds spent on a single character at the configured speed
    pub fn char_interval_ms(&self) -> f64 {
        1000.0 / self.chars_per_sec
    }
}

/// Named typewriter speeds accepted by the `speed` built-in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    Slow,
    Normal,
    Fast,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 3] = [SpeedPreset::Slow, SpeedPreset::Normal, SpeedPreset::Fast];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "slow" => Some(SpeedPreset::Slow),
            "normal" => Some(SpeedPreset::Normal),
            "fast" => Some(SpeedPreset::Fast),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Slow => "slow",
            SpeedPreset::Normal => "normal",
            SpeedPreset::Fast => "fast",
        }
    }

    /// Characters per second for this preset
    pub fn chars_per_sec(&self) -> f64 {
        match self {
            SpeedPreset::Slow => 15.0,
            SpeedPreset::Normal => DEFAULT_CHARS_PER_SEC,
            SpeedPreset::Fast => 80.0,
        }
    }
}

/// Named pause lengths accepted by the `pause` built-in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PausePreset {
    Short,
    Medium,
    Long,
}

impl PausePreset {
    pub const ALL: [PausePreset; 3] = [PausePreset::Short, PausePreset::Medium, PausePreset::Long];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "short" => Some(PausePreset::Short),
            "medium" => Some(PausePreset::Medium),
            "long" => Some(PausePreset::Long),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PausePreset::Short => "short",
            PausePreset::Medium => "medium",
            PausePreset::Long => "long",
        }
    }

    /// Pause length in milliseconds
    pub fn millis(&self) -> f64 {
        match self {
            PausePreset::Short => 250.0,
            PausePreset::Medium => 500.0,
            PausePreset::Long => 1000.0,
        }
    }
}

/// Pipeline phase, used for per-phase log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Tokenizer,
    Parser,
    Compiler,
    Runner,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Tokenizer, Phase::Parser, Phase::Compiler, Phase::Runner];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Tokenizer => "tokenizer",
            Phase::Parser => "parser",
            Phase::Compiler => "compiler",
            Phase::Runner => "runner",
        }
    }

    /// Get the log target name for this phase
    pub const fn target(&self) -> &'static str {
        match self {
            Phase::Tokenizer => "patter::tokenizer",
            Phase::Parser => "patter::parser",
            Phase::Compiler => "patter::compiler",
            Phase::Runner => "patter::runner",
        }
    }
}
