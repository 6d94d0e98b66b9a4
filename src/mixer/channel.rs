//! Per-channel volume and mute model

use serde::{Deserialize, Serialize};

/// Upper bound of the volume domain (percent)
pub const MAX_VOLUME: u8 = 100;

/// Rotation direction of an encoder step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Clockwise
    Up,
    /// Counter-clockwise
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Volume (0-100) and mute flag of one channel
///
/// A pure state transformer: persistence and activity tracking are
/// orchestrated by the engine, never from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    volume: u8,
    muted: bool,
}

impl ChannelState {
    /// Create a channel state, clamping the volume into range
    pub fn new(volume: u8, muted: bool) -> Self {
        Self {
            volume: volume.min(MAX_VOLUME),
            muted,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Volume as heard by the host: zero while muted
    pub fn effective_volume(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.volume
        }
    }

    /// Move the volume by `step`, saturating at 0 and 100. Returns the new volume.
    pub fn apply_step(&mut self, direction: Direction, step: u8) -> u8 {
        self.volume = match direction {
            Direction::Up => self.volume.saturating_add(step).min(MAX_VOLUME),
            Direction::Down => self.volume.saturating_sub(step),
        };
        self.volume
    }

    /// Flip the mute flag. Returns the new flag.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            volume: MAX_VOLUME,
            muted: false,
        }
    }
}
