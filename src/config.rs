//! Configuration management for the SoundMixer console
//!
//! Handles loading, parsing and validation of the YAML configuration file.
//! Every section is optional; missing values fall back to the values of the
//! reference hardware build.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::fs;

use crate::mixer::{FadeProfile, Hsv, LedProfile, NUM_CHANNELS};
use crate::storage::{record_len, DEFAULT_CAPACITY};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mixer: MixerConfig,
    #[serde(default)]
    pub buttons: ButtonConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub leds: LedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Channel layout and encoder behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MixerConfig {
    /// Volume change per encoder detent (percent)
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
}

/// One mixer channel
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelConfig {
    pub name: String,
    pub pins: EncoderPins,
    /// Ring colour at full brightness
    pub color: Hsv,
}

/// Encoder pin assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EncoderPins {
    pub a: u8,
    pub b: u8,
    pub switch: u8,
}

/// Auxiliary analog buttons
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ButtonConfig {
    #[serde(default = "default_button_pins")]
    pub pins: Vec<u8>,
    /// Analog readings below this count as pressed
    #[serde(default = "default_press_threshold")]
    pub press_threshold: u16,
}

/// Timing of the poll loop and all interval-driven behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_ms: u64,
    #[serde(default = "default_fade_black_time")]
    pub fade_black_time_ms: u64,
    #[serde(default = "default_fade_black_steps")]
    pub fade_black_steps: u8,
    #[serde(default = "default_fade_light_time")]
    pub fade_light_time_ms: u64,
    #[serde(default = "default_fade_light_steps")]
    pub fade_light_steps: u8,
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval_ms: u64,
    #[serde(default = "default_animation_frame")]
    pub idle_animation_frame_ms: u64,
}

/// LED ring configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LedConfig {
    #[serde(default = "default_leds_per_channel")]
    pub per_channel: u8,
    /// Colour value used at zero brightness
    #[serde(default = "default_min_brightness")]
    pub min_brightness: u8,
    #[serde(default = "default_mute_color")]
    pub mute_color: Hsv,
}

/// Durable storage configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// EEPROM image file; defaults to the application data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eeprom_path: Option<PathBuf>,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Telemetry output configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `stdout`, `off`, or a file path
    #[serde(default = "default_telemetry_output")]
    pub output: String,
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.mixer.channels.len() != NUM_CHANNELS {
            anyhow::bail!(
                "Exactly {} channels must be configured (found {})",
                NUM_CHANNELS,
                self.mixer.channels.len()
            );
        }

        if !(1..=100).contains(&self.mixer.volume_step) {
            anyhow::bail!("mixer.volume_step must be between 1 and 100");
        }

        let mut used_pins = HashSet::new();
        for (idx, channel) in self.mixer.channels.iter().enumerate() {
            if channel.name.is_empty() {
                anyhow::bail!("Channel {} name cannot be empty", idx);
            }
            for pin in [channel.pins.a, channel.pins.b, channel.pins.switch] {
                if !used_pins.insert(pin) {
                    anyhow::bail!("Pin {} of channel '{}' is already in use", pin, channel.name);
                }
            }
        }
        for &pin in &self.buttons.pins {
            if !used_pins.insert(pin) {
                anyhow::bail!("Button pin {} is already in use", pin);
            }
        }

        let timing = &self.timing;
        if timing.poll_interval_ms == 0 {
            anyhow::bail!("timing.poll_interval_ms must be at least 1");
        }
        for (name, steps) in [
            ("fade_black_steps", timing.fade_black_steps),
            ("fade_light_steps", timing.fade_light_steps),
        ] {
            if !(1..=100).contains(&steps) {
                anyhow::bail!("timing.{} must be between 1 and 100", name);
            }
        }

        if self.leds.per_channel == 0 {
            anyhow::bail!("leds.per_channel must be at least 1");
        }

        let needed = record_len(NUM_CHANNELS);
        if self.storage.capacity < needed {
            anyhow::bail!(
                "storage.capacity must be at least {} bytes (found {})",
                needed,
                self.storage.capacity
            );
        }

        Ok(())
    }

    /// Channel names in order
    pub fn channel_names(&self) -> Vec<String> {
        self.mixer.channels.iter().map(|c| c.name.clone()).collect()
    }
}

impl TimingConfig {
    pub fn fade_profile(&self) -> FadeProfile {
        FadeProfile::new(
            self.fade_black_time_ms,
            self.fade_black_steps,
            self.fade_light_time_ms,
            self.fade_light_steps,
        )
    }
}

impl LedConfig {
    pub fn profile(&self) -> LedProfile {
        LedProfile {
            per_channel: self.per_channel,
            min_brightness: self.min_brightness,
            mute_color: self.mute_color,
        }
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            volume_step: default_volume_step(),
            channels: default_channels(),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pins: default_button_pins(),
            press_threshold: default_press_threshold(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            idle_timeout_ms: default_idle_timeout(),
            fade_black_time_ms: default_fade_black_time(),
            fade_black_steps: default_fade_black_steps(),
            fade_light_time_ms: default_fade_light_time(),
            fade_light_steps: default_fade_light_steps(),
            telemetry_interval_ms: default_telemetry_interval(),
            idle_animation_frame_ms: default_animation_frame(),
        }
    }
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            per_channel: default_leds_per_channel(),
            min_brightness: default_min_brightness(),
            mute_color: default_mute_color(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            eeprom_path: None,
            capacity: default_capacity(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            output: default_telemetry_output(),
        }
    }
}

fn channel(name: &str, a: u8, b: u8, switch: u8, color: Hsv) -> ChannelConfig {
    ChannelConfig {
        name: name.to_string(),
        pins: EncoderPins { a, b, switch },
        color,
    }
}

// Default value functions
fn default_channels() -> Vec<ChannelConfig> {
    vec![
        channel("Master", 13, 14, 12, Hsv::new(92, 51, 217)),
        channel("Discord", 16, 17, 15, Hsv::new(166, 163, 242)),
        channel("Spotify", 4, 5, 3, Hsv::new(100, 214, 184)),
        channel("Chrome", 7, 8, 6, Hsv::new(31, 186, 255)),
        channel("Games", 10, 11, 9, Hsv::new(92, 51, 217)),
    ]
}
fn default_volume_step() -> u8 { 3 }
fn default_button_pins() -> Vec<u8> { vec![20, 21] }
fn default_press_threshold() -> u16 { 512 }
fn default_poll_interval() -> u64 { 1 }
fn default_idle_timeout() -> u64 { 5000 }
fn default_fade_black_time() -> u64 { 2000 }
fn default_fade_black_steps() -> u8 { 20 }
fn default_fade_light_time() -> u64 { 500 }
fn default_fade_light_steps() -> u8 { 5 }
fn default_telemetry_interval() -> u64 { 100 }
fn default_animation_frame() -> u64 { 240 }
fn default_leds_per_channel() -> u8 { 25 }
fn default_min_brightness() -> u8 { 60 }
fn default_mute_color() -> Hsv { Hsv::new(0, 255, 255) }
fn default_capacity() -> usize { DEFAULT_CAPACITY }
fn default_telemetry_output() -> String { "stdout".to_string() }
