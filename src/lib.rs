//! SoundMixer - state engine of a standalone volume mixer console
//!
//! Each channel has a rotary encoder with a push switch and an LED ring. The
//! engine tracks per-channel volume and mute, fades the rings when the console
//! sits idle, persists changes to a byte-addressed EEPROM once the console goes
//! quiet, and streams a deej-style telemetry line to the host.

pub mod cli;
pub mod config;
pub mod drivers;
pub mod mixer;
pub mod paths;
pub mod storage;

pub use config::AppConfig;
pub use mixer::{EngineSettings, MixerEngine, PollReport, NUM_CHANNELS};
