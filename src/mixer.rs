//! Mixer state engine
//!
//! Everything with real invariants lives here: encoder decoding, the per-channel
//! volume/mute model, idle detection, the brightness fade, telemetry encoding and
//! the engine object that ties them together once per poll cycle.
//!
//! Time is always passed in explicitly as milliseconds on a monotonic clock, so
//! any poll cadence can be simulated deterministically.

mod activity;
mod buttons;
mod channel;
mod encoder;
mod engine;
mod fader;
mod interval;
mod leds;
mod screen;
mod telemetry;


pub use activity::{ActivityClock, IdleEdge, IdleEdgeDetector};
pub use buttons::{is_button_pressed, ButtonBank};
pub use channel::{ChannelState, Direction, MAX_VOLUME};
pub use encoder::{decode_rotation, EncoderChannel, EncoderEvents, PinLevels, SWITCH_RELEASED};
pub use engine::{EngineSettings, MixerEngine, PollReport};
pub use fader::{next_brightness, BrightnessFader, FadeProfile, MAX_BRIGHTNESS};
pub use interval::IntervalGate;
pub use leds::{lit_leds, ring_frame, Hsv, LedProfile, RingFrame};
pub use screen::{ScreenState, IDLE_ANIMATION_FRAMES};
pub use telemetry::{encode_line, scale_volume, TelemetryEncoder, TELEMETRY_DELIMITER, TELEMETRY_MAX};

/// Number of physical channels on the console
pub const NUM_CHANNELS: usize = 5;

/// Linear re-mapping with integer truncation, matching the firmware `map()` helper.
pub(crate) fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}
