//! LED ring frames
//!
//! Computes what each ring should show: how many LEDs are lit for the volume and
//! which colour they get. Muted channels use the mute colour. The value channel
//! is scaled by the global brightness between the configured floor and the
//! colour's own value. Pixel driving is left to the [`LedRing`] collaborator.
//!
//! [`LedRing`]: crate::drivers::LedRing

use serde::{Deserialize, Serialize};

use super::channel::{ChannelState, MAX_VOLUME};
use super::fader::MAX_BRIGHTNESS;
use super::map_range;

/// HSV colour, 8 bits per component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

impl std::fmt::Display for Hsv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsv({}, {}, {})", self.h, self.s, self.v)
    }
}

/// Ring geometry and colour policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedProfile {
    pub per_channel: u8,
    pub min_brightness: u8,
    pub mute_color: Hsv,
}

/// What one ring shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingFrame {
    /// LEDs lit from the start of the ring; the rest are black
    pub lit: u8,
    pub color: Hsv,
}

/// Number of lit LEDs for a volume
pub fn lit_leds(volume: u8, per_channel: u8) -> u8 {
    map_range(
        i32::from(volume.min(MAX_VOLUME)),
        0,
        i32::from(MAX_VOLUME),
        0,
        i32::from(per_channel),
    ) as u8
}

/// Frame for one channel at the given global brightness
pub fn ring_frame(state: &ChannelState, base: Hsv, brightness: u8, profile: &LedProfile) -> RingFrame {
    let mut color = if state.is_muted() {
        profile.mute_color
    } else {
        base
    };
    color.v = map_range(
        i32::from(brightness.min(MAX_BRIGHTNESS)),
        0,
        i32::from(MAX_BRIGHTNESS),
        i32::from(profile.min_brightness),
        i32::from(color.v),
    )
    .clamp(0, 255) as u8;

    RingFrame {
        lit: lit_leds(state.volume(), profile.per_channel),
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> LedProfile {
        LedProfile {
            per_channel: 25,
            min_brightness: 60,
            mute_color: Hsv::new(0, 255, 255),
        }
    }

    #[test]
    fn test_lit_leds() {
        assert_eq!(lit_leds(0, 25), 0);
        assert_eq!(lit_leds(3, 25), 0);
        assert_eq!(lit_leds(4, 25), 1);
        assert_eq!(lit_leds(50, 25), 12);
        assert_eq!(lit_leds(100, 25), 25);
    }

    #[test]
    fn test_full_brightness_keeps_color() {
        let base = Hsv::new(92, 51, 217);
        let frame = ring_frame(&ChannelState::new(100, false), base, 100, &profile());
        assert_eq!(frame.lit, 25);
        assert_eq!(frame.color, base);
    }

    #[test]
    fn test_zero_brightness_uses_floor() {
        let base = Hsv::new(92, 51, 217);
        let frame = ring_frame(&ChannelState::new(40, false), base, 0, &profile());
        assert_eq!(frame.lit, 10);
        assert_eq!(frame.color.v, 60);
        assert_eq!(frame.color.h, 92);
    }

    #[test]
    fn test_half_brightness() {
        let base = Hsv::new(31, 186, 255);
        let frame = ring_frame(&ChannelState::new(100, false), base, 50, &profile());
        // 60 + 50 * (255 - 60) / 100
        assert_eq!(frame.color.v, 157);
    }

    #[test]
    fn test_muted_uses_mute_color() {
        let base = Hsv::new(166, 163, 242);
        let frame = ring_frame(&ChannelState::new(60, true), base, 100, &profile());
        assert_eq!(frame.color, Hsv::new(0, 255, 255));
        // The ring still shows the stored volume
        assert_eq!(frame.lit, 15);
    }
}
