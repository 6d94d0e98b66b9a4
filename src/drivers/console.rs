//! Console collaborators - log LED and display output instead of driving hardware
//!
//! Useful for:
//! - Running the engine on a desktop without the panel
//! - Watching what the rings and the screen would show

use tracing::{debug, trace};

use super::{DisplaySink, LedRing};
use crate::mixer::RingFrame;

/// LED rings that remember the last shown frame per channel
#[derive(Debug, Clone)]
pub struct ConsoleLeds {
    staged: Vec<Option<RingFrame>>,
    shown: Vec<Option<RingFrame>>,
    show_count: u64,
}

impl ConsoleLeds {
    pub fn new(channel_count: usize) -> Self {
        Self {
            staged: vec![None; channel_count],
            shown: vec![None; channel_count],
            show_count: 0,
        }
    }

    /// Frame last pushed to a channel's ring
    pub fn shown(&self, channel: usize) -> Option<RingFrame> {
        self.shown.get(channel).copied().flatten()
    }

    pub fn show_count(&self) -> u64 {
        self.show_count
    }
}

impl LedRing for ConsoleLeds {
    fn set_channel(&mut self, channel: usize, frame: RingFrame) {
        if let Some(slot) = self.staged.get_mut(channel) {
            *slot = Some(frame);
        }
    }

    fn show(&mut self) {
        self.show_count += 1;
        for (channel, (staged, shown)) in self.staged.iter().zip(self.shown.iter_mut()).enumerate() {
            if *staged != *shown {
                if let Some(frame) = staged {
                    trace!("💡 Ring {}: {} LEDs lit, {}", channel, frame.lit, frame.color);
                }
                *shown = *staged;
            }
        }
    }
}

/// Display that logs what would be drawn
#[derive(Debug, Clone)]
pub struct ConsoleDisplay {
    names: Vec<String>,
}

impl ConsoleDisplay {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    fn name(&self, channel: usize) -> &str {
        self.names.get(channel).map(String::as_str).unwrap_or("?")
    }
}

impl DisplaySink for ConsoleDisplay {
    fn clear(&mut self) {
        trace!("Display cleared");
    }

    fn draw_idle_overview(&mut self, channel_count: usize) {
        let names: Vec<&str> = (0..channel_count).map(|i| self.name(i)).collect();
        debug!("📺 Idle overview: {}", names.join(" "));
    }

    fn draw_idle_frame(&mut self, frame: u8) {
        trace!("📺 Idle animation frame {}", frame);
    }

    fn draw_channel_view(&mut self, center: usize, others: &[usize]) {
        let others: Vec<&str> = others.iter().map(|&i| self.name(i)).collect();
        debug!("📺 Channel view: [{}] ({})", self.name(center), others.join(", "));
    }

    fn draw_volume(&mut self, volume: u8, _clear_first: bool) {
        debug!("📺 Volume {}", volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::Hsv;

    #[test]
    fn test_frames_visible_after_show() {
        let mut leds = ConsoleLeds::new(2);
        let frame = RingFrame {
            lit: 5,
            color: Hsv::new(1, 2, 3),
        };

        leds.set_channel(1, frame);
        assert_eq!(leds.shown(1), None);

        leds.show();
        assert_eq!(leds.shown(1), Some(frame));
        assert_eq!(leds.shown(0), None);
        assert_eq!(leds.show_count(), 1);
    }

    #[test]
    fn test_unknown_channel_ignored() {
        let mut leds = ConsoleLeds::new(1);
        leds.set_channel(4, RingFrame { lit: 1, color: Hsv::default() });
        leds.show();
        assert_eq!(leds.shown(4), None);
    }
}
