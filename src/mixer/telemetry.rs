//! deej telemetry line encoding
//!
//! The host side (deej) expects one line per update with every channel's
//! slider value in `0..=1023`, separated by `|`. Muted channels report 0.

use super::channel::{ChannelState, MAX_VOLUME};
use super::interval::IntervalGate;
use super::map_range;

/// Full-scale value on the telemetry link
pub const TELEMETRY_MAX: u16 = 1023;

/// Separator between channel values
pub const TELEMETRY_DELIMITER: char = '|';

/// Rescale a 0-100 volume to 0-1023, truncating
pub fn scale_volume(volume: u8) -> u16 {
    map_range(
        i32::from(volume.min(MAX_VOLUME)),
        0,
        i32::from(MAX_VOLUME),
        0,
        i32::from(TELEMETRY_MAX),
    ) as u16
}

/// Encode all channels into one line, without the trailing newline
pub fn encode_line(channels: &[ChannelState]) -> String {
    let mut line = String::with_capacity(channels.len() * 5);
    for (i, channel) in channels.iter().enumerate() {
        if i > 0 {
            line.push(TELEMETRY_DELIMITER);
        }
        line.push_str(&scale_volume(channel.effective_volume()).to_string());
    }
    line
}

/// Interval-gated telemetry encoder
#[derive(Debug, Clone)]
pub struct TelemetryEncoder {
    gate: IntervalGate,
}

impl TelemetryEncoder {
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            gate: IntervalGate::new(interval_ms, now_ms),
        }
    }

    /// Encode a line if the interval has elapsed since the last one
    pub fn poll(&mut self, now_ms: u64, channels: &[ChannelState]) -> Option<String> {
        self.gate.ready(now_ms).then(|| encode_line(channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_volume_floor() {
        assert_eq!(scale_volume(0), 0);
        assert_eq!(scale_volume(50), 511);
        assert_eq!(scale_volume(1), 10);
        assert_eq!(scale_volume(100), 1023);
        assert_eq!(scale_volume(200), 1023);
    }

    #[test]
    fn test_encode_line_with_mute() {
        let channels = [
            ChannelState::new(100, false),
            ChannelState::new(0, true),
            ChannelState::new(50, false),
        ];
        assert_eq!(encode_line(&channels), "1023|0|511");
    }

    #[test]
    fn test_muted_channel_reports_zero() {
        let channels = [ChannelState::new(80, true), ChannelState::new(80, false)];
        assert_eq!(encode_line(&channels), "0|818");
    }

    #[test]
    fn test_single_channel_has_no_delimiter() {
        assert_eq!(encode_line(&[ChannelState::default()]), "1023");
        assert_eq!(encode_line(&[]), "");
    }

    #[test]
    fn test_poll_is_interval_gated() {
        let channels = [ChannelState::default(), ChannelState::new(0, false)];
        let mut encoder = TelemetryEncoder::new(100, 0);

        assert_eq!(encoder.poll(50, &channels), None);
        assert_eq!(encoder.poll(100, &channels).as_deref(), Some("1023|0"));
        assert_eq!(encoder.poll(120, &channels), None);
        assert_eq!(encoder.poll(199, &channels), None);
        assert!(encoder.poll(200, &channels).is_some());
    }
}
