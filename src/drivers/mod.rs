//! Hardware collaborators
//!
//! The engine never touches hardware directly. It reads pins, pushes LED ring
//! frames, draws on the display and emits telemetry lines through these traits.
//! The implementations shipped here log to the console or simulate the panel,
//! so the console can run on a desktop.

use std::io;

use crate::mixer::RingFrame;

pub mod console;
pub mod serial;
pub mod simulated;

pub use console::{ConsoleDisplay, ConsoleLeds};
pub use serial::{open_telemetry, LineSink};
pub use simulated::SimulatedPanel;

/// Raw pin sampling
pub trait PinSource {
    /// Digital level of a pin (true = high)
    fn read_digital(&mut self, pin: u8) -> bool;

    /// 10-bit analog reading of a pin (0-1023)
    fn read_analog(&mut self, pin: u8) -> u16;
}

/// LED ring output
pub trait LedRing {
    /// Stage the frame for one channel's ring
    fn set_channel(&mut self, channel: usize, frame: RingFrame);

    /// Push staged frames to the LEDs
    fn show(&mut self);
}

/// Display drawing primitives
pub trait DisplaySink {
    fn clear(&mut self);

    /// Icons of all channels, drawn once when entering idle
    fn draw_idle_overview(&mut self, channel_count: usize);

    /// One bitmap of the idle animation
    fn draw_idle_frame(&mut self, frame: u8);

    /// Large icon for `center`, small icons for the others
    fn draw_channel_view(&mut self, center: usize, others: &[usize]);

    /// Volume number; `clear_first` when the previous number had more digits
    fn draw_volume(&mut self, volume: u8, clear_first: bool);
}

/// Host-facing telemetry transport
pub trait TelemetrySink {
    /// Send one line; the transport terminates it with a newline
    fn send_line(&mut self, line: &str) -> io::Result<()>;
}

/// All collaborators the engine needs for one poll
pub struct Peripherals<P, L, D, T> {
    pub pins: P,
    pub leds: L,
    pub display: D,
    pub telemetry: T,
}
