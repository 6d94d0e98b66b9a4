//! Rotary encoder decoding
//!
//! Single-edge quadrature decode: only edges on signal A are considered, and the
//! direction is read from the *current* levels of A and B at that edge. This misses
//! detents when polling is slow relative to rotation, which is acceptable at
//! human rotation speeds.
//!
//! The push switch is active-low and has no debounce timer; the poll rate does
//! the debouncing.

use super::channel::Direction;

/// Level of an encoder switch that is not pressed
pub const SWITCH_RELEASED: bool = true;

/// Raw pin levels sampled for one encoder in one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinLevels {
    pub a: bool,
    pub b: bool,
    pub switch: bool,
}

/// Events produced by one decode call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderEvents {
    /// At most one rotation step per call
    pub rotation: Option<Direction>,
    /// Switch went down this call
    pub toggle: bool,
}

impl EncoderEvents {
    pub fn is_empty(&self) -> bool {
        self.rotation.is_none() && !self.toggle
    }
}

/// Decode a rotation step from the previous and current A level and the current B level
pub fn decode_rotation(previous_a: bool, a: bool, b: bool) -> Option<Direction> {
    if a == previous_a {
        return None;
    }
    if b != a {
        Some(Direction::Up)
    } else {
        Some(Direction::Down)
    }
}

/// Decoder state for one physical encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderChannel {
    last_a: bool,
    last_switch: bool,
}

impl EncoderChannel {
    /// Create a decoder seeded with the A level read at start-up
    pub fn new(initial_a: bool) -> Self {
        Self {
            last_a: initial_a,
            last_switch: SWITCH_RELEASED,
        }
    }

    /// Feed the current pin levels and get the resulting events
    pub fn decode(&mut self, levels: PinLevels) -> EncoderEvents {
        let rotation = decode_rotation(self.last_a, levels.a, levels.b);
        self.last_a = levels.a;

        let mut toggle = false;
        if levels.switch != self.last_switch {
            self.last_switch = levels.switch;
            toggle = levels.switch != SWITCH_RELEASED;
        }

        EncoderEvents { rotation, toggle }
    }
}
