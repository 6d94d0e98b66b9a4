//! Auxiliary push buttons
//!
//! The buttons sit on analog-only pins, so a press is detected by thresholding
//! the analog reading. A held button counts as activity on every poll but never
//! dirties persisted state.

use crate::drivers::PinSource;

/// Analog reading below the threshold means pressed
pub fn is_button_pressed(raw: u16, threshold: u16) -> bool {
    raw < threshold
}

/// Set of analog buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonBank {
    pins: Vec<u8>,
    threshold: u16,
}

impl ButtonBank {
    pub fn new(pins: Vec<u8>, threshold: u16) -> Self {
        Self { pins, threshold }
    }

    /// Indices of the buttons currently held down
    pub fn pressed<P: PinSource>(&self, source: &mut P) -> Vec<usize> {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, &pin)| is_button_pressed(source.read_analog(pin), self.threshold))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedAnalog(HashMap<u8, u16>);

    impl PinSource for FixedAnalog {
        fn read_digital(&mut self, _pin: u8) -> bool {
            true
        }

        fn read_analog(&mut self, pin: u8) -> u16 {
            self.0.get(&pin).copied().unwrap_or(1023)
        }
    }

    #[test]
    fn test_threshold() {
        assert!(is_button_pressed(0, 512));
        assert!(is_button_pressed(511, 512));
        assert!(!is_button_pressed(512, 512));
        assert!(!is_button_pressed(1023, 512));
    }

    #[test]
    fn test_pressed_indices() {
        let bank = ButtonBank::new(vec![20, 21], 512);
        let mut source = FixedAnalog(HashMap::from([(20, 1023), (21, 100)]));
        assert_eq!(bank.pressed(&mut source), vec![1]);

        let mut idle = FixedAnalog(HashMap::new());
        assert!(bank.pressed(&mut idle).is_empty());
    }
}
