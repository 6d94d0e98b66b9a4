//! Simulated front panel
//!
//! Holds the level of every pin and a script of pending level changes. Each
//! call to [`SimulatedPanel::advance`] applies one scripted step, so a
//! scripted encoder turn plays out over consecutive polls exactly like a
//! physical one would.

use anyhow::{bail, Result};
use std::collections::{HashMap, VecDeque};
use tracing::trace;

use super::PinSource;
use crate::config::EncoderPins;
use crate::mixer::{Direction, SWITCH_RELEASED};

/// Analog reading of a released button
const BUTTON_RELEASED: u16 = 1023;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Digital(bool),
    Analog(u16),
}

type Step = Vec<(u8, Level)>;

/// Pin source driven by scripted input
#[derive(Debug, Clone)]
pub struct SimulatedPanel {
    digital: HashMap<u8, bool>,
    analog: HashMap<u8, u16>,
    encoders: Vec<EncoderPins>,
    buttons: Vec<u8>,
    /// A level of each encoder once the script has played out
    planned_a: Vec<bool>,
    script: VecDeque<Step>,
}

impl SimulatedPanel {
    /// Panel at rest: A and B low, switches released, buttons released
    pub fn new(encoders: Vec<EncoderPins>, buttons: Vec<u8>) -> Self {
        let mut digital = HashMap::new();
        for pins in &encoders {
            digital.insert(pins.a, false);
            digital.insert(pins.b, false);
            digital.insert(pins.switch, SWITCH_RELEASED);
        }
        let analog = buttons.iter().map(|&pin| (pin, BUTTON_RELEASED)).collect();

        Self {
            digital,
            analog,
            planned_a: vec![false; encoders.len()],
            encoders,
            buttons,
            script: VecDeque::new(),
        }
    }

    fn encoder(&self, channel: usize) -> Result<EncoderPins> {
        match self.encoders.get(channel) {
            Some(pins) => Ok(*pins),
            None => bail!("No channel {} (panel has {})", channel, self.encoders.len()),
        }
    }

    /// Queue `detents` steps of rotation on a channel
    pub fn turn(&mut self, channel: usize, direction: Direction, detents: u32) -> Result<()> {
        let pins = self.encoder(channel)?;
        for _ in 0..detents {
            let a = !self.planned_a[channel];
            let b = match direction {
                Direction::Up => !a,
                Direction::Down => a,
            };
            self.planned_a[channel] = a;
            self.script
                .push_back(vec![(pins.a, Level::Digital(a)), (pins.b, Level::Digital(b))]);
        }
        Ok(())
    }

    /// Queue a press and release of a channel's encoder switch
    pub fn press(&mut self, channel: usize) -> Result<()> {
        let pins = self.encoder(channel)?;
        self.script
            .push_back(vec![(pins.switch, Level::Digital(!SWITCH_RELEASED))]);
        self.script
            .push_back(vec![(pins.switch, Level::Digital(SWITCH_RELEASED))]);
        Ok(())
    }

    /// Queue a press and release of an auxiliary button
    pub fn press_button(&mut self, index: usize) -> Result<()> {
        let Some(&pin) = self.buttons.get(index) else {
            bail!("No button {} (panel has {})", index, self.buttons.len());
        };
        self.script.push_back(vec![(pin, Level::Analog(0))]);
        self.script.push_back(vec![(pin, Level::Analog(BUTTON_RELEASED))]);
        Ok(())
    }

    /// Apply the next scripted step. Returns false once the script is empty.
    pub fn advance(&mut self) -> bool {
        let Some(step) = self.script.pop_front() else {
            return false;
        };
        for (pin, level) in step {
            trace!("Simulated pin {} -> {:?}", pin, level);
            match level {
                Level::Digital(high) => {
                    self.digital.insert(pin, high);
                }
                Level::Analog(value) => {
                    self.analog.insert(pin, value);
                }
            }
        }
        true
    }

    /// Number of scripted steps not yet applied
    pub fn pending(&self) -> usize {
        self.script.len()
    }
}

impl PinSource for SimulatedPanel {
    fn read_digital(&mut self, pin: u8) -> bool {
        // Unconnected inputs float high on the pull-ups
        self.digital.get(&pin).copied().unwrap_or(true)
    }

    fn read_analog(&mut self, pin: u8) -> u16 {
        self.analog.get(&pin).copied().unwrap_or(BUTTON_RELEASED)
    }
}
