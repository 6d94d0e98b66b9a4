//! Display state
//!
//! Two views share the small screen: the volume view for the most recently
//! touched channel (its icon in the middle, the other channels around it, the
//! volume below) and, once idle, an overview of all channels with a looping
//! animation above it. Drawing itself is done by the [`DisplaySink`].

use super::interval::IntervalGate;
use crate::drivers::DisplaySink;

/// Order in which animation bitmaps are shown while idle
pub const IDLE_ANIMATION_FRAMES: [u8; 4] = [0, 1, 2, 1];

fn digit_count(mut number: u8) -> u8 {
    let mut digits = 1;
    while number >= 10 {
        digits += 1;
        number /= 10;
    }
    digits
}

#[derive(Debug, Clone)]
pub struct ScreenState {
    channel_count: usize,
    /// Channel shown in the volume view
    current: Option<usize>,
    /// Channel whose icons are currently on screen
    last: Option<usize>,
    /// Volume last drawn, used to clear leftover digits
    last_volume: u8,
    frame_index: usize,
    animation: IntervalGate,
}

impl ScreenState {
    pub fn new(channel_count: usize, frame_interval_ms: u64, now_ms: u64) -> Self {
        Self {
            channel_count,
            current: None,
            last: None,
            last_volume: 100,
            frame_index: 0,
            animation: IntervalGate::new(frame_interval_ms, now_ms),
        }
    }

    /// Channel currently shown in the volume view
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Index into [`IDLE_ANIMATION_FRAMES`] of the next frame to draw
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Make `channel` the subject of the volume view
    pub fn select(&mut self, channel: usize) {
        self.last = self.current;
        self.current = Some(channel);
    }

    /// Draw the volume view for the selected channel
    pub fn show_volume<D: DisplaySink>(&mut self, volumes: &[u8], display: &mut D) {
        let center = self.current.unwrap_or(0);

        if self.last.is_none() {
            display.clear();
        }

        if self.current != self.last {
            let others: Vec<usize> = (0..self.channel_count).filter(|&i| i != center).collect();
            display.draw_channel_view(center, &others);
        }

        let volume = volumes.get(center).copied().unwrap_or(0);
        let clear_first = digit_count(self.last_volume) > digit_count(volume);
        display.draw_volume(volume, clear_first);
        self.last_volume = volume;
    }

    /// Switch to the idle overview and restart the animation
    pub fn enter_idle<D: DisplaySink>(&mut self, now_ms: u64, display: &mut D) {
        self.frame_index = 0;
        self.current = None;
        self.last = None;
        self.animation.reset(now_ms);
        display.clear();
        display.draw_idle_overview(self.channel_count);
    }

    /// Draw the next animation frame when due
    pub fn animate<D: DisplaySink>(&mut self, now_ms: u64, display: &mut D) -> bool {
        if !self.animation.ready(now_ms) {
            return false;
        }
        display.draw_idle_frame(IDLE_ANIMATION_FRAMES[self.frame_index]);
        self.frame_index = (self.frame_index + 1) % IDLE_ANIMATION_FRAMES.len();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Clear,
        Overview(usize),
        Frame(u8),
        View(usize, Vec<usize>),
        Volume(u8, bool),
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl DisplaySink for Recorder {
        fn clear(&mut self) {
            self.0.push(Call::Clear);
        }
        fn draw_idle_overview(&mut self, channel_count: usize) {
            self.0.push(Call::Overview(channel_count));
        }
        fn draw_idle_frame(&mut self, frame: u8) {
            self.0.push(Call::Frame(frame));
        }
        fn draw_channel_view(&mut self, center: usize, others: &[usize]) {
            self.0.push(Call::View(center, others.to_vec()));
        }
        fn draw_volume(&mut self, volume: u8, clear_first: bool) {
            self.0.push(Call::Volume(volume, clear_first));
        }
    }

    #[test]
    fn test_digit_count() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(100), 3);
    }

    #[test]
    fn test_first_selection_clears_and_draws_icons() {
        let mut screen = ScreenState::new(3, 240, 0);
        let mut display = Recorder::default();

        screen.select(1);
        screen.show_volume(&[100, 97, 100], &mut display);

        assert_eq!(
            display.0,
            vec![
                Call::Clear,
                Call::View(1, vec![0, 2]),
                Call::Volume(97, true),
            ]
        );
    }

    #[test]
    fn test_same_channel_only_redraws_volume() {
        let mut screen = ScreenState::new(3, 240, 0);
        let mut display = Recorder::default();

        screen.select(0);
        screen.show_volume(&[100, 0, 0], &mut display);
        display.0.clear();

        screen.select(0);
        screen.show_volume(&[97, 0, 0], &mut display);
        assert_eq!(display.0, vec![Call::Volume(97, true)]);
    }

    #[test]
    fn test_switching_channel_redraws_icons() {
        let mut screen = ScreenState::new(3, 240, 0);
        let mut display = Recorder::default();

        screen.select(0);
        screen.show_volume(&[5, 50, 0], &mut display);
        display.0.clear();

        screen.select(1);
        screen.show_volume(&[5, 50, 0], &mut display);
        assert_eq!(
            display.0,
            vec![Call::View(1, vec![0, 2]), Call::Volume(50, false)]
        );
    }

    #[test]
    fn test_idle_animation_cycle() {
        let mut screen = ScreenState::new(2, 240, 0);
        let mut display = Recorder::default();

        screen.enter_idle(1000, &mut display);
        assert_eq!(display.0, vec![Call::Clear, Call::Overview(2)]);
        display.0.clear();

        assert!(!screen.animate(1100, &mut display));
        let mut now = 1000;
        for _ in 0..5 {
            now += 240;
            assert!(screen.animate(now, &mut display));
        }
        assert_eq!(
            display.0,
            vec![
                Call::Frame(0),
                Call::Frame(1),
                Call::Frame(2),
                Call::Frame(1),
                Call::Frame(0),
            ]
        );
    }

    #[test]
    fn test_enter_idle_resets_selection() {
        let mut screen = ScreenState::new(2, 240, 0);
        let mut display = Recorder::default();

        screen.select(1);
        screen.enter_idle(0, &mut display);
        assert_eq!(screen.current(), None);
        assert_eq!(screen.frame_index(), 0);

        // The next volume view starts from a cleared screen
        display.0.clear();
        screen.select(1);
        screen.show_volume(&[10, 20], &mut display);
        assert_eq!(display.0[0], Call::Clear);
    }
}
