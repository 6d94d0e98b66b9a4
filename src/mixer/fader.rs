//! Global brightness fade
//!
//! There is no stored fade mode. Each poll re-derives the regime from the idle
//! predicate: dim towards 0 while idle, brighten towards 100 while active. The
//! fade is gated on wall-clock time, not on the idle edge, so a late edge
//! handler does not disturb it.

/// Full brightness level
pub const MAX_BRIGHTNESS: u8 = 100;

/// Step intervals and amounts for both fade directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeProfile {
    pub black_interval_ms: u64,
    pub black_step: u8,
    pub light_interval_ms: u64,
    pub light_step: u8,
}

impl FadeProfile {
    /// Derive a profile from total fade times and step counts
    ///
    /// Step counts are clamped to `1..=100` so every step moves the level.
    pub fn new(
        fade_black_time_ms: u64,
        fade_black_steps: u8,
        fade_light_time_ms: u64,
        fade_light_steps: u8,
    ) -> Self {
        let black_steps = fade_black_steps.clamp(1, MAX_BRIGHTNESS);
        let light_steps = fade_light_steps.clamp(1, MAX_BRIGHTNESS);
        Self {
            black_interval_ms: fade_black_time_ms / u64::from(black_steps),
            black_step: MAX_BRIGHTNESS / black_steps,
            light_interval_ms: fade_light_time_ms / u64::from(light_steps),
            light_step: MAX_BRIGHTNESS / light_steps,
        }
    }
}

impl Default for FadeProfile {
    fn default() -> Self {
        Self::new(2000, 20, 500, 5)
    }
}

/// Next brightness level given the current level, the idle predicate and the
/// time elapsed since the last step
pub fn next_brightness(current: u8, idle: bool, elapsed_ms: u64, profile: &FadeProfile) -> u8 {
    let current = current.min(MAX_BRIGHTNESS);
    if idle && current > 0 {
        if elapsed_ms >= profile.black_interval_ms {
            return current.saturating_sub(profile.black_step);
        }
    } else if !idle && current < MAX_BRIGHTNESS {
        if elapsed_ms >= profile.light_interval_ms {
            return current.saturating_add(profile.light_step).min(MAX_BRIGHTNESS);
        }
    }
    current
}

/// Time-stepped brightness level shared by all LED rings
#[derive(Debug, Clone)]
pub struct BrightnessFader {
    level: u8,
    profile: FadeProfile,
    /// Timestamp of the last step (ms)
    last_step_ms: u64,
}

impl BrightnessFader {
    pub fn new(profile: FadeProfile, initial_level: u8, now_ms: u64) -> Self {
        Self {
            level: initial_level.min(MAX_BRIGHTNESS),
            profile,
            last_step_ms: now_ms,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Advance the fade. Returns true if the level changed.
    pub fn tick(&mut self, now_ms: u64, idle: bool) -> bool {
        let next = next_brightness(
            self.level,
            idle,
            now_ms.saturating_sub(self.last_step_ms),
            &self.profile,
        );
        if next == self.level {
            return false;
        }
        self.level = next;
        self.last_step_ms = now_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FADE_BLACK_STEPS: u8 = 20;
    const FADE_LIGHT_STEPS: u8 = 5;

    fn profile() -> FadeProfile {
        FadeProfile::new(2000, FADE_BLACK_STEPS, 500, FADE_LIGHT_STEPS)
    }

    #[test]
    fn test_profile_from_defaults() {
        let p = profile();
        assert_eq!(p.black_interval_ms, 100);
        assert_eq!(p.black_step, 5);
        assert_eq!(p.light_interval_ms, 100);
        assert_eq!(p.light_step, 20);
        assert_eq!(FadeProfile::default(), p);
    }

    #[test]
    fn test_next_brightness_waits_for_interval() {
        let p = profile();
        assert_eq!(next_brightness(100, true, 99, &p), 100);
        assert_eq!(next_brightness(100, true, 100, &p), 95);
        assert_eq!(next_brightness(0, false, 99, &p), 0);
        assert_eq!(next_brightness(0, false, 100, &p), 20);
    }

    #[test]
    fn test_next_brightness_bounds() {
        let p = profile();
        assert_eq!(next_brightness(3, true, 1000, &p), 0);
        assert_eq!(next_brightness(0, true, 1000, &p), 0);
        assert_eq!(next_brightness(90, false, 1000, &p), 100);
        assert_eq!(next_brightness(100, false, 1000, &p), 100);
    }

    #[test]
    fn test_fade_to_black_in_exact_steps() {
        let p = profile();
        let mut fader = BrightnessFader::new(p, 100, 0);
        let mut now = 0;
        let mut steps = 0;

        while fader.level() > 0 {
            now += p.black_interval_ms;
            assert!(fader.tick(now, true));
            steps += 1;
            assert!(steps <= FADE_BLACK_STEPS as usize);
        }
        assert_eq!(steps, FADE_BLACK_STEPS as usize);

        // Stays at zero
        now += p.black_interval_ms;
        assert!(!fader.tick(now, true));
        assert_eq!(fader.level(), 0);
    }

    #[test]
    fn test_fade_to_light_in_exact_steps() {
        let p = profile();
        let mut fader = BrightnessFader::new(p, 0, 0);
        let mut now = 0;

        for _ in 0..FADE_LIGHT_STEPS {
            now += p.light_interval_ms;
            assert!(fader.tick(now, false));
        }
        assert_eq!(fader.level(), 100);

        now += p.light_interval_ms;
        assert!(!fader.tick(now, false));
    }

    #[test]
    fn test_fast_polls_do_not_speed_up_fade() {
        let p = profile();
        let mut fader = BrightnessFader::new(p, 100, 0);

        // Poll every millisecond for one interval: exactly one step
        for now in 1..=p.black_interval_ms {
            fader.tick(now, true);
        }
        assert_eq!(fader.level(), 95);
    }

    #[test]
    fn test_regime_follows_idle_predicate() {
        let p = profile();
        let mut fader = BrightnessFader::new(p, 100, 0);

        fader.tick(100, true);
        fader.tick(200, true);
        assert_eq!(fader.level(), 90);

        // Wake up: brightening resumes from the current level
        fader.tick(300, false);
        assert_eq!(fader.level(), 100);
    }

    #[test]
    fn test_uneven_step_count_never_undershoots() {
        let p = FadeProfile::new(2000, 30, 500, 7);
        assert_eq!(p.black_step, 3);
        let mut fader = BrightnessFader::new(p, 100, 0);
        let mut now = 0;
        for _ in 0..100 {
            now += p.black_interval_ms;
            fader.tick(now, true);
        }
        assert_eq!(fader.level(), 0);
    }
}
