//! Poll-driven interval gate
//!
//! Timed behaviours (fade stepping, telemetry, idle animation) are checked inline
//! on every poll instead of using timers. A gate fires at most once per elapsed
//! period since it last fired, so poll latency bounds the timing precision.

/// Fires at most once per `period_ms` since the last firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalGate {
    period_ms: u64,
    last_fire_ms: u64,
}

impl IntervalGate {
    /// Create a gate whose first firing is one full period after `now_ms`
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            last_fire_ms: now_ms,
        }
    }

    /// Milliseconds since the gate last fired
    pub fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_fire_ms)
    }

    /// Returns true (and re-arms) if a full period has elapsed
    pub fn ready(&mut self, now_ms: u64) -> bool {
        if self.elapsed(now_ms) >= self.period_ms {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Re-arm without firing
    pub fn reset(&mut self, now_ms: u64) {
        self.last_fire_ms = now_ms;
    }
}
