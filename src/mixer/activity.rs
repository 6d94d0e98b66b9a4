//! Activity tracking and idle detection
//!
//! Keeps the timestamp of the last user interaction and whether a change is
//! waiting to be persisted. Idle/active transitions are detected by the engine
//! through [`IdleEdgeDetector`], so each edge is reported exactly once.

use tracing::trace;

/// Tracks the last interaction and pending persistence
#[derive(Debug, Clone)]
pub struct ActivityClock {
    /// Timestamp of the last interaction (ms, monotonic)
    last_activity_ms: u64,
    /// Inactivity needed before the console counts as idle
    idle_timeout_ms: u64,
    /// Set on any volume/mute change, cleared once persisted
    pending_persist: bool,
}

impl ActivityClock {
    /// Create a clock that counts `now_ms` as the last interaction
    pub fn new(idle_timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            last_activity_ms: now_ms,
            idle_timeout_ms,
            pending_persist: false,
        }
    }

    /// Record an interaction
    ///
    /// Buttons pass `also_mark_dirty = false` (nothing persisted changes);
    /// encoder turns and mute toggles pass `true`.
    pub fn mark_activity(&mut self, now_ms: u64, also_mark_dirty: bool) {
        self.last_activity_ms = now_ms;
        if also_mark_dirty {
            self.pending_persist = true;
        }
        trace!("Activity at {}ms (dirty: {})", now_ms, self.pending_persist);
    }

    /// Idle once strictly more than the timeout has elapsed since the last interaction
    pub fn is_idle(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) > self.idle_timeout_ms
    }

    pub fn pending_persist(&self) -> bool {
        self.pending_persist
    }

    /// Clear the pending flag once the state is durably written
    pub fn mark_persisted(&mut self) {
        self.pending_persist = false;
    }
}

/// Idle state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEdge {
    BecameIdle,
    BecameActive,
}

/// Remembers the previous idle state to report transitions once
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleEdgeDetector {
    last_idle: bool,
}

impl IdleEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current idle predicate; returns an edge only when it flips
    pub fn update(&mut self, idle: bool) -> Option<IdleEdge> {
        let edge = match (self.last_idle, idle) {
            (false, true) => Some(IdleEdge::BecameIdle),
            (true, false) => Some(IdleEdge::BecameActive),
            _ => None,
        };
        self.last_idle = idle;
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_idle_right_after_activity() {
        let mut clock = ActivityClock::new(5000, 0);
        clock.mark_activity(10_000, false);
        assert!(!clock.is_idle(10_000));
    }

    #[test]
    fn test_idle_only_after_timeout_exceeded() {
        let mut clock = ActivityClock::new(5000, 0);
        clock.mark_activity(1000, false);

        assert!(!clock.is_idle(5999));
        // Exactly the timeout is not yet idle
        assert!(!clock.is_idle(6000));
        assert!(clock.is_idle(6001));
    }

    #[test]
    fn test_activity_postpones_idle() {
        let mut clock = ActivityClock::new(100, 0);
        clock.mark_activity(90, false);
        assert!(!clock.is_idle(150));
        assert!(clock.is_idle(191));
    }

    #[test]
    fn test_dirty_flag() {
        let mut clock = ActivityClock::new(100, 0);

        clock.mark_activity(1, false);
        assert!(!clock.pending_persist());

        clock.mark_activity(2, true);
        assert!(clock.pending_persist());

        // A later button press keeps the pending flag
        clock.mark_activity(3, false);
        assert!(clock.pending_persist());

        clock.mark_persisted();
        assert!(!clock.pending_persist());
    }

    #[test]
    fn test_edges_reported_once() {
        let mut detector = IdleEdgeDetector::new();

        assert_eq!(detector.update(false), None);
        assert_eq!(detector.update(true), Some(IdleEdge::BecameIdle));
        assert_eq!(detector.update(true), None);
        assert_eq!(detector.update(true), None);
        assert_eq!(detector.update(false), Some(IdleEdge::BecameActive));
        assert_eq!(detector.update(false), None);
    }
}
