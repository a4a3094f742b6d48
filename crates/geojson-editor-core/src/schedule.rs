//! Time source, debounced emission and frame coalescing.
//!
//! The editor never spawns threads or timers. The host drives time by calling
//! [`GeoJsonEditor::poll`](crate::GeoJsonEditor::poll) from its event loop; deadlines here are
//! plain millisecond values compared against a [`Clock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Millisecond time source.
pub trait Clock: Send {
    /// Milliseconds since an arbitrary fixed origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Monotonic wall clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time (ignored if it would go backwards).
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Cancellable single-slot deadline.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    /// Debouncer firing `delay_ms` after the latest schedule.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    /// Replace any pending deadline with `now + delay`.
    pub fn schedule(&mut self, now: u64) {
        self.deadline = Some(now.saturating_add(self.delay_ms));
    }

    /// Drop the pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a deadline is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed.
    pub fn fire_if_due(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Coalesces repaint requests into a single pending frame.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: bool,
    blocked: bool,
}

impl FrameScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a repaint. Multiple requests before [`take`](Self::take) collapse into one.
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// Suppress frames while an inline control is mid-interaction.
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    /// Whether frames are suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Whether a repaint is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Take the pending frame. While blocked, returns `false` and keeps the request.
    pub fn take(&mut self) -> bool {
        if self.blocked || !self.pending {
            return false;
        }
        self.pending = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debouncer_reschedule_replaces_deadline() {
        let mut debouncer = Debouncer::new(150);
        debouncer.schedule(0);
        debouncer.schedule(100);
        assert!(!debouncer.fire_if_due(200));
        assert!(debouncer.fire_if_due(250));
        assert!(!debouncer.fire_if_due(400));
    }

    #[test]
    fn test_debouncer_cancel() {
        let mut debouncer = Debouncer::new(10);
        debouncer.schedule(0);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire_if_due(100));
    }

    #[test]
    fn test_frames_coalesce_and_respect_block() {
        let mut frames = FrameScheduler::new();
        frames.request();
        frames.request();
        frames.set_blocked(true);
        assert!(!frames.take());
        assert!(frames.is_pending());
        frames.set_blocked(false);
        assert!(frames.take());
        assert!(!frames.take());
    }

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(5);
        let other = clock.clone();
        clock.advance(10);
        assert_eq!(other.now_ms(), 15);
        other.set(3);
        assert_eq!(clock.now_ms(), 15);
    }
}
