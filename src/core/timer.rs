// src/core/timer.rs

//! Ring-flag timers.
//!
//! The main loop is single-threaded and cooperative: nothing may block on a
//! sleep. Instead every stage machine owns one or more `Timer`s, `start`s
//! them with a deadline, and polls `ring()` once per tick. This mirrors the
//! original `mtc_timer` construct used throughout `mtcNodeMnfa.cpp` and
//! `mtcNodeFsm.cpp`, where a timer handler sets a flag consumed by the next
//! scheduler pass rather than invoking a callback directly.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Timer {
    deadline: Option<Instant>,
    rung: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            deadline: None,
            rung: false,
        }
    }

    /// Arms the timer for `duration` from now, clearing any prior ring.
    pub fn start(&mut self, duration: Duration) {
        self.deadline = Some(Instant::now() + duration);
        self.rung = false;
    }

    /// Re-arms the timer for `duration` from now, same as `start`.
    pub fn reset(&mut self, duration: Duration) {
        self.start(duration);
    }

    /// Disarms the timer. Does not clear a ring that already latched.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Must be called once per tick by the owning stage machine before
    /// `ring()` is checked. Latches `rung` once the deadline has passed.
    pub fn poll(&mut self) {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.rung = true;
                self.deadline = None;
            }
        }
    }

    /// True exactly once after the deadline elapses; does not self-clear so
    /// callers can check it multiple times within the same tick, but a new
    /// `start`/`reset` clears it.
    pub fn ring(&self) -> bool {
        self.rung
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_after_deadline() {
        let mut t = Timer::new();
        assert!(!t.ring());
        t.start(Duration::from_millis(5));
        assert!(t.is_running());
        std::thread::sleep(Duration::from_millis(10));
        t.poll();
        assert!(t.ring());
        assert!(!t.is_running());
    }

    #[test]
    fn reset_clears_previous_ring() {
        let mut t = Timer::new();
        t.start(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        t.poll();
        assert!(t.ring());
        t.reset(Duration::from_secs(10));
        assert!(!t.ring());
        assert!(t.is_running());
    }

    #[test]
    fn stop_disarms_without_ringing() {
        let mut t = Timer::new();
        t.start(Duration::from_secs(10));
        t.stop();
        assert!(!t.is_running());
        t.poll();
        assert!(!t.ring());
    }
}
