// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Lamport clock used to mint element counters.
//!
//! The clock is a simple counter that:
//! - Increments on local events (tick)
//! - Jumps past any remote timestamp it observes (update)
//!
//! Complexity: O(1) for every operation.

use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LamportClock {
    time: u64,
}

impl LamportClock {
    /// Create a new clock starting at 0.
    pub fn new() -> LamportClock {
        return LamportClock { time: 0 };
    }

    /// Create a clock with a specific starting time.
    pub fn with_time(time: u64) -> LamportClock {
        return LamportClock { time };
    }

    #[inline]
    pub fn time(&self) -> u64 {
        return self.time;
    }

    /// Increment the clock for a local event.
    /// Returns the new time.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.time += 1;
        return self.time;
    }

    /// Sets local time to max(local, remote) + 1 and returns it.
    #[inline]
    pub fn update(&mut self, remote_time: u64) -> u64 {
        self.time = self.time.max(remote_time) + 1;
        return self.time;
    }

    /// Sets local time to max(local, remote) without ticking.
    #[inline]
    pub fn observe(&mut self, remote_time: u64) {
        self.time = self.time.max(remote_time);
    }
}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        return self.time.cmp(&other.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_increments() {
        let mut clock = LamportClock::new();
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.time(), 2);
    }

    #[test]
    fn update_jumps_past_remote() {
        let mut clock = LamportClock::with_time(3);
        assert_eq!(clock.update(10), 11);
        assert_eq!(clock.update(2), 12);
    }

    #[test]
    fn observe_does_not_tick() {
        let mut clock = LamportClock::with_time(5);
        clock.observe(4);
        assert_eq!(clock.time(), 5);
        clock.observe(8);
        assert_eq!(clock.time(), 8);
    }

    #[test]
    fn clocks_order_by_time() {
        assert!(LamportClock::with_time(1) < LamportClock::with_time(2));
    }
}
