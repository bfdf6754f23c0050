//! Fixed-interval scheduling and interruptible sleeps shared by both loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use soil_traits::Clock;

/// Pause after a failed sensor read before trying again.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Longest single sleep between shutdown checks.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Drift-free tick schedule: tick `n` is due at `start + n * interval`.
///
/// The first tick is due at `start`. If an iteration overruns one or more
/// boundaries, they collapse into a single immediate tick instead of firing
/// back-to-back.
#[derive(Debug, Clone)]
pub struct Ticker {
    next: Instant,
    interval: Duration,
}

impl Ticker {
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            next: start,
            interval: interval.max(Duration::from_nanos(1)),
        }
    }

    /// Claim the next tick and return its deadline.
    pub fn next_tick(&mut self, now: Instant) -> Instant {
        let mut deadline = self.next;
        if now > deadline {
            let missed = now.duration_since(deadline).as_nanos() / self.interval.as_nanos();
            deadline += self.span(missed);
        }
        self.next = deadline + self.interval;
        deadline
    }

    /// Move the schedule to the first boundary strictly after `now`.
    ///
    /// Used after an out-of-band retry so the next tick is a normal aligned
    /// one rather than an immediate catch-up.
    pub fn resync(&mut self, now: Instant) {
        if self.next <= now {
            let missed = now.duration_since(self.next).as_nanos() / self.interval.as_nanos();
            self.next += self.span(missed + 1);
        }
    }

    fn span(&self, ticks: u128) -> Duration {
        let nanos = ticks.saturating_mul(self.interval.as_nanos());
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Sleep until `deadline`, waking at least every 100 ms to honour `shutdown`.
///
/// Returns false when interrupted by shutdown.
pub fn sleep_until_interruptible(
    clock: &impl Clock,
    deadline: Instant,
    shutdown: &AtomicBool,
) -> bool {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        let now = clock.now();
        if deadline <= now {
            return true;
        }
        clock.sleep_until(deadline.min(now + SLEEP_SLICE));
    }
}

/// Sleep for `d`, waking at least every 100 ms to honour `shutdown`.
pub fn sleep_interruptible(clock: &impl Clock, d: Duration, shutdown: &AtomicBool) -> bool {
    let deadline = clock.now() + d;
    sleep_until_interruptible(clock, deadline, shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soil_traits::ManualClock;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn ticks_are_aligned_regardless_of_work_time() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut t = Ticker::new(start, SEC);
        assert_eq!(t.next_tick(clock.now()), start);
        clock.advance(Duration::from_millis(300));
        assert_eq!(t.next_tick(clock.now()), start + SEC);
        clock.set_offset(SEC + Duration::from_millis(900));
        assert_eq!(t.next_tick(clock.now()), start + 2 * SEC);
    }

    #[test]
    fn overrun_collapses_missed_ticks() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut t = Ticker::new(start, SEC);
        t.next_tick(start);
        clock.set_offset(Duration::from_millis(3500));
        // ticks at 1s and 2s were missed; 3s is due now
        assert_eq!(t.next_tick(clock.now()), start + 3 * SEC);
        assert_eq!(t.next_tick(clock.now()), start + 4 * SEC);
    }

    #[test]
    fn resync_skips_to_a_future_boundary() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut t = Ticker::new(start, SEC);
        t.next_tick(start);
        t.resync(start + Duration::from_millis(6200));
        assert_eq!(t.next_tick(start + Duration::from_millis(6200)), start + 7 * SEC);

        // already in the future: unchanged
        t.resync(start + Duration::from_millis(7100));
        assert_eq!(t.next_tick(start + Duration::from_millis(7100)), start + 8 * SEC);
    }

    #[test]
    fn resync_exactly_on_boundary_moves_past_it() {
        let start = Instant::now();
        let mut t = Ticker::new(start, SEC);
        t.next_tick(start);
        t.resync(start + SEC);
        assert_eq!(t.next_tick(start + SEC), start + 2 * SEC);
    }

    #[test]
    fn interruptible_sleep_covers_full_duration() {
        let clock = ManualClock::new();
        let stop = AtomicBool::new(false);
        assert!(sleep_interruptible(&clock, Duration::from_secs(5), &stop));
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn interruptible_sleep_lands_on_deadline() {
        let clock = ManualClock::new();
        let stop = AtomicBool::new(false);
        let deadline = clock.now() + Duration::from_millis(250);
        assert!(sleep_until_interruptible(&clock, deadline, &stop));
        assert_eq!(clock.now(), deadline);
    }

    #[test]
    fn interruptible_sleep_returns_on_shutdown() {
        let clock = ManualClock::new();
        let stop = AtomicBool::new(true);
        assert!(!sleep_interruptible(&clock, Duration::from_secs(5), &stop));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
