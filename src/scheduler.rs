//! Fixed-interval cadences tracked by their own last fire time.
//!
//! A cadence that fell behind (slow firmware call, suspended process) fires
//! once when checked and then resumes its normal interval from that point.
//! It never fires twice for the same interval and never skips permanently.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct Cadence {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Cadence {
            interval,
            last_fired: None,
        }
    }

    /// The first check is always due.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn fire(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }

    /// Check and fire in one step.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = self.is_due(now);
        if due {
            self.fire(now);
        }
        due
    }

    pub fn next_due(&self, now: Instant) -> Instant {
        match self.last_fired {
            None => now,
            Some(last) => (last + self.interval).max(now),
        }
    }
}

/// The two cadences of the daemon plus the display tick counter.
#[derive(Clone, Debug)]
pub struct Schedule {
    pub display: Cadence,
    pub power_report: Cadence,
    ticks: u64,
}

impl Schedule {
    pub fn new(display: Duration, power_report: Duration) -> Self {
        Schedule {
            display: Cadence::new(display),
            power_report: Cadence::new(power_report),
            ticks: 0,
        }
    }

    /// Fire the display cadence if due, returning the index of this tick.
    pub fn display_tick(&mut self, now: Instant) -> Option<u64> {
        if !self.display.poll(now) {
            return None;
        }
        let tick = self.ticks;
        self.ticks += 1;
        Some(tick)
    }

    pub fn power_report_due(&mut self, now: Instant) -> bool {
        self.power_report.poll(now)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// When the loop next has something to do.
    pub fn next_wakeup(&self, now: Instant) -> Instant {
        self.display.next_due(now).min(self.power_report.next_due(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn first_check_fires() {
        let now = Instant::now();
        let mut cadence = Cadence::new(SECOND);
        assert!(cadence.is_due(now));
        assert_eq!(cadence.next_due(now), now);
        assert!(cadence.poll(now));
    }

    #[test]
    fn no_double_fire_inside_an_interval() {
        let start = Instant::now();
        let mut cadence = Cadence::new(SECOND);
        assert!(cadence.poll(start));
        assert!(!cadence.poll(start));
        assert!(!cadence.poll(start + Duration::from_millis(999)));
        assert!(cadence.poll(start + SECOND));
        assert_eq!(cadence.next_due(start + SECOND), start + 2 * SECOND);
    }

    #[test]
    fn stall_fires_once_then_resumes() {
        let start = Instant::now();
        let mut cadence = Cadence::new(SECOND);
        cadence.fire(start);
        let late = start + Duration::from_secs(7);
        assert!(cadence.poll(late));
        assert!(!cadence.poll(late + Duration::from_millis(10)));
        assert_eq!(cadence.next_due(late), late + SECOND);
        assert!(cadence.poll(late + SECOND));
    }

    #[test]
    fn clock_never_runs_backwards_into_a_fire() {
        let start = Instant::now() + SECOND;
        let mut cadence = Cadence::new(SECOND);
        cadence.fire(start);
        assert!(!cadence.is_due(start - Duration::from_millis(500)));
    }

    #[test]
    fn cadences_are_independent() {
        let start = Instant::now();
        let mut schedule = Schedule::new(SECOND, 5 * SECOND);
        assert_eq!(schedule.display_tick(start), Some(0));
        assert!(schedule.power_report_due(start));

        let mut reports = 0;
        let mut ticks = Vec::new();
        for ms in (100..=10_000).step_by(100) {
            let now = start + Duration::from_millis(ms);
            if let Some(tick) = schedule.display_tick(now) {
                ticks.push(tick);
            }
            if schedule.power_report_due(now) {
                reports += 1;
            }
        }
        assert_eq!(ticks, (1..=10).collect::<Vec<_>>());
        assert_eq!(reports, 2);
        assert_eq!(schedule.ticks(), 11);
    }

    #[test]
    fn wakeup_is_the_earliest_cadence() {
        let start = Instant::now();
        let mut schedule = Schedule::new(SECOND, 5 * SECOND);
        schedule.display_tick(start);
        schedule.power_report_due(start);
        assert_eq!(schedule.next_wakeup(start), start + SECOND);
    }
}
