//! # Cycle pacer
//!
//! Keeps the control loop running at a fixed period. Mark the start of each cycle with
//! [`CyclePacer::mark`] and call [`CyclePacer::wait`] at its end to sleep for what remains of the
//! period.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CyclePacer {
    period: Duration,

    /// Start of the current cycle
    mark: Instant,

    num_consec_overruns: u64,

    /// Number of consecutive overruns after which they stop being logged individually
    overrun_warn_limit: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CyclePacer {
    pub fn new(period: Duration, overrun_warn_limit: u64) -> Self {
        Self {
            period,
            mark: Instant::now(),
            num_consec_overruns: 0,
            overrun_warn_limit,
        }
    }

    /// Record the start of a cycle.
    pub fn mark(&mut self) -> Instant {
        self.mark = Instant::now();
        self.mark
    }

    /// Sleep until a full period has elapsed since the last mark, returning the time slept.
    ///
    /// If the period has already elapsed the cycle overran and this returns immediately.
    pub fn wait(&mut self) -> Duration {
        let cycle_dur = Instant::now().saturating_duration_since(self.mark);

        match self.period.checked_sub(cycle_dur) {
            Some(remaining) => {
                self.num_consec_overruns = 0;
                thread::sleep(remaining);
                remaining
            }
            None => {
                self.num_consec_overruns += 1;

                if self.num_consec_overruns <= self.overrun_warn_limit {
                    warn!(
                        "Cycle overran by {:.6} s",
                        (cycle_dur - self.period).as_secs_f64()
                    );
                } else if self.num_consec_overruns == self.overrun_warn_limit + 1 {
                    warn!(
                        "{} consecutive cycle overruns, no longer reporting them",
                        self.num_consec_overruns
                    );
                }

                Duration::from_secs(0)
            }
        }
    }

    /// Pause for at least `pause`, and at least until the end of the current period.
    ///
    /// A deliberate pause is not an overrun.
    pub fn settle(&mut self, pause: Duration) -> Duration {
        let cycle_dur = Instant::now().saturating_duration_since(self.mark);
        let remaining = self
            .period
            .checked_sub(cycle_dur)
            .unwrap_or_else(|| Duration::from_secs(0));

        let sleep = remaining.max(pause);
        thread::sleep(sleep);
        self.num_consec_overruns = 0;

        sleep
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn num_consec_overruns(&self) -> u64 {
        self.num_consec_overruns
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fixed_period() {
        let mut pacer = CyclePacer::new(Duration::from_millis(20), 5);

        let start = pacer.mark();
        thread::sleep(Duration::from_millis(5));
        let slept = pacer.wait();

        assert!(slept <= Duration::from_millis(15));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_overrun() {
        let mut pacer = CyclePacer::new(Duration::from_millis(5), 1);

        for i in 1..=3 {
            pacer.mark();
            thread::sleep(Duration::from_millis(10));
            assert_eq!(pacer.wait(), Duration::from_secs(0));
            assert_eq!(pacer.num_consec_overruns(), i);
        }

        // A settled cycle resets the count
        pacer.mark();
        let start = Instant::now();
        pacer.settle(Duration::from_millis(15));
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert_eq!(pacer.num_consec_overruns(), 0);
    }
}
