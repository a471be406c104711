use std::time::Duration;

/// Delay before the second job fetch.
pub const INITIAL_POLL_DELAY: Duration = Duration::from_millis(700);
/// Upper bound for the delay between fetches.
pub const MAX_POLL_DELAY: Duration = Duration::from_millis(2500);
pub const POLL_MULTIPLIER: f64 = 1.2;

/// Wall-clock ceiling for a single polling loop.
pub const JOB_TIMEOUT_MINUTES: u64 = 60;
pub const JOB_TIMEOUT: Duration = Duration::from_secs(JOB_TIMEOUT_MINUTES * 60);

/// Geometric backoff between job status fetches. Delays never decrease.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_POLL_DELAY, MAX_POLL_DELAY, POLL_MULTIPLIER)
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            current: initial.min(max),
            max,
            multiplier: multiplier.max(1.0),
        }
    }

    /// Delay to wait now; advances the schedule for the next call.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let next_ms = (self.current.as_millis() as f64 * self.multiplier).round() as u64;
        self.current = Duration::from_millis(next_ms).min(self.max);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let mut backoff = Backoff::default();
        assert_eq!(backoff.next_delay(), Duration::from_millis(700));
        assert_eq!(backoff.next_delay(), Duration::from_millis(840));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1008));
    }

    #[test]
    fn test_backoff_is_non_decreasing_and_capped() {
        let mut backoff = Backoff::default();
        let delays: Vec<Duration> = (0..20).map(|_| backoff.next_delay()).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= MAX_POLL_DELAY));
        assert_eq!(delays.last(), Some(&MAX_POLL_DELAY));
    }

    #[test]
    fn test_backoff_clamps_bad_inputs() {
        let mut backoff = Backoff::new(Duration::from_secs(10), Duration::from_secs(1), 0.5);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
