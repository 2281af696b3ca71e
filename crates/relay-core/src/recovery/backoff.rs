//! Exponential backoff delays

use std::time::Duration;

/// Delay schedule for retry attempts
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap applied to every computed delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub multiplier: f64,
    /// Add pseudo-random jitter to spread out synchronized retries
    pub jitter: bool,
    /// Jitter magnitude as a fraction of the delay (0.0 - 1.0)
    pub jitter_ratio: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
            jitter_ratio: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay for a 0-indexed attempt: initial * multiplier^attempt, capped
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()));
        self.add_jitter(capped)
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let range = delay.as_secs_f64() * self.jitter_ratio;
        Duration::from_secs_f64((delay.as_secs_f64() + clock_jitter(range)).max(0.0))
    }
}

// Hash of the subsecond clock; good enough to decorrelate retry storms
// without pulling in a random number generator.
fn clock_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let hash = nanos.wrapping_mul(2654435761);
    (hash as f64) / (u32::MAX as f64) * range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_per_attempt() {
        let policy = BackoffPolicy::default().with_jitter(false);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = BackoffPolicy::default()
            .with_jitter(false)
            .with_max_delay(Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(250));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = BackoffPolicy::default();
        let base = Duration::from_millis(100);
        for attempt in 0..5 {
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay >= base);
        }
    }
}
