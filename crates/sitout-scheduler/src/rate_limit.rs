//! Outbound call spacing with exponential backoff.
//!
//! The limiter never blocks. A denied [`RateLimiter::try_acquire`] means the
//! caller should fall back for this turn instead of waiting.

use std::time::{Duration, Instant};

use sitout_config::RateLimitConfig;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    base: Duration,
    ceiling: Duration,
    consecutive_failures: u32,
    last_call_at: Option<Instant>,
}

impl RateLimiter {
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        Self {
            base,
            ceiling: ceiling.max(base),
            consecutive_failures: 0,
            last_call_at: None,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.base_interval(), config.max_interval())
    }

    /// Current minimum spacing: `min(base * 2^failures, ceiling)`.
    pub fn interval(&self) -> Duration {
        // 2^31 already dwarfs any sane ceiling; clamp the shift to avoid overflow.
        let factor = 1u32.checked_shl(self.consecutive_failures.min(31)).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.ceiling, |d| d.min(self.ceiling))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        self.remaining_at(now).is_zero()
    }

    /// Time until the next call would be admitted (zero when admitted now).
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match self.last_call_at {
            None => Duration::ZERO,
            Some(last) => self.interval().saturating_sub(now.duration_since(last)),
        }
    }

    pub fn record_attempt(&mut self) {
        self.record_attempt_at(Instant::now());
    }

    pub fn record_attempt_at(&mut self, now: Instant) {
        self.last_call_at = Some(now);
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        debug!(
            failures = self.consecutive_failures,
            interval_ms = self.interval().as_millis() as u64,
            "Backing off outbound calls"
        );
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(10), Duration::from_secs(120))
    }

    #[test]
    fn test_first_call_admitted() {
        let rl = limiter();
        assert!(rl.try_acquire());
        assert_eq!(rl.remaining_at(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_denied_until_interval_elapses() {
        let mut rl = limiter();
        let t0 = Instant::now();
        rl.record_attempt_at(t0);
        assert!(!rl.try_acquire_at(t0));
        assert!(!rl.try_acquire_at(t0 + Duration::from_millis(9_999)));
        assert_eq!(
            rl.remaining_at(t0 + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_interval_doubles_up_to_ceiling() {
        let mut rl = limiter();
        let expected = [10, 20, 40, 80, 120, 120];
        for secs in expected {
            assert_eq!(rl.interval(), Duration::from_secs(secs));
            rl.record_failure();
        }
    }

    #[test]
    fn test_success_resets_backoff() {
        let mut rl = limiter();
        rl.record_failure();
        rl.record_failure();
        assert_eq!(rl.interval(), Duration::from_secs(40));
        rl.record_success();
        assert_eq!(rl.interval(), Duration::from_secs(10));
        assert_eq!(rl.consecutive_failures(), 0);
    }

    #[test]
    fn test_backoff_applies_to_admission() {
        let mut rl = limiter();
        let t0 = Instant::now();
        rl.record_attempt_at(t0);
        rl.record_failure();
        assert!(!rl.try_acquire_at(t0 + Duration::from_secs(15)));
        assert!(rl.try_acquire_at(t0 + Duration::from_secs(20)));
    }

    #[test]
    fn test_many_failures_do_not_overflow() {
        let mut rl = limiter();
        for _ in 0..100 {
            rl.record_failure();
        }
        assert_eq!(rl.interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_defaults_from_config() {
        let rl = RateLimiter::default();
        assert_eq!(rl.interval(), Duration::from_secs(10));
    }
}
