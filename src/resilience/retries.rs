//! Per-load retry budget.
//!
//! A resource with `retrying_count = n` is dispatched at most `n + 1` times.
//! Only transient classifications may spend the budget; the engine decides
//! which those are. With backoff enabled, retry `n` waits
//! `min(base * 2^(n-1), max)` plus up to 10% jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

#[derive(Debug, Clone, Copy)]
struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    fn delay(self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(63);
        let capped = self
            .base_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_ms);
        let jitter = rand::thread_rng().gen_range(0..=capped / 10);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

#[derive(Debug, Clone)]
pub struct RetryBudget {
    remaining: u32,
    attempt: u32,
    backoff: Option<Backoff>,
}

impl RetryBudget {
    pub fn new(retrying_count: u32, config: &RetryConfig) -> Self {
        let backoff = config.backoff_enabled.then_some(Backoff {
            base_ms: config.base_delay_ms,
            max_ms: config.max_delay_ms,
        });
        Self {
            remaining: retrying_count,
            attempt: 0,
            backoff,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Zero-based index of the attempt about to be dispatched.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Take one retry if any is left, returning the delay to wait first.
    pub fn try_consume(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.attempt += 1;
        Some(
            self.backoff
                .map_or(Duration::ZERO, |backoff| backoff.delay(self.attempt)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exhaustion() {
        let mut budget = RetryBudget::new(3, &RetryConfig::default());
        assert_eq!(budget.try_consume(), Some(Duration::ZERO));
        assert_eq!(budget.try_consume(), Some(Duration::ZERO));
        assert_eq!(budget.try_consume(), Some(Duration::ZERO));
        assert_eq!(budget.try_consume(), None);
        assert_eq!(budget.attempt(), 3);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_zero_budget() {
        let mut budget = RetryBudget::new(0, &RetryConfig::default());
        assert_eq!(budget.try_consume(), None);
        assert_eq!(budget.attempt(), 0);
    }

    #[test]
    fn test_backoff_when_enabled() {
        let config = RetryConfig {
            backoff_enabled: true,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        };
        let mut budget = RetryBudget::new(5, &config);
        let first = budget.try_consume().unwrap();
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(111));
        let second = budget.try_consume().unwrap();
        assert!(second >= Duration::from_millis(200));
    }

    #[test]
    fn test_backoff_caps_at_max() {
        let config = RetryConfig {
            backoff_enabled: true,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        };
        let mut budget = RetryBudget::new(40, &config);
        let delays: Vec<_> = std::iter::from_fn(|| budget.try_consume()).collect();
        assert_eq!(delays.len(), 40);
        for delay in &delays[4..] {
            assert!((1000..=1100).contains(&delay.as_millis()));
        }
    }

    #[test]
    fn test_backoff_saturates() {
        let backoff = Backoff {
            base_ms: u64::MAX,
            max_ms: u64::MAX,
        };
        assert_eq!(backoff.delay(u32::MAX), Duration::from_millis(u64::MAX));
    }
}
