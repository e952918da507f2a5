use std::time::Duration;

use serde::Deserialize;

/// Opt-in retry policy for client calls.
///
/// Only retryable errors (transport failures, commit conflicts) are
/// retried; the default never retries.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Single attempt
    #[default]
    None,
    /// Fixed delay between attempts
    Fixed { delay_ms: u64, max_attempts: u32 },
    /// Exponential backoff, capped at `max_delay_ms`
    Exponential {
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        max_attempts: u32,
    },
}

impl RetryPolicy {
    /// Total attempts allowed, including the first one.
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryPolicy::None => 1,
            RetryPolicy::Fixed { max_attempts, .. } | RetryPolicy::Exponential { max_attempts, .. } => {
                (*max_attempts).max(1)
            }
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { delay_ms, .. } => Duration::from_millis(*delay_ms),
            RetryPolicy::Exponential {
                initial_delay_ms,
                max_delay_ms,
                multiplier,
                ..
            } => {
                let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let delay = (*initial_delay_ms as f64) * multiplier.powi(exp);
                let delay = delay.min(*max_delay_ms as f64).max(0.0);
                Duration::from_millis(delay as u64)
            }
        }
    }
}
